//! Slot endpoints: ad-hoc creation, queries and withdrawal

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, NaiveDate, Utc};
use lexbook_domain::{CancelTarget, Slot};
use serde::Deserialize;
use uuid::Uuid;

use crate::context::AppContext;
use crate::error::ApiResult;
use crate::routes::recurring::AdvocateQuery;

#[derive(Debug, Deserialize)]
pub struct CreateSlotPayload {
    pub advocate_id: Uuid,
    pub starts_at: DateTime<Utc>,
}

pub async fn create_slot(
    State(ctx): State<Arc<AppContext>>,
    Json(payload): Json<CreateSlotPayload>,
) -> ApiResult<(StatusCode, Json<Slot>)> {
    let slot = ctx.availability.create_slot(payload.advocate_id, payload.starts_at).await?;
    Ok((StatusCode::CREATED, Json(slot)))
}

#[derive(Debug, Deserialize)]
pub struct SlotRangeQuery {
    pub advocate_id: Uuid,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

pub async fn list_slots(
    State(ctx): State<Arc<AppContext>>,
    Query(query): Query<SlotRangeQuery>,
) -> ApiResult<Json<Vec<Slot>>> {
    let slots = ctx.availability.find_slots(query.advocate_id, query.start, query.end).await?;
    Ok(Json(slots))
}

pub async fn available_slots(
    State(ctx): State<Arc<AppContext>>,
    Query(query): Query<AdvocateQuery>,
) -> ApiResult<Json<Vec<Slot>>> {
    let slots = ctx.availability.available_slots(query.advocate_id).await?;
    Ok(Json(slots))
}

pub async fn cancel_slot(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    ctx.bookings.cancel(CancelTarget::Slot(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
