//! Booking endpoints: create, postpone, cancel and history

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use lexbook_domain::{Booking, BookingRequest, CancelTarget, LexbookError};
use serde::Deserialize;
use uuid::Uuid;

use crate::context::AppContext;
use crate::error::ApiResult;

pub async fn create_booking(
    State(ctx): State<Arc<AppContext>>,
    Json(request): Json<BookingRequest>,
) -> ApiResult<(StatusCode, Json<Booking>)> {
    let booking = ctx.bookings.book(request).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

#[derive(Debug, Deserialize)]
pub struct PostponePayload {
    pub new_time: DateTime<Utc>,
    pub reason: String,
}

pub async fn postpone_booking(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PostponePayload>,
) -> ApiResult<Json<Booking>> {
    let booking = ctx.bookings.postpone(id, payload.new_time, payload.reason).await?;
    Ok(Json(booking))
}

pub async fn cancel_booking(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    ctx.bookings.cancel(CancelTarget::Booking(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub user_id: Option<Uuid>,
    pub advocate_id: Option<Uuid>,
}

pub async fn booking_history(
    State(ctx): State<Arc<AppContext>>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<Vec<Booking>>> {
    let bookings = match (query.user_id, query.advocate_id) {
        (Some(user_id), None) => ctx.bookings.history_for_user(user_id).await?,
        (None, Some(advocate_id)) => ctx.bookings.history_for_advocate(advocate_id).await?,
        _ => {
            return Err(LexbookError::Validation(
                "exactly one of user_id or advocate_id is required".into(),
            )
            .into())
        }
    };
    Ok(Json(bookings))
}
