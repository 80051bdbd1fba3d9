//! Recurring-availability rule endpoints

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use lexbook_domain::{AvailabilityRule, NewAvailabilityRule};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::context::AppContext;
use crate::error::ApiResult;

#[derive(Debug, Serialize)]
pub struct CreateRuleResponse {
    pub rule: AvailabilityRule,
    pub slots_created: usize,
}

pub async fn create_rule(
    State(ctx): State<Arc<AppContext>>,
    Json(payload): Json<NewAvailabilityRule>,
) -> ApiResult<(StatusCode, Json<CreateRuleResponse>)> {
    let (rule, slots_created) = ctx.availability.create_rule(payload).await?;
    Ok((StatusCode::CREATED, Json(CreateRuleResponse { rule, slots_created })))
}

#[derive(Debug, Deserialize)]
pub struct AdvocateQuery {
    pub advocate_id: Uuid,
}

pub async fn list_rules(
    State(ctx): State<Arc<AppContext>>,
    Query(query): Query<AdvocateQuery>,
) -> ApiResult<Json<Vec<AvailabilityRule>>> {
    let rules = ctx.availability.list_rules(query.advocate_id).await?;
    Ok(Json(rules))
}
