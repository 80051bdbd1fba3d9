//! HTTP surface

pub mod bookings;
pub mod recurring;
pub mod slots;

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::json;

use crate::context::AppContext;
use crate::error::ApiResult;

/// Build the application router.
pub fn create_router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/recurring", post(recurring::create_rule).get(recurring::list_rules))
        .route("/slots", post(slots::create_slot).get(slots::list_slots))
        .route("/slots/available", get(slots::available_slots))
        .route("/slots/{id}/cancel", put(slots::cancel_slot))
        .route("/bookings", post(bookings::create_booking).get(bookings::booking_history))
        .route("/bookings/{id}/postpone", put(bookings::postpone_booking))
        .route("/bookings/{id}/cancel", put(bookings::cancel_booking))
        .with_state(ctx)
}

async fn health(State(ctx): State<Arc<AppContext>>) -> ApiResult<Json<serde_json::Value>> {
    ctx.db.health_check()?;
    Ok(Json(json!({ "status": "ok" })))
}
