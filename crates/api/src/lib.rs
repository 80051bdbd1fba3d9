//! # Lexbook API
//!
//! HTTP surface and application wiring: builds the dependency injection
//! context, exposes the axum router and owns the background scheduler's
//! lifecycle.

pub mod context;
pub mod error;
pub mod routes;

pub use context::AppContext;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
