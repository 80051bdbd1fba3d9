//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Lexbook.
///
/// Variants follow the platform taxonomy: validation failures are always
/// caller-fixable, conflicts describe a state clash with an existing record,
/// policy violations are business-rule rejections, and dependency failures
/// come from external collaborators (notifications, wallet, storage).
#[derive(Error, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum LexbookError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Policy violation: {0}")]
    Policy(String),

    #[error("Dependency failure: {0}")]
    Dependency(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl LexbookError {
    pub fn slot_not_found(id: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("slot {id} not found"))
    }

    pub fn slot_unavailable(id: impl std::fmt::Display) -> Self {
        Self::Conflict(format!("slot {id} is not available"))
    }

    pub fn invalid_time(detail: impl Into<String>) -> Self {
        Self::Validation(detail.into())
    }

    pub fn duplicate_slot(detail: impl Into<String>) -> Self {
        Self::Conflict(detail.into())
    }

    pub fn booking_not_found(id: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("booking {id} not found"))
    }

    pub fn already_cancelled(id: impl std::fmt::Display) -> Self {
        Self::Conflict(format!("booking {id} is already cancelled"))
    }

    pub fn cannot_cancel_postponed(id: impl std::fmt::Display) -> Self {
        Self::Policy(format!("booking {id} was postponed and must be cancelled via its new slot"))
    }

    pub fn too_late_to_cancel(hours_left: i64) -> Self {
        Self::Policy(format!(
            "appointments can no longer be cancelled {hours_left}h before they start"
        ))
    }

    pub fn no_slot_at_time(at: impl std::fmt::Display) -> Self {
        Self::Conflict(format!("no slot exists at {at}"))
    }

    pub fn slot_already_booked(id: impl std::fmt::Display) -> Self {
        Self::Conflict(format!("slot {id} is already booked"))
    }

    pub fn insufficient_balance() -> Self {
        Self::Conflict("insufficient wallet balance".into())
    }
}

/// Result type alias for Lexbook operations
pub type Result<T> = std::result::Result<T, LexbookError>;
