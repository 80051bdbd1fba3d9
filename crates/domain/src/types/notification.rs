//! Notification payloads sent to the external notification collaborator

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Category of a notification, used by the delivery layer for routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    BookingCreated,
    BookingCancelled,
    BookingPostponed,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BookingCreated => "booking_created",
            Self::BookingCancelled => "booking_cancelled",
            Self::BookingPostponed => "booking_postponed",
        }
    }
}

/// Fire-and-forget notification payload. Delivery failures are logged by
/// the caller and never block the triggering workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewNotification {
    pub receiver_id: Uuid,
    pub sender_id: Uuid,
    pub message: String,
    pub kind: NotificationKind,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl NewNotification {
    pub fn new(
        receiver_id: Uuid,
        sender_id: Uuid,
        message: impl Into<String>,
        kind: NotificationKind,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self { receiver_id, sender_id, message: message.into(), kind, read: false, created_at }
    }
}
