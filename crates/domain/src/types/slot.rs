//! Bookable slots

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::status::AppointmentStatus;

/// One concrete bookable date-time instance for one advocate.
///
/// Slots are never physically deleted; they transition to `cancelled` or
/// `expired` instead. State transitions are expressed as consuming
/// functions that return the updated value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slot {
    pub id: Uuid,
    pub advocate_id: Uuid,
    /// Calendar day of the slot. Matches the day of `starts_at` at creation.
    pub date: NaiveDate,
    /// UTC instant the consultation starts.
    pub starts_at: DateTime<Utc>,
    pub is_available: bool,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
}

impl Slot {
    /// Build a fresh, available slot.
    pub fn new(advocate_id: Uuid, starts_at: DateTime<Utc>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            advocate_id,
            date: starts_at.date_naive(),
            starts_at,
            is_available: true,
            status: AppointmentStatus::Confirmed,
            created_at,
        }
    }

    /// A slot can be booked while it is available and not terminal.
    pub fn is_bookable(&self) -> bool {
        self.is_available && !self.status.is_terminal()
    }

    /// Transition: claimed by a booking.
    pub fn marked_booked(self) -> Self {
        Self { is_available: false, ..self }
    }

    /// Transition: returned to the bookable pool.
    pub fn released(self) -> Self {
        Self { is_available: true, ..self }
    }

    /// Transition: withdrawn by the advocate before it was ever booked.
    pub fn cancelled(self) -> Self {
        Self { is_available: false, status: AppointmentStatus::Cancelled, ..self }
    }

    /// Transition: reclassified by the sweeper once the instant has passed.
    pub fn expired(self) -> Self {
        Self { is_available: false, status: AppointmentStatus::Expired, ..self }
    }
}

/// Partial update applied through the slot store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlotPatch {
    pub is_available: Option<bool>,
    pub status: Option<AppointmentStatus>,
}

impl SlotPatch {
    pub fn status(status: AppointmentStatus) -> Self {
        Self { status: Some(status), ..Self::default() }
    }

    pub fn with_availability(mut self, is_available: bool) -> Self {
        self.is_available = Some(is_available);
        self
    }
}
