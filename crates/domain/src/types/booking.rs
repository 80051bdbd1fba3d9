//! Bookings and the cancel-target addressing

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::slot::Slot;
use super::status::AppointmentStatus;

/// A client's claim on a slot.
///
/// At most one non-terminal booking may reference a given slot at a time;
/// the slot store's conditional claim enforces this. Bookings are never
/// deleted, only transitioned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub advocate_id: Uuid,
    pub user_id: Uuid,
    pub slot_id: Uuid,
    pub date: NaiveDate,
    pub starts_at: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub case_id: Option<Uuid>,
    /// Identifier of the video-call room, generated at booking time.
    pub room_id: Option<String>,
    pub notes: Option<String>,
    pub postpone_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Transition: re-targeted to a different slot.
    pub fn postponed_to(self, slot: &Slot, reason: String, now: DateTime<Utc>) -> Self {
        Self {
            slot_id: slot.id,
            date: slot.date,
            starts_at: slot.starts_at,
            status: AppointmentStatus::Postponed,
            postpone_reason: Some(reason),
            updated_at: now,
            ..self
        }
    }

    /// Transition: cancelled by the client.
    pub fn cancelled(self, now: DateTime<Utc>) -> Self {
        Self { status: AppointmentStatus::Cancelled, updated_at: now, ..self }
    }

    /// Transition: reclassified by the sweeper once the instant has passed.
    pub fn expired(self, now: DateTime<Utc>) -> Self {
        Self { status: AppointmentStatus::Expired, updated_at: now, ..self }
    }
}

/// Input to the booking engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRequest {
    pub advocate_id: Uuid,
    pub slot_id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub case_id: Option<Uuid>,
}

/// What a cancel operation addresses.
///
/// The caller (route) chooses the variant explicitly; nothing is inferred
/// from the shape of the identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum CancelTarget {
    /// A never-booked slot the advocate is withdrawing.
    Slot(Uuid),
    /// An existing booking the client is cancelling.
    Booking(Uuid),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn booking(now: DateTime<Utc>) -> Booking {
        Booking {
            id: Uuid::new_v4(),
            advocate_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            slot_id: Uuid::new_v4(),
            date: now.date_naive(),
            starts_at: now,
            status: AppointmentStatus::Confirmed,
            case_id: None,
            room_id: Some("room-test".into()),
            notes: None,
            postpone_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn postpone_re_targets_slot_and_records_reason() {
        let now = Utc::now();
        let target = Slot::new(Uuid::new_v4(), now + chrono::Duration::days(2), now);
        let updated = booking(now).postponed_to(&target, "conflict".into(), now);

        assert_eq!(updated.slot_id, target.id);
        assert_eq!(updated.starts_at, target.starts_at);
        assert_eq!(updated.date, target.date);
        assert_eq!(updated.status, AppointmentStatus::Postponed);
        assert_eq!(updated.postpone_reason.as_deref(), Some("conflict"));
    }

    #[test]
    fn cancelled_booking_keeps_identity() {
        let now = Utc::now();
        let b = booking(now);
        let id = b.id;
        let cancelled = b.cancelled(now);
        assert_eq!(cancelled.id, id);
        assert_eq!(cancelled.status, AppointmentStatus::Cancelled);
    }
}
