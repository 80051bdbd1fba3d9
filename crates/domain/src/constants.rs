//! Domain constants shared across the booking workflows

/// How far into the future the booking engine searches for candidate slots.
pub const BOOKING_WINDOW_DAYS: i64 = 30;

/// Minimum number of hours before an appointment at which it may still be
/// cancelled. At or below this threshold the cancel is rejected.
pub const CANCEL_CUTOFF_HOURS: i64 = 3;

/// Fixed refund credited to the client's wallet when a confirmed booking is
/// cancelled, in currency units.
pub const CANCELLATION_REFUND: i64 = 100;
