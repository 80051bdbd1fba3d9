//! Expiration sweeper - periodic consistency pass
//!
//! Reclassifies stale bookings and slots no other code path will touch.
//! Every record is evaluated and written independently: a failure on one is
//! logged and counted, never aborts the rest of the pass.

use std::sync::Arc;

use lexbook_domain::{AppointmentStatus, SlotPatch};
use tracing::{info, warn};

use crate::booking::ports::{BookingRepository, SlotRepository};
use crate::clock::Clock;

/// Outcome of one sweep pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub bookings_expired: usize,
    pub slots_expired: usize,
    pub failures: usize,
}

/// Marks past, unresolved bookings and slots as expired.
pub struct SweeperService {
    slots: Arc<dyn SlotRepository>,
    bookings: Arc<dyn BookingRepository>,
    clock: Arc<dyn Clock>,
}

impl SweeperService {
    pub fn new(
        slots: Arc<dyn SlotRepository>,
        bookings: Arc<dyn BookingRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { slots, bookings, clock }
    }

    /// Run one idempotent sweep pass. A second pass over the same state is
    /// a no-op.
    pub async fn sweep(&self) -> SweepReport {
        let now = self.clock.now();
        let mut report = SweepReport::default();

        match self.bookings.list_unexpired_before(now).await {
            Ok(stale) => {
                for booking in stale {
                    let id = booking.id;
                    let expired = booking.expired(now);
                    match self.bookings.update(&expired).await {
                        Ok(()) => report.bookings_expired += 1,
                        Err(err) => {
                            warn!(booking_id = %id, error = %err, "failed to expire booking");
                            report.failures += 1;
                        }
                    }
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to list stale bookings");
                report.failures += 1;
            }
        }

        match self.slots.list_unexpired_before(now).await {
            Ok(stale) => {
                for slot in stale {
                    let patch = SlotPatch::status(AppointmentStatus::Expired)
                        .with_availability(false);
                    match self.slots.update(slot.id, patch).await {
                        Ok(_) => report.slots_expired += 1,
                        Err(err) => {
                            warn!(slot_id = %slot.id, error = %err, "failed to expire slot");
                            report.failures += 1;
                        }
                    }
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to list stale slots");
                report.failures += 1;
            }
        }

        info!(
            bookings_expired = report.bookings_expired,
            slots_expired = report.slots_expired,
            failures = report.failures,
            "expiration sweep finished"
        );
        report
    }
}
