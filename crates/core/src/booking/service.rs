//! Booking engine and postpone/cancel workflow - core business logic
//!
//! All validation happens before any write. The slot store's conditional
//! `claim` is the authoritative booking gate; the window lookup and the
//! bookable check in front of it are an optimistic pre-check only.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use lexbook_domain::{
    AppointmentStatus, Booking, BookingRequest, CancelTarget, LexbookError, NewNotification,
    NotificationKind, Result, SlotPatch, BOOKING_WINDOW_DAYS, CANCELLATION_REFUND,
    CANCEL_CUTOFF_HOURS,
};
use tracing::{info, warn};
use uuid::Uuid;

use super::ports::{BookingRepository, NotificationSender, SlotRepository, WalletLedger};
use crate::clock::Clock;

/// Booking service: turns available slots into bookings and keeps slot and
/// booking state mutually consistent through postpone and cancel.
pub struct BookingService {
    slots: Arc<dyn SlotRepository>,
    bookings: Arc<dyn BookingRepository>,
    wallets: Arc<dyn WalletLedger>,
    notifier: Arc<dyn NotificationSender>,
    clock: Arc<dyn Clock>,
}

impl BookingService {
    pub fn new(
        slots: Arc<dyn SlotRepository>,
        bookings: Arc<dyn BookingRepository>,
        wallets: Arc<dyn WalletLedger>,
        notifier: Arc<dyn NotificationSender>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { slots, bookings, wallets, notifier, clock }
    }

    /// Book an available slot for a user.
    ///
    /// The claimed slot is released again if the booking insert fails, so a
    /// lost write leaves an extra bookable slot rather than a phantom
    /// booking.
    pub async fn book(&self, request: BookingRequest) -> Result<Booking> {
        let now = self.clock.now();
        let window = self
            .slots
            .find_by_advocate(
                request.advocate_id,
                now.date_naive(),
                now.date_naive() + Duration::days(BOOKING_WINDOW_DAYS),
            )
            .await?;

        let slot = window
            .into_iter()
            .find(|s| s.id == request.slot_id)
            .ok_or_else(|| LexbookError::slot_not_found(request.slot_id))?;

        if !slot.is_bookable() {
            return Err(LexbookError::slot_unavailable(slot.id));
        }
        if slot.starts_at <= now {
            return Err(LexbookError::invalid_time(format!(
                "slot {} starts in the past",
                slot.id
            )));
        }

        // The actual gate. Losing the race here means someone else booked
        // the slot between the window read and this update.
        if !self.slots.claim(slot.id).await? {
            return Err(LexbookError::slot_unavailable(slot.id));
        }

        let booking = Booking {
            id: Uuid::new_v4(),
            advocate_id: request.advocate_id,
            user_id: request.user_id,
            slot_id: slot.id,
            date: slot.date,
            starts_at: slot.starts_at,
            status: AppointmentStatus::Confirmed,
            case_id: request.case_id,
            room_id: Some(format!("room-{}", Uuid::new_v4())),
            notes: request.notes.clone(),
            postpone_reason: None,
            created_at: now,
            updated_at: now,
        };

        if let Err(err) = self.bookings.create(&booking).await {
            if let Err(release_err) = self.slots.release(slot.id).await {
                warn!(
                    slot_id = %slot.id,
                    error = %release_err,
                    "failed to release slot after booking insert failure"
                );
            }
            return Err(err);
        }

        info!(booking_id = %booking.id, slot_id = %slot.id, "booking created");

        self.notify(
            booking.advocate_id,
            booking.user_id,
            format!("{} wants to book your slot at {}", request.user_name, booking.starts_at),
            NotificationKind::BookingCreated,
            now,
        )
        .await;
        self.notify(
            booking.user_id,
            booking.advocate_id,
            format!("You booked a consultation at {}", booking.starts_at),
            NotificationKind::BookingCreated,
            now,
        )
        .await;

        Ok(booking)
    }

    /// Cancel either a booking or a never-booked slot. The caller picks the
    /// variant; nothing is inferred from the id itself.
    pub async fn cancel(&self, target: CancelTarget) -> Result<()> {
        match target {
            CancelTarget::Booking(id) => self.cancel_booking(id).await,
            CancelTarget::Slot(id) => self.cancel_slot(id).await,
        }
    }

    async fn cancel_booking(&self, id: Uuid) -> Result<()> {
        let now = self.clock.now();
        let booking = self.bookings.get(id).await?;

        match booking.status {
            AppointmentStatus::Cancelled => return Err(LexbookError::already_cancelled(id)),
            AppointmentStatus::Expired => {
                return Err(LexbookError::Conflict(format!("booking {id} has already expired")));
            }
            AppointmentStatus::Postponed => {
                return Err(LexbookError::cannot_cancel_postponed(id));
            }
            AppointmentStatus::Confirmed | AppointmentStatus::Pending => {}
        }

        if booking.starts_at.signed_duration_since(now)
            <= Duration::hours(CANCEL_CUTOFF_HOURS)
        {
            return Err(LexbookError::too_late_to_cancel(CANCEL_CUTOFF_HOURS));
        }

        // The refund is part of the cancel contract: a wallet failure here
        // aborts the whole operation before any state changes.
        let wallet = self.wallets.get_or_create_wallet(booking.user_id).await?;
        self.wallets.credit(wallet.id, CANCELLATION_REFUND).await?;

        let cancelled = booking.clone().cancelled(now);
        self.bookings.update(&cancelled).await?;

        if let Err(err) = self.slots.release(booking.slot_id).await {
            warn!(
                slot_id = %booking.slot_id,
                error = %err,
                "failed to release slot of cancelled booking"
            );
        }

        info!(booking_id = %id, refund = CANCELLATION_REFUND, "booking cancelled");

        self.notify(
            booking.advocate_id,
            booking.user_id,
            format!("The consultation at {} was cancelled", booking.starts_at),
            NotificationKind::BookingCancelled,
            now,
        )
        .await;
        self.notify(
            booking.user_id,
            booking.advocate_id,
            format!(
                "Your booking at {} was cancelled and {CANCELLATION_REFUND} credited to your wallet",
                booking.starts_at
            ),
            NotificationKind::BookingCancelled,
            now,
        )
        .await;

        Ok(())
    }

    /// A slot that was never booked is withdrawn from the bookable pool for
    /// good. No booking and no refund are involved.
    async fn cancel_slot(&self, id: Uuid) -> Result<()> {
        let slot = self.slots.get(id).await?;

        if slot.status.is_terminal() || slot.status == AppointmentStatus::Postponed {
            return Err(LexbookError::Conflict(format!("slot {id} is already {}", slot.status)));
        }
        if !slot.is_available {
            return Err(LexbookError::slot_already_booked(id));
        }

        self.slots
            .update(
                id,
                SlotPatch::status(AppointmentStatus::Cancelled).with_availability(false),
            )
            .await?;

        info!(slot_id = %id, "slot withdrawn");
        Ok(())
    }

    /// Re-target a booking to a different slot of the same advocate.
    pub async fn postpone(
        &self,
        booking_id: Uuid,
        new_time: DateTime<Utc>,
        reason: String,
    ) -> Result<Booking> {
        let now = self.clock.now();
        let booking = self.bookings.get(booking_id).await?;

        if booking.status.is_terminal() {
            return Err(LexbookError::Conflict(format!(
                "booking {booking_id} is {} and can no longer be postponed",
                booking.status
            )));
        }
        if new_time <= now {
            return Err(LexbookError::invalid_time(format!(
                "postpone target {new_time} is in the past"
            )));
        }

        let window = self
            .slots
            .find_by_advocate(
                booking.advocate_id,
                now.date_naive(),
                now.date_naive() + Duration::days(BOOKING_WINDOW_DAYS),
            )
            .await?;

        // The old slot may have expired out of the window; that must not
        // block the postpone.
        let old_slot = window.iter().find(|s| s.id == booking.slot_id).cloned();
        let target = window
            .into_iter()
            .find(|s| s.starts_at == new_time)
            .ok_or_else(|| LexbookError::no_slot_at_time(new_time))?;

        if !target.is_bookable() {
            return Err(LexbookError::slot_already_booked(target.id));
        }
        if !self.slots.claim(target.id).await? {
            return Err(LexbookError::slot_already_booked(target.id));
        }

        let updated = booking.postponed_to(&target, reason, now);
        if let Err(err) = self.bookings.update(&updated).await {
            if let Err(release_err) = self.slots.release(target.id).await {
                warn!(
                    slot_id = %target.id,
                    error = %release_err,
                    "failed to release target slot after postpone update failure"
                );
            }
            return Err(err);
        }

        if let Some(old) = old_slot.filter(|s| s.id != target.id) {
            if let Err(err) = self.slots.release(old.id).await {
                warn!(slot_id = %old.id, error = %err, "failed to free the original slot");
            }
        }

        info!(
            booking_id = %booking_id,
            new_slot_id = %updated.slot_id,
            "booking postponed"
        );

        self.notify(
            updated.advocate_id,
            updated.user_id,
            format!("The consultation was postponed to {}", updated.starts_at),
            NotificationKind::BookingPostponed,
            now,
        )
        .await;
        self.notify(
            updated.user_id,
            updated.advocate_id,
            format!("Your booking was postponed to {}", updated.starts_at),
            NotificationKind::BookingPostponed,
            now,
        )
        .await;

        Ok(updated)
    }

    /// Booking history of a user, newest first.
    pub async fn history_for_user(&self, user_id: Uuid) -> Result<Vec<Booking>> {
        self.bookings.find_by_user(user_id).await
    }

    /// Booking history of an advocate, newest first.
    pub async fn history_for_advocate(&self, advocate_id: Uuid) -> Result<Vec<Booking>> {
        self.bookings.find_by_advocate(advocate_id).await
    }

    /// Best-effort notification; failures are logged and swallowed so the
    /// primary state transition stands on its own.
    async fn notify(
        &self,
        receiver: Uuid,
        sender: Uuid,
        message: String,
        kind: NotificationKind,
        now: DateTime<Utc>,
    ) {
        let notification = NewNotification::new(receiver, sender, message, kind, now);
        if let Err(err) = self.notifier.send(notification).await {
            warn!(receiver = %receiver, error = %err, "failed to send notification");
        }
    }
}
