//! Port interfaces for slots, bookings and the external collaborators
//!
//! These traits define the boundaries between core business logic
//! and infrastructure implementations.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use lexbook_domain::{Booking, NewNotification, Result, Slot, SlotPatch, Wallet};
use uuid::Uuid;

/// Trait for persisting and querying slots.
///
/// The `claim`/`release` pair is the authoritative guard on a slot's
/// availability flag: both are conditional updates that succeed for at
/// most one caller, so read-then-write races cannot double-book a slot.
#[async_trait]
pub trait SlotRepository: Send + Sync {
    /// Persist a new slot. Fails with a conflict if a slot with the same
    /// (advocate, instant) identity already exists.
    async fn create(&self, slot: &Slot) -> Result<()>;

    /// Persist a batch of slots, skipping those that already exist.
    /// Returns the number actually inserted.
    async fn create_many(&self, slots: &[Slot]) -> Result<usize>;

    /// Fetch a slot by id.
    async fn get(&self, id: Uuid) -> Result<Slot>;

    /// Inclusive date-range query over an advocate's slots, most recently
    /// created first.
    async fn find_by_advocate(
        &self,
        advocate_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Slot>>;

    /// All currently bookable slots of an advocate.
    async fn get_available(&self, advocate_id: Uuid) -> Result<Vec<Slot>>;

    /// Apply a partial update. Fails with not-found if no such slot.
    async fn update(&self, id: Uuid, patch: SlotPatch) -> Result<Slot>;

    /// Atomically flip `is_available` from true to false while the slot is
    /// still bookable. Returns false when the slot was already taken (or
    /// terminal), in which case nothing was written.
    async fn claim(&self, id: Uuid) -> Result<bool>;

    /// Atomically flip `is_available` back from false to true. Returns
    /// false when the slot was already available.
    async fn release(&self, id: Uuid) -> Result<bool>;

    /// Slots whose instant lies strictly before `before` and whose status
    /// is not yet terminal. Feed for the expiration sweeper.
    async fn list_unexpired_before(&self, before: DateTime<Utc>) -> Result<Vec<Slot>>;
}

/// Trait for persisting bookings.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Persist a new booking.
    async fn create(&self, booking: &Booking) -> Result<()>;

    /// Fetch a booking by id.
    async fn get(&self, id: Uuid) -> Result<Booking>;

    /// Overwrite an existing booking. Fails with not-found if absent.
    async fn update(&self, booking: &Booking) -> Result<()>;

    /// Booking history of a user, newest first.
    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<Booking>>;

    /// Booking history of an advocate, newest first.
    async fn find_by_advocate(&self, advocate_id: Uuid) -> Result<Vec<Booking>>;

    /// Bookings whose instant lies strictly before `before` and whose
    /// status is not yet terminal. Feed for the expiration sweeper.
    async fn list_unexpired_before(&self, before: DateTime<Utc>) -> Result<Vec<Booking>>;
}

/// Trait for the external notification collaborator.
///
/// Sends are fire-and-forget from the workflows' perspective: failures are
/// logged by the caller and never block the primary state transition.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, notification: NewNotification) -> Result<()>;
}

/// Trait for the wallet refund ledger.
#[async_trait]
pub trait WalletLedger: Send + Sync {
    /// Fetch the user's wallet, creating an empty one if none exists.
    async fn get_or_create_wallet(&self, owner_id: Uuid) -> Result<Wallet>;

    /// Credit an amount, recording a transaction.
    async fn credit(&self, wallet_id: Uuid, amount: i64) -> Result<Wallet>;

    /// Debit an amount, recording a transaction. Fails with a conflict when
    /// the balance would go negative.
    async fn debit(&self, wallet_id: Uuid, amount: i64) -> Result<Wallet>;
}
