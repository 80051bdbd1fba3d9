//! In-memory port implementations for deterministic tests
//!
//! These back the service-level tests in this crate and the integration
//! tests further up the workspace. They hold state behind a `Mutex` and
//! never await while the lock is held, so the conditional `claim`/`release`
//! semantics match what the SQL adapters guarantee.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use lexbook_domain::{
    AppointmentStatus, AvailabilityRule, Booking, LexbookError, NewNotification, Result, Slot,
    SlotPatch, TransactionDirection, Wallet, WalletTransaction,
};
use uuid::Uuid;

use crate::availability::ports::RuleRepository;
use crate::booking::ports::{
    BookingRepository, NotificationSender, SlotRepository, WalletLedger,
};
use crate::clock::Clock;

/// Clock pinned to a settable instant.
pub struct MockClock {
    now: Mutex<DateTime<Utc>>,
}

impl MockClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(now) }
    }

    pub fn advance(&self, by: Duration) {
        let mut guard = self.now.lock().unwrap();
        *guard += by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().unwrap() = to;
    }
}

impl Clock for MockClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// In-memory slot store with the same conflict semantics as the SQL adapter.
#[derive(Default)]
pub struct InMemorySlotRepository {
    slots: Mutex<HashMap<Uuid, Slot>>,
}

impl InMemorySlotRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert directly, bypassing duplicate checks. Test setup helper.
    pub fn seed(&self, slot: Slot) {
        self.slots.lock().unwrap().insert(slot.id, slot);
    }

    pub fn snapshot(&self, id: Uuid) -> Option<Slot> {
        self.slots.lock().unwrap().get(&id).cloned()
    }
}

#[async_trait]
impl SlotRepository for InMemorySlotRepository {
    async fn create(&self, slot: &Slot) -> Result<()> {
        let mut slots = self.slots.lock().unwrap();
        let duplicate = slots
            .values()
            .any(|s| s.advocate_id == slot.advocate_id && s.starts_at == slot.starts_at);
        if duplicate {
            return Err(LexbookError::duplicate_slot(format!(
                "slot for advocate {} at {} already exists",
                slot.advocate_id, slot.starts_at
            )));
        }
        slots.insert(slot.id, slot.clone());
        Ok(())
    }

    async fn create_many(&self, batch: &[Slot]) -> Result<usize> {
        let mut slots = self.slots.lock().unwrap();
        let mut inserted = 0;
        for slot in batch {
            let exists = slots
                .values()
                .any(|s| s.advocate_id == slot.advocate_id && s.starts_at == slot.starts_at);
            if !exists {
                slots.insert(slot.id, slot.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn get(&self, id: Uuid) -> Result<Slot> {
        self.slots
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| LexbookError::slot_not_found(id))
    }

    async fn find_by_advocate(
        &self,
        advocate_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Slot>> {
        let slots = self.slots.lock().unwrap();
        let mut found: Vec<Slot> = slots
            .values()
            .filter(|s| s.advocate_id == advocate_id && s.date >= start && s.date <= end)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(found)
    }

    async fn get_available(&self, advocate_id: Uuid) -> Result<Vec<Slot>> {
        let slots = self.slots.lock().unwrap();
        let mut found: Vec<Slot> = slots
            .values()
            .filter(|s| s.advocate_id == advocate_id && s.is_available)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(found)
    }

    async fn update(&self, id: Uuid, patch: SlotPatch) -> Result<Slot> {
        let mut slots = self.slots.lock().unwrap();
        let slot = slots.get_mut(&id).ok_or_else(|| LexbookError::slot_not_found(id))?;
        if let Some(is_available) = patch.is_available {
            slot.is_available = is_available;
        }
        if let Some(status) = patch.status {
            slot.status = status;
        }
        Ok(slot.clone())
    }

    async fn claim(&self, id: Uuid) -> Result<bool> {
        let mut slots = self.slots.lock().unwrap();
        match slots.get_mut(&id) {
            Some(slot) if slot.is_bookable() => {
                slot.is_available = false;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn release(&self, id: Uuid) -> Result<bool> {
        let mut slots = self.slots.lock().unwrap();
        match slots.get_mut(&id) {
            Some(slot) if !slot.is_available => {
                slot.is_available = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_unexpired_before(&self, before: DateTime<Utc>) -> Result<Vec<Slot>> {
        let slots = self.slots.lock().unwrap();
        Ok(slots
            .values()
            .filter(|s| s.starts_at < before && !s.status.is_terminal())
            .cloned()
            .collect())
    }
}

/// In-memory booking store.
#[derive(Default)]
pub struct InMemoryBookingRepository {
    bookings: Mutex<HashMap<Uuid, Booking>>,
}

impl InMemoryBookingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, booking: Booking) {
        self.bookings.lock().unwrap().insert(booking.id, booking);
    }

    pub fn snapshot(&self, id: Uuid) -> Option<Booking> {
        self.bookings.lock().unwrap().get(&id).cloned()
    }
}

#[async_trait]
impl BookingRepository for InMemoryBookingRepository {
    async fn create(&self, booking: &Booking) -> Result<()> {
        self.bookings.lock().unwrap().insert(booking.id, booking.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Booking> {
        self.bookings
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| LexbookError::booking_not_found(id))
    }

    async fn update(&self, booking: &Booking) -> Result<()> {
        let mut bookings = self.bookings.lock().unwrap();
        if !bookings.contains_key(&booking.id) {
            return Err(LexbookError::booking_not_found(booking.id));
        }
        bookings.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<Booking>> {
        let bookings = self.bookings.lock().unwrap();
        let mut found: Vec<Booking> =
            bookings.values().filter(|b| b.user_id == user_id).cloned().collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(found)
    }

    async fn find_by_advocate(&self, advocate_id: Uuid) -> Result<Vec<Booking>> {
        let bookings = self.bookings.lock().unwrap();
        let mut found: Vec<Booking> =
            bookings.values().filter(|b| b.advocate_id == advocate_id).cloned().collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(found)
    }

    async fn list_unexpired_before(&self, before: DateTime<Utc>) -> Result<Vec<Booking>> {
        let bookings = self.bookings.lock().unwrap();
        Ok(bookings
            .values()
            .filter(|b| b.starts_at < before && !b.status.is_terminal())
            .cloned()
            .collect())
    }
}

/// In-memory rule store.
#[derive(Default)]
pub struct InMemoryRuleRepository {
    rules: Mutex<Vec<AvailabilityRule>>,
}

impl InMemoryRuleRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RuleRepository for InMemoryRuleRepository {
    async fn create(&self, rule: &AvailabilityRule) -> Result<()> {
        self.rules.lock().unwrap().push(rule.clone());
        Ok(())
    }

    async fn list_by_advocate(&self, advocate_id: Uuid) -> Result<Vec<AvailabilityRule>> {
        let rules = self.rules.lock().unwrap();
        let mut found: Vec<AvailabilityRule> =
            rules.iter().filter(|r| r.advocate_id == advocate_id).cloned().collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }
}

/// In-memory wallet ledger with the same balance invariant as the SQL
/// adapter.
#[derive(Default)]
pub struct InMemoryWalletLedger {
    wallets: Mutex<HashMap<Uuid, Wallet>>,
    transactions: Mutex<Vec<WalletTransaction>>,
    fail_credits: AtomicBool,
}

impl InMemoryWalletLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent credits fail, to exercise abort paths.
    pub fn fail_credits(&self, fail: bool) {
        self.fail_credits.store(fail, Ordering::SeqCst);
    }

    pub fn balance_of(&self, owner_id: Uuid) -> Option<i64> {
        self.wallets.lock().unwrap().values().find(|w| w.owner_id == owner_id).map(|w| w.balance)
    }

    pub fn transactions_for(&self, wallet_id: Uuid) -> Vec<WalletTransaction> {
        self.transactions
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.wallet_id == wallet_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl WalletLedger for InMemoryWalletLedger {
    async fn get_or_create_wallet(&self, owner_id: Uuid) -> Result<Wallet> {
        let mut wallets = self.wallets.lock().unwrap();
        if let Some(wallet) = wallets.values().find(|w| w.owner_id == owner_id) {
            return Ok(wallet.clone());
        }
        let wallet =
            Wallet { id: Uuid::new_v4(), owner_id, balance: 0, created_at: Utc::now() };
        wallets.insert(wallet.id, wallet.clone());
        Ok(wallet)
    }

    async fn credit(&self, wallet_id: Uuid, amount: i64) -> Result<Wallet> {
        if self.fail_credits.load(Ordering::SeqCst) {
            return Err(LexbookError::Dependency("wallet ledger unavailable".into()));
        }
        let mut wallets = self.wallets.lock().unwrap();
        let wallet = wallets
            .get_mut(&wallet_id)
            .ok_or_else(|| LexbookError::NotFound(format!("wallet {wallet_id} not found")))?;
        wallet.balance += amount;
        self.transactions.lock().unwrap().push(WalletTransaction {
            id: Uuid::new_v4(),
            wallet_id,
            amount,
            direction: TransactionDirection::Credit,
            created_at: Utc::now(),
        });
        Ok(wallet.clone())
    }

    async fn debit(&self, wallet_id: Uuid, amount: i64) -> Result<Wallet> {
        let mut wallets = self.wallets.lock().unwrap();
        let wallet = wallets
            .get_mut(&wallet_id)
            .ok_or_else(|| LexbookError::NotFound(format!("wallet {wallet_id} not found")))?;
        if wallet.balance < amount {
            return Err(LexbookError::insufficient_balance());
        }
        wallet.balance -= amount;
        self.transactions.lock().unwrap().push(WalletTransaction {
            id: Uuid::new_v4(),
            wallet_id,
            amount,
            direction: TransactionDirection::Debit,
            created_at: Utc::now(),
        });
        Ok(wallet.clone())
    }
}

/// Notification sender that records what it was asked to deliver.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<NewNotification>>,
    fail_sends: AtomicBool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent sends fail, to verify they stay best-effort.
    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<NewNotification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSender for RecordingNotifier {
    async fn send(&self, notification: NewNotification) -> Result<()> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(LexbookError::Dependency("notification transport down".into()));
        }
        self.sent.lock().unwrap().push(notification);
        Ok(())
    }
}

/// Convenience: a confirmed, available slot for an advocate.
pub fn make_slot(advocate_id: Uuid, starts_at: DateTime<Utc>) -> Slot {
    Slot::new(advocate_id, starts_at, starts_at - Duration::days(7))
}

/// Convenience: a booking in a given state referencing a slot.
pub fn make_booking(slot: &Slot, user_id: Uuid, status: AppointmentStatus) -> Booking {
    Booking {
        id: Uuid::new_v4(),
        advocate_id: slot.advocate_id,
        user_id,
        slot_id: slot.id,
        date: slot.date,
        starts_at: slot.starts_at,
        status,
        case_id: None,
        room_id: Some(format!("room-{}", Uuid::new_v4())),
        notes: None,
        postpone_reason: None,
        created_at: slot.created_at,
        updated_at: slot.created_at,
    }
}
