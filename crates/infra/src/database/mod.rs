//! SQLite persistence layer

pub mod booking_repository;
pub mod manager;
pub mod notification_repository;
pub mod rule_repository;
pub mod slot_repository;
pub mod wallet_repository;

pub use booking_repository::SqliteBookingRepository;
pub use manager::{DbConnection, DbManager};
pub use notification_repository::SqliteNotificationSender;
pub use rule_repository::SqliteRuleRepository;
pub use slot_repository::SqliteSlotRepository;
pub use wallet_repository::SqliteWalletLedger;

use chrono::{DateTime, NaiveDate, Utc};
use lexbook_domain::{LexbookError, Result};
use uuid::Uuid;

pub(crate) fn parse_uuid(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw)
        .map_err(|err| LexbookError::Database(format!("invalid uuid {raw:?}: {err}")))
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate> {
    raw.parse::<NaiveDate>()
        .map_err(|err| LexbookError::Database(format!("invalid date {raw:?}: {err}")))
}

pub(crate) fn parse_instant(secs: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| LexbookError::Database(format!("invalid timestamp {secs}")))
}
