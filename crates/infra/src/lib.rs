//! # Lexbook Infra
//!
//! Infrastructure adapters behind the core ports:
//! - SQLite persistence (connection pool, repositories, CAS booking gate)
//! - Cron-driven expiration scheduler
//! - System clock
//! - Environment-driven configuration

pub mod clock;
pub mod config;
pub mod database;
pub mod errors;
pub mod scheduling;

pub use clock::SystemClock;
pub use config::Config;
pub use database::{
    DbManager, SqliteBookingRepository, SqliteNotificationSender, SqliteRuleRepository,
    SqliteSlotRepository, SqliteWalletLedger,
};
pub use errors::InfraError;
pub use scheduling::{
    ExpirationScheduler, ExpirationSchedulerConfig, SchedulerError, SchedulerResult, SweepJob,
};
