//! Cron-based background scheduling

pub mod error;
pub mod expiration_scheduler;

pub use error::{SchedulerError, SchedulerResult};
pub use expiration_scheduler::{ExpirationScheduler, ExpirationSchedulerConfig, SweepJob};
