//! Real wall-clock implementation of the core clock port

use chrono::{DateTime, Utc};
use lexbook_core::Clock;

/// System clock used in production.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
