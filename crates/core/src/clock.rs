//! Time abstraction for testability
//!
//! Every "now" and "today" reference in the services goes through this
//! trait so tests can pin the clock to a fixed instant.

use chrono::{DateTime, NaiveDate, Utc};

/// Wall-clock source injected into the services.
pub trait Clock: Send + Sync {
    /// Current wall-clock time.
    fn now(&self) -> DateTime<Utc>;

    /// Current UTC calendar day.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}
