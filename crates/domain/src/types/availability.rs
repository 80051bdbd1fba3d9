//! Recurring availability rules

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{LexbookError, Result};

/// Recurrence frequency of an availability rule.
///
/// Monthly rules expand with the same day-of-week semantics as weekly ones;
/// there is no day-of-month recurrence in this design.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Weekly,
    Monthly,
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Weekly => f.write_str("weekly"),
            Self::Monthly => f.write_str("monthly"),
        }
    }
}

impl FromStr for Frequency {
    type Err = LexbookError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            other => Err(LexbookError::Validation(format!("unknown frequency: {other}"))),
        }
    }
}

/// Payload for creating an availability rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAvailabilityRule {
    pub advocate_id: Uuid,
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub frequency: Frequency,
    /// Days of the week, Sunday = 0 .. Saturday = 6.
    pub days_of_week: BTreeSet<u8>,
    /// Time of day in `HH:mm`.
    pub time_slot: String,
    /// Calendar dates excluded from the recurrence.
    #[serde(default)]
    pub exceptions: BTreeSet<NaiveDate>,
}

/// An advocate-defined recurrence describing which days/times are open for
/// booking. Immutable once created; there is no update path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityRule {
    pub id: Uuid,
    pub advocate_id: Uuid,
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub frequency: Frequency,
    pub days_of_week: BTreeSet<u8>,
    pub time_slot: String,
    pub exceptions: BTreeSet<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl AvailabilityRule {
    /// Validate and build a rule from its creation payload.
    pub fn new(payload: NewAvailabilityRule, created_at: DateTime<Utc>) -> Result<Self> {
        if payload.start_date > payload.end_date {
            return Err(LexbookError::Validation(format!(
                "start date {} is after end date {}",
                payload.start_date, payload.end_date
            )));
        }
        if payload.days_of_week.is_empty() {
            return Err(LexbookError::Validation("days of week must not be empty".into()));
        }
        if let Some(day) = payload.days_of_week.iter().find(|d| **d > 6) {
            return Err(LexbookError::Validation(format!(
                "day of week {day} is out of range (0 = Sunday .. 6 = Saturday)"
            )));
        }
        parse_time_slot(&payload.time_slot)?;

        Ok(Self {
            id: Uuid::new_v4(),
            advocate_id: payload.advocate_id,
            description: payload.description,
            start_date: payload.start_date,
            end_date: payload.end_date,
            frequency: payload.frequency,
            days_of_week: payload.days_of_week,
            time_slot: payload.time_slot,
            exceptions: payload.exceptions,
            created_at,
        })
    }

    /// The parsed `HH:mm` time of day.
    ///
    /// Construction validates the string, so this cannot fail on a rule that
    /// went through [`AvailabilityRule::new`].
    pub fn time_of_day(&self) -> Result<NaiveTime> {
        parse_time_slot(&self.time_slot)
    }
}

/// Parse a strict `HH:mm` time-of-day string.
pub fn parse_time_slot(value: &str) -> Result<NaiveTime> {
    if value.len() != 5 || value.as_bytes()[2] != b':' {
        return Err(LexbookError::Validation(format!("time slot {value:?} is not HH:mm")));
    }
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|_| LexbookError::Validation(format!("time slot {value:?} is not HH:mm")))
}
