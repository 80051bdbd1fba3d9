//! Slot expander: maps an availability rule to concrete slots
//!
//! The expansion is a pure function of the rule and the supplied "now"
//! reference. Persistence (including skipping slots that already exist)
//! is the caller's responsibility.

use chrono::{DateTime, Datelike, Utc};
use lexbook_domain::{AvailabilityRule, Result, Slot};

/// Expand a rule into the slots it implies over its full date range.
///
/// Every UTC calendar day in `[start_date, end_date]` is kept iff its
/// day-of-week (Sunday = 0) is in the rule's set, the day is not before
/// `now`'s calendar day, and the day is not an exception. Each kept day is
/// combined with the rule's `HH:mm` time into a single UTC instant.
///
/// Monthly rules expand with the same day-of-week semantics as weekly
/// ones; there is no day-of-month recurrence.
pub fn expand(rule: &AvailabilityRule, now: DateTime<Utc>) -> Result<Vec<Slot>> {
    let time_of_day = rule.time_of_day()?;
    let today = now.date_naive();

    let slots = rule
        .start_date
        .iter_days()
        .take_while(|day| *day <= rule.end_date)
        .filter(|day| {
            let dow = day.weekday().num_days_from_sunday() as u8;
            rule.days_of_week.contains(&dow)
                && *day >= today
                && !rule.exceptions.contains(day)
        })
        .map(|day| {
            let starts_at = day.and_time(time_of_day).and_utc();
            Slot::new(rule.advocate_id, starts_at, now)
        })
        .collect();

    Ok(slots)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::{NaiveDate, TimeZone};
    use lexbook_domain::{AppointmentStatus, Frequency, NewAvailabilityRule};
    use uuid::Uuid;

    use super::*;

    fn rule(
        start: (i32, u32, u32),
        end: (i32, u32, u32),
        days: &[u8],
        time_slot: &str,
        frequency: Frequency,
        exceptions: &[(i32, u32, u32)],
    ) -> AvailabilityRule {
        let payload = NewAvailabilityRule {
            advocate_id: Uuid::new_v4(),
            description: "test rule".into(),
            start_date: NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
            end_date: NaiveDate::from_ymd_opt(end.0, end.1, end.2).unwrap(),
            frequency,
            days_of_week: days.iter().copied().collect(),
            time_slot: time_slot.into(),
            exceptions: exceptions
                .iter()
                .map(|(y, m, d)| NaiveDate::from_ymd_opt(*y, *m, *d).unwrap())
                .collect::<BTreeSet<_>>(),
        };
        AvailabilityRule::new(payload, Utc::now()).unwrap()
    }

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn mon_wed_over_two_weeks_yields_four_slots() {
        // 2025-01-06 is a Monday
        let r = rule((2025, 1, 6), (2025, 1, 19), &[1, 3], "10:30", Frequency::Weekly, &[]);
        let slots = expand(&r, at(2025, 1, 1)).unwrap();

        assert_eq!(slots.len(), 4);
        for slot in &slots {
            let dow = slot.date.weekday().num_days_from_sunday();
            assert!(dow == 1 || dow == 3, "unexpected day {dow}");
            assert!(slot.is_available);
            assert_eq!(slot.status, AppointmentStatus::Confirmed);
            assert_eq!(slot.starts_at.date_naive(), slot.date);
        }
    }

    #[test]
    fn past_days_are_skipped() {
        let r = rule((2025, 1, 6), (2025, 1, 19), &[1, 3], "10:30", Frequency::Weekly, &[]);
        // "today" falls mid-range; the first Monday and Wednesday are gone
        let slots = expand(&r, at(2025, 1, 10)).unwrap();
        assert_eq!(slots.len(), 2);
        assert!(slots.iter().all(|s| s.date >= NaiveDate::from_ymd_opt(2025, 1, 10).unwrap()));
    }

    #[test]
    fn exception_removes_exactly_that_occurrence() {
        let without = rule((2025, 1, 6), (2025, 1, 19), &[1, 3], "10:30", Frequency::Weekly, &[]);
        let with =
            rule((2025, 1, 6), (2025, 1, 19), &[1, 3], "10:30", Frequency::Weekly, &[(2025, 1, 8)]);

        let base = expand(&without, at(2025, 1, 1)).unwrap();
        let filtered = expand(&with, at(2025, 1, 1)).unwrap();

        assert_eq!(base.len(), filtered.len() + 1);
        let excluded = NaiveDate::from_ymd_opt(2025, 1, 8).unwrap();
        assert!(filtered.iter().all(|s| s.date != excluded));

        let remaining: Vec<_> = base.iter().map(|s| s.date).filter(|d| *d != excluded).collect();
        assert_eq!(filtered.iter().map(|s| s.date).collect::<Vec<_>>(), remaining);
    }

    #[test]
    fn monthly_frequency_expands_like_weekly() {
        let weekly = rule((2025, 1, 6), (2025, 1, 19), &[1], "09:00", Frequency::Weekly, &[]);
        let monthly = rule((2025, 1, 6), (2025, 1, 19), &[1], "09:00", Frequency::Monthly, &[]);

        let a = expand(&weekly, at(2025, 1, 1)).unwrap();
        let b = expand(&monthly, at(2025, 1, 1)).unwrap();
        assert_eq!(
            a.iter().map(|s| s.starts_at).collect::<Vec<_>>(),
            b.iter().map(|s| s.starts_at).collect::<Vec<_>>()
        );
    }

    #[test]
    fn no_duplicate_instants_are_produced() {
        let r = rule((2025, 1, 1), (2025, 3, 31), &[0, 1, 2, 3, 4, 5, 6], "12:00",
            Frequency::Weekly, &[]);
        let slots = expand(&r, at(2025, 1, 1)).unwrap();

        let mut instants: Vec<_> = slots.iter().map(|s| (s.advocate_id, s.starts_at)).collect();
        instants.sort();
        instants.dedup();
        assert_eq!(instants.len(), slots.len());
    }

    #[test]
    fn end_to_end_example_three_mondays_at_nine() {
        // Rule: Mondays 09:00 between 2025-01-06 and 2025-01-20, today 2025-01-01
        let r = rule((2025, 1, 6), (2025, 1, 20), &[1], "09:00", Frequency::Weekly, &[]);
        let slots = expand(&r, at(2025, 1, 1)).unwrap();

        let expected = [
            Utc.with_ymd_and_hms(2025, 1, 6, 9, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 1, 13, 9, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 1, 20, 9, 0, 0).unwrap(),
        ];
        assert_eq!(slots.iter().map(|s| s.starts_at).collect::<Vec<_>>(), expected);
        assert!(slots.iter().all(|s| s.is_available));
        assert!(slots.iter().all(|s| s.status == AppointmentStatus::Confirmed));
    }

    #[test]
    fn range_entirely_in_the_past_yields_nothing() {
        let r = rule((2024, 1, 1), (2024, 1, 31), &[0, 1, 2, 3, 4, 5, 6], "09:00",
            Frequency::Weekly, &[]);
        assert!(expand(&r, at(2025, 1, 1)).unwrap().is_empty());
    }
}
