//! Availability service: rule creation, expansion and slot queries

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use lexbook_domain::{
    AvailabilityRule, LexbookError, NewAvailabilityRule, Result, Slot,
};
use tracing::info;
use uuid::Uuid;

use super::expander::expand;
use super::ports::RuleRepository;
use crate::booking::ports::SlotRepository;
use crate::clock::Clock;

/// Availability service: persists recurring rules, expands them into slots
/// and answers slot queries.
pub struct AvailabilityService {
    rules: Arc<dyn RuleRepository>,
    slots: Arc<dyn SlotRepository>,
    clock: Arc<dyn Clock>,
}

impl AvailabilityService {
    pub fn new(
        rules: Arc<dyn RuleRepository>,
        slots: Arc<dyn SlotRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { rules, slots, clock }
    }

    /// Validate and persist a rule, then expand it and insert the resulting
    /// slots. Slots that already exist for the same advocate and instant are
    /// skipped, so re-running a rule's expansion is idempotent.
    pub async fn create_rule(
        &self,
        payload: NewAvailabilityRule,
    ) -> Result<(AvailabilityRule, usize)> {
        let now = self.clock.now();
        let rule = AvailabilityRule::new(payload, now)?;
        self.rules.create(&rule).await?;

        let slots = expand(&rule, now)?;
        let inserted = self.slots.create_many(&slots).await?;

        info!(
            rule_id = %rule.id,
            advocate_id = %rule.advocate_id,
            expanded = slots.len(),
            inserted,
            "availability rule created"
        );
        Ok((rule, inserted))
    }

    /// All rules of an advocate, newest first.
    pub async fn list_rules(&self, advocate_id: Uuid) -> Result<Vec<AvailabilityRule>> {
        self.rules.list_by_advocate(advocate_id).await
    }

    /// Create a single ad-hoc slot outside any rule.
    pub async fn create_slot(
        &self,
        advocate_id: Uuid,
        starts_at: DateTime<Utc>,
    ) -> Result<Slot> {
        let now = self.clock.now();
        if starts_at <= now {
            return Err(LexbookError::invalid_time(format!(
                "slot time {starts_at} is in the past"
            )));
        }
        let slot = Slot::new(advocate_id, starts_at, now);
        self.slots.create(&slot).await?;
        Ok(slot)
    }

    /// Inclusive date-range query over an advocate's slots.
    pub async fn find_slots(
        &self,
        advocate_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Slot>> {
        self.slots.find_by_advocate(advocate_id, start, end).await
    }

    /// Currently bookable slots of an advocate.
    pub async fn available_slots(&self, advocate_id: Uuid) -> Result<Vec<Slot>> {
        self.slots.get_available(advocate_id).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::{Duration, TimeZone};
    use lexbook_domain::Frequency;

    use super::*;
    use crate::testing::{InMemoryRuleRepository, InMemorySlotRepository, MockClock};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
    }

    fn service() -> (AvailabilityService, Arc<InMemorySlotRepository>) {
        let slots = Arc::new(InMemorySlotRepository::new());
        let service = AvailabilityService::new(
            Arc::new(InMemoryRuleRepository::new()),
            slots.clone(),
            Arc::new(MockClock::at(now())),
        );
        (service, slots)
    }

    fn mondays_at_nine(advocate_id: Uuid) -> NewAvailabilityRule {
        NewAvailabilityRule {
            advocate_id,
            description: "mondays".into(),
            start_date: NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 1, 20).unwrap(),
            frequency: Frequency::Weekly,
            days_of_week: BTreeSet::from([1]),
            time_slot: "09:00".into(),
            exceptions: BTreeSet::new(),
        }
    }

    #[tokio::test]
    async fn creating_a_rule_persists_its_slots() {
        let (service, slots) = service();
        let advocate = Uuid::new_v4();

        let (rule, inserted) = service.create_rule(mondays_at_nine(advocate)).await.unwrap();

        assert_eq!(inserted, 3);
        assert_eq!(rule.advocate_id, advocate);
        let stored = slots
            .find_by_advocate(advocate, rule.start_date, rule.end_date)
            .await
            .unwrap();
        assert_eq!(stored.len(), 3);
    }

    #[tokio::test]
    async fn re_expanding_a_rule_inserts_nothing_new() {
        let (service, slots) = service();
        let advocate = Uuid::new_v4();

        service.create_rule(mondays_at_nine(advocate)).await.unwrap();
        let (rule, inserted) = service.create_rule(mondays_at_nine(advocate)).await.unwrap();

        assert_eq!(inserted, 0);
        let stored = slots
            .find_by_advocate(advocate, rule.start_date, rule.end_date)
            .await
            .unwrap();
        assert_eq!(stored.len(), 3);
    }

    #[tokio::test]
    async fn invalid_rules_never_reach_the_store() {
        let (service, slots) = service();
        let advocate = Uuid::new_v4();
        let mut payload = mondays_at_nine(advocate);
        payload.time_slot = "25:00".into();

        assert!(service.create_rule(payload).await.is_err());
        assert!(service.list_rules(advocate).await.unwrap().is_empty());
        assert!(slots.get_available(advocate).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn ad_hoc_slot_in_the_past_is_rejected() {
        let (service, _) = service();
        let err =
            service.create_slot(Uuid::new_v4(), now() - Duration::hours(1)).await.unwrap_err();
        assert!(matches!(err, LexbookError::Validation(_)));
    }

    #[tokio::test]
    async fn duplicate_ad_hoc_slot_is_rejected() {
        let (service, _) = service();
        let advocate = Uuid::new_v4();
        let at = now() + Duration::days(1);

        service.create_slot(advocate, at).await.unwrap();
        let err = service.create_slot(advocate, at).await.unwrap_err();
        assert!(matches!(err, LexbookError::Conflict(_)));
    }
}
