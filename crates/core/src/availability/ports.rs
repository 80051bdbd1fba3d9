//! Port interfaces for availability rules

use async_trait::async_trait;
use lexbook_domain::{AvailabilityRule, Result};
use uuid::Uuid;

/// Trait for persisting availability rules.
///
/// Rules are immutable once created; there is no update operation.
#[async_trait]
pub trait RuleRepository: Send + Sync {
    /// Persist a new rule.
    async fn create(&self, rule: &AvailabilityRule) -> Result<()>;

    /// List all rules owned by an advocate, newest first.
    async fn list_by_advocate(&self, advocate_id: Uuid) -> Result<Vec<AvailabilityRule>>;
}
