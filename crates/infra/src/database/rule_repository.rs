//! SQLite implementation of the recurring-availability rule store

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use lexbook_core::RuleRepository;
use lexbook_domain::{AvailabilityRule, Frequency, LexbookError, Result};
use rusqlite::{params, Row};
use tokio::task;
use uuid::Uuid;

use super::manager::DbManager;
use super::{parse_date, parse_instant, parse_uuid};
use crate::errors::{map_join_error, map_sql_error};

const RULE_COLUMNS: &str = "id, advocate_id, description, start_date, end_date, frequency, \
                            days_of_week, time_slot, exceptions, created_at";

pub struct SqliteRuleRepository {
    db: Arc<DbManager>,
}

impl SqliteRuleRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

type RuleRow = (
    String,
    String,
    String,
    String,
    String,
    String,
    String,
    String,
    String,
    i64,
);

fn read_row(row: &Row<'_>) -> rusqlite::Result<RuleRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
        row.get(9)?,
    ))
}

fn decode_json<T: serde::de::DeserializeOwned>(column: &str, raw: &str) -> Result<T> {
    serde_json::from_str(raw)
        .map_err(|err| LexbookError::Database(format!("invalid {column} payload: {err}")))
}

fn encode_json<T: serde::Serialize>(column: &str, value: &T) -> Result<String> {
    serde_json::to_string(value)
        .map_err(|err| LexbookError::Database(format!("cannot encode {column}: {err}")))
}

fn rule_from_row(raw: RuleRow) -> Result<AvailabilityRule> {
    let (
        id,
        advocate_id,
        description,
        start_date,
        end_date,
        frequency,
        days_of_week,
        time_slot,
        exceptions,
        created_at,
    ) = raw;
    Ok(AvailabilityRule {
        id: parse_uuid(&id)?,
        advocate_id: parse_uuid(&advocate_id)?,
        description,
        start_date: parse_date(&start_date)?,
        end_date: parse_date(&end_date)?,
        frequency: frequency.parse::<Frequency>()?,
        days_of_week: decode_json::<BTreeSet<u8>>("days_of_week", &days_of_week)?,
        time_slot,
        exceptions: decode_json::<BTreeSet<NaiveDate>>("exceptions", &exceptions)?,
        created_at: parse_instant(created_at)?,
    })
}

#[async_trait]
impl RuleRepository for SqliteRuleRepository {
    async fn create(&self, rule: &AvailabilityRule) -> Result<()> {
        let db = Arc::clone(&self.db);
        let rule = rule.clone();
        task::spawn_blocking(move || -> Result<()> {
            let days = encode_json("days_of_week", &rule.days_of_week)?;
            let exceptions = encode_json("exceptions", &rule.exceptions)?;
            let conn = db.get_connection()?;
            conn.execute(
                "INSERT INTO availability_rules
                     (id, advocate_id, description, start_date, end_date, frequency,
                      days_of_week, time_slot, exceptions, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    rule.id.to_string(),
                    rule.advocate_id.to_string(),
                    rule.description,
                    rule.start_date.to_string(),
                    rule.end_date.to_string(),
                    rule.frequency.to_string(),
                    days,
                    rule.time_slot,
                    exceptions,
                    rule.created_at.timestamp(),
                ],
            )
            .map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn list_by_advocate(&self, advocate_id: Uuid) -> Result<Vec<AvailabilityRule>> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> Result<Vec<AvailabilityRule>> {
            let conn = db.get_connection()?;
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {RULE_COLUMNS} FROM availability_rules
                     WHERE advocate_id = ?1 ORDER BY created_at DESC, id"
                ))
                .map_err(map_sql_error)?;
            let rows = stmt
                .query_map(params![advocate_id.to_string()], read_row)
                .map_err(map_sql_error)?
                .collect::<Vec<_>>();
            rows.into_iter()
                .map(|raw| raw.map_err(map_sql_error).and_then(rule_from_row))
                .collect()
        })
        .await
        .map_err(map_join_error)?
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use lexbook_domain::NewAvailabilityRule;
    use tempfile::TempDir;

    use super::*;

    fn repository() -> (SqliteRuleRepository, TempDir) {
        let temp_dir = TempDir::new().expect("temp dir created");
        let db = Arc::new(
            DbManager::new(temp_dir.path().join("test.db"), 4).expect("manager created"),
        );
        db.run_migrations().expect("migrations run");
        (SqliteRuleRepository::new(db), temp_dir)
    }

    fn sample_rule(advocate_id: Uuid) -> AvailabilityRule {
        let payload = NewAvailabilityRule {
            advocate_id,
            description: "weekday mornings".into(),
            start_date: NaiveDate::from_ymd_opt(2025, 3, 3).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
            frequency: Frequency::Weekly,
            days_of_week: BTreeSet::from([1, 3]),
            time_slot: "09:00".into(),
            exceptions: BTreeSet::from([NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()]),
        };
        AvailabilityRule::new(payload, Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap())
            .expect("valid rule")
    }

    #[tokio::test]
    async fn create_and_list_round_trip() {
        let (repo, _guard) = repository();
        let advocate = Uuid::new_v4();
        let rule = sample_rule(advocate);
        repo.create(&rule).await.unwrap();

        let rules = repo.list_by_advocate(advocate).await.unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].days_of_week, BTreeSet::from([1, 3]));
        assert_eq!(rules[0].exceptions.len(), 1);
        assert_eq!(rules[0].time_slot, "09:00");
    }

    #[tokio::test]
    async fn listing_is_scoped_to_the_advocate() {
        let (repo, _guard) = repository();
        let advocate = Uuid::new_v4();
        repo.create(&sample_rule(advocate)).await.unwrap();
        repo.create(&sample_rule(Uuid::new_v4())).await.unwrap();

        let rules = repo.list_by_advocate(advocate).await.unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].advocate_id, advocate);
    }
}
