//! SQLite implementation of the slot store port
//!
//! The `claim`/`release` pair relies on SQLite's single-writer semantics:
//! each is one conditional UPDATE, so concurrent bookers racing for the
//! same slot see exactly one winner.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use lexbook_core::SlotRepository;
use lexbook_domain::{AppointmentStatus, LexbookError, Result, Slot, SlotPatch};
use rusqlite::{params, Row};
use tokio::task;
use uuid::Uuid;

use super::manager::DbManager;
use super::{parse_date, parse_instant, parse_uuid};
use crate::errors::map_join_error;
use crate::errors::map_sql_error;

const SLOT_COLUMNS: &str = "id, advocate_id, date, starts_at, is_available, status, created_at";

pub struct SqliteSlotRepository {
    db: Arc<DbManager>,
}

impl SqliteSlotRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

type SlotRow = (String, String, String, i64, bool, String, i64);

fn read_row(row: &Row<'_>) -> rusqlite::Result<SlotRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
    ))
}

fn slot_from_row(raw: SlotRow) -> Result<Slot> {
    let (id, advocate_id, date, starts_at, is_available, status, created_at) = raw;
    Ok(Slot {
        id: parse_uuid(&id)?,
        advocate_id: parse_uuid(&advocate_id)?,
        date: parse_date(&date)?,
        starts_at: parse_instant(starts_at)?,
        is_available,
        status: status.parse::<AppointmentStatus>()?,
        created_at: parse_instant(created_at)?,
    })
}

fn collect_slots(rows: Vec<rusqlite::Result<SlotRow>>) -> Result<Vec<Slot>> {
    rows.into_iter()
        .map(|raw| raw.map_err(map_sql_error).and_then(slot_from_row))
        .collect()
}

#[async_trait]
impl SlotRepository for SqliteSlotRepository {
    async fn create(&self, slot: &Slot) -> Result<()> {
        let db = Arc::clone(&self.db);
        let slot = slot.clone();
        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            conn.execute(
                "INSERT INTO slots (id, advocate_id, date, starts_at, is_available, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    slot.id.to_string(),
                    slot.advocate_id.to_string(),
                    slot.date.to_string(),
                    slot.starts_at.timestamp(),
                    slot.is_available,
                    slot.status.as_str(),
                    slot.created_at.timestamp(),
                ],
            )
            .map_err(|err| match map_sql_error(err) {
                LexbookError::Conflict(_) => LexbookError::duplicate_slot(format!(
                    "slot for advocate {} at {} already exists",
                    slot.advocate_id, slot.starts_at
                )),
                other => other,
            })?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn create_many(&self, slots: &[Slot]) -> Result<usize> {
        let db = Arc::clone(&self.db);
        let slots = slots.to_vec();
        task::spawn_blocking(move || -> Result<usize> {
            let mut conn = db.get_connection()?;
            let tx = conn.transaction().map_err(map_sql_error)?;
            let mut inserted = 0;
            for slot in &slots {
                inserted += tx
                    .execute(
                        "INSERT OR IGNORE INTO slots
                             (id, advocate_id, date, starts_at, is_available, status, created_at)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                        params![
                            slot.id.to_string(),
                            slot.advocate_id.to_string(),
                            slot.date.to_string(),
                            slot.starts_at.timestamp(),
                            slot.is_available,
                            slot.status.as_str(),
                            slot.created_at.timestamp(),
                        ],
                    )
                    .map_err(map_sql_error)?;
            }
            tx.commit().map_err(map_sql_error)?;
            Ok(inserted)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn get(&self, id: Uuid) -> Result<Slot> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> Result<Slot> {
            let conn = db.get_connection()?;
            let raw = conn
                .query_row(
                    &format!("SELECT {SLOT_COLUMNS} FROM slots WHERE id = ?1"),
                    params![id.to_string()],
                    read_row,
                )
                .map_err(|err| match err {
                    rusqlite::Error::QueryReturnedNoRows => LexbookError::slot_not_found(id),
                    other => map_sql_error(other),
                })?;
            slot_from_row(raw)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn find_by_advocate(
        &self,
        advocate_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Slot>> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> Result<Vec<Slot>> {
            let conn = db.get_connection()?;
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {SLOT_COLUMNS} FROM slots
                     WHERE advocate_id = ?1 AND date BETWEEN ?2 AND ?3
                     ORDER BY created_at DESC, id"
                ))
                .map_err(map_sql_error)?;
            let rows = stmt
                .query_map(
                    params![advocate_id.to_string(), start.to_string(), end.to_string()],
                    read_row,
                )
                .map_err(map_sql_error)?
                .collect::<Vec<_>>();
            collect_slots(rows)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn get_available(&self, advocate_id: Uuid) -> Result<Vec<Slot>> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> Result<Vec<Slot>> {
            let conn = db.get_connection()?;
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {SLOT_COLUMNS} FROM slots
                     WHERE advocate_id = ?1 AND is_available = 1
                     ORDER BY created_at DESC, id"
                ))
                .map_err(map_sql_error)?;
            let rows = stmt
                .query_map(params![advocate_id.to_string()], read_row)
                .map_err(map_sql_error)?
                .collect::<Vec<_>>();
            collect_slots(rows)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn update(&self, id: Uuid, patch: SlotPatch) -> Result<Slot> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> Result<Slot> {
            let conn = db.get_connection()?;
            let changed = conn
                .execute(
                    "UPDATE slots SET
                         is_available = COALESCE(?2, is_available),
                         status = COALESCE(?3, status)
                     WHERE id = ?1",
                    params![
                        id.to_string(),
                        patch.is_available,
                        patch.status.map(|s| s.as_str()),
                    ],
                )
                .map_err(map_sql_error)?;
            if changed == 0 {
                return Err(LexbookError::slot_not_found(id));
            }
            let raw = conn
                .query_row(
                    &format!("SELECT {SLOT_COLUMNS} FROM slots WHERE id = ?1"),
                    params![id.to_string()],
                    read_row,
                )
                .map_err(map_sql_error)?;
            slot_from_row(raw)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn claim(&self, id: Uuid) -> Result<bool> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> Result<bool> {
            let conn = db.get_connection()?;
            let changed = conn
                .execute(
                    "UPDATE slots SET is_available = 0
                     WHERE id = ?1 AND is_available = 1
                       AND status NOT IN ('cancelled', 'expired')",
                    params![id.to_string()],
                )
                .map_err(map_sql_error)?;
            Ok(changed == 1)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn release(&self, id: Uuid) -> Result<bool> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> Result<bool> {
            let conn = db.get_connection()?;
            let changed = conn
                .execute(
                    "UPDATE slots SET is_available = 1
                     WHERE id = ?1 AND is_available = 0",
                    params![id.to_string()],
                )
                .map_err(map_sql_error)?;
            Ok(changed == 1)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn list_unexpired_before(&self, before: DateTime<Utc>) -> Result<Vec<Slot>> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> Result<Vec<Slot>> {
            let conn = db.get_connection()?;
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {SLOT_COLUMNS} FROM slots
                     WHERE starts_at < ?1 AND status NOT IN ('cancelled', 'expired')"
                ))
                .map_err(map_sql_error)?;
            let rows = stmt
                .query_map(params![before.timestamp()], read_row)
                .map_err(map_sql_error)?
                .collect::<Vec<_>>();
            collect_slots(rows)
        })
        .await
        .map_err(map_join_error)?
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use tempfile::TempDir;

    use super::*;

    fn repository() -> (SqliteSlotRepository, TempDir) {
        let temp_dir = TempDir::new().expect("temp dir created");
        let db = Arc::new(
            DbManager::new(temp_dir.path().join("test.db"), 4).expect("manager created"),
        );
        db.run_migrations().expect("migrations run");
        (SqliteSlotRepository::new(db), temp_dir)
    }

    fn slot_at(advocate: Uuid, offset_days: i64) -> Slot {
        let base = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        Slot::new(advocate, base + Duration::days(offset_days), base)
    }

    #[tokio::test]
    async fn create_and_get_round_trip() {
        let (repo, _guard) = repository();
        let slot = slot_at(Uuid::new_v4(), 1);
        repo.create(&slot).await.unwrap();

        let stored = repo.get(slot.id).await.unwrap();
        assert_eq!(stored.id, slot.id);
        assert_eq!(stored.starts_at, slot.starts_at);
        assert_eq!(stored.date, slot.date);
        assert!(stored.is_available);
    }

    #[tokio::test]
    async fn duplicate_identity_is_rejected() {
        let (repo, _guard) = repository();
        let advocate = Uuid::new_v4();
        let slot = slot_at(advocate, 1);
        repo.create(&slot).await.unwrap();

        let mut twin = slot_at(advocate, 1);
        twin.id = Uuid::new_v4();
        let err = repo.create(&twin).await.unwrap_err();
        assert!(matches!(err, LexbookError::Conflict(_)));
    }

    #[tokio::test]
    async fn create_many_skips_existing_rows() {
        let (repo, _guard) = repository();
        let advocate = Uuid::new_v4();
        let batch: Vec<Slot> = (0..3).map(|i| slot_at(advocate, i)).collect();

        assert_eq!(repo.create_many(&batch).await.unwrap(), 3);
        // re-expansion with fresh ids but identical instants inserts nothing
        let again: Vec<Slot> = (0..3).map(|i| slot_at(advocate, i)).collect();
        assert_eq!(repo.create_many(&again).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn claim_succeeds_exactly_once() {
        let (repo, _guard) = repository();
        let slot = slot_at(Uuid::new_v4(), 1);
        repo.create(&slot).await.unwrap();

        assert!(repo.claim(slot.id).await.unwrap());
        assert!(!repo.claim(slot.id).await.unwrap());

        assert!(repo.release(slot.id).await.unwrap());
        assert!(!repo.release(slot.id).await.unwrap());
        assert!(repo.claim(slot.id).await.unwrap());
    }

    #[tokio::test]
    async fn cancelled_slot_cannot_be_claimed() {
        let (repo, _guard) = repository();
        let slot = slot_at(Uuid::new_v4(), 1);
        repo.create(&slot).await.unwrap();
        repo.update(slot.id, SlotPatch::status(AppointmentStatus::Cancelled)).await.unwrap();

        assert!(!repo.claim(slot.id).await.unwrap());
    }

    #[tokio::test]
    async fn range_query_is_inclusive_and_newest_first() {
        let (repo, _guard) = repository();
        let advocate = Uuid::new_v4();
        for i in 0..4 {
            let mut slot = slot_at(advocate, i);
            slot.created_at = slot.created_at + Duration::minutes(i);
            repo.create(&slot).await.unwrap();
        }

        let start = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
        let found = repo.find_by_advocate(advocate, start, end).await.unwrap();
        assert_eq!(found.len(), 3);
        assert!(found.windows(2).all(|w| w[0].created_at >= w[1].created_at));
    }

    #[tokio::test]
    async fn update_missing_slot_is_not_found() {
        let (repo, _guard) = repository();
        let err = repo
            .update(Uuid::new_v4(), SlotPatch::status(AppointmentStatus::Expired))
            .await
            .unwrap_err();
        assert!(matches!(err, LexbookError::NotFound(_)));
    }

    #[tokio::test]
    async fn sweeper_feed_skips_terminal_slots() {
        let (repo, _guard) = repository();
        let advocate = Uuid::new_v4();
        let past = slot_at(advocate, 0);
        let cancelled = slot_at(advocate, 1);
        repo.create(&past).await.unwrap();
        repo.create(&cancelled).await.unwrap();
        repo.update(cancelled.id, SlotPatch::status(AppointmentStatus::Cancelled))
            .await
            .unwrap();

        let cutoff = Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap();
        let stale = repo.list_unexpired_before(cutoff).await.unwrap();
        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].id, past.id);
    }
}
