//! SQLite implementation of the booking store port

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lexbook_core::BookingRepository;
use lexbook_domain::{AppointmentStatus, Booking, LexbookError, Result};
use rusqlite::{params, Row};
use tokio::task;
use uuid::Uuid;

use super::manager::DbManager;
use super::{parse_date, parse_instant, parse_uuid};
use crate::errors::{map_join_error, map_sql_error};

const BOOKING_COLUMNS: &str = "id, advocate_id, user_id, slot_id, date, starts_at, status, \
                               case_id, room_id, notes, postpone_reason, created_at, updated_at";

pub struct SqliteBookingRepository {
    db: Arc<DbManager>,
}

impl SqliteBookingRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[allow(clippy::type_complexity)]
type BookingRow = (
    String,
    String,
    String,
    String,
    String,
    i64,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    i64,
    i64,
);

fn read_row(row: &Row<'_>) -> rusqlite::Result<BookingRow> {
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
        row.get(10)?,
        row.get(11)?,
        row.get(12)?,
    ))
}

fn booking_from_row(raw: BookingRow) -> Result<Booking> {
    let (
        id,
        advocate_id,
        user_id,
        slot_id,
        date,
        starts_at,
        status,
        case_id,
        room_id,
        notes,
        postpone_reason,
        created_at,
        updated_at,
    ) = raw;
    Ok(Booking {
        id: parse_uuid(&id)?,
        advocate_id: parse_uuid(&advocate_id)?,
        user_id: parse_uuid(&user_id)?,
        slot_id: parse_uuid(&slot_id)?,
        date: parse_date(&date)?,
        starts_at: parse_instant(starts_at)?,
        status: status.parse::<AppointmentStatus>()?,
        case_id: case_id.as_deref().map(parse_uuid).transpose()?,
        room_id,
        notes,
        postpone_reason,
        created_at: parse_instant(created_at)?,
        updated_at: parse_instant(updated_at)?,
    })
}

fn collect_bookings(rows: Vec<rusqlite::Result<BookingRow>>) -> Result<Vec<Booking>> {
    rows.into_iter()
        .map(|raw| raw.map_err(map_sql_error).and_then(booking_from_row))
        .collect()
}

#[async_trait]
impl BookingRepository for SqliteBookingRepository {
    async fn create(&self, booking: &Booking) -> Result<()> {
        let db = Arc::clone(&self.db);
        let booking = booking.clone();
        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            conn.execute(
                "INSERT INTO bookings
                     (id, advocate_id, user_id, slot_id, date, starts_at, status,
                      case_id, room_id, notes, postpone_reason, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                params![
                    booking.id.to_string(),
                    booking.advocate_id.to_string(),
                    booking.user_id.to_string(),
                    booking.slot_id.to_string(),
                    booking.date.to_string(),
                    booking.starts_at.timestamp(),
                    booking.status.as_str(),
                    booking.case_id.map(|id| id.to_string()),
                    booking.room_id,
                    booking.notes,
                    booking.postpone_reason,
                    booking.created_at.timestamp(),
                    booking.updated_at.timestamp(),
                ],
            )
            .map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn get(&self, id: Uuid) -> Result<Booking> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> Result<Booking> {
            let conn = db.get_connection()?;
            let raw = conn
                .query_row(
                    &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
                    params![id.to_string()],
                    read_row,
                )
                .map_err(|err| match err {
                    rusqlite::Error::QueryReturnedNoRows => {
                        LexbookError::booking_not_found(id)
                    }
                    other => map_sql_error(other),
                })?;
            booking_from_row(raw)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn update(&self, booking: &Booking) -> Result<()> {
        let db = Arc::clone(&self.db);
        let booking = booking.clone();
        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            let changed = conn
                .execute(
                    "UPDATE bookings SET
                         slot_id = ?2, date = ?3, starts_at = ?4, status = ?5,
                         notes = ?6, postpone_reason = ?7, updated_at = ?8
                     WHERE id = ?1",
                    params![
                        booking.id.to_string(),
                        booking.slot_id.to_string(),
                        booking.date.to_string(),
                        booking.starts_at.timestamp(),
                        booking.status.as_str(),
                        booking.notes,
                        booking.postpone_reason,
                        booking.updated_at.timestamp(),
                    ],
                )
                .map_err(map_sql_error)?;
            if changed == 0 {
                return Err(LexbookError::booking_not_found(booking.id));
            }
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<Booking>> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> Result<Vec<Booking>> {
            let conn = db.get_connection()?;
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {BOOKING_COLUMNS} FROM bookings
                     WHERE user_id = ?1 ORDER BY created_at DESC, id"
                ))
                .map_err(map_sql_error)?;
            let rows = stmt
                .query_map(params![user_id.to_string()], read_row)
                .map_err(map_sql_error)?
                .collect::<Vec<_>>();
            collect_bookings(rows)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn find_by_advocate(&self, advocate_id: Uuid) -> Result<Vec<Booking>> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> Result<Vec<Booking>> {
            let conn = db.get_connection()?;
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {BOOKING_COLUMNS} FROM bookings
                     WHERE advocate_id = ?1 ORDER BY created_at DESC, id"
                ))
                .map_err(map_sql_error)?;
            let rows = stmt
                .query_map(params![advocate_id.to_string()], read_row)
                .map_err(map_sql_error)?
                .collect::<Vec<_>>();
            collect_bookings(rows)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn list_unexpired_before(&self, before: DateTime<Utc>) -> Result<Vec<Booking>> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> Result<Vec<Booking>> {
            let conn = db.get_connection()?;
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {BOOKING_COLUMNS} FROM bookings
                     WHERE starts_at < ?1 AND status NOT IN ('cancelled', 'expired')"
                ))
                .map_err(map_sql_error)?;
            let rows = stmt
                .query_map(params![before.timestamp()], read_row)
                .map_err(map_sql_error)?
                .collect::<Vec<_>>();
            collect_bookings(rows)
        })
        .await
        .map_err(map_join_error)?
    }
}
