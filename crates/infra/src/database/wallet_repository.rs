//! SQLite implementation of the wallet refund ledger

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use lexbook_core::WalletLedger;
use lexbook_domain::{LexbookError, Result, TransactionDirection, Wallet};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tokio::task;
use uuid::Uuid;

use super::manager::DbManager;
use super::{parse_instant, parse_uuid};
use crate::errors::{map_join_error, map_sql_error};

pub struct SqliteWalletLedger {
    db: Arc<DbManager>,
}

impl SqliteWalletLedger {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

fn read_wallet(row: &Row<'_>) -> rusqlite::Result<(String, String, i64, i64)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn wallet_from_row(raw: (String, String, i64, i64)) -> Result<Wallet> {
    let (id, owner_id, balance, created_at) = raw;
    Ok(Wallet {
        id: parse_uuid(&id)?,
        owner_id: parse_uuid(&owner_id)?,
        balance,
        created_at: parse_instant(created_at)?,
    })
}

fn select_wallet(conn: &Connection, wallet_id: Uuid) -> Result<Wallet> {
    let raw = conn
        .query_row(
            "SELECT id, owner_id, balance, created_at FROM wallets WHERE id = ?1",
            params![wallet_id.to_string()],
            read_wallet,
        )
        .map_err(|err| match err {
            rusqlite::Error::QueryReturnedNoRows => {
                LexbookError::NotFound(format!("wallet {wallet_id} not found"))
            }
            other => map_sql_error(other),
        })?;
    wallet_from_row(raw)
}

fn record_transaction(
    conn: &Connection,
    wallet_id: Uuid,
    amount: i64,
    direction: TransactionDirection,
) -> Result<()> {
    conn.execute(
        "INSERT INTO wallet_transactions (id, wallet_id, amount, direction, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            Uuid::new_v4().to_string(),
            wallet_id.to_string(),
            amount,
            direction.to_string(),
            Utc::now().timestamp(),
        ],
    )
    .map_err(map_sql_error)?;
    Ok(())
}

#[async_trait]
impl WalletLedger for SqliteWalletLedger {
    async fn get_or_create_wallet(&self, owner_id: Uuid) -> Result<Wallet> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> Result<Wallet> {
            let conn = db.get_connection()?;
            let existing = conn
                .query_row(
                    "SELECT id, owner_id, balance, created_at FROM wallets WHERE owner_id = ?1",
                    params![owner_id.to_string()],
                    read_wallet,
                )
                .optional()
                .map_err(map_sql_error)?;
            if let Some(raw) = existing {
                return wallet_from_row(raw);
            }

            // INSERT OR IGNORE keeps a concurrent creator from erroring; the
            // re-select below returns whichever row won.
            conn.execute(
                "INSERT OR IGNORE INTO wallets (id, owner_id, balance, created_at)
                 VALUES (?1, ?2, 0, ?3)",
                params![
                    Uuid::new_v4().to_string(),
                    owner_id.to_string(),
                    Utc::now().timestamp(),
                ],
            )
            .map_err(map_sql_error)?;

            let raw = conn
                .query_row(
                    "SELECT id, owner_id, balance, created_at FROM wallets WHERE owner_id = ?1",
                    params![owner_id.to_string()],
                    read_wallet,
                )
                .map_err(map_sql_error)?;
            wallet_from_row(raw)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn credit(&self, wallet_id: Uuid, amount: i64) -> Result<Wallet> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> Result<Wallet> {
            let mut conn = db.get_connection()?;
            let tx = conn.transaction().map_err(map_sql_error)?;
            let changed = tx
                .execute(
                    "UPDATE wallets SET balance = balance + ?2 WHERE id = ?1",
                    params![wallet_id.to_string(), amount],
                )
                .map_err(map_sql_error)?;
            if changed == 0 {
                return Err(LexbookError::NotFound(format!("wallet {wallet_id} not found")));
            }
            record_transaction(&tx, wallet_id, amount, TransactionDirection::Credit)?;
            let wallet = select_wallet(&tx, wallet_id)?;
            tx.commit().map_err(map_sql_error)?;
            Ok(wallet)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn debit(&self, wallet_id: Uuid, amount: i64) -> Result<Wallet> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> Result<Wallet> {
            let mut conn = db.get_connection()?;
            let tx = conn.transaction().map_err(map_sql_error)?;
            // Conditional on the balance so a racing debit cannot overdraw.
            let changed = tx
                .execute(
                    "UPDATE wallets SET balance = balance - ?2
                     WHERE id = ?1 AND balance >= ?2",
                    params![wallet_id.to_string(), amount],
                )
                .map_err(map_sql_error)?;
            if changed == 0 {
                select_wallet(&tx, wallet_id)?;
                return Err(LexbookError::insufficient_balance());
            }
            record_transaction(&tx, wallet_id, amount, TransactionDirection::Debit)?;
            let wallet = select_wallet(&tx, wallet_id)?;
            tx.commit().map_err(map_sql_error)?;
            Ok(wallet)
        })
        .await
        .map_err(map_join_error)?
    }
}
