//! SQLite-backed notification outbox

use std::sync::Arc;

use async_trait::async_trait;
use lexbook_core::NotificationSender;
use lexbook_domain::{NewNotification, Result};
use rusqlite::params;
use tokio::task;
use uuid::Uuid;

use super::manager::DbManager;
use crate::errors::{map_join_error, map_sql_error};

/// Persists notifications into the local outbox table. Delivery to the
/// user-facing channel is handled out of band.
pub struct SqliteNotificationSender {
    db: Arc<DbManager>,
}

impl SqliteNotificationSender {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl NotificationSender for SqliteNotificationSender {
    async fn send(&self, notification: NewNotification) -> Result<()> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            conn.execute(
                "INSERT INTO notifications
                     (id, receiver_id, sender_id, message, kind, read, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    Uuid::new_v4().to_string(),
                    notification.receiver_id.to_string(),
                    notification.sender_id.to_string(),
                    notification.message,
                    notification.kind.as_str(),
                    notification.read,
                    notification.created_at.timestamp(),
                ],
            )
            .map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use lexbook_domain::NotificationKind;
    use tempfile::TempDir;

    use super::*;

    #[tokio::test]
    async fn send_persists_the_notification() {
        let temp_dir = TempDir::new().expect("temp dir created");
        let db = Arc::new(
            DbManager::new(temp_dir.path().join("test.db"), 4).expect("manager created"),
        );
        db.run_migrations().expect("migrations run");
        let sender = SqliteNotificationSender::new(Arc::clone(&db));

        let receiver = Uuid::new_v4();
        sender
            .send(NewNotification::new(
                receiver,
                Uuid::new_v4(),
                "your consultation is booked",
                NotificationKind::BookingCreated,
                Utc::now(),
            ))
            .await
            .unwrap();

        let conn = db.get_connection().unwrap();
        let (message, read): (String, bool) = conn
            .query_row(
                "SELECT message, read FROM notifications WHERE receiver_id = ?1",
                params![receiver.to_string()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(message, "your consultation is booked");
        assert!(!read);
    }
}
