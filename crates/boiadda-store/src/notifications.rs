//! CRUD operations for [`Notification`] records.
//!
//! Notifications are append-only; the only mutation is the recipient flipping
//! the read flag.

use chrono::Utc;
use rusqlite::params;

use crate::database::{ts_column, Database};
use crate::error::{Result, StoreError};
use crate::models::{Notification, NotificationKind};

impl Database {
    /// Append an unread notification for a user.  Every call creates a new
    /// record; there is no dedup.
    pub fn insert_notification(
        &self,
        user_id: i64,
        kind: NotificationKind,
        message: &str,
    ) -> Result<Notification> {
        let created_at = Utc::now();
        self.conn().execute(
            "INSERT INTO notifications (user_id, kind, message, is_read, created_at)
             VALUES (?1, ?2, ?3, 0, ?4)",
            params![user_id, kind, message, created_at.to_rfc3339()],
        )?;
        let id = self.conn().last_insert_rowid();
        Ok(Notification {
            id,
            user_id,
            kind,
            message: message.to_string(),
            read: false,
            created_at,
        })
    }

    /// Fetch a single notification by id.
    pub fn get_notification(&self, id: i64) -> Result<Notification> {
        self.conn()
            .query_row(
                "SELECT id, user_id, kind, message, is_read, created_at
                 FROM notifications
                 WHERE id = ?1",
                params![id],
                row_to_notification,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// All notifications for a user, newest first.
    pub fn notifications_for_user(&self, user_id: i64) -> Result<Vec<Notification>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, user_id, kind, message, is_read, created_at
             FROM notifications
             WHERE user_id = ?1
             ORDER BY created_at DESC, id DESC",
        )?;

        let rows = stmt.query_map(params![user_id], row_to_notification)?;

        let mut notifications = Vec::new();
        for row in rows {
            notifications.push(row?);
        }
        Ok(notifications)
    }

    /// Set the read flag.  Returns `true` if the row existed.
    pub fn mark_notification_read(&self, id: i64) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE notifications SET is_read = 1 WHERE id = ?1",
            params![id],
        )?;
        Ok(affected > 0)
    }

    /// Number of unread notifications for a user.
    pub fn unread_notification_count(&self, user_id: i64) -> Result<u32> {
        let count = self.conn().query_row(
            "SELECT COUNT(*) FROM notifications WHERE user_id = ?1 AND is_read = 0",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Map a `rusqlite::Row` to a [`Notification`].
fn row_to_notification(row: &rusqlite::Row<'_>) -> rusqlite::Result<Notification> {
    let is_read: i64 = row.get(4)?;
    Ok(Notification {
        id: row.get(0)?,
        user_id: row.get(1)?,
        kind: row.get(2)?,
        message: row.get(3)?,
        read: is_read != 0,
        created_at: ts_column(row, 5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewUser, Role};

    fn user_id(db: &Database) -> i64 {
        db.create_user(&NewUser {
            name: "মাহিরা ইসলাম".to_string(),
            email: "mahera@example.com".to_string(),
            phone: None,
            password_hash: "x".to_string(),
            role: Role::User,
        })
        .unwrap()
        .id
    }

    #[test]
    fn emit_and_read_back() {
        let db = Database::open_in_memory().unwrap();
        let uid = user_id(&db);

        let n = db
            .insert_notification(uid, NotificationKind::BorrowApproved, "বইটি প্রস্তুত")
            .unwrap();
        assert!(!n.read);

        let listed = db.notifications_for_user(uid).unwrap();
        assert_eq!(listed, vec![n.clone()]);
        assert_eq!(db.unread_notification_count(uid).unwrap(), 1);

        assert!(db.mark_notification_read(n.id).unwrap());
        assert_eq!(db.unread_notification_count(uid).unwrap(), 0);
        assert!(db.get_notification(n.id).unwrap().read);
    }

    #[test]
    fn every_emit_is_a_new_record() {
        let db = Database::open_in_memory().unwrap();
        let uid = user_id(&db);

        db.insert_notification(uid, NotificationKind::DonationApproved, "ধন্যবাদ")
            .unwrap();
        db.insert_notification(uid, NotificationKind::DonationApproved, "ধন্যবাদ")
            .unwrap();

        assert_eq!(db.notifications_for_user(uid).unwrap().len(), 2);
    }
}
