//! CRUD operations for [`Session`] records (bearer-token auth).

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

use crate::database::{ts_column, Database};
use crate::error::{Result, StoreError};
use crate::models::Session;

impl Database {
    /// Insert a new session for a user.  `token_hash` is the SHA-256 digest
    /// of the bearer token, hex-encoded; the token itself is never stored.
    pub fn insert_session(
        &self,
        user_id: i64,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Session> {
        let created_at = Utc::now();
        self.conn().execute(
            "INSERT INTO sessions (user_id, token_hash, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                user_id,
                token_hash,
                created_at.to_rfc3339(),
                expires_at.to_rfc3339(),
            ],
        )?;
        let id = self.conn().last_insert_rowid();
        Ok(Session {
            id,
            user_id,
            token_hash: token_hash.to_string(),
            created_at,
            expires_at,
        })
    }

    /// Look up a session by token digest.
    pub fn get_session_by_hash(&self, token_hash: &str) -> Result<Option<Session>> {
        self.conn()
            .query_row(
                "SELECT id, user_id, token_hash, created_at, expires_at
                 FROM sessions
                 WHERE token_hash = ?1",
                params![token_hash],
                row_to_session,
            )
            .optional()
            .map_err(StoreError::Sqlite)
    }

    /// Delete a session by token digest (logout).  Returns `true` if a row
    /// was deleted.
    pub fn delete_session(&self, token_hash: &str) -> Result<bool> {
        let affected = self.conn().execute(
            "DELETE FROM sessions WHERE token_hash = ?1",
            params![token_hash],
        )?;
        Ok(affected > 0)
    }

    /// Drop every session that expired before `now`.  Returns the number of
    /// rows removed.
    pub fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<usize> {
        let affected = self.conn().execute(
            "DELETE FROM sessions WHERE expires_at < ?1",
            params![now.to_rfc3339()],
        )?;
        Ok(affected)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Map a `rusqlite::Row` to a [`Session`].
fn row_to_session(row: &rusqlite::Row<'_>) -> rusqlite::Result<Session> {
    Ok(Session {
        id: row.get(0)?,
        user_id: row.get(1)?,
        token_hash: row.get(2)?,
        created_at: ts_column(row, 3)?,
        expires_at: ts_column(row, 4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewUser, Role};

    #[test]
    fn session_round_trip_and_expiry() {
        let db = Database::open_in_memory().unwrap();
        let user = db
            .create_user(&NewUser {
                name: "Demo User".to_string(),
                email: "demo@boiadda.com".to_string(),
                phone: None,
                password_hash: "x".to_string(),
                role: Role::User,
            })
            .unwrap();

        let now = Utc::now();
        let live = db
            .insert_session(user.id, "aaaa", now + chrono::Duration::hours(24))
            .unwrap();
        db.insert_session(user.id, "bbbb", now - chrono::Duration::hours(1))
            .unwrap();

        assert_eq!(db.get_session_by_hash("aaaa").unwrap(), Some(live.clone()));
        assert!(db.get_session_by_hash("cccc").unwrap().is_none());

        assert_eq!(db.delete_expired_sessions(now).unwrap(), 1);
        assert!(db.get_session_by_hash("bbbb").unwrap().is_none());

        assert!(db.delete_session("aaaa").unwrap());
        assert!(!db.delete_session("aaaa").unwrap());
    }
}
