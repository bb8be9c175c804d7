//! CRUD operations for [`User`] records.

use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use crate::database::{ts_column, Database};
use crate::error::{Result, StoreError};
use crate::models::{NewUser, User};

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert a new user and return the stored record.
    pub fn create_user(&self, new: &NewUser) -> Result<User> {
        let created_at = Utc::now();
        self.conn().execute(
            "INSERT INTO users (name, email, phone, password_hash, role, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                new.name,
                new.email,
                new.phone,
                new.password_hash,
                new.role,
                created_at.to_rfc3339(),
            ],
        )?;
        let id = self.conn().last_insert_rowid();
        Ok(User {
            id,
            name: new.name.clone(),
            email: new.email.clone(),
            phone: new.phone.clone(),
            password_hash: new.password_hash.clone(),
            role: new.role,
            created_at,
        })
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch a single user by id.
    pub fn get_user(&self, id: i64) -> Result<User> {
        self.conn()
            .query_row(
                "SELECT id, name, email, phone, password_hash, role, created_at
                 FROM users
                 WHERE id = ?1",
                params![id],
                row_to_user,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// Fetch a user by login email, if one exists.
    pub fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.conn()
            .query_row(
                "SELECT id, name, email, phone, password_hash, role, created_at
                 FROM users
                 WHERE email = ?1",
                params![email],
                row_to_user,
            )
            .optional()
            .map_err(StoreError::Sqlite)
    }

    /// Fetch a user by phone number, if one exists.
    pub fn get_user_by_phone(&self, phone: &str) -> Result<Option<User>> {
        self.conn()
            .query_row(
                "SELECT id, name, email, phone, password_hash, role, created_at
                 FROM users
                 WHERE phone = ?1",
                params![phone],
                row_to_user,
            )
            .optional()
            .map_err(StoreError::Sqlite)
    }

    /// List all users, ordered by creation date ascending.
    pub fn list_users(&self) -> Result<Vec<User>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, name, email, phone, password_hash, role, created_at
             FROM users
             ORDER BY created_at ASC, id ASC",
        )?;

        let rows = stmt.query_map([], row_to_user)?;

        let mut users = Vec::new();
        for row in rows {
            users.push(row?);
        }
        Ok(users)
    }

    /// Most recently registered users, newest first.
    pub fn recent_users(&self, limit: u32) -> Result<Vec<User>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, name, email, phone, password_hash, role, created_at
             FROM users
             ORDER BY created_at DESC, id DESC
             LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit], row_to_user)?;

        let mut users = Vec::new();
        for row in rows {
            users.push(row?);
        }
        Ok(users)
    }

    /// Total number of registered users.
    pub fn count_users(&self) -> Result<i64> {
        let count = self
            .conn()
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Map a `rusqlite::Row` to a [`User`].
fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        password_hash: row.get(4)?,
        role: row.get(5)?,
        created_at: ts_column(row, 6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "রহিম উদ্দিন".to_string(),
            email: email.to_string(),
            phone: None,
            password_hash: "x".to_string(),
            role: Role::User,
        }
    }

    #[test]
    fn create_and_fetch_user() {
        let db = Database::open_in_memory().unwrap();

        let created = db.create_user(&new_user("rahim@example.com")).unwrap();
        let fetched = db.get_user(created.id).unwrap();
        assert_eq!(created, fetched);

        let by_email = db.get_user_by_email("rahim@example.com").unwrap();
        assert_eq!(by_email, Some(created));
        assert!(db.get_user_by_email("nobody@example.com").unwrap().is_none());
    }

    #[test]
    fn missing_user_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(db.get_user(42), Err(StoreError::NotFound)));
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        db.create_user(&new_user("dup@example.com")).unwrap();
        assert!(db.create_user(&new_user("dup@example.com")).is_err());
    }
}
