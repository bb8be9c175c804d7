//! CRUD and guarded transitions for [`BorrowRequest`] and [`DonationRequest`]
//! records.
//!
//! Every status flip is an UPDATE guarded on `status = 'pending'` (and, for
//! returns, on the active-loan condition), so a request can leave the pending
//! state exactly once no matter how many writers try.  Requests are never
//! deleted; they are the library's history.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

use crate::database::{opt_ts_column, ts_column, Database};
use crate::error::{Result, StoreError};
use crate::models::{BorrowRequest, DonationRequest, RequestStatus};

const BORROW_COLUMNS: &str = "id, user_id, book_id, copy_id, status, due_date, returned_at,
                              admin_id, admin_comment, created_at, decided_at";

const DONATION_COLUMNS: &str =
    "id, user_id, book_id, status, admin_id, admin_comment, created_at, decided_at";

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert a new pending borrow request.
    pub fn insert_borrow_request(&self, user_id: i64, book_id: i64) -> Result<BorrowRequest> {
        let created_at = Utc::now();
        self.conn().execute(
            "INSERT INTO borrow_requests (user_id, book_id, status, created_at)
             VALUES (?1, ?2, 'pending', ?3)",
            params![user_id, book_id, created_at.to_rfc3339()],
        )?;
        let id = self.conn().last_insert_rowid();
        Ok(BorrowRequest {
            id,
            user_id,
            book_id,
            copy_id: None,
            status: RequestStatus::Pending,
            due_date: None,
            returned_at: None,
            admin_id: None,
            admin_comment: None,
            created_at,
            decided_at: None,
        })
    }

    /// Insert a new pending donation request.
    pub fn insert_donation_request(&self, user_id: i64, book_id: i64) -> Result<DonationRequest> {
        let created_at = Utc::now();
        self.conn().execute(
            "INSERT INTO donation_requests (user_id, book_id, status, created_at)
             VALUES (?1, ?2, 'pending', ?3)",
            params![user_id, book_id, created_at.to_rfc3339()],
        )?;
        let id = self.conn().last_insert_rowid();
        Ok(DonationRequest {
            id,
            user_id,
            book_id,
            status: RequestStatus::Pending,
            admin_id: None,
            admin_comment: None,
            created_at,
            decided_at: None,
        })
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch a single borrow request by id.
    pub fn get_borrow_request(&self, id: i64) -> Result<BorrowRequest> {
        self.conn()
            .query_row(
                &format!("SELECT {BORROW_COLUMNS} FROM borrow_requests WHERE id = ?1"),
                params![id],
                row_to_borrow,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// Fetch a single donation request by id.
    pub fn get_donation_request(&self, id: i64) -> Result<DonationRequest> {
        self.conn()
            .query_row(
                &format!("SELECT {DONATION_COLUMNS} FROM donation_requests WHERE id = ?1"),
                params![id],
                row_to_donation,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// All pending borrow requests, oldest first (admin review queue order).
    pub fn pending_borrow_requests(&self) -> Result<Vec<BorrowRequest>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {BORROW_COLUMNS} FROM borrow_requests
             WHERE status = 'pending'
             ORDER BY created_at ASC, id ASC"
        ))?;

        let rows = stmt.query_map([], row_to_borrow)?;

        let mut requests = Vec::new();
        for row in rows {
            requests.push(row?);
        }
        Ok(requests)
    }

    /// All pending donation requests, oldest first.
    pub fn pending_donation_requests(&self) -> Result<Vec<DonationRequest>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {DONATION_COLUMNS} FROM donation_requests
             WHERE status = 'pending'
             ORDER BY created_at ASC, id ASC"
        ))?;

        let rows = stmt.query_map([], row_to_donation)?;

        let mut requests = Vec::new();
        for row in rows {
            requests.push(row?);
        }
        Ok(requests)
    }

    /// Full borrow history for a user, newest first.
    pub fn borrow_requests_for_user(&self, user_id: i64) -> Result<Vec<BorrowRequest>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {BORROW_COLUMNS} FROM borrow_requests
             WHERE user_id = ?1
             ORDER BY created_at DESC, id DESC"
        ))?;

        let rows = stmt.query_map(params![user_id], row_to_borrow)?;

        let mut requests = Vec::new();
        for row in rows {
            requests.push(row?);
        }
        Ok(requests)
    }

    /// Full donation history for a user, newest first.
    pub fn donation_requests_for_user(&self, user_id: i64) -> Result<Vec<DonationRequest>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {DONATION_COLUMNS} FROM donation_requests
             WHERE user_id = ?1
             ORDER BY created_at DESC, id DESC"
        ))?;

        let rows = stmt.query_map(params![user_id], row_to_donation)?;

        let mut requests = Vec::new();
        for row in rows {
            requests.push(row?);
        }
        Ok(requests)
    }

    /// A user's approved, unreturned loans, oldest first.
    pub fn active_borrows_for_user(&self, user_id: i64) -> Result<Vec<BorrowRequest>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {BORROW_COLUMNS} FROM borrow_requests
             WHERE user_id = ?1 AND status = 'approved' AND returned_at IS NULL
             ORDER BY created_at ASC, id ASC"
        ))?;

        let rows = stmt.query_map(params![user_id], row_to_borrow)?;

        let mut requests = Vec::new();
        for row in rows {
            requests.push(row?);
        }
        Ok(requests)
    }

    /// The user's active loan of a specific copy, if any.
    pub fn active_borrow_for_copy(
        &self,
        user_id: i64,
        copy_id: i64,
    ) -> Result<Option<BorrowRequest>> {
        self.conn()
            .query_row(
                &format!(
                    "SELECT {BORROW_COLUMNS} FROM borrow_requests
                     WHERE user_id = ?1 AND copy_id = ?2
                       AND status = 'approved' AND returned_at IS NULL"
                ),
                params![user_id, copy_id],
                row_to_borrow,
            )
            .optional()
            .map_err(StoreError::Sqlite)
    }

    /// Whether the user currently holds an unreturned copy of this book.
    pub fn has_active_borrow(&self, user_id: i64, book_id: i64) -> Result<bool> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM borrow_requests
             WHERE user_id = ?1 AND book_id = ?2
               AND status = 'approved' AND returned_at IS NULL",
            params![user_id, book_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Whether the user already has a pending borrow request for this book.
    pub fn has_pending_borrow(&self, user_id: i64, book_id: i64) -> Result<bool> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM borrow_requests
             WHERE user_id = ?1 AND book_id = ?2 AND status = 'pending'",
            params![user_id, book_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    // ------------------------------------------------------------------
    // Transitions (guarded)
    // ------------------------------------------------------------------

    /// Flip a borrow request from pending to approved, recording the claimed
    /// copy, the due date, and the deciding admin.  Returns `false` if the
    /// request had already left the pending state.
    pub fn approve_borrow_request(
        &self,
        id: i64,
        copy_id: i64,
        admin_id: i64,
        comment: Option<&str>,
        due_date: DateTime<Utc>,
        decided_at: DateTime<Utc>,
    ) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE borrow_requests
             SET status = 'approved', copy_id = ?2, admin_id = ?3, admin_comment = ?4,
                 due_date = ?5, decided_at = ?6
             WHERE id = ?1 AND status = 'pending'",
            params![
                id,
                copy_id,
                admin_id,
                comment,
                due_date.to_rfc3339(),
                decided_at.to_rfc3339(),
            ],
        )?;
        Ok(affected > 0)
    }

    /// Flip a borrow request from pending to rejected.
    pub fn reject_borrow_request(
        &self,
        id: i64,
        admin_id: i64,
        comment: Option<&str>,
        decided_at: DateTime<Utc>,
    ) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE borrow_requests
             SET status = 'rejected', admin_id = ?2, admin_comment = ?3, decided_at = ?4
             WHERE id = ?1 AND status = 'pending'",
            params![id, admin_id, comment, decided_at.to_rfc3339()],
        )?;
        Ok(affected > 0)
    }

    /// Flip a donation request from pending to approved.
    pub fn approve_donation_request(
        &self,
        id: i64,
        admin_id: i64,
        comment: Option<&str>,
        decided_at: DateTime<Utc>,
    ) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE donation_requests
             SET status = 'approved', admin_id = ?2, admin_comment = ?3, decided_at = ?4
             WHERE id = ?1 AND status = 'pending'",
            params![id, admin_id, comment, decided_at.to_rfc3339()],
        )?;
        Ok(affected > 0)
    }

    /// Flip a donation request from pending to rejected.
    pub fn reject_donation_request(
        &self,
        id: i64,
        admin_id: i64,
        comment: Option<&str>,
        decided_at: DateTime<Utc>,
    ) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE donation_requests
             SET status = 'rejected', admin_id = ?2, admin_comment = ?3, decided_at = ?4
             WHERE id = ?1 AND status = 'pending'",
            params![id, admin_id, comment, decided_at.to_rfc3339()],
        )?;
        Ok(affected > 0)
    }

    /// Stamp an approved loan as returned.  Guarded on the active-loan
    /// condition so a loan can only be returned once.
    pub fn mark_returned(&self, id: i64, returned_at: DateTime<Utc>) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE borrow_requests
             SET returned_at = ?2
             WHERE id = ?1 AND status = 'approved' AND returned_at IS NULL",
            params![id, returned_at.to_rfc3339()],
        )?;
        Ok(affected > 0)
    }

    // ------------------------------------------------------------------
    // Activity feeds
    // ------------------------------------------------------------------

    /// Recently approved borrow requests, newest decision first.
    pub fn recent_approved_borrows(&self, limit: u32) -> Result<Vec<BorrowRequest>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {BORROW_COLUMNS} FROM borrow_requests
             WHERE status = 'approved'
             ORDER BY decided_at DESC
             LIMIT ?1"
        ))?;

        let rows = stmt.query_map(params![limit], row_to_borrow)?;

        let mut requests = Vec::new();
        for row in rows {
            requests.push(row?);
        }
        Ok(requests)
    }

    /// Recently approved donation requests, newest decision first.
    pub fn recent_approved_donations(&self, limit: u32) -> Result<Vec<DonationRequest>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {DONATION_COLUMNS} FROM donation_requests
             WHERE status = 'approved'
             ORDER BY decided_at DESC
             LIMIT ?1"
        ))?;

        let rows = stmt.query_map(params![limit], row_to_donation)?;

        let mut requests = Vec::new();
        for row in rows {
            requests.push(row?);
        }
        Ok(requests)
    }

    /// Recently returned loans, newest return first.
    pub fn recent_returns(&self, limit: u32) -> Result<Vec<BorrowRequest>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {BORROW_COLUMNS} FROM borrow_requests
             WHERE returned_at IS NOT NULL
             ORDER BY returned_at DESC
             LIMIT ?1"
        ))?;

        let rows = stmt.query_map(params![limit], row_to_borrow)?;

        let mut requests = Vec::new();
        for row in rows {
            requests.push(row?);
        }
        Ok(requests)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Map a `rusqlite::Row` to a [`BorrowRequest`].
fn row_to_borrow(row: &rusqlite::Row<'_>) -> rusqlite::Result<BorrowRequest> {
    Ok(BorrowRequest {
        id: row.get(0)?,
        user_id: row.get(1)?,
        book_id: row.get(2)?,
        copy_id: row.get(3)?,
        status: row.get(4)?,
        due_date: opt_ts_column(row, 5)?,
        returned_at: opt_ts_column(row, 6)?,
        admin_id: row.get(7)?,
        admin_comment: row.get(8)?,
        created_at: ts_column(row, 9)?,
        decided_at: opt_ts_column(row, 10)?,
    })
}

/// Map a `rusqlite::Row` to a [`DonationRequest`].
fn row_to_donation(row: &rusqlite::Row<'_>) -> rusqlite::Result<DonationRequest> {
    Ok(DonationRequest {
        id: row.get(0)?,
        user_id: row.get(1)?,
        book_id: row.get(2)?,
        status: row.get(3)?,
        admin_id: row.get(4)?,
        admin_comment: row.get(5)?,
        created_at: ts_column(row, 6)?,
        decided_at: opt_ts_column(row, 7)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewBook, NewUser, Role};

    fn setup() -> (Database, i64, i64) {
        let db = Database::open_in_memory().unwrap();
        let user = db
            .create_user(&NewUser {
                name: "তানভীর আহমেদ".to_string(),
                email: "tanvir@example.com".to_string(),
                phone: None,
                password_hash: "x".to_string(),
                role: Role::User,
            })
            .unwrap();
        let book = db
            .create_book(&NewBook {
                title: "আজব দুনিয়া".to_string(),
                author: "মুহম্মদ জাফর ইকবাল".to_string(),
                isbn: "9789848000001".to_string(),
                description: None,
                category: "বিজ্ঞান কল্পকাহিনি".to_string(),
                cover_img: None,
                donor_id: None,
            })
            .unwrap();
        (db, user.id, book.id)
    }

    #[test]
    fn borrow_request_round_trip() {
        let (db, user_id, book_id) = setup();

        let req = db.insert_borrow_request(user_id, book_id).unwrap();
        assert_eq!(req.status, RequestStatus::Pending);
        assert_eq!(req.copy_id, None);

        let fetched = db.get_borrow_request(req.id).unwrap();
        assert_eq!(req, fetched);
        assert!(db.has_pending_borrow(user_id, book_id).unwrap());
    }

    #[test]
    fn pending_queue_is_oldest_first() {
        let (db, user_id, book_id) = setup();

        let first = db.insert_borrow_request(user_id, book_id).unwrap();
        let second = db.insert_borrow_request(user_id, book_id).unwrap();

        let pending = db.pending_borrow_requests().unwrap();
        let ids: Vec<i64> = pending.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);
    }

    #[test]
    fn approve_flips_exactly_once() {
        let (db, user_id, book_id) = setup();
        let copy = db.add_copy(book_id).unwrap();
        let req = db.insert_borrow_request(user_id, book_id).unwrap();

        let now = Utc::now();
        let due = now + chrono::Duration::days(14);
        assert!(db
            .approve_borrow_request(req.id, copy.id, 1, Some("ঠিক আছে"), due, now)
            .unwrap());

        // Second flip attempt fails the status guard.
        assert!(!db
            .approve_borrow_request(req.id, copy.id, 1, None, due, now)
            .unwrap());
        assert!(!db.reject_borrow_request(req.id, 1, None, now).unwrap());

        let stored = db.get_borrow_request(req.id).unwrap();
        assert_eq!(stored.status, RequestStatus::Approved);
        assert_eq!(stored.copy_id, Some(copy.id));
        assert_eq!(stored.admin_id, Some(1));
        assert!(stored.due_date.is_some());
    }

    #[test]
    fn mark_returned_is_single_shot() {
        let (db, user_id, book_id) = setup();
        let copy = db.add_copy(book_id).unwrap();
        let req = db.insert_borrow_request(user_id, book_id).unwrap();

        let now = Utc::now();
        db.approve_borrow_request(req.id, copy.id, 1, None, now, now)
            .unwrap();

        assert!(db.mark_returned(req.id, now).unwrap());
        assert!(!db.mark_returned(req.id, now).unwrap());

        let stored = db.get_borrow_request(req.id).unwrap();
        assert!(stored.returned_at.is_some());
        assert!(db
            .active_borrow_for_copy(user_id, copy.id)
            .unwrap()
            .is_none());
    }
}
