//! CRUD operations for [`Book`] and [`BookCopy`] records.
//!
//! Inventory counters are never stored; they are derived by counting copy
//! rows, which keeps `0 <= available_copies <= total_copies` true by
//! construction.

use rusqlite::{params, OptionalExtension};

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{Book, BookCopy, BookSummary, CopyStatus, NewBook};

impl Database {
    // ------------------------------------------------------------------
    // Books
    // ------------------------------------------------------------------

    /// Insert a new catalog title and return the stored record.
    pub fn create_book(&self, new: &NewBook) -> Result<Book> {
        self.conn().execute(
            "INSERT INTO books (title, author, isbn, description, category, cover_img, donor_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                new.title,
                new.author,
                new.isbn,
                new.description,
                new.category,
                new.cover_img,
                new.donor_id,
            ],
        )?;
        let id = self.conn().last_insert_rowid();
        Ok(Book {
            id,
            title: new.title.clone(),
            author: new.author.clone(),
            isbn: new.isbn.clone(),
            description: new.description.clone(),
            category: new.category.clone(),
            cover_img: new.cover_img.clone(),
            donor_id: new.donor_id,
        })
    }

    /// Fetch a single book by id.
    pub fn get_book(&self, id: i64) -> Result<Book> {
        self.conn()
            .query_row(
                "SELECT id, title, author, isbn, description, category, cover_img, donor_id
                 FROM books
                 WHERE id = ?1",
                params![id],
                row_to_book,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// List all catalog titles with derived inventory counters.
    pub fn list_book_summaries(&self) -> Result<Vec<BookSummary>> {
        let mut stmt = self.conn().prepare(
            "SELECT b.id, b.title, b.author, b.isbn, b.description, b.category,
                    b.cover_img, b.donor_id,
                    COUNT(c.id) FILTER (WHERE c.status != 'lost') AS total_copies,
                    COUNT(c.id) FILTER (WHERE c.status = 'available') AS available_copies
             FROM books b
             LEFT JOIN book_copies c ON c.book_id = b.id
             GROUP BY b.id
             ORDER BY b.id ASC",
        )?;

        let rows = stmt.query_map([], row_to_summary)?;

        let mut books = Vec::new();
        for row in rows {
            books.push(row?);
        }
        Ok(books)
    }

    /// Fetch one title with its derived inventory counters.
    pub fn get_book_summary(&self, id: i64) -> Result<BookSummary> {
        self.conn()
            .query_row(
                "SELECT b.id, b.title, b.author, b.isbn, b.description, b.category,
                        b.cover_img, b.donor_id,
                        COUNT(c.id) FILTER (WHERE c.status != 'lost') AS total_copies,
                        COUNT(c.id) FILTER (WHERE c.status = 'available') AS available_copies
                 FROM books b
                 LEFT JOIN book_copies c ON c.book_id = b.id
                 WHERE b.id = ?1
                 GROUP BY b.id",
                params![id],
                row_to_summary,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    // ------------------------------------------------------------------
    // Copies
    // ------------------------------------------------------------------

    /// Add one available copy of a book to the shelf.
    pub fn add_copy(&self, book_id: i64) -> Result<BookCopy> {
        self.add_copy_with_status(book_id, CopyStatus::Available, None)
    }

    /// Add a copy in an explicit state.  Used by the demo seeder.
    pub fn add_copy_with_status(
        &self,
        book_id: i64,
        status: CopyStatus,
        holder_id: Option<i64>,
    ) -> Result<BookCopy> {
        self.conn().execute(
            "INSERT INTO book_copies (book_id, status, holder_id) VALUES (?1, ?2, ?3)",
            params![book_id, status, holder_id],
        )?;
        let id = self.conn().last_insert_rowid();
        Ok(BookCopy {
            id,
            book_id,
            status,
            holder_id,
        })
    }

    /// Fetch a single copy by id.
    pub fn get_copy(&self, id: i64) -> Result<BookCopy> {
        self.conn()
            .query_row(
                "SELECT id, book_id, status, holder_id FROM book_copies WHERE id = ?1",
                params![id],
                row_to_copy,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// Number of copies of a book currently on the shelf.
    pub fn available_copy_count(&self, book_id: i64) -> Result<u32> {
        let count = self.conn().query_row(
            "SELECT COUNT(*) FROM book_copies WHERE book_id = ?1 AND status = 'available'",
            params![book_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Claim one available copy of a book for a borrower.
    ///
    /// The UPDATE is guarded on `status = 'available'`, so when two deciders
    /// race for the last copy exactly one of them gets it; the other sees
    /// `None`.  Returns the claimed copy id.
    pub fn claim_available_copy(&self, book_id: i64, holder_id: i64) -> Result<Option<i64>> {
        let copy_id: Option<i64> = self
            .conn()
            .query_row(
                "SELECT id FROM book_copies
                 WHERE book_id = ?1 AND status = 'available'
                 ORDER BY id ASC
                 LIMIT 1",
                params![book_id],
                |row| row.get(0),
            )
            .optional()?;

        let Some(copy_id) = copy_id else {
            return Ok(None);
        };

        let affected = self.conn().execute(
            "UPDATE book_copies SET status = 'borrowed', holder_id = ?2
             WHERE id = ?1 AND status = 'available'",
            params![copy_id, holder_id],
        )?;

        Ok(if affected > 0 { Some(copy_id) } else { None })
    }

    /// Put a borrowed copy back on the shelf.  Returns `true` if the copy was
    /// actually in the borrowed state.
    pub fn release_copy(&self, copy_id: i64) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE book_copies SET status = 'available', holder_id = NULL
             WHERE id = ?1 AND status = 'borrowed'",
            params![copy_id],
        )?;
        Ok(affected > 0)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Map a `rusqlite::Row` to a [`Book`].
fn row_to_book(row: &rusqlite::Row<'_>) -> rusqlite::Result<Book> {
    Ok(Book {
        id: row.get(0)?,
        title: row.get(1)?,
        author: row.get(2)?,
        isbn: row.get(3)?,
        description: row.get(4)?,
        category: row.get(5)?,
        cover_img: row.get(6)?,
        donor_id: row.get(7)?,
    })
}

/// Map a summary row (book columns followed by the two counters).
fn row_to_summary(row: &rusqlite::Row<'_>) -> rusqlite::Result<BookSummary> {
    Ok(BookSummary {
        book: row_to_book(row)?,
        total_copies: row.get(8)?,
        available_copies: row.get(9)?,
    })
}

/// Map a `rusqlite::Row` to a [`BookCopy`].
fn row_to_copy(row: &rusqlite::Row<'_>) -> rusqlite::Result<BookCopy> {
    Ok(BookCopy {
        id: row.get(0)?,
        book_id: row.get(1)?,
        status: row.get(2)?,
        holder_id: row.get(3)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewUser, Role};

    fn sample_user(db: &Database) -> i64 {
        db.create_user(&NewUser {
            name: "রহিম উদ্দিন".to_string(),
            email: "rahim@example.com".to_string(),
            phone: None,
            password_hash: "x".to_string(),
            role: Role::User,
        })
        .unwrap()
        .id
    }

    fn sample_book() -> NewBook {
        NewBook {
            title: "হিমু".to_string(),
            author: "হুমায়ূন আহমেদ".to_string(),
            isbn: "9789848000002".to_string(),
            description: None,
            category: "উপন্যাস".to_string(),
            cover_img: None,
            donor_id: None,
        }
    }

    #[test]
    fn counters_are_derived_from_copies() {
        let db = Database::open_in_memory().unwrap();
        let book = db.create_book(&sample_book()).unwrap();

        let summary = db.get_book_summary(book.id).unwrap();
        assert_eq!(summary.total_copies, 0);
        assert_eq!(summary.available_copies, 0);

        db.add_copy(book.id).unwrap();
        db.add_copy(book.id).unwrap();
        db.add_copy_with_status(book.id, CopyStatus::Lost, None).unwrap();

        let summary = db.get_book_summary(book.id).unwrap();
        assert_eq!(summary.total_copies, 2);
        assert_eq!(summary.available_copies, 2);
        assert_eq!(db.available_copy_count(book.id).unwrap(), 2);
    }

    #[test]
    fn claim_takes_each_copy_once() {
        let db = Database::open_in_memory().unwrap();
        let holder_id = sample_user(&db);
        let book = db.create_book(&sample_book()).unwrap();
        db.add_copy(book.id).unwrap();

        let first = db.claim_available_copy(book.id, holder_id).unwrap();
        assert!(first.is_some());

        // The shelf is now empty; a second claim finds nothing.
        let second = db.claim_available_copy(book.id, holder_id).unwrap();
        assert_eq!(second, None);

        let copy = db.get_copy(first.unwrap()).unwrap();
        assert_eq!(copy.status, CopyStatus::Borrowed);
        assert_eq!(copy.holder_id, Some(holder_id));
    }

    #[test]
    fn release_returns_copy_to_shelf() {
        let db = Database::open_in_memory().unwrap();
        let holder_id = sample_user(&db);
        let book = db.create_book(&sample_book()).unwrap();
        db.add_copy(book.id).unwrap();

        let copy_id = db.claim_available_copy(book.id, holder_id).unwrap().unwrap();
        assert!(db.release_copy(copy_id).unwrap());
        // Releasing an already-available copy is a no-op.
        assert!(!db.release_copy(copy_id).unwrap());

        assert_eq!(db.available_copy_count(book.id).unwrap(), 1);
    }
}
