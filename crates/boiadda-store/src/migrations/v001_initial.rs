//! v001 -- Initial schema creation.
//!
//! Creates the seven core tables: `users`, `books`, `book_copies`,
//! `borrow_requests`, `donation_requests`, `notifications`, and `sessions`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Users
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    name          TEXT NOT NULL,
    email         TEXT NOT NULL UNIQUE,
    phone         TEXT UNIQUE,
    password_hash TEXT NOT NULL,
    role          TEXT NOT NULL DEFAULT 'user',    -- 'admin' | 'user'
    created_at    TEXT NOT NULL                    -- ISO-8601 / RFC-3339
);

-- ----------------------------------------------------------------
-- Books (catalog titles)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS books (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    title       TEXT NOT NULL,
    author      TEXT NOT NULL,
    isbn        TEXT NOT NULL,
    description TEXT,
    category    TEXT NOT NULL,
    cover_img   TEXT,
    donor_id    INTEGER,                           -- nullable FK -> users(id)

    FOREIGN KEY (donor_id) REFERENCES users(id)
);

-- ----------------------------------------------------------------
-- Book copies (physical inventory)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS book_copies (
    id        INTEGER PRIMARY KEY AUTOINCREMENT,
    book_id   INTEGER NOT NULL,                    -- FK -> books(id)
    status    TEXT NOT NULL DEFAULT 'available',   -- 'available' | 'borrowed' | 'lost'
    holder_id INTEGER,                             -- borrower, when status = 'borrowed'

    FOREIGN KEY (book_id) REFERENCES books(id) ON DELETE CASCADE,
    FOREIGN KEY (holder_id) REFERENCES users(id)
);

CREATE INDEX IF NOT EXISTS idx_copies_book_status ON book_copies(book_id, status);

-- ----------------------------------------------------------------
-- Borrow requests
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS borrow_requests (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id       INTEGER NOT NULL,                -- requesting member
    book_id       INTEGER NOT NULL,
    copy_id       INTEGER,                         -- claimed at approval
    status        TEXT NOT NULL DEFAULT 'pending', -- 'pending' | 'approved' | 'rejected'
    due_date      TEXT,                            -- set at approval
    returned_at   TEXT,
    admin_id      INTEGER,                         -- deciding admin
    admin_comment TEXT,
    created_at    TEXT NOT NULL,
    decided_at    TEXT,

    FOREIGN KEY (user_id) REFERENCES users(id),
    FOREIGN KEY (book_id) REFERENCES books(id),
    FOREIGN KEY (copy_id) REFERENCES book_copies(id),
    FOREIGN KEY (admin_id) REFERENCES users(id)
);

CREATE INDEX IF NOT EXISTS idx_borrow_status_created
    ON borrow_requests(status, created_at);
CREATE INDEX IF NOT EXISTS idx_borrow_user
    ON borrow_requests(user_id, created_at DESC);

-- ----------------------------------------------------------------
-- Donation requests
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS donation_requests (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id       INTEGER NOT NULL,                -- donating member
    book_id       INTEGER NOT NULL,
    status        TEXT NOT NULL DEFAULT 'pending',
    admin_id      INTEGER,
    admin_comment TEXT,
    created_at    TEXT NOT NULL,
    decided_at    TEXT,

    FOREIGN KEY (user_id) REFERENCES users(id),
    FOREIGN KEY (book_id) REFERENCES books(id),
    FOREIGN KEY (admin_id) REFERENCES users(id)
);

CREATE INDEX IF NOT EXISTS idx_donation_status_created
    ON donation_requests(status, created_at);
CREATE INDEX IF NOT EXISTS idx_donation_user
    ON donation_requests(user_id, created_at DESC);

-- ----------------------------------------------------------------
-- Notifications
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS notifications (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id    INTEGER NOT NULL,                   -- recipient
    kind       TEXT NOT NULL,
    message    TEXT NOT NULL,
    is_read    INTEGER NOT NULL DEFAULT 0,         -- boolean 0/1
    created_at TEXT NOT NULL,

    FOREIGN KEY (user_id) REFERENCES users(id)
);

CREATE INDEX IF NOT EXISTS idx_notifications_user
    ON notifications(user_id, created_at DESC);

-- ----------------------------------------------------------------
-- Auth sessions
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS sessions (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id    INTEGER NOT NULL,
    token_hash TEXT NOT NULL UNIQUE,               -- SHA-256 of the bearer token
    created_at TEXT NOT NULL,
    expires_at TEXT NOT NULL,

    FOREIGN KEY (user_id) REFERENCES users(id)
);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
