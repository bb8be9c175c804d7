//! Domain model structs persisted in the local SQLite database.
//!
//! Every struct derives `Serialize` and `Deserialize` so it can be handed
//! directly to the API layer.  Status enums are stored as lowercase text
//! columns and implement `ToSql`/`FromSql` so queries can bind them directly.

use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::ToSql;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Role of a registered user.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

/// Availability status of a physical book copy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CopyStatus {
    Available,
    Borrowed,
    Lost,
}

/// Lifecycle status of a borrow or donation request.
///
/// Transitions are one-way: `Pending` moves to exactly one of the terminal
/// states and never changes again.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

/// Discriminates the two request flavours where one code path handles both.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    Borrow,
    Donation,
}

/// Category of a user-facing notification.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    BorrowApproved,
    BorrowRejected,
    DonationApproved,
    DonationRejected,
}

macro_rules! text_enum {
    ($ty:ty { $($variant:path => $text:literal),+ $(,)? }) => {
        impl $ty {
            /// The lowercase text stored in SQLite for this value.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($variant => $text),+
                }
            }

            /// Parse the stored text back into the enum.
            pub fn parse(s: &str) -> Option<Self> {
                match s {
                    $($text => Some($variant),)+
                    _ => None,
                }
            }
        }

        impl ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $ty {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                let text = value.as_str()?;
                Self::parse(text).ok_or(FromSqlError::InvalidType)
            }
        }
    };
}

text_enum!(Role {
    Role::Admin => "admin",
    Role::User => "user",
});

text_enum!(CopyStatus {
    CopyStatus::Available => "available",
    CopyStatus::Borrowed => "borrowed",
    CopyStatus::Lost => "lost",
});

text_enum!(RequestStatus {
    RequestStatus::Pending => "pending",
    RequestStatus::Approved => "approved",
    RequestStatus::Rejected => "rejected",
});

text_enum!(RequestKind {
    RequestKind::Borrow => "borrow",
    RequestKind::Donation => "donation",
});

text_enum!(NotificationKind {
    NotificationKind::BorrowApproved => "borrow_approved",
    NotificationKind::BorrowRejected => "borrow_rejected",
    NotificationKind::DonationApproved => "donation_approved",
    NotificationKind::DonationRejected => "donation_rejected",
});

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A registered library member or admin.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub name: String,
    /// Unique login email.
    pub email: String,
    /// Optional phone number, unique when present.
    pub phone: Option<String>,
    /// Salted password digest.  Never serialized to the API layer.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Fields needed to insert a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password_hash: String,
    pub role: Role,
}

// ---------------------------------------------------------------------------
// Book
// ---------------------------------------------------------------------------

/// A catalog title.  Physical inventory lives in [`BookCopy`] rows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub description: Option<String>,
    pub category: String,
    pub cover_img: Option<String>,
    /// The member who donated this title, if it entered via donation.
    pub donor_id: Option<i64>,
}

/// Fields needed to insert a new book.
#[derive(Debug, Clone)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub description: Option<String>,
    pub category: String,
    pub cover_img: Option<String>,
    pub donor_id: Option<i64>,
}

/// A single physical copy of a [`Book`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BookCopy {
    pub id: i64,
    pub book_id: i64,
    pub status: CopyStatus,
    /// The member currently holding the copy, when borrowed.
    pub holder_id: Option<i64>,
}

/// A [`Book`] together with its derived inventory counters.
///
/// `total_copies` counts copies that are not lost, `available_copies` those
/// on the shelf, so `0 <= available_copies <= total_copies` always holds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BookSummary {
    #[serde(flatten)]
    pub book: Book,
    pub total_copies: u32,
    pub available_copies: u32,
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// A member's request to borrow one copy of a book.
///
/// `copy_id` stays `NULL` while pending; the concrete copy is claimed when an
/// admin approves.  `returned_at` is the terminal sub-state of an approved
/// loan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BorrowRequest {
    pub id: i64,
    pub user_id: i64,
    pub book_id: i64,
    pub copy_id: Option<i64>,
    pub status: RequestStatus,
    pub due_date: Option<DateTime<Utc>>,
    pub returned_at: Option<DateTime<Utc>>,
    pub admin_id: Option<i64>,
    pub admin_comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
}

/// A member's offer to donate one copy of a book (new title or existing).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DonationRequest {
    pub id: i64,
    pub user_id: i64,
    pub book_id: i64,
    pub status: RequestStatus,
    pub admin_id: Option<i64>,
    pub admin_comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Notification
// ---------------------------------------------------------------------------

/// A user-facing message produced when a request changes state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notification {
    pub id: i64,
    /// The recipient.  Only this user may mark the notification read.
    pub user_id: i64,
    pub kind: NotificationKind,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A bearer-token auth session.  Only the SHA-256 digest of the token is
/// stored; the token itself is handed to the client once at login.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    pub id: i64,
    pub user_id: i64,
    pub token_hash: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enum_text_round_trip() {
        assert_eq!(RequestStatus::parse("pending"), Some(RequestStatus::Pending));
        assert_eq!(RequestStatus::Approved.as_str(), "approved");
        assert_eq!(CopyStatus::parse("lost"), Some(CopyStatus::Lost));
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(
            NotificationKind::parse("donation_rejected"),
            Some(NotificationKind::DonationRejected)
        );
        assert_eq!(NotificationKind::parse("bogus"), None);
    }
}
