//! # boiadda-store
//!
//! SQLite persistence for the BoiAdda community library, backed by rusqlite.
//!
//! The crate exposes a synchronous [`Database`] handle that wraps a
//! `rusqlite::Connection` and provides typed CRUD helpers for every domain
//! record: users, books, physical book copies, borrow/donation requests,
//! notifications, and auth sessions.  Request status transitions and copy
//! claims are expressed as guarded UPDATE statements so that a transition
//! can only ever succeed once, regardless of who else is writing.

pub mod books;
pub mod database;
pub mod migrations;
pub mod models;
pub mod notifications;
pub mod requests;
pub mod sessions;
pub mod users;

mod error;

pub use database::Database;
pub use error::StoreError;
pub use models::*;
