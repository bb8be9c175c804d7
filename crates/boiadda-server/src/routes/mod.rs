//! HTTP route handlers, grouped by concern.

pub mod admin;
pub mod auth;
pub mod catalog;
pub mod dashboard;
pub mod lending;
pub mod notifications;

use serde::Serialize;

use boiadda_store::{BookSummary, User};

/// Public view of a user (no password material).
#[derive(Debug, Clone, Serialize)]
pub struct UserInfo {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role_name: &'static str,
}

impl UserInfo {
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            role_name: user.role.as_str(),
        }
    }
}

/// Public view of a catalog title with derived availability.
#[derive(Debug, Clone, Serialize)]
pub struct BookInfo {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub category: String,
    pub total_copies: u32,
    pub available_copies: u32,
    pub description: Option<String>,
    pub isbn: String,
    pub cover_img: Option<String>,
    /// Whether the requesting user may submit a borrow request for this
    /// title.  `true` for anonymous callers.
    pub user_can_borrow: bool,
}

impl BookInfo {
    pub fn from_summary(summary: &BookSummary, user_can_borrow: bool) -> Self {
        Self {
            id: summary.book.id,
            title: summary.book.title.clone(),
            author: summary.book.author.clone(),
            category: summary.book.category.clone(),
            total_copies: summary.total_copies,
            available_copies: summary.available_copies,
            description: summary.book.description.clone(),
            isbn: summary.book.isbn.clone(),
            cover_img: summary.book.cover_img.clone(),
            user_can_borrow,
        }
    }
}
