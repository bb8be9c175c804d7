//! Catalog browsing: books with availability, the member directory.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};

use crate::api::AppState;
use crate::auth::Authed;
use crate::error::ApiError;
use crate::routes::{BookInfo, UserInfo};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/books", get(list_books))
        .route("/books/{book_id}", get(get_book))
        .route("/users", get(list_users))
}

/// All catalog titles.  When the caller is authenticated the
/// `user_can_borrow` flag reflects their own loans and pending requests.
async fn list_books(
    State(state): State<AppState>,
    authed: Option<Authed>,
) -> Result<Json<Vec<BookInfo>>, ApiError> {
    let db = state.lending.database().map_err(ApiError::from)?;

    let summaries = db.list_book_summaries()?;
    let mut books = Vec::with_capacity(summaries.len());
    for summary in &summaries {
        let user_can_borrow = match &authed {
            Some(Authed(actor)) => {
                !db.has_active_borrow(actor.id, summary.book.id)?
                    && !db.has_pending_borrow(actor.id, summary.book.id)?
            }
            None => true,
        };
        books.push(BookInfo::from_summary(summary, user_can_borrow));
    }
    Ok(Json(books))
}

async fn get_book(
    State(state): State<AppState>,
    Path(book_id): Path<i64>,
    authed: Option<Authed>,
) -> Result<Json<BookInfo>, ApiError> {
    let db = state.lending.database().map_err(ApiError::from)?;

    let summary = db.get_book_summary(book_id)?;
    let user_can_borrow = match &authed {
        Some(Authed(actor)) => {
            !db.has_active_borrow(actor.id, book_id)?
                && !db.has_pending_borrow(actor.id, book_id)?
        }
        None => true,
    };
    Ok(Json(BookInfo::from_summary(&summary, user_can_borrow)))
}

async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<UserInfo>>, ApiError> {
    let db = state.lending.database().map_err(ApiError::from)?;
    let users = db.list_users()?;
    Ok(Json(users.iter().map(UserInfo::from_user).collect()))
}
