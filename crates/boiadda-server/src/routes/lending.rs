//! Member workflow: borrow, donate, return.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use boiadda_lending::NewDonation;

use crate::api::AppState;
use crate::auth::Authed;
use crate::error::ApiError;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/borrow/{book_id}", post(request_borrow))
        .route("/donate", post(donate_new_book))
        .route("/donate/{book_id}", post(donate_existing_book))
        .route("/return", post(return_book))
        .route("/users/{user_id}/borrowed-books", get(borrowed_books))
}

#[derive(Deserialize)]
struct DonateBookInput {
    title: String,
    author: String,
    description: Option<String>,
    cover_img: Option<String>,
    category: Option<String>,
}

#[derive(Deserialize)]
struct ReturnBookInput {
    book_copy_id: i64,
}

#[derive(Serialize)]
struct BorrowSubmitted {
    message: &'static str,
    request_id: i64,
}

#[derive(Serialize)]
struct DonationSubmitted {
    message: &'static str,
    book_id: i64,
    request_id: i64,
}

#[derive(Serialize)]
struct BookReturned {
    message: String,
    book_copy_id: i64,
}

#[derive(Serialize)]
struct BorrowedBook {
    book_copy_id: i64,
    book_id: i64,
    title: String,
    author: String,
    category: String,
    borrowed_date: DateTime<Utc>,
    due_date: Option<DateTime<Utc>>,
    is_overdue: bool,
}

async fn request_borrow(
    State(state): State<AppState>,
    Path(book_id): Path<i64>,
    Authed(actor): Authed,
) -> Result<Json<BorrowSubmitted>, ApiError> {
    let request = state.lending.create_borrow_request(&actor, book_id)?;
    Ok(Json(BorrowSubmitted {
        message: "Borrow request submitted",
        request_id: request.id,
    }))
}

async fn donate_new_book(
    State(state): State<AppState>,
    Authed(actor): Authed,
    Json(input): Json<DonateBookInput>,
) -> Result<Json<DonationSubmitted>, ApiError> {
    let (book, request) = state.lending.create_donation_request(
        &actor,
        NewDonation {
            title: input.title,
            author: input.author,
            description: input.description,
            cover_img: input.cover_img,
            category: input.category,
        },
    )?;
    Ok(Json(DonationSubmitted {
        message: "Book donation submitted successfully",
        book_id: book.id,
        request_id: request.id,
    }))
}

async fn donate_existing_book(
    State(state): State<AppState>,
    Path(book_id): Path<i64>,
    Authed(actor): Authed,
) -> Result<Json<DonationSubmitted>, ApiError> {
    let request = state.lending.donate_existing_book(&actor, book_id)?;
    Ok(Json(DonationSubmitted {
        message: "Donation request submitted",
        book_id,
        request_id: request.id,
    }))
}

async fn return_book(
    State(state): State<AppState>,
    Authed(actor): Authed,
    Json(input): Json<ReturnBookInput>,
) -> Result<Json<BookReturned>, ApiError> {
    let request = state.lending.return_book(&actor, input.book_copy_id)?;
    Ok(Json(BookReturned {
        message: format!("Book copy {} returned.", input.book_copy_id),
        book_copy_id: request.copy_id.unwrap_or(input.book_copy_id),
    }))
}

/// Books currently held by a user, with overdue flags.
async fn borrowed_books(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<BorrowedBook>>, ApiError> {
    let db = state.lending.database().map_err(ApiError::from)?;
    db.get_user(user_id)?;

    let now = Utc::now();
    let loans = db.active_borrows_for_user(user_id)?;
    let mut result = Vec::with_capacity(loans.len());
    for loan in loans {
        let book = db.get_book(loan.book_id)?;
        result.push(BorrowedBook {
            // An approved loan always has its claimed copy recorded.
            book_copy_id: loan.copy_id.unwrap_or_default(),
            book_id: book.id,
            title: book.title,
            author: book.author,
            category: book.category,
            borrowed_date: loan.created_at,
            due_date: loan.due_date,
            is_overdue: loan.due_date.is_some_and(|due| now > due),
        });
    }
    Ok(Json(result))
}
