//! Admin review queues and decisions.
//!
//! The acting admin is resolved from the bearer session; the request body
//! carries only the optional comment.  Role enforcement happens both here
//! (for the queue listings) and inside the lending service (for decisions).

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use boiadda_store::{RequestKind, RequestStatus};

use crate::api::AppState;
use crate::auth::{require_admin, Authed};
use crate::error::ApiError;
use crate::routes::{BookInfo, UserInfo};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/borrow-requests", get(list_pending_borrows))
        .route("/admin/donation-requests", get(list_pending_donations))
        .route("/admin/borrow-requests/{id}/approve", post(approve_borrow))
        .route("/admin/borrow-requests/{id}/reject", post(reject_borrow))
        .route("/admin/donation-requests/{id}/approve", post(approve_donation))
        .route("/admin/donation-requests/{id}/reject", post(reject_donation))
}

#[derive(Deserialize)]
struct AdminActionInput {
    comment: Option<String>,
}

#[derive(Serialize)]
struct AdminBorrowRequest {
    id: i64,
    user_id: i64,
    book_id: i64,
    copy_id: Option<i64>,
    status: RequestStatus,
    due_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    decided_at: Option<DateTime<Utc>>,
    admin_id: Option<i64>,
    admin_comment: Option<String>,
    user: UserInfo,
    book: BookInfo,
}

#[derive(Serialize)]
struct AdminDonationRequest {
    id: i64,
    user_id: i64,
    book_id: i64,
    status: RequestStatus,
    created_at: DateTime<Utc>,
    decided_at: Option<DateTime<Utc>>,
    admin_id: Option<i64>,
    admin_comment: Option<String>,
    user: UserInfo,
    book: BookInfo,
}

#[derive(Serialize)]
struct MessageResponse {
    message: &'static str,
}

/// Pending borrow requests, oldest first, with requester and title detail.
async fn list_pending_borrows(
    State(state): State<AppState>,
    Authed(actor): Authed,
) -> Result<Json<Vec<AdminBorrowRequest>>, ApiError> {
    require_admin(&actor)?;
    let db = state.lending.database().map_err(ApiError::from)?;

    let pending = db.pending_borrow_requests()?;
    let mut result = Vec::with_capacity(pending.len());
    for request in pending {
        let user = db.get_user(request.user_id)?;
        let summary = db.get_book_summary(request.book_id)?;
        result.push(AdminBorrowRequest {
            id: request.id,
            user_id: request.user_id,
            book_id: request.book_id,
            copy_id: request.copy_id,
            status: request.status,
            due_date: request.due_date,
            created_at: request.created_at,
            decided_at: request.decided_at,
            admin_id: request.admin_id,
            admin_comment: request.admin_comment,
            user: UserInfo::from_user(&user),
            book: BookInfo::from_summary(&summary, true),
        });
    }
    Ok(Json(result))
}

/// Pending donation requests, oldest first.
async fn list_pending_donations(
    State(state): State<AppState>,
    Authed(actor): Authed,
) -> Result<Json<Vec<AdminDonationRequest>>, ApiError> {
    require_admin(&actor)?;
    let db = state.lending.database().map_err(ApiError::from)?;

    let pending = db.pending_donation_requests()?;
    let mut result = Vec::with_capacity(pending.len());
    for request in pending {
        let user = db.get_user(request.user_id)?;
        let summary = db.get_book_summary(request.book_id)?;
        result.push(AdminDonationRequest {
            id: request.id,
            user_id: request.user_id,
            book_id: request.book_id,
            status: request.status,
            created_at: request.created_at,
            decided_at: request.decided_at,
            admin_id: request.admin_id,
            admin_comment: request.admin_comment,
            user: UserInfo::from_user(&user),
            book: BookInfo::from_summary(&summary, true),
        });
    }
    Ok(Json(result))
}

async fn approve_borrow(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Authed(actor): Authed,
    Json(input): Json<AdminActionInput>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .lending
        .approve(&actor, RequestKind::Borrow, id, input.comment)?;
    Ok(Json(MessageResponse {
        message: "Borrow request approved.",
    }))
}

async fn reject_borrow(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Authed(actor): Authed,
    Json(input): Json<AdminActionInput>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .lending
        .reject(&actor, RequestKind::Borrow, id, input.comment)?;
    Ok(Json(MessageResponse {
        message: "Borrow request rejected.",
    }))
}

async fn approve_donation(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Authed(actor): Authed,
    Json(input): Json<AdminActionInput>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .lending
        .approve(&actor, RequestKind::Donation, id, input.comment)?;
    Ok(Json(MessageResponse {
        message: "Donation approved and new copy added.",
    }))
}

async fn reject_donation(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Authed(actor): Authed,
    Json(input): Json<AdminActionInput>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .lending
        .reject(&actor, RequestKind::Donation, id, input.comment)?;
    Ok(Json(MessageResponse {
        message: "Donation rejected.",
    }))
}
