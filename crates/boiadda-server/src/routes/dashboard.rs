//! Dashboard feeds: recent library activity and per-user statistics.

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use boiadda_store::RequestStatus;

use crate::api::AppState;
use crate::error::ApiError;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/recent-activities", get(recent_activities))
        .route("/users/{user_id}/statistics", get(user_statistics))
}

const MAX_ACTIVITY_LIMIT: u32 = 50;

#[derive(Deserialize)]
struct ActivityQuery {
    limit: Option<u32>,
}

#[derive(Serialize)]
struct RecentActivity {
    id: String,
    #[serde(rename = "type")]
    kind: &'static str,
    description: String,
    timestamp: DateTime<Utc>,
    user_name: Option<String>,
    book_title: Option<String>,
}

/// Recent borrows, donations, returns and new members, merged newest first.
async fn recent_activities(
    State(state): State<AppState>,
    Query(query): Query<ActivityQuery>,
) -> Result<Json<Vec<RecentActivity>>, ApiError> {
    let limit = query.limit.unwrap_or(10).min(MAX_ACTIVITY_LIMIT);
    let db = state.lending.database().map_err(ApiError::from)?;

    let mut activities = Vec::new();

    for loan in db.recent_approved_borrows(limit / 2)? {
        let user = db.get_user(loan.user_id)?;
        let book = db.get_book(loan.book_id)?;
        activities.push(RecentActivity {
            id: format!("borrow_{}", loan.id),
            kind: "borrow",
            description: format!("{} ধার নিয়েছেন \"{}\"", user.name, book.title),
            timestamp: loan.decided_at.unwrap_or(loan.created_at),
            user_name: Some(user.name),
            book_title: Some(book.title),
        });
    }

    for donation in db.recent_approved_donations(limit / 2)? {
        let user = db.get_user(donation.user_id)?;
        let book = db.get_book(donation.book_id)?;
        activities.push(RecentActivity {
            id: format!("donation_{}", donation.id),
            kind: "donation",
            description: format!("{} দান করেছেন \"{}\"", user.name, book.title),
            timestamp: donation.decided_at.unwrap_or(donation.created_at),
            user_name: Some(user.name),
            book_title: Some(book.title),
        });
    }

    for loan in db.recent_returns(limit / 4)? {
        let user = db.get_user(loan.user_id)?;
        let book = db.get_book(loan.book_id)?;
        // Only returned loans come back from the query.
        let timestamp = loan.returned_at.unwrap_or(loan.created_at);
        activities.push(RecentActivity {
            id: format!("return_{}", loan.id),
            kind: "return",
            description: format!("{} ফেরত দিয়েছেন \"{}\"", user.name, book.title),
            timestamp,
            user_name: Some(user.name),
            book_title: Some(book.title),
        });
    }

    for user in db.recent_users(limit / 4)? {
        activities.push(RecentActivity {
            id: format!("member_{}", user.id),
            kind: "member",
            description: format!("{} নতুন সদস্য হিসেবে যোগ দিয়েছেন", user.name),
            timestamp: user.created_at,
            user_name: Some(user.name),
            book_title: None,
        });
    }

    activities.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    activities.truncate(limit as usize);
    Ok(Json(activities))
}

#[derive(Serialize)]
struct UserBorrowedBook {
    id: i64,
    book_title: String,
    book_author: String,
    book_category: String,
    due_date: Option<DateTime<Utc>>,
    borrowed_date: DateTime<Utc>,
    return_date: Option<DateTime<Utc>>,
    status: &'static str,
    is_overdue: bool,
    admin_comment: Option<String>,
    book_copy_id: Option<i64>,
}

#[derive(Serialize)]
struct UserDonatedBook {
    id: i64,
    book_title: String,
    book_author: String,
    book_category: String,
    donation_date: DateTime<Utc>,
    status: &'static str,
    copies_added: u32,
    admin_comment: Option<String>,
}

#[derive(Serialize)]
struct UserStatistics {
    borrowed_books: Vec<UserBorrowedBook>,
    donated_books: Vec<UserDonatedBook>,
    total_borrowed: u32,
    total_donated: u32,
    current_borrowed: u32,
    overdue_books: u32,
    pending_borrow_requests: u32,
    pending_donation_requests: u32,
    rejected_borrow_requests: u32,
    rejected_donation_requests: u32,
}

/// Full borrow/donation history and counters for one user.
async fn user_statistics(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<UserStatistics>, ApiError> {
    let db = state.lending.database().map_err(ApiError::from)?;
    db.get_user(user_id)?;

    let now = Utc::now();
    let mut stats = UserStatistics {
        borrowed_books: Vec::new(),
        donated_books: Vec::new(),
        total_borrowed: 0,
        total_donated: 0,
        current_borrowed: 0,
        overdue_books: 0,
        pending_borrow_requests: 0,
        pending_donation_requests: 0,
        rejected_borrow_requests: 0,
        rejected_donation_requests: 0,
    };

    for request in db.borrow_requests_for_user(user_id)? {
        let book = db.get_book(request.book_id)?;
        let (status, is_overdue) = borrow_status(&request, now);

        match request.status {
            RequestStatus::Approved => {
                stats.total_borrowed += 1;
                if request.returned_at.is_none() {
                    stats.current_borrowed += 1;
                }
            }
            RequestStatus::Pending => stats.pending_borrow_requests += 1,
            RequestStatus::Rejected => stats.rejected_borrow_requests += 1,
        }
        if is_overdue {
            stats.overdue_books += 1;
        }

        stats.borrowed_books.push(UserBorrowedBook {
            id: request.id,
            book_title: book.title,
            book_author: book.author,
            book_category: book.category,
            due_date: request.due_date,
            borrowed_date: request.created_at,
            return_date: request.returned_at,
            status,
            is_overdue,
            admin_comment: request.admin_comment,
            book_copy_id: request.copy_id,
        });
    }

    for request in db.donation_requests_for_user(user_id)? {
        let book = db.get_book(request.book_id)?;
        let (status, copies_added) = match request.status {
            RequestStatus::Approved => {
                stats.total_donated += 1;
                ("Approved", 1)
            }
            RequestStatus::Pending => {
                stats.pending_donation_requests += 1;
                ("Pending", 0)
            }
            RequestStatus::Rejected => {
                stats.rejected_donation_requests += 1;
                ("Rejected", 0)
            }
        };

        stats.donated_books.push(UserDonatedBook {
            id: request.id,
            book_title: book.title,
            book_author: book.author,
            book_category: book.category,
            donation_date: request.created_at,
            status,
            copies_added,
            admin_comment: request.admin_comment,
        });
    }

    Ok(Json(stats))
}

/// The display status of a borrow request, plus its overdue flag.
fn borrow_status(
    request: &boiadda_store::BorrowRequest,
    now: DateTime<Utc>,
) -> (&'static str, bool) {
    match request.status {
        RequestStatus::Pending => ("Pending", false),
        RequestStatus::Rejected => ("Rejected", false),
        RequestStatus::Approved => {
            if request.returned_at.is_some() {
                ("Returned", false)
            } else if request.due_date.is_some_and(|due| now > due) {
                ("Overdue", true)
            } else {
                ("Current", false)
            }
        }
    }
}
