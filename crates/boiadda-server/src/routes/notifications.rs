//! The caller's notifications.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use boiadda_store::Notification;

use crate::api::AppState;
use crate::auth::Authed;
use crate::error::ApiError;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(list_notifications))
        .route("/notifications/{id}/read", post(mark_read))
}

#[derive(Serialize)]
struct MessageResponse {
    message: &'static str,
}

async fn list_notifications(
    State(state): State<AppState>,
    Authed(actor): Authed,
) -> Result<Json<Vec<Notification>>, ApiError> {
    let notifications = state.lending.notifications_for(&actor)?;
    Ok(Json(notifications))
}

async fn mark_read(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Authed(actor): Authed,
) -> Result<Json<MessageResponse>, ApiError> {
    state.lending.mark_read(&actor, id)?;
    Ok(Json(MessageResponse {
        message: "Notification marked as read.",
    }))
}
