//! Registration, login, and session management.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use boiadda_store::{NewUser, Role};

use crate::api::AppState;
use crate::auth::{self, Authed, BearerToken};
use crate::error::ApiError;
use crate::routes::UserInfo;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
}

#[derive(Deserialize)]
struct RegisterInput {
    name: String,
    email: String,
    phone: Option<String>,
    password: String,
}

#[derive(Deserialize)]
struct LoginInput {
    email: String,
    password: String,
}

#[derive(Serialize)]
struct AuthResponse {
    access_token: String,
    token_type: &'static str,
    user: UserInfo,
    expires_in: i64,
}

#[derive(Serialize)]
struct AuthUser {
    id: i64,
    name: String,
    email: String,
    phone: Option<String>,
    role_name: &'static str,
    created_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct MessageResponse {
    message: &'static str,
}

async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterInput>,
) -> Result<Json<AuthResponse>, ApiError> {
    let name = input.name.trim();
    let email = input.email.trim();
    if name.is_empty() || email.is_empty() || input.password.is_empty() {
        return Err(ApiError::BadRequest(
            "name, email and password are required".to_string(),
        ));
    }

    let password_hash = auth::hash_password(&input.password);
    let phone = input
        .phone
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string);

    let (user, token, expires_in) = {
        let db = state.lending.database().map_err(ApiError::from)?;

        if db.get_user_by_email(email)?.is_some() {
            return Err(ApiError::BadRequest("Email already registered".to_string()));
        }
        if let Some(phone) = phone.as_deref() {
            if db.get_user_by_phone(phone)?.is_some() {
                return Err(ApiError::BadRequest(
                    "Phone number already registered".to_string(),
                ));
            }
        }

        let user = db.create_user(&NewUser {
            name: name.to_string(),
            email: email.to_string(),
            phone,
            password_hash,
            role: Role::User,
        })?;

        let (token, _) = auth::issue_session(&db, user.id, state.config.session_ttl_minutes)?;
        (user, token, state.config.session_ttl_minutes * 60)
    };

    info!(user_id = user.id, "new member registered");

    Ok(Json(AuthResponse {
        access_token: token,
        token_type: "bearer",
        user: UserInfo::from_user(&user),
        expires_in,
    }))
}

async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginInput>,
) -> Result<Json<AuthResponse>, ApiError> {
    let (user, token, expires_in) = {
        let db = state.lending.database().map_err(ApiError::from)?;

        let user = db
            .get_user_by_email(input.email.trim())?
            .ok_or(ApiError::InvalidCredentials)?;

        if !auth::verify_password(&input.password, &user.password_hash) {
            return Err(ApiError::InvalidCredentials);
        }

        let (token, _) = auth::issue_session(&db, user.id, state.config.session_ttl_minutes)?;
        (user, token, state.config.session_ttl_minutes * 60)
    };

    info!(user_id = user.id, "member logged in");

    Ok(Json(AuthResponse {
        access_token: token,
        token_type: "bearer",
        user: UserInfo::from_user(&user),
        expires_in,
    }))
}

async fn logout(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> Result<Json<MessageResponse>, ApiError> {
    let db = state.lending.database().map_err(ApiError::from)?;
    db.delete_session(&auth::token_digest(&token))?;
    Ok(Json(MessageResponse {
        message: "Logged out successfully",
    }))
}

async fn me(
    State(state): State<AppState>,
    Authed(actor): Authed,
) -> Result<Json<AuthUser>, ApiError> {
    let user = state
        .lending
        .database()
        .map_err(ApiError::from)?
        .get_user(actor.id)?;

    Ok(Json(AuthUser {
        id: user.id,
        name: user.name.clone(),
        email: user.email.clone(),
        phone: user.phone.clone(),
        role_name: user.role.as_str(),
        created_at: user.created_at,
    }))
}
