//! Password hashing and bearer-token sessions.
//!
//! Passwords are stored as `salt$digest` where `digest = SHA-256(salt || password)`
//! with a fresh 16-byte salt per user.  Session tokens are 32 random bytes,
//! hex-encoded; only their SHA-256 digest is persisted, so a leaked database
//! does not leak live tokens.

use axum::extract::{FromRequestParts, OptionalFromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use boiadda_lending::Actor;
use boiadda_store::Database;

use crate::api::AppState;
use crate::error::ApiError;

const SALT_BYTES: usize = 16;
const TOKEN_BYTES: usize = 32;

// ---------------------------------------------------------------------------
// Passwords
// ---------------------------------------------------------------------------

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_BYTES];
    rand::thread_rng().fill_bytes(&mut salt);

    let digest = salted_digest(&salt, password);
    format!("{}${}", hex::encode(salt), hex::encode(digest))
}

/// Verify a password against a stored `salt$digest` value.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt_hex, digest_hex)) = stored.split_once('$') else {
        return false;
    };
    let (Ok(salt), Ok(expected)) = (hex::decode(salt_hex), hex::decode(digest_hex)) else {
        return false;
    };

    let actual = salted_digest(&salt, password);
    actual.ct_eq(expected.as_slice()).into()
}

fn salted_digest(salt: &[u8], password: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize().into()
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

/// Generate a fresh random bearer token.
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// The digest under which a token is stored.
pub fn token_digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Create a session for a user and return the token to hand to the client.
pub fn issue_session(
    db: &Database,
    user_id: i64,
    ttl_minutes: i64,
) -> Result<(String, DateTime<Utc>), ApiError> {
    let token = generate_session_token();
    let expires_at = Utc::now() + Duration::minutes(ttl_minutes);
    db.insert_session(user_id, &token_digest(&token), expires_at)?;
    Ok((token, expires_at))
}

/// Resolve a bearer token to the acting user.
pub fn authenticate(state: &AppState, token: &str) -> Result<Actor, ApiError> {
    let db = state.lending.database().map_err(ApiError::from)?;

    let session = db
        .get_session_by_hash(&token_digest(token))?
        .ok_or(ApiError::Unauthorized)?;

    if session.expires_at < Utc::now() {
        db.delete_session(&session.token_hash)?;
        return Err(ApiError::Unauthorized);
    }

    let user = db.get_user(session.user_id)?;
    Ok(Actor {
        id: user.id,
        role: user.role,
    })
}

/// Require the actor to hold the admin role.
pub fn require_admin(actor: &Actor) -> Result<(), ApiError> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(ApiError::Lending(boiadda_lending::LendingError::Forbidden(
            "admin role required".to_string(),
        )))
    }
}

// ---------------------------------------------------------------------------
// Extractors
// ---------------------------------------------------------------------------

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

/// The authenticated caller, resolved from the `Authorization` header.
#[derive(Debug, Clone, Copy)]
pub struct Authed(pub Actor);

impl FromRequestParts<AppState> for Authed {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(ApiError::Unauthorized)?;
        authenticate(state, token).map(Authed)
    }
}

impl OptionalFromRequestParts<AppState> for Authed {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Option<Self>, Self::Rejection> {
        match bearer_token(parts) {
            None => Ok(None),
            Some(token) => authenticate(state, token).map(|actor| Some(Authed(actor))),
        }
    }
}

/// The raw bearer token, for logout.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        bearer_token(parts)
            .map(|token| BearerToken(token.to_string()))
            .ok_or(ApiError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_round_trip() {
        let stored = hash_password("Demo123456");
        assert!(verify_password("Demo123456", &stored));
        assert!(!verify_password("demo123456", &stored));
    }

    #[test]
    fn each_hash_gets_its_own_salt() {
        let a = hash_password("same-password");
        let b = hash_password("same-password");
        assert_ne!(a, b);
        assert!(verify_password("same-password", &a));
        assert!(verify_password("same-password", &b));
    }

    #[test]
    fn malformed_stored_hash_never_verifies() {
        assert!(!verify_password("whatever", "not-a-hash"));
        assert!(!verify_password("whatever", "zz$zz"));
    }

    #[test]
    fn token_digest_is_stable_and_token_is_random() {
        let token = generate_session_token();
        assert_eq!(token.len(), TOKEN_BYTES * 2);
        assert_eq!(token_digest(&token), token_digest(&token));
        assert_ne!(generate_session_token(), generate_session_token());
    }
}
