use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use boiadda_lending::LendingError;
use boiadda_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Lending(#[from] LendingError),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Service not ready")]
    NotReady,
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError::Lending(LendingError::from(e))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Lending(e) => match e {
                LendingError::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
                LendingError::Forbidden(_) => (StatusCode::FORBIDDEN, self.to_string()),
                LendingError::InvalidState => (StatusCode::CONFLICT, self.to_string()),
                LendingError::BookUnavailable => (StatusCode::CONFLICT, self.to_string()),
                LendingError::Validation(_) => (StatusCode::BAD_REQUEST, self.to_string()),
                LendingError::Duplicate(_) => (StatusCode::BAD_REQUEST, self.to_string()),
                LendingError::LockPoisoned | LendingError::Store(_) => {
                    tracing::error!(error = %e, "store failure");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Internal server error".to_string(),
                    )
                }
            },
            ApiError::InvalidCredentials => (StatusCode::UNAUTHORIZED, self.to_string()),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::NotReady => (StatusCode::SERVICE_UNAVAILABLE, self.to_string()),
        };

        let body = serde_json::json!({
            "error": message,
        });

        (status, axum::Json(body)).into_response()
    }
}
