use boiadda_store::StoreError;
use thiserror::Error;

/// Outcomes of a workflow operation that the caller must surface distinctly.
#[derive(Error, Debug)]
pub enum LendingError {
    /// The referenced request, book, copy, or notification does not exist.
    #[error("Record not found")]
    NotFound,

    /// Role or ownership check failed.
    #[error("Not allowed: {0}")]
    Forbidden(String),

    /// The request already left the pending state (or the loan is no longer
    /// active); the transition is rejected, never silently ignored.
    #[error("Request already handled")]
    InvalidState,

    /// Every copy of the book is off the shelf.
    #[error("No available copy of this book")]
    BookUnavailable,

    /// Malformed input, e.g. a donation without title or author.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// The user already holds this book or already has a pending request
    /// for it.
    #[error("{0}")]
    Duplicate(String),

    /// The store mutex was poisoned by a panic in another thread.
    #[error("Store lock poisoned")]
    LockPoisoned,

    /// Underlying store failure.
    #[error("Store error: {0}")]
    Store(#[source] StoreError),
}

impl From<StoreError> for LendingError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => LendingError::NotFound,
            other => LendingError::Store(other),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, LendingError>;
