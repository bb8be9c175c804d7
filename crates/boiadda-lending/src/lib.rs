//! # boiadda-lending
//!
//! The borrow/donate request lifecycle for the BoiAdda library.
//!
//! The [`Lending`] service owns the database handle and is the single writer
//! for requests, inventory, and notifications.  Members create requests,
//! admins approve or reject them exactly once, approved loans are returned by
//! their borrower.  The caller's identity is always passed in explicitly as
//! an [`Actor`]; this crate performs no authentication of its own.

pub mod identity;
pub mod notify;
pub mod service;

mod error;

pub use error::LendingError;
pub use identity::Actor;
pub use service::{Lending, NewDonation, DEFAULT_LOAN_PERIOD_DAYS};
