//! Caller identity.
//!
//! The auth layer (whatever it is -- the HTTP server resolves bearer
//! sessions, tests construct values directly) asserts who is calling and
//! passes an [`Actor`] into every service method.  The workflow trusts this
//! identity and never reads ambient auth state.

use boiadda_store::Role;
use serde::{Deserialize, Serialize};

/// The authenticated caller of a workflow operation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Actor {
    /// The user's id in the store.
    pub id: i64,
    pub role: Role,
}

impl Actor {
    /// An admin actor.
    pub fn admin(id: i64) -> Self {
        Self {
            id,
            role: Role::Admin,
        }
    }

    /// A regular member actor.
    pub fn member(id: i64) -> Self {
        Self {
            id,
            role: Role::User,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
