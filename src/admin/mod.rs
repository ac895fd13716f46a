//! Admin console enforcement and HTTP surface.
//!
//! The pieces that sit between the capability engine in [`crate::authz`]
//! and the outside world:
//!
//! - [`AdminDirectory`]: the storage seam applications implement - target
//!   facts in, guarded mutations out
//! - [`Enforcer`]: loads target facts, runs the engine, and applies or
//!   denies - the only consumer the surrounding CRUD handlers need
//! - [`router`]: axum routes for the capability query and every mutation
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use quarterdeck::admin::{router, AdminState};
//! use quarterdeck::auth::Impersonations;
//!
//! let state = AdminState::new(my_directory, Impersonations::with_defaults(my_swap_store));
//! let app = axum::Router::new().nest("/admin", router(state));
//! ```

mod directory;
mod enforcement;
mod routes;
mod types;

pub use directory::{AdminDirectory, AdminMutation, DirectoryError};
pub use enforcement::{Enforcer, EnforcementError};
pub use routes::{router, AdminState, CurrentActor};
pub use types::{
    AdminAuditEntry, ImpersonateRequest, SetPasswordRequest, SetRoleRequest, UpdateUser,
};

#[cfg(any(test, feature = "test-support"))]
pub use directory::test::{InMemoryDirectory, UserRecord};
