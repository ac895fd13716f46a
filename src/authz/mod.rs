//! The capability engine and its supporting policies.
//!
//! This module is pure domain logic with a narrow call contract: it
//! consumes actor and target snapshots plus a declarative permission table,
//! and produces a capability set and a list of denial reasons. It owns no
//! persisted state, performs no I/O, and is safe to call concurrently from
//! any number of request-handling tasks.
//!
//! # Components
//!
//! - [`PermissionTable`]: role to `resource:action` grants, fails closed
//! - [`PlatformRole`]: the admin > manager > member hierarchy and which
//!   roles each may assign
//! - [`OrgScope`]: which organizations an actor may operate within
//! - [`evaluate`] / [`compute_capabilities`]: the decision point combining
//!   all of the above with the self-action ceiling and the rank/scope gate

mod capability;
mod denial;
mod permissions;
mod role;
mod scope;
mod types;

pub use capability::{
    check_role_assignment, compute_capabilities, evaluate, Capabilities, CapabilityResult,
    Evaluation,
};
pub use denial::Denial;
pub use permissions::{AdminAction, PermissionTable, PermissionTableBuilder};
pub use role::{OrgRole, ParseRoleError, PlatformRole};
pub use scope::{is_target_in_scope, require_active_organization, OrgScope};
pub use types::{Actor, Membership, Target};
