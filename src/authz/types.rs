//! Actor and target records evaluated by the capability engine.
//!
//! Both are read from the identity/data store at request time and discarded
//! after the response. The engine treats them as immutable snapshots.

use serde::{Deserialize, Serialize};

use super::role::{OrgRole, PlatformRole};

/// The authenticated caller performing an action.
///
/// When impersonation is active, the session layer substitutes the
/// impersonated identity before this record is built; the engine never
/// knows the difference.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Unique user id.
    pub id: String,
    /// Platform-wide role.
    pub role: PlatformRole,
    /// The organization a manager's session is currently scoped to.
    ///
    /// Sourced from session state, mutated only by an explicit
    /// "switch active organization" operation outside this crate.
    pub active_org: Option<String>,
}

impl Actor {
    /// Create an actor with no active organization.
    pub fn new(id: impl Into<String>, role: PlatformRole) -> Self {
        Self {
            id: id.into(),
            role,
            active_org: None,
        }
    }

    /// Set the active organization for this actor.
    #[must_use]
    pub fn with_active_org(mut self, org_id: impl Into<String>) -> Self {
        self.active_org = Some(org_id.into());
        self
    }
}

/// A single organization membership row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    /// The organization this row belongs to.
    pub org_id: String,
    /// Role held within that organization.
    pub org_role: OrgRole,
}

impl Membership {
    /// Create a membership row.
    pub fn new(org_id: impl Into<String>, org_role: OrgRole) -> Self {
        Self {
            org_id: org_id.into(),
            org_role,
        }
    }
}

/// The user an action is performed on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Unique user id.
    pub id: String,
    /// Platform-wide role.
    pub role: PlatformRole,
    /// Organization memberships, zero or more.
    #[serde(default)]
    pub memberships: Vec<Membership>,
}

impl Target {
    /// Create a target with no memberships.
    pub fn new(id: impl Into<String>, role: PlatformRole) -> Self {
        Self {
            id: id.into(),
            role,
            memberships: Vec::new(),
        }
    }

    /// Add a membership row.
    #[must_use]
    pub fn with_membership(mut self, org_id: impl Into<String>, org_role: OrgRole) -> Self {
        self.memberships.push(Membership::new(org_id, org_role));
        self
    }

    /// Check whether this user belongs to the given organization.
    #[must_use]
    pub fn is_member_of(&self, org_id: &str) -> bool {
        self.memberships.iter().any(|m| m.org_id == org_id)
    }

    /// Ids of every organization this user belongs to.
    pub fn org_ids(&self) -> Vec<String> {
        self.memberships.iter().map(|m| m.org_id.clone()).collect()
    }
}
