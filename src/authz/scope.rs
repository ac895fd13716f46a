//! Organization scope resolution.
//!
//! Computes the set of organizations an actor may operate within. Admins
//! are unrestricted, managers are confined to their session's active
//! organization, members have no administrative scope at all.

use super::denial::Denial;
use super::role::PlatformRole;
use super::types::{Actor, Target};

/// The organizations an actor may act within.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OrgScope {
    /// Matches any organization (admin actors).
    Unrestricted,
    /// Exactly the manager's active organization.
    Single(String),
    /// No organization passes (members, or managers without an active
    /// organization).
    Empty,
}

impl OrgScope {
    /// Resolve the scope for an actor.
    #[must_use]
    pub fn resolve(actor: &Actor) -> Self {
        match actor.role {
            PlatformRole::Admin => Self::Unrestricted,
            PlatformRole::Manager => actor
                .active_org
                .clone()
                .map_or(Self::Empty, Self::Single),
            PlatformRole::Member => Self::Empty,
        }
    }

    /// Check whether an organization id falls inside this scope.
    #[must_use]
    pub fn contains(&self, org_id: &str) -> bool {
        match self {
            Self::Unrestricted => true,
            Self::Single(id) => id == org_id,
            Self::Empty => false,
        }
    }

    /// Check whether a target has a membership inside this scope.
    #[must_use]
    pub fn allows(&self, target: &Target) -> bool {
        match self {
            Self::Unrestricted => true,
            Self::Single(id) => target.is_member_of(id),
            Self::Empty => false,
        }
    }
}

/// Check whether the target falls inside the actor's organization scope.
#[must_use]
pub fn is_target_in_scope(actor: &Actor, target: &Target) -> bool {
    OrgScope::resolve(actor).allows(target)
}

/// Require a manager actor to have an active organization.
///
/// Admins pass trivially (their scope is unrestricted and carries no single
/// organization). Members and managers without an active organization fail
/// closed.
pub fn require_active_organization(actor: &Actor) -> Result<(), Denial> {
    match actor.role {
        PlatformRole::Admin => Ok(()),
        PlatformRole::Manager if actor.active_org.is_some() => Ok(()),
        _ => Err(Denial::NoActiveOrganization),
    }
}
