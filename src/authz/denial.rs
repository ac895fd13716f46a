//! Policy denial taxonomy.
//!
//! These are policy decisions, not transient failures: deterministic,
//! side-effect-free, never retried. They feed internal audit logs only;
//! callers surface every denial as a uniform "action not available".

use thiserror::Error;

use super::role::PlatformRole;

/// Why a structural gate refused an action.
///
/// A plain permission-table miss produces `false` capability flags with no
/// denial entry; the taxonomy covers the structural gates.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Denial {
    /// A manager actor has no active organization; every scoped check
    /// fails closed.
    #[error("manager has no active organization")]
    NoActiveOrganization,

    /// The target's rank is not strictly below the actor's.
    #[error("target rank is not below actor rank")]
    InsufficientRank,

    /// The target has no membership in the manager's active organization.
    #[error("target is outside the actor's active organization")]
    OutOfScope,

    /// The requested new role violates the assignability hierarchy.
    #[error("role '{requested}' cannot be assigned by a {actor_role}")]
    RoleNotAssignable {
        /// Role of the actor attempting the assignment.
        actor_role: PlatformRole,
        /// The requested destination role.
        requested: PlatformRole,
    },

    /// The mutation would leave an organization without any admin-role
    /// member.
    #[error("organization '{org_id}' would be left without an admin")]
    LastAdminProtected {
        /// The organization that would lose its last admin.
        org_id: String,
    },

    /// The actor attempted a forbidden action on their own account.
    #[error("action is not available on the actor's own account")]
    SelfActionRestricted,
}

impl Denial {
    /// Stable kind label for audit log fields.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NoActiveOrganization => "no_active_organization",
            Self::InsufficientRank => "insufficient_rank",
            Self::OutOfScope => "out_of_scope",
            Self::RoleNotAssignable { .. } => "role_not_assignable",
            Self::LastAdminProtected { .. } => "last_admin_protected",
            Self::SelfActionRestricted => "self_action_restricted",
        }
    }
}
