//! Platform roles and the hierarchy policy.
//!
//! Two ordered relations live here: the total rank order used to decide
//! whether an actor may act on a target at all, and the assignability
//! relation used when changing a target's role.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Platform-wide role of a user.
///
/// # Example
///
/// ```rust
/// use quarterdeck::authz::PlatformRole;
///
/// assert!(PlatformRole::Admin.outranks(PlatformRole::Manager));
/// assert!(!PlatformRole::Manager.can_assign(PlatformRole::Admin));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformRole {
    /// Platform administrator, unrestricted organization scope.
    Admin,
    /// Organization manager, confined to their active organization.
    Manager,
    /// Regular member with no administrative reach.
    #[default]
    Member,
}

impl PlatformRole {
    /// Get the string representation of the role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::Member => "member",
        }
    }

    /// Get the hierarchy rank (higher = more privileged).
    #[must_use]
    pub fn rank(&self) -> u8 {
        match self {
            Self::Admin => 2,
            Self::Manager => 1,
            Self::Member => 0,
        }
    }

    /// Check whether this role sits strictly above another in the hierarchy.
    ///
    /// Strictly above, not equal: an admin does not outrank another admin,
    /// and a manager does not outrank another manager. Equal-rank pairs are
    /// always denied administrative actions on each other.
    #[must_use]
    pub fn outranks(&self, other: PlatformRole) -> bool {
        self.rank() > other.rank()
    }

    /// Check whether this role may assign `target` as a new role.
    ///
    /// Admins may assign any role. Managers may assign manager or member,
    /// never admin. Members may assign nothing.
    #[must_use]
    pub fn can_assign(&self, target: PlatformRole) -> bool {
        match self {
            Self::Admin => true,
            Self::Manager => matches!(target, Self::Manager | Self::Member),
            Self::Member => false,
        }
    }
}

/// Error returned when parsing a role string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRoleError {
    invalid_value: String,
}

impl fmt::Display for ParseRoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid role: '{}' (expected: admin, manager, or member)",
            self.invalid_value
        )
    }
}

impl std::error::Error for ParseRoleError {}

impl FromStr for PlatformRole {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "manager" => Ok(Self::Manager),
            "member" => Ok(Self::Member),
            _ => Err(ParseRoleError {
                invalid_value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for PlatformRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Role a user holds inside a single organization.
///
/// Membership rows carry this alongside the organization id; the platform
/// role above stays global.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrgRole {
    /// Manages the organization's members.
    Manager,
    /// Regular organization member.
    #[default]
    Member,
}

impl OrgRole {
    /// Get the string representation of the role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manager => "manager",
            Self::Member => "member",
        }
    }
}

impl FromStr for OrgRole {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "manager" => Ok(Self::Manager),
            "member" => Ok(Self::Member),
            _ => Err(ParseRoleError {
                invalid_value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for OrgRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
