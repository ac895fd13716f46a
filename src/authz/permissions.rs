//! Base permission table.
//!
//! A static mapping from role to the set of `resource:action` grants it
//! holds. Lookups are pure and fail closed: an unknown role, resource, or
//! action is simply not granted, never an error.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use super::role::PlatformRole;

/// Administrative actions the capability engine decides on.
///
/// Each maps to one `resource:action` grant in the permission table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AdminAction {
    /// Edit the target's profile fields.
    Update,
    /// Change the target's platform role.
    SetRole,
    /// Ban the target from the platform.
    Ban,
    /// Lift a ban.
    Unban,
    /// Set a new password for the target.
    SetPassword,
    /// Delete the target's account.
    Remove,
    /// Revoke all of the target's sessions.
    RevokeSessions,
    /// Act as the target.
    Impersonate,
}

impl AdminAction {
    /// Every action, in wire order.
    pub const ALL: [AdminAction; 8] = [
        Self::Update,
        Self::SetRole,
        Self::Ban,
        Self::Unban,
        Self::SetPassword,
        Self::Remove,
        Self::RevokeSessions,
        Self::Impersonate,
    ];

    /// The `(resource, action)` pair this maps to in the permission table.
    #[must_use]
    pub fn permission(&self) -> (&'static str, &'static str) {
        match self {
            Self::Update => ("users", "update"),
            Self::SetRole => ("users", "set-role"),
            Self::Ban => ("users", "ban"),
            Self::Unban => ("users", "unban"),
            Self::SetPassword => ("users", "set-password"),
            Self::Remove => ("users", "delete"),
            Self::RevokeSessions => ("sessions", "revoke"),
            Self::Impersonate => ("sessions", "impersonate"),
        }
    }

    /// The `resource:action` key for this action.
    #[must_use]
    pub fn key(&self) -> String {
        let (resource, action) = self.permission();
        format!("{resource}:{action}")
    }
}

/// Static role-to-grants table.
///
/// Loaded once and consumed read-only by the capability engine. Role
/// management CRUD mutates it through its own surface, itself gated by this
/// same engine via the `rbac:manage` grant.
///
/// # Example
///
/// ```rust
/// use quarterdeck::authz::{PermissionTable, PlatformRole};
///
/// let table = PermissionTable::default();
/// assert!(table.grants(PlatformRole::Admin, "users", "set-role"));
/// assert!(!table.grants(PlatformRole::Manager, "users", "set-role"));
/// assert!(!table.grants(PlatformRole::Member, "users", "update"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PermissionTable {
    grants: HashMap<PlatformRole, BTreeSet<String>>,
}

impl PermissionTable {
    /// Start building a custom table.
    #[must_use]
    pub fn builder() -> PermissionTableBuilder {
        PermissionTableBuilder {
            grants: HashMap::new(),
        }
    }

    /// Check whether `role` holds the `resource:action` grant.
    ///
    /// Fails closed: anything not present in the table is not granted.
    #[must_use]
    pub fn grants(&self, role: PlatformRole, resource: &str, action: &str) -> bool {
        self.grants
            .get(&role)
            .is_some_and(|set| set.contains(&format!("{resource}:{action}")))
    }

    /// Check whether `role` holds the grant backing an admin action.
    #[must_use]
    pub fn grants_action(&self, role: PlatformRole, action: AdminAction) -> bool {
        let (resource, act) = action.permission();
        self.grants(role, resource, act)
    }

    /// The grouped `resource:action` set for a role, for UI display.
    #[must_use]
    pub fn permissions_for(&self, role: PlatformRole) -> BTreeSet<String> {
        self.grants.get(&role).cloned().unwrap_or_default()
    }
}

impl Default for PermissionTable {
    /// The documented platform matrix.
    ///
    /// Admins hold every administrative grant plus `rbac:manage`; managers
    /// hold update and ban/unban over users; members hold nothing.
    fn default() -> Self {
        let mut builder = Self::builder();
        for action in AdminAction::ALL {
            builder = builder.grant_action(PlatformRole::Admin, action);
        }
        builder
            .grant(PlatformRole::Admin, "rbac", "manage")
            .grant_action(PlatformRole::Manager, AdminAction::Update)
            .grant_action(PlatformRole::Manager, AdminAction::Ban)
            .grant_action(PlatformRole::Manager, AdminAction::Unban)
            .build()
    }
}

/// Builder for [`PermissionTable`].
pub struct PermissionTableBuilder {
    grants: HashMap<PlatformRole, BTreeSet<String>>,
}

impl PermissionTableBuilder {
    /// Grant `resource:action` to a role.
    ///
    /// Grants are a set; repeating an entry is a no-op.
    #[must_use]
    pub fn grant(mut self, role: PlatformRole, resource: &str, action: &str) -> Self {
        self.grants
            .entry(role)
            .or_default()
            .insert(format!("{resource}:{action}"));
        self
    }

    /// Grant the permission backing an admin action to a role.
    #[must_use]
    pub fn grant_action(self, role: PlatformRole, action: AdminAction) -> Self {
        let (resource, act) = action.permission();
        self.grant(role, resource, act)
    }

    /// Finish building the table.
    #[must_use]
    pub fn build(self) -> PermissionTable {
        PermissionTable {
            grants: self.grants,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matrix_admin() {
        let table = PermissionTable::default();
        for action in AdminAction::ALL {
            assert!(
                table.grants_action(PlatformRole::Admin, action),
                "admin should hold {}",
                action.key()
            );
        }
        assert!(table.grants(PlatformRole::Admin, "rbac", "manage"));
    }

    #[test]
    fn test_default_matrix_manager() {
        let table = PermissionTable::default();
        assert!(table.grants_action(PlatformRole::Manager, AdminAction::Update));
        assert!(table.grants_action(PlatformRole::Manager, AdminAction::Ban));
        assert!(table.grants_action(PlatformRole::Manager, AdminAction::Unban));

        assert!(!table.grants_action(PlatformRole::Manager, AdminAction::SetRole));
        assert!(!table.grants_action(PlatformRole::Manager, AdminAction::SetPassword));
        assert!(!table.grants_action(PlatformRole::Manager, AdminAction::Remove));
        assert!(!table.grants_action(PlatformRole::Manager, AdminAction::RevokeSessions));
        assert!(!table.grants_action(PlatformRole::Manager, AdminAction::Impersonate));
    }

    #[test]
    fn test_default_matrix_member() {
        let table = PermissionTable::default();
        assert!(table.permissions_for(PlatformRole::Member).is_empty());
    }

    #[test]
    fn test_fails_closed_on_unknown_permission() {
        let table = PermissionTable::default();
        assert!(!table.grants(PlatformRole::Admin, "users", "teleport"));
        assert!(!table.grants(PlatformRole::Admin, "billing", "refund"));
    }

    #[test]
    fn test_entries_are_unique() {
        let table = PermissionTable::builder()
            .grant(PlatformRole::Manager, "users", "ban")
            .grant(PlatformRole::Manager, "users", "ban")
            .build();
        assert_eq!(table.permissions_for(PlatformRole::Manager).len(), 1);
    }

    #[test]
    fn test_permissions_for_display() {
        let table = PermissionTable::default();
        let perms = table.permissions_for(PlatformRole::Manager);
        assert_eq!(
            perms.into_iter().collect::<Vec<_>>(),
            vec!["users:ban", "users:unban", "users:update"]
        );
    }

    #[test]
    fn test_action_wire_names() {
        let json = serde_json::to_string(&AdminAction::SetRole).unwrap();
        assert_eq!(json, "\"setRole\"");
        let json = serde_json::to_string(&AdminAction::RevokeSessions).unwrap();
        assert_eq!(json, "\"revokeSessions\"");
    }
}
