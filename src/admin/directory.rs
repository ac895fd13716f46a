//! Directory storage seam for the enforcement layer.
//!
//! Applications implement [`AdminDirectory`] over their database. The
//! enforcement adapter stays storage-agnostic: it loads target facts,
//! decides, and hands the store a single [`AdminMutation`] to apply.

use async_trait::async_trait;
use thiserror::Error;

use super::types::{AdminAuditEntry, UpdateUser};
use crate::authz::{Denial, PlatformRole, Target};

/// One administrative mutation, decided on and ready to apply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AdminMutation {
    /// Update profile fields.
    Update {
        /// The user to update.
        user_id: String,
        /// The fields to change.
        update: UpdateUser,
    },
    /// Change the platform role.
    SetRole {
        /// The user whose role changes.
        user_id: String,
        /// The new role.
        role: PlatformRole,
    },
    /// Ban from the platform.
    Ban {
        /// The user to ban.
        user_id: String,
    },
    /// Lift a ban.
    Unban {
        /// The user to unban.
        user_id: String,
    },
    /// Set a new password.
    SetPassword {
        /// The user whose password changes.
        user_id: String,
        /// The new password, forwarded to the credential collaborator.
        new_password: String,
    },
    /// Delete the account.
    Remove {
        /// The user to delete.
        user_id: String,
    },
    /// Revoke every session.
    RevokeSessions {
        /// The user whose sessions are revoked.
        user_id: String,
    },
}

impl AdminMutation {
    /// The user this mutation applies to.
    #[must_use]
    pub fn user_id(&self) -> &str {
        match self {
            Self::Update { user_id, .. }
            | Self::SetRole { user_id, .. }
            | Self::Ban { user_id }
            | Self::Unban { user_id }
            | Self::SetPassword { user_id, .. }
            | Self::Remove { user_id }
            | Self::RevokeSessions { user_id } => user_id,
        }
    }
}

/// Errors from directory operations.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// No user with the given id.
    #[error("user not found: {0}")]
    UserNotFound(String),

    /// A guarded mutation was vetoed by a policy invariant.
    #[error(transparent)]
    Denied(#[from] Denial),

    /// Database or storage failure.
    #[error("storage error: {0}")]
    Storage(String),
}

/// Trait for admin directory storage operations.
///
/// Implement this for your database layer. An organization's admins are
/// its manager-role members; [`count_org_admins`](Self::count_org_admins)
/// counts them.
///
/// # Example
///
/// ```rust,ignore
/// use quarterdeck::admin::{AdminDirectory, AdminMutation, DirectoryError};
/// use async_trait::async_trait;
///
/// struct SeaOrmDirectory { db: DatabaseConnection }
///
/// #[async_trait]
/// impl AdminDirectory for SeaOrmDirectory {
///     async fn load_target(&self, user_id: &str) -> Result<Option<Target>, DirectoryError> {
///         // Join users with their membership rows
///     }
///
///     async fn count_org_admins(&self, org_id: &str) -> Result<u32, DirectoryError> {
///         // SELECT count(*) FROM memberships JOIN users ...
///     }
///
///     async fn execute(
///         &self,
///         mutation: AdminMutation,
///         admin_floor: &[String],
///     ) -> Result<(), DirectoryError> {
///         // Run the floor checks and the mutation in one transaction
///     }
/// }
/// ```
#[async_trait]
pub trait AdminDirectory: Send + Sync {
    /// Load the target facts for a user: platform role plus organization
    /// memberships.
    async fn load_target(&self, user_id: &str) -> Result<Option<Target>, DirectoryError>;

    /// Count the admin-role (manager) members of an organization.
    async fn count_org_admins(&self, org_id: &str) -> Result<u32, DirectoryError>;

    /// Apply one mutation.
    ///
    /// When `admin_floor` is non-empty, the implementation must verify that
    /// every listed organization still has more than one admin-role member
    /// and apply the mutation under a single serializable transaction or a
    /// row-level lock on the membership rows - two concurrent demotions
    /// must not both observe a count of two and both proceed. A failed
    /// check is [`Denial::LastAdminProtected`] for the first offending
    /// organization.
    async fn execute(
        &self,
        mutation: AdminMutation,
        admin_floor: &[String],
    ) -> Result<(), DirectoryError>;

    /// Record an audit log entry.
    ///
    /// Default implementation is a no-op. Override this if your application
    /// tracks admin actions.
    async fn record_audit(&self, _entry: &AdminAuditEntry) -> Result<(), DirectoryError> {
        Ok(())
    }
}

#[async_trait]
impl AdminDirectory for std::sync::Arc<dyn AdminDirectory> {
    async fn load_target(&self, user_id: &str) -> Result<Option<Target>, DirectoryError> {
        (**self).load_target(user_id).await
    }

    async fn count_org_admins(&self, org_id: &str) -> Result<u32, DirectoryError> {
        (**self).count_org_admins(org_id).await
    }

    async fn execute(
        &self,
        mutation: AdminMutation,
        admin_floor: &[String],
    ) -> Result<(), DirectoryError> {
        (**self).execute(mutation, admin_floor).await
    }

    async fn record_audit(&self, entry: &AdminAuditEntry) -> Result<(), DirectoryError> {
        (**self).record_audit(entry).await
    }
}

/// In-memory directory for testing.
#[cfg(any(test, feature = "test-support"))]
pub mod test {
    use super::*;
    use std::collections::HashMap;
    use std::sync::RwLock;

    /// One user's state in the in-memory directory.
    #[derive(Clone, Debug)]
    pub struct UserRecord {
        /// The target facts the enforcement layer sees.
        pub target: Target,
        /// Whether the user is banned.
        pub banned: bool,
        /// The user's password, when one has been set through the console.
        pub password: Option<String>,
        /// Profile name.
        pub name: Option<String>,
        /// Profile email.
        pub email: Option<String>,
        /// How many times this user's sessions were revoked.
        pub sessions_revoked: u32,
    }

    impl UserRecord {
        fn new(target: Target) -> Self {
            Self {
                target,
                banned: false,
                password: None,
                name: None,
                email: None,
                sessions_revoked: 0,
            }
        }
    }

    /// In-memory admin directory for testing.
    ///
    /// A single lock guards all state, so the admin-floor check and the
    /// mutation are naturally atomic, matching the transactional contract
    /// of [`AdminDirectory::execute`].
    #[derive(Default)]
    pub struct InMemoryDirectory {
        users: RwLock<HashMap<String, UserRecord>>,
        audit: RwLock<Vec<AdminAuditEntry>>,
    }

    impl InMemoryDirectory {
        /// Create a new empty directory.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Add a user.
        pub fn add_user(&self, target: Target) {
            self.users
                .write()
                .unwrap()
                .insert(target.id.clone(), UserRecord::new(target));
        }

        /// Fetch a user record.
        pub fn user(&self, user_id: &str) -> Option<UserRecord> {
            self.users.read().unwrap().get(user_id).cloned()
        }

        /// Whether a user still exists.
        pub fn exists(&self, user_id: &str) -> bool {
            self.users.read().unwrap().contains_key(user_id)
        }

        /// All recorded audit entries.
        pub fn audit_entries(&self) -> Vec<AdminAuditEntry> {
            self.audit.read().unwrap().clone()
        }

        fn count_admins_locked(users: &HashMap<String, UserRecord>, org_id: &str) -> u32 {
            users
                .values()
                .filter(|r| {
                    r.target.role == PlatformRole::Manager && r.target.is_member_of(org_id)
                })
                .count() as u32
        }
    }

    #[async_trait]
    impl AdminDirectory for InMemoryDirectory {
        async fn load_target(&self, user_id: &str) -> Result<Option<Target>, DirectoryError> {
            Ok(self
                .users
                .read()
                .unwrap()
                .get(user_id)
                .map(|r| r.target.clone()))
        }

        async fn count_org_admins(&self, org_id: &str) -> Result<u32, DirectoryError> {
            Ok(Self::count_admins_locked(&self.users.read().unwrap(), org_id))
        }

        async fn execute(
            &self,
            mutation: AdminMutation,
            admin_floor: &[String],
        ) -> Result<(), DirectoryError> {
            // One write lock across the floor check and the mutation keeps
            // the pair atomic.
            let mut users = self.users.write().unwrap();

            for org_id in admin_floor {
                if Self::count_admins_locked(&users, org_id) <= 1 {
                    return Err(Denial::LastAdminProtected {
                        org_id: org_id.clone(),
                    }
                    .into());
                }
            }

            let user_id = mutation.user_id().to_string();

            if matches!(mutation, AdminMutation::Remove { .. }) {
                users
                    .remove(&user_id)
                    .ok_or_else(|| DirectoryError::UserNotFound(user_id.clone()))?;
                return Ok(());
            }

            let record = users
                .get_mut(&user_id)
                .ok_or_else(|| DirectoryError::UserNotFound(user_id.clone()))?;

            match mutation {
                AdminMutation::Update { update, .. } => {
                    if let Some(name) = update.name {
                        record.name = Some(name);
                    }
                    if let Some(email) = update.email {
                        record.email = Some(email);
                    }
                }
                AdminMutation::SetRole { role, .. } => {
                    record.target.role = role;
                }
                AdminMutation::Ban { .. } => {
                    record.banned = true;
                }
                AdminMutation::Unban { .. } => {
                    record.banned = false;
                }
                AdminMutation::SetPassword { new_password, .. } => {
                    record.password = Some(new_password);
                }
                AdminMutation::RevokeSessions { .. } => {
                    record.sessions_revoked += 1;
                }
                AdminMutation::Remove { .. } => unreachable!("handled above"),
            }

            Ok(())
        }

        async fn record_audit(&self, entry: &AdminAuditEntry) -> Result<(), DirectoryError> {
            self.audit.write().unwrap().push(entry.clone());
            Ok(())
        }
    }
}
