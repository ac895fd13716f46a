//! Shared fixtures: an in-memory directory and swap store implementing the
//! storage traits from outside the crate, plus the seeded platform the
//! tests run against.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use quarterdeck::admin::{AdminAuditEntry, AdminDirectory, AdminMutation, DirectoryError};
use quarterdeck::auth::{ImpersonationError, ImpersonationStore, ImpersonationSwap};
use quarterdeck::authz::{Actor, Denial, OrgRole, PlatformRole, Target};

/// One user's state.
#[derive(Clone, Debug)]
pub struct UserRecord {
    pub target: Target,
    pub banned: bool,
    pub password: Option<String>,
    pub sessions_revoked: u32,
}

/// In-memory admin directory backed by a single lock, so the admin-floor
/// check and the mutation are atomic.
#[derive(Default)]
pub struct TestDirectory {
    users: RwLock<HashMap<String, UserRecord>>,
    audit: RwLock<Vec<AdminAuditEntry>>,
}

impl TestDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, target: Target) {
        self.users.write().unwrap().insert(
            target.id.clone(),
            UserRecord {
                target,
                banned: false,
                password: None,
                sessions_revoked: 0,
            },
        );
    }

    pub fn user(&self, user_id: &str) -> Option<UserRecord> {
        self.users.read().unwrap().get(user_id).cloned()
    }

    pub fn exists(&self, user_id: &str) -> bool {
        self.users.read().unwrap().contains_key(user_id)
    }

    pub fn audit_entries(&self) -> Vec<AdminAuditEntry> {
        self.audit.read().unwrap().clone()
    }

    fn count_admins_locked(users: &HashMap<String, UserRecord>, org_id: &str) -> u32 {
        users
            .values()
            .filter(|r| r.target.role == PlatformRole::Manager && r.target.is_member_of(org_id))
            .count() as u32
    }
}

#[async_trait]
impl AdminDirectory for TestDirectory {
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
            AdminMutation::Update { .. } => {}
            AdminMutation::SetRole { role, .. } => record.target.role = role,
            AdminMutation::Ban { .. } => record.banned = true,
            AdminMutation::Unban { .. } => record.banned = false,
            AdminMutation::SetPassword { new_password, .. } => {
                record.password = Some(new_password);
            }
            AdminMutation::RevokeSessions { .. } => record.sessions_revoked += 1,
            AdminMutation::Remove { .. } => unreachable!("handled above"),
        }

        Ok(())
    }

    async fn record_audit(&self, entry: &AdminAuditEntry) -> Result<(), DirectoryError> {
        self.audit.write().unwrap().push(entry.clone());
        Ok(())
    }
}

/// In-memory impersonation swap store.
#[derive(Default)]
pub struct TestSwapStore {
    swaps: RwLock<HashMap<String, ImpersonationSwap>>,
}

impl TestSwapStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ImpersonationStore for TestSwapStore {
    async fn put(&self, swap: &ImpersonationSwap) -> Result<(), ImpersonationError> {
        self.swaps
            .write()
            .unwrap()
            .insert(swap.original_actor_id.clone(), swap.clone());
        Ok(())
    }

    async fn get(
        &self,
        original_actor_id: &str,
    ) -> Result<Option<ImpersonationSwap>, ImpersonationError> {
        Ok(self.swaps.read().unwrap().get(original_actor_id).cloned())
    }

    async fn take(
        &self,
        original_actor_id: &str,
    ) -> Result<Option<ImpersonationSwap>, ImpersonationError> {
        Ok(self.swaps.write().unwrap().remove(original_actor_id))
    }
}

/// The platform every test runs against.
///
/// Organization `org_a` keeps two admin-role members (`mgr_1`, `mgr_2`) so
/// the last-admin floor stays open unless a test removes one.
pub fn seeded_directory() -> TestDirectory {
    let dir = TestDirectory::new();
    dir.add_user(Target::new("admin_1", PlatformRole::Admin));
    dir.add_user(Target::new("admin_2", PlatformRole::Admin));
    dir.add_user(
        Target::new("mgr_1", PlatformRole::Manager).with_membership("org_a", OrgRole::Manager),
    );
    dir.add_user(
        Target::new("mgr_2", PlatformRole::Manager).with_membership("org_a", OrgRole::Manager),
    );
    dir.add_user(
        Target::new("member_a", PlatformRole::Member).with_membership("org_a", OrgRole::Member),
    );
    dir.add_user(
        Target::new("member_b", PlatformRole::Member).with_membership("org_b", OrgRole::Member),
    );
    dir
}

pub fn seeded_directory_arc() -> Arc<dyn AdminDirectory> {
    Arc::new(seeded_directory())
}

pub fn swap_store_arc() -> Arc<dyn ImpersonationStore> {
    Arc::new(TestSwapStore::new())
}

pub fn admin_actor() -> Actor {
    Actor::new("admin_1", PlatformRole::Admin)
}

pub fn manager_actor() -> Actor {
    Actor::new("mgr_1", PlatformRole::Manager).with_active_org("org_a")
}

pub fn member_actor() -> Actor {
    Actor::new("member_a", PlatformRole::Member)
}
