//! The enforcement adapter.
//!
//! Every mutating admin operation passes through here: load target facts,
//! run the capability engine, and deny before touching the store when the
//! action flag is false. The capability query endpoint calls the same
//! engine through [`Enforcer::capabilities`], which is what keeps the API
//! and the UI in agreement.
//!
//! Capabilities answer "is this class of action ever allowed here"; the
//! admin-floor check run by the directory answers "is this specific
//! organization state safe to mutate right now" - it can still veto a
//! mutation whose capability flag was true.
//!
//! Denials are uniform: the caller sees "action not available" whichever
//! sub-check failed. The specific kind goes to the audit log and server
//! logs only.

use thiserror::Error;

use super::directory::{AdminDirectory, AdminMutation, DirectoryError};
use super::types::{AdminAuditEntry, UpdateUser};
use crate::auth::{ImpersonationError, ImpersonationStore, ImpersonationSwap, Impersonations};
use crate::authz::{
    check_role_assignment, compute_capabilities, evaluate, Actor, AdminAction, CapabilityResult,
    Denial, PermissionTable, PlatformRole, Target,
};
use crate::error::QuarterdeckError;

/// Errors from enforcement operations.
#[derive(Debug, Error)]
pub enum EnforcementError {
    /// No user with the given id.
    #[error("target user not found: {0}")]
    TargetNotFound(String),

    /// The action was denied. Which sub-check failed is deliberately not
    /// part of this variant.
    #[error("action not available")]
    Forbidden,

    /// A request parameter was rejected before any decision was made.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Database or storage failure.
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<EnforcementError> for QuarterdeckError {
    fn from(err: EnforcementError) -> Self {
        match err {
            EnforcementError::TargetNotFound(id) => QuarterdeckError::not_found(id),
            EnforcementError::Forbidden => QuarterdeckError::forbidden("action not available"),
            EnforcementError::InvalidParameter(msg) => QuarterdeckError::bad_request(msg),
            EnforcementError::Storage(msg) => QuarterdeckError::internal(msg),
        }
    }
}

/// The enforcement adapter - guards every mutation with the capability
/// engine.
///
/// # Example
///
/// ```rust,ignore
/// use quarterdeck::admin::Enforcer;
///
/// let enforcer = Enforcer::new(my_directory);
///
/// // Deny-or-apply in one call:
/// enforcer.ban(&actor, "usr_42").await?;
///
/// // The same engine behind the capability query:
/// let caps = enforcer.capabilities(&actor, "usr_42").await?;
/// assert_eq!(caps.actions.ban, true);
/// ```
pub struct Enforcer<D: AdminDirectory> {
    table: PermissionTable,
    directory: D,
}

impl<D: AdminDirectory> Enforcer<D> {
    /// Create an enforcer with the default permission table.
    #[must_use]
    pub fn new(directory: D) -> Self {
        Self::with_table(directory, PermissionTable::default())
    }

    /// Create an enforcer with a custom permission table.
    #[must_use]
    pub fn with_table(directory: D, table: PermissionTable) -> Self {
        Self { table, directory }
    }

    /// The permission table in use.
    #[must_use]
    pub fn table(&self) -> &PermissionTable {
        &self.table
    }

    /// The underlying directory.
    #[must_use]
    pub fn directory(&self) -> &D {
        &self.directory
    }

    /// Compute the capability set for a target - the query interface the
    /// UI renders from.
    pub async fn capabilities(
        &self,
        actor: &Actor,
        target_user_id: &str,
    ) -> Result<CapabilityResult, EnforcementError> {
        let target = self.load(target_user_id).await?;
        Ok(compute_capabilities(&self.table, actor, &target))
    }

    /// Update a target's profile fields.
    pub async fn update_user(
        &self,
        actor: &Actor,
        target_id: &str,
        update: UpdateUser,
    ) -> Result<(), EnforcementError> {
        let target = self.authorize(actor, target_id, AdminAction::Update).await?;
        let mutation = AdminMutation::Update {
            user_id: target.id.clone(),
            update,
        };
        self.run(actor, &target, AdminAction::Update, mutation, Vec::new())
            .await
    }

    /// Change a target's platform role.
    ///
    /// The capability flag only knows the target's current role, so the
    /// assignability of the requested destination role is checked again
    /// here. Demoting an organization's last admin-role member is vetoed
    /// by the floor check.
    pub async fn set_role(
        &self,
        actor: &Actor,
        target_id: &str,
        new_role: PlatformRole,
    ) -> Result<(), EnforcementError> {
        let target = self.authorize(actor, target_id, AdminAction::SetRole).await?;

        if let Err(denial) = check_role_assignment(actor, new_role) {
            self.deny(actor, &target.id, AdminAction::SetRole, &denial).await;
            return Err(EnforcementError::Forbidden);
        }

        let demotes_admin =
            target.role == PlatformRole::Manager && new_role.rank() < target.role.rank();
        let floor = if demotes_admin {
            target.org_ids()
        } else {
            Vec::new()
        };

        let mutation = AdminMutation::SetRole {
            user_id: target.id.clone(),
            role: new_role,
        };
        self.run(actor, &target, AdminAction::SetRole, mutation, floor)
            .await
    }

    /// Ban a target from the platform.
    pub async fn ban(&self, actor: &Actor, target_id: &str) -> Result<(), EnforcementError> {
        let target = self.authorize(actor, target_id, AdminAction::Ban).await?;
        let floor = admin_floor_for(&target);
        let mutation = AdminMutation::Ban {
            user_id: target.id.clone(),
        };
        self.run(actor, &target, AdminAction::Ban, mutation, floor)
            .await
    }

    /// Lift a target's ban.
    pub async fn unban(&self, actor: &Actor, target_id: &str) -> Result<(), EnforcementError> {
        let target = self.authorize(actor, target_id, AdminAction::Unban).await?;
        let mutation = AdminMutation::Unban {
            user_id: target.id.clone(),
        };
        self.run(actor, &target, AdminAction::Unban, mutation, Vec::new())
            .await
    }

    /// Set a new password for a target.
    pub async fn set_password(
        &self,
        actor: &Actor,
        target_id: &str,
        new_password: String,
    ) -> Result<(), EnforcementError> {
        let target = self
            .authorize(actor, target_id, AdminAction::SetPassword)
            .await?;
        let mutation = AdminMutation::SetPassword {
            user_id: target.id.clone(),
            new_password,
        };
        self.run(actor, &target, AdminAction::SetPassword, mutation, Vec::new())
            .await
    }

    /// Delete a target's account.
    pub async fn remove(&self, actor: &Actor, target_id: &str) -> Result<(), EnforcementError> {
        let target = self.authorize(actor, target_id, AdminAction::Remove).await?;
        let floor = admin_floor_for(&target);
        let mutation = AdminMutation::Remove {
            user_id: target.id.clone(),
        };
        self.run(actor, &target, AdminAction::Remove, mutation, floor)
            .await
    }

    /// Revoke every session of a target.
    pub async fn revoke_sessions(
        &self,
        actor: &Actor,
        target_id: &str,
    ) -> Result<(), EnforcementError> {
        let target = self
            .authorize(actor, target_id, AdminAction::RevokeSessions)
            .await?;
        let mutation = AdminMutation::RevokeSessions {
            user_id: target.id.clone(),
        };
        self.run(
            actor,
            &target,
            AdminAction::RevokeSessions,
            mutation,
            Vec::new(),
        )
        .await
    }

    /// Start impersonating a target.
    ///
    /// On success the identity collaborator records the original actor so
    /// [`stop_impersonating`](Self::stop_impersonating) can restore it.
    pub async fn impersonate<S: ImpersonationStore>(
        &self,
        swaps: &Impersonations<S>,
        actor: &Actor,
        target_id: &str,
        reason: Option<String>,
    ) -> Result<ImpersonationSwap, EnforcementError> {
        let target = self
            .authorize(actor, target_id, AdminAction::Impersonate)
            .await?;

        let swap = swaps
            .start(&actor.id, &target.id, reason)
            .await
            .map_err(impersonation_failure)?;

        self.audit(actor, &target.id, AdminAction::Impersonate, true, None)
            .await;
        Ok(swap)
    }

    /// Stop impersonating and restore the original identity.
    ///
    /// `original_actor_id` is the admin who started the swap, as resolved
    /// by the session layer - not the impersonated identity.
    pub async fn stop_impersonating<S: ImpersonationStore>(
        &self,
        swaps: &Impersonations<S>,
        original_actor_id: &str,
    ) -> Result<ImpersonationSwap, EnforcementError> {
        swaps
            .stop(original_actor_id)
            .await
            .map_err(impersonation_failure)
    }

    async fn load(&self, target_id: &str) -> Result<Target, EnforcementError> {
        match self.directory.load_target(target_id).await {
            Ok(Some(target)) => Ok(target),
            Ok(None) => Err(EnforcementError::TargetNotFound(target_id.to_string())),
            Err(err) => Err(directory_failure(err)),
        }
    }

    /// Load target facts and require the capability flag for `action`.
    async fn authorize(
        &self,
        actor: &Actor,
        target_id: &str,
        action: AdminAction,
    ) -> Result<Target, EnforcementError> {
        let target = self.load(target_id).await?;
        let eval = evaluate(&self.table, actor, &target);

        if !eval.result.actions.allows(action) {
            let kinds: Vec<&'static str> = eval.denials.iter().map(Denial::kind).collect();
            tracing::warn!(
                target: "admin.enforcement.denied",
                actor_id = %actor.id,
                target_user_id = %target.id,
                action = %action.key(),
                denials = ?kinds,
                "Action denied"
            );
            self.audit(
                actor,
                &target.id,
                action,
                false,
                kinds.first().map(|k| (*k).to_string()),
            )
            .await;
            return Err(EnforcementError::Forbidden);
        }

        Ok(target)
    }

    /// Apply an authorized mutation, honoring the admin floor.
    async fn run(
        &self,
        actor: &Actor,
        target: &Target,
        action: AdminAction,
        mutation: AdminMutation,
        floor: Vec<String>,
    ) -> Result<(), EnforcementError> {
        match self.directory.execute(mutation, &floor).await {
            Ok(()) => {
                tracing::info!(
                    target: "admin.enforcement.applied",
                    actor_id = %actor.id,
                    target_user_id = %target.id,
                    action = %action.key(),
                    "Action applied"
                );
                self.audit(actor, &target.id, action, true, None).await;
                Ok(())
            }
            Err(DirectoryError::Denied(denial)) => {
                self.deny(actor, &target.id, action, &denial).await;
                Err(EnforcementError::Forbidden)
            }
            Err(DirectoryError::UserNotFound(id)) => Err(EnforcementError::TargetNotFound(id)),
            Err(DirectoryError::Storage(msg)) => Err(EnforcementError::Storage(msg)),
        }
    }

    /// Log and audit a denial.
    async fn deny(&self, actor: &Actor, target_id: &str, action: AdminAction, denial: &Denial) {
        tracing::warn!(
            target: "admin.enforcement.denied",
            actor_id = %actor.id,
            target_user_id = %target_id,
            action = %action.key(),
            denial = denial.kind(),
            "Action denied"
        );
        self.audit(
            actor,
            target_id,
            action,
            false,
            Some(denial.kind().to_string()),
        )
        .await;
    }

    /// Best-effort audit record; failures are logged, never surfaced.
    async fn audit(
        &self,
        actor: &Actor,
        target_id: &str,
        action: AdminAction,
        allowed: bool,
        denial: Option<String>,
    ) {
        let entry = AdminAuditEntry::new(&actor.id, target_id, action, allowed, denial);
        if let Err(err) = self.directory.record_audit(&entry).await {
            tracing::warn!(
                target: "admin.enforcement.audit_failed",
                actor_id = %actor.id,
                error = %err,
                "Failed to record audit entry"
            );
        }
    }
}

/// Organizations that must keep an admin-role member if this target is
/// banned or removed.
fn admin_floor_for(target: &Target) -> Vec<String> {
    if target.role == PlatformRole::Manager {
        target.org_ids()
    } else {
        Vec::new()
    }
}

fn directory_failure(err: DirectoryError) -> EnforcementError {
    match err {
        DirectoryError::UserNotFound(id) => EnforcementError::TargetNotFound(id),
        DirectoryError::Storage(msg) => EnforcementError::Storage(msg),
        DirectoryError::Denied(_) => EnforcementError::Forbidden,
    }
}

fn impersonation_failure(err: ImpersonationError) -> EnforcementError {
    match err {
        ImpersonationError::Storage(msg) => EnforcementError::Storage(msg),
        other => EnforcementError::InvalidParameter(other.to_string()),
    }
}
