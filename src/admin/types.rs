//! Admin API request and audit types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::authz::{AdminAction, PlatformRole};

/// Parameters for updating a user's profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateUser {
    /// New name for the user.
    pub name: Option<String>,
    /// New email for the user.
    pub email: Option<String>,
}

/// Request to change a user's platform role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetRoleRequest {
    /// The requested destination role.
    pub role: PlatformRole,
}

/// Request to set a new password for a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetPasswordRequest {
    /// The new password, forwarded to the credential collaborator.
    pub new_password: String,
}

/// Request to impersonate a user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImpersonateRequest {
    /// Reason for the impersonation (e.g., support ticket).
    pub reason: Option<String>,
}

/// An entry in the admin action audit log.
///
/// Recorded for every enforcement decision, allowed or denied. The denial
/// kind lives here and in server logs only; it is never exposed to the
/// caller.
#[derive(Debug, Clone, Serialize)]
pub struct AdminAuditEntry {
    /// Unique ID of the audit entry.
    pub id: String,
    /// User who attempted the action.
    pub actor_id: String,
    /// The user the action was attempted on.
    pub target_user_id: String,
    /// The action attempted.
    pub action: AdminAction,
    /// Whether the action was allowed.
    pub allowed: bool,
    /// Denial kind when a structural gate fired.
    pub denial: Option<String>,
    /// When the decision was made.
    pub created_at: DateTime<Utc>,
}

impl AdminAuditEntry {
    /// Create an entry for an enforcement decision.
    pub fn new(
        actor_id: impl Into<String>,
        target_user_id: impl Into<String>,
        action: AdminAction,
        allowed: bool,
        denial: Option<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            actor_id: actor_id.into(),
            target_user_id: target_user_id.into(),
            action,
            allowed,
            denial,
            created_at: Utc::now(),
        }
    }
}
