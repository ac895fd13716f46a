//! The capability engine.
//!
//! [`evaluate`] is the single decision point for every administrative
//! action. The mutation guards in [`crate::admin`] and the capability query
//! endpoint both call it with the same inputs, so an action a handler would
//! refuse is never rendered as available, and vice versa.
//!
//! The function is pure: no clock, no randomness, no hidden state. For
//! identical actor/target snapshots and the same table it always returns
//! the same result, even when the API and the UI query at slightly
//! different times within one page render.

use serde::{Deserialize, Serialize};

use super::denial::Denial;
use super::permissions::{AdminAction, PermissionTable};
use super::role::PlatformRole;
use super::scope::{is_target_in_scope, require_active_organization};
use super::types::{Actor, Target};

/// One boolean per administrative action, each independently derived.
///
/// Serialized with every field present and always boolean, never omitted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    pub update: bool,
    pub set_role: bool,
    pub ban: bool,
    pub unban: bool,
    pub set_password: bool,
    pub remove: bool,
    pub revoke_sessions: bool,
    pub impersonate: bool,
}

impl Capabilities {
    /// No action allowed.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Check the flag for a single action.
    #[must_use]
    pub fn allows(&self, action: AdminAction) -> bool {
        match action {
            AdminAction::Update => self.update,
            AdminAction::SetRole => self.set_role,
            AdminAction::Ban => self.ban,
            AdminAction::Unban => self.unban,
            AdminAction::SetPassword => self.set_password,
            AdminAction::Remove => self.remove,
            AdminAction::RevokeSessions => self.revoke_sessions,
            AdminAction::Impersonate => self.impersonate,
        }
    }

    fn set(&mut self, action: AdminAction, value: bool) {
        match action {
            AdminAction::Update => self.update = value,
            AdminAction::SetRole => self.set_role = value,
            AdminAction::Ban => self.ban = value,
            AdminAction::Unban => self.unban = value,
            AdminAction::SetPassword => self.set_password = value,
            AdminAction::Remove => self.remove = value,
            AdminAction::RevokeSessions => self.revoke_sessions = value,
            AdminAction::Impersonate => self.impersonate = value,
        }
    }

    /// The actions whose flag is true, in wire order.
    pub fn enabled(&self) -> Vec<AdminAction> {
        AdminAction::ALL
            .into_iter()
            .filter(|a| self.allows(*a))
            .collect()
    }
}

/// The capability set for one (actor, target) pair.
///
/// Derived, never persisted; recomputed per request. This is the JSON body
/// of the capability query endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityResult {
    /// The target this result describes.
    pub target_user_id: String,
    /// The target's current platform role.
    pub target_role: PlatformRole,
    /// Whether the actor and target are the same user.
    pub is_self: bool,
    /// One flag per action.
    pub actions: Capabilities,
}

/// A capability result plus the structural denials behind the false flags.
///
/// The denials are audit-log detail; they never reach an unprivileged
/// caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Evaluation {
    /// The capability set.
    pub result: CapabilityResult,
    /// Structural gates that fired while computing it.
    pub denials: Vec<Denial>,
}

/// Compute the capability set for an actor acting on a target.
///
/// Self targets are capped at `update` and `set_password` (still requiring
/// the base grants); everything else is forced false so no one can escalate
/// or lock themselves out. Non-self targets require the base grant, a
/// strictly higher actor rank, and - for managers - the target inside the
/// active organization.
#[must_use]
pub fn evaluate(table: &PermissionTable, actor: &Actor, target: &Target) -> Evaluation {
    let is_self = actor.id == target.id;
    let mut actions = Capabilities::none();
    let mut denials = Vec::new();

    if is_self {
        actions.update = table.grants_action(actor.role, AdminAction::Update);
        actions.set_password = table.grants_action(actor.role, AdminAction::SetPassword);

        let suppressed = AdminAction::ALL.into_iter().any(|a| {
            !matches!(a, AdminAction::Update | AdminAction::SetPassword)
                && table.grants_action(actor.role, a)
        });
        if suppressed {
            denials.push(Denial::SelfActionRestricted);
        }
    } else {
        let outranks = actor.role.outranks(target.role);
        if !outranks {
            denials.push(Denial::InsufficientRank);
        }

        // Scope only gates manager actors; admins are unrestricted and a
        // member already fails the rank gate on every target.
        let in_scope = match actor.role {
            PlatformRole::Manager => match require_active_organization(actor) {
                Err(denial) => {
                    denials.push(denial);
                    false
                }
                Ok(()) => {
                    let ok = is_target_in_scope(actor, target);
                    if !ok {
                        denials.push(Denial::OutOfScope);
                    }
                    ok
                }
            },
            PlatformRole::Admin | PlatformRole::Member => true,
        };

        if outranks && in_scope {
            for action in AdminAction::ALL {
                actions.set(action, table.grants_action(actor.role, action));
            }
        }
    }

    Evaluation {
        result: CapabilityResult {
            target_user_id: target.id.clone(),
            target_role: target.role,
            is_self,
            actions,
        },
        denials,
    }
}

/// Compute just the capability set, discarding denial detail.
#[must_use]
pub fn compute_capabilities(
    table: &PermissionTable,
    actor: &Actor,
    target: &Target,
) -> CapabilityResult {
    evaluate(table, actor, target).result
}

/// Check the assignability of a requested destination role.
///
/// The capability query only knows the target's current role, so this is
/// re-evaluated at mutation time with the role the caller actually asked
/// for.
pub fn check_role_assignment(actor: &Actor, requested: PlatformRole) -> Result<(), Denial> {
    if actor.role.can_assign(requested) {
        Ok(())
    } else {
        Err(Denial::RoleNotAssignable {
            actor_role: actor.role,
            requested,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::role::OrgRole;

    fn table() -> PermissionTable {
        PermissionTable::default()
    }

    fn assert_all_false(caps: &Capabilities) {
        for action in AdminAction::ALL {
            assert!(!caps.allows(action), "{} should be false", action.key());
        }
    }

    #[test]
    fn test_self_ceiling_for_every_role() {
        for role in [
            PlatformRole::Admin,
            PlatformRole::Manager,
            PlatformRole::Member,
        ] {
            let actor = Actor::new("usr_1", role);
            let target = Target::new("usr_1", role);
            let caps = compute_capabilities(&table(), &actor, &target);

            assert!(caps.is_self);
            assert!(!caps.actions.set_role);
            assert!(!caps.actions.remove);
            assert!(!caps.actions.impersonate);
            assert!(!caps.actions.ban);
            assert!(!caps.actions.unban);
            assert!(!caps.actions.revoke_sessions);
        }
    }

    #[test]
    fn test_self_keeps_base_granted_update_and_password() {
        let admin = Actor::new("usr_1", PlatformRole::Admin);
        let caps = compute_capabilities(&table(), &admin, &Target::new("usr_1", PlatformRole::Admin));
        assert!(caps.actions.update);
        assert!(caps.actions.set_password);

        // Managers hold update but not set-password in the base table.
        let manager = Actor::new("usr_2", PlatformRole::Manager).with_active_org("org_a");
        let caps =
            compute_capabilities(&table(), &manager, &Target::new("usr_2", PlatformRole::Manager));
        assert!(caps.actions.update);
        assert!(!caps.actions.set_password);

        let member = Actor::new("usr_3", PlatformRole::Member);
        let caps =
            compute_capabilities(&table(), &member, &Target::new("usr_3", PlatformRole::Member));
        assert!(!caps.actions.update);
        assert!(!caps.actions.set_password);
    }

    #[test]
    fn test_rank_antisymmetry_equal_roles() {
        for role in [
            PlatformRole::Admin,
            PlatformRole::Manager,
            PlatformRole::Member,
        ] {
            let actor = Actor::new("usr_1", role).with_active_org("org_a");
            let target = Target::new("usr_2", role).with_membership("org_a", OrgRole::Member);
            let eval = evaluate(&table(), &actor, &target);

            assert_all_false(&eval.result.actions);
            assert!(eval.denials.contains(&Denial::InsufficientRank));
        }
    }

    #[test]
    fn test_admin_on_member_gets_everything() {
        let actor = Actor::new("usr_1", PlatformRole::Admin);
        let target = Target::new("usr_2", PlatformRole::Member);
        let caps = compute_capabilities(&table(), &actor, &target);

        for action in AdminAction::ALL {
            assert!(caps.actions.allows(action), "{} should be true", action.key());
        }
    }

    #[test]
    fn test_admin_on_manager_gets_everything() {
        let actor = Actor::new("usr_1", PlatformRole::Admin);
        let target = Target::new("usr_2", PlatformRole::Manager)
            .with_membership("org_a", OrgRole::Manager);
        let caps = compute_capabilities(&table(), &actor, &target);
        for action in AdminAction::ALL {
            assert!(caps.actions.allows(action));
        }
    }

    #[test]
    fn test_admin_on_admin_all_false() {
        let actor = Actor::new("usr_1", PlatformRole::Admin);
        let target = Target::new("usr_2", PlatformRole::Admin);
        let eval = evaluate(&table(), &actor, &target);

        assert_all_false(&eval.result.actions);
        assert_eq!(eval.denials, vec![Denial::InsufficientRank]);
    }

    #[test]
    fn test_manager_on_member_in_scope() {
        let actor = Actor::new("usr_1", PlatformRole::Manager).with_active_org("org_a");
        let target = Target::new("usr_2", PlatformRole::Member)
            .with_membership("org_a", OrgRole::Member);
        let caps = compute_capabilities(&table(), &actor, &target);

        assert!(caps.actions.update);
        assert!(caps.actions.ban);
        assert!(caps.actions.unban);
        assert!(!caps.actions.set_role);
        assert!(!caps.actions.set_password);
        assert!(!caps.actions.remove);
        assert!(!caps.actions.revoke_sessions);
        assert!(!caps.actions.impersonate);
    }

    #[test]
    fn test_manager_scope_gate_other_org() {
        let actor = Actor::new("usr_1", PlatformRole::Manager).with_active_org("org_a");
        let target = Target::new("usr_2", PlatformRole::Member)
            .with_membership("org_b", OrgRole::Member);
        let eval = evaluate(&table(), &actor, &target);

        assert_all_false(&eval.result.actions);
        assert!(eval.denials.contains(&Denial::OutOfScope));
    }

    #[test]
    fn test_manager_without_active_org_all_false() {
        let actor = Actor::new("usr_1", PlatformRole::Manager);
        let target = Target::new("usr_2", PlatformRole::Member)
            .with_membership("org_a", OrgRole::Member);
        let eval = evaluate(&table(), &actor, &target);

        assert_all_false(&eval.result.actions);
        assert!(eval.denials.contains(&Denial::NoActiveOrganization));
    }

    #[test]
    fn test_member_actor_all_false_on_every_target() {
        let actor = Actor::new("usr_1", PlatformRole::Member);
        for role in [
            PlatformRole::Admin,
            PlatformRole::Manager,
            PlatformRole::Member,
        ] {
            let target = Target::new("usr_2", role);
            let caps = compute_capabilities(&table(), &actor, &target);
            assert_all_false(&caps.actions);
        }
    }

    #[test]
    fn test_role_assignment_check() {
        let admin = Actor::new("usr_1", PlatformRole::Admin);
        let manager = Actor::new("usr_2", PlatformRole::Manager).with_active_org("org_a");

        assert!(check_role_assignment(&admin, PlatformRole::Admin).is_ok());
        assert!(check_role_assignment(&manager, PlatformRole::Member).is_ok());
        assert_eq!(
            check_role_assignment(&manager, PlatformRole::Admin),
            Err(Denial::RoleNotAssignable {
                actor_role: PlatformRole::Manager,
                requested: PlatformRole::Admin,
            })
        );
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let actor = Actor::new("usr_1", PlatformRole::Manager).with_active_org("org_a");
        let target = Target::new("usr_2", PlatformRole::Member)
            .with_membership("org_b", OrgRole::Member);

        let first = evaluate(&table(), &actor, &target);
        let second = evaluate(&table(), &actor, &target);
        assert_eq!(first, second);
    }

    #[test]
    fn test_result_serializes_every_action_flag() {
        let actor = Actor::new("usr_1", PlatformRole::Member);
        let target = Target::new("usr_2", PlatformRole::Admin);
        let result = compute_capabilities(&table(), &actor, &target);

        let json = serde_json::to_value(&result).unwrap();
        let actions = json["actions"].as_object().unwrap();
        assert_eq!(actions.len(), 8);
        for key in [
            "update",
            "setRole",
            "ban",
            "unban",
            "setPassword",
            "remove",
            "revokeSessions",
            "impersonate",
        ] {
            assert!(actions[key].is_boolean(), "{key} must be present and boolean");
        }
    }
}
