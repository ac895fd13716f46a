//! HTTP surface for the admin console.
//!
//! Thin axum handlers over the enforcement adapter. The identity layer in
//! front of this router resolves the session - impersonation included -
//! and stashes the effective [`Actor`] in request extensions; handlers
//! never see credentials or tokens.

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Path, State},
    http::{request::Parts, StatusCode},
    routing::{get, patch, post, put},
    Json, Router,
};

use super::directory::AdminDirectory;
use super::enforcement::Enforcer;
use super::types::{ImpersonateRequest, SetPasswordRequest, SetRoleRequest, UpdateUser};
use crate::auth::{ImpersonationStore, ImpersonationSwap, Impersonations};
use crate::authz::{Actor, CapabilityResult, PermissionTable};
use crate::error::QuarterdeckError;
use crate::Result;

/// Shared state for the admin router.
#[derive(Clone)]
pub struct AdminState {
    enforcer: Arc<Enforcer<Arc<dyn AdminDirectory>>>,
    swaps: Arc<Impersonations<Arc<dyn ImpersonationStore>>>,
}

impl AdminState {
    /// Create state with the default permission table.
    pub fn new(
        directory: Arc<dyn AdminDirectory>,
        swaps: Impersonations<Arc<dyn ImpersonationStore>>,
    ) -> Self {
        Self {
            enforcer: Arc::new(Enforcer::new(directory)),
            swaps: Arc::new(swaps),
        }
    }

    /// Create state with a custom permission table.
    pub fn with_table(
        directory: Arc<dyn AdminDirectory>,
        table: PermissionTable,
        swaps: Impersonations<Arc<dyn ImpersonationStore>>,
    ) -> Self {
        Self {
            enforcer: Arc::new(Enforcer::with_table(directory, table)),
            swaps: Arc::new(swaps),
        }
    }

    /// The enforcement adapter behind this state.
    #[must_use]
    pub fn enforcer(&self) -> &Enforcer<Arc<dyn AdminDirectory>> {
        &self.enforcer
    }
}

/// Extractor for the effective actor resolved by the identity layer.
///
/// Rejects with 401 when no actor context is present - the request never
/// reached the identity middleware or carried no session.
pub struct CurrentActor(pub Actor);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for CurrentActor {
    type Rejection = QuarterdeckError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        parts
            .extensions
            .get::<Actor>()
            .cloned()
            .map(CurrentActor)
            .ok_or_else(|| QuarterdeckError::unauthorized("missing actor context"))
    }
}

/// Build the admin router.
pub fn router(state: AdminState) -> Router {
    Router::new()
        .route("/users/:id/capabilities", get(get_capabilities))
        .route("/users/:id", patch(update_user).delete(remove_user))
        .route("/users/:id/role", put(set_role))
        .route("/users/:id/ban", post(ban_user))
        .route("/users/:id/unban", post(unban_user))
        .route("/users/:id/password", put(set_password))
        .route("/users/:id/sessions", axum::routing::delete(revoke_sessions))
        .route("/users/:id/impersonate", post(impersonate))
        .route("/impersonation/stop", post(stop_impersonating))
        .with_state(state)
}

/// The capability query the UI renders from.
async fn get_capabilities(
    State(state): State<AdminState>,
    CurrentActor(actor): CurrentActor,
    Path(user_id): Path<String>,
) -> Result<Json<CapabilityResult>> {
    let result = state.enforcer.capabilities(&actor, &user_id).await?;
    Ok(Json(result))
}

async fn update_user(
    State(state): State<AdminState>,
    CurrentActor(actor): CurrentActor,
    Path(user_id): Path<String>,
    Json(update): Json<UpdateUser>,
) -> Result<StatusCode> {
    state.enforcer.update_user(&actor, &user_id, update).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn set_role(
    State(state): State<AdminState>,
    CurrentActor(actor): CurrentActor,
    Path(user_id): Path<String>,
    Json(req): Json<SetRoleRequest>,
) -> Result<StatusCode> {
    state.enforcer.set_role(&actor, &user_id, req.role).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn ban_user(
    State(state): State<AdminState>,
    CurrentActor(actor): CurrentActor,
    Path(user_id): Path<String>,
) -> Result<StatusCode> {
    state.enforcer.ban(&actor, &user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn unban_user(
    State(state): State<AdminState>,
    CurrentActor(actor): CurrentActor,
    Path(user_id): Path<String>,
) -> Result<StatusCode> {
    state.enforcer.unban(&actor, &user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn set_password(
    State(state): State<AdminState>,
    CurrentActor(actor): CurrentActor,
    Path(user_id): Path<String>,
    Json(req): Json<SetPasswordRequest>,
) -> Result<StatusCode> {
    state
        .enforcer
        .set_password(&actor, &user_id, req.new_password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn remove_user(
    State(state): State<AdminState>,
    CurrentActor(actor): CurrentActor,
    Path(user_id): Path<String>,
) -> Result<StatusCode> {
    state.enforcer.remove(&actor, &user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn revoke_sessions(
    State(state): State<AdminState>,
    CurrentActor(actor): CurrentActor,
    Path(user_id): Path<String>,
) -> Result<StatusCode> {
    state.enforcer.revoke_sessions(&actor, &user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn impersonate(
    State(state): State<AdminState>,
    CurrentActor(actor): CurrentActor,
    Path(user_id): Path<String>,
    Json(req): Json<ImpersonateRequest>,
) -> Result<Json<ImpersonationSwap>> {
    let swap = state
        .enforcer
        .impersonate(&state.swaps, &actor, &user_id, req.reason)
        .await?;
    Ok(Json(swap))
}

async fn stop_impersonating(
    State(state): State<AdminState>,
    CurrentActor(actor): CurrentActor,
) -> Result<Json<ImpersonationSwap>> {
    let swap = state
        .enforcer
        .stop_impersonating(&state.swaps, &actor.id)
        .await?;
    Ok(Json(swap))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::directory::test::InMemoryDirectory;
    use crate::auth::InMemorySwapStore;
    use crate::authz::{OrgRole, PlatformRole, Target};
    use axum::body::Body;
    use axum::http::Request;
    use axum::Extension;
    use tower::ServiceExt;

    fn test_state() -> AdminState {
        let dir = InMemoryDirectory::new();
        dir.add_user(Target::new("admin_1", PlatformRole::Admin));
        dir.add_user(
            Target::new("member_a", PlatformRole::Member)
                .with_membership("org_a", OrgRole::Member),
        );
        let directory: Arc<dyn AdminDirectory> = Arc::new(dir);
        let store: Arc<dyn ImpersonationStore> = Arc::new(InMemorySwapStore::new());
        AdminState::new(directory, Impersonations::with_defaults(store))
    }

    fn app_as(actor: Actor) -> Router {
        router(test_state()).layer(Extension(actor))
    }

    #[tokio::test]
    async fn test_capabilities_endpoint_shape() {
        let app = app_as(Actor::new("admin_1", PlatformRole::Admin));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/users/member_a/capabilities")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["targetUserId"], "member_a");
        assert_eq!(json["targetRole"], "member");
        assert_eq!(json["isSelf"], false);
        let actions = json["actions"].as_object().unwrap();
        assert_eq!(actions.len(), 8);
        assert_eq!(actions["ban"], true);
        assert_eq!(actions["impersonate"], true);
    }

    #[tokio::test]
    async fn test_missing_actor_is_unauthorized() {
        let app = router(test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/users/member_a/capabilities")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_ban_allowed_for_admin() {
        let app = app_as(Actor::new("admin_1", PlatformRole::Admin));
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/users/member_a/ban")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_forbidden_is_uniform_for_member_actor() {
        let app = app_as(Actor::new("member_a", PlatformRole::Member));
        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/users/admin_1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        // No denial taxonomy in the body.
        assert_eq!(json["error"], "Forbidden: action not available");
    }

    #[tokio::test]
    async fn test_impersonation_round_trip() {
        let app = app_as(Actor::new("admin_1", PlatformRole::Admin));

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/users/member_a/impersonate")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"reason":"ticket #7"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/impersonation/stop")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["impersonated_user_id"], "member_a");
    }
}
