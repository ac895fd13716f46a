//! Impersonation session swaps.
//!
//! When an admin impersonates a user, the identity layer swaps the session
//! to the target and records the original actor so an explicit stop
//! operation can restore it. The capability engine is never aware of
//! impersonation: it only ever sees the effective actor the session layer
//! hands it. Authorization for *starting* an impersonation lives in the
//! enforcement adapter, not here.
//!
//! # Example
//!
//! ```rust,ignore
//! use quarterdeck::auth::{Impersonations, ImpersonationConfig};
//!
//! let swaps = Impersonations::new(store, ImpersonationConfig::default());
//!
//! // After the enforcement adapter has allowed the action:
//! let swap = swaps.start("admin-123", "user-456", Some("ticket #789".into())).await?;
//!
//! // Later, restore the original identity:
//! let restored = swaps.stop("admin-123").await?;
//! assert_eq!(restored.impersonated_user_id, "user-456");
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Maximum length for an impersonation reason.
const MAX_REASON_LENGTH: usize = 500;

/// Configuration for impersonation behavior.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImpersonationConfig {
    /// Require a reason when starting an impersonation.
    pub require_reason: bool,
}

impl Default for ImpersonationConfig {
    fn default() -> Self {
        Self {
            require_reason: true,
        }
    }
}

impl ImpersonationConfig {
    /// Create a new config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether a reason is required.
    #[must_use]
    pub fn require_reason(mut self, require: bool) -> Self {
        self.require_reason = require;
        self
    }
}

/// The record of one active identity swap.
///
/// One per original actor; stacked impersonation is rejected.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpersonationSwap {
    /// The admin who started the impersonation.
    pub original_actor_id: String,
    /// The user being impersonated.
    pub impersonated_user_id: String,
    /// Reason for the swap, for the audit trail.
    pub reason: Option<String>,
    /// Unix seconds when the swap started.
    pub started_at: u64,
}

/// Errors from impersonation operations.
#[derive(Debug, Error)]
pub enum ImpersonationError {
    /// The actor already has an active swap.
    #[error("actor '{0}' is already impersonating a user")]
    AlreadyImpersonating(String),

    /// Stop was called without an active swap.
    #[error("actor '{0}' is not impersonating anyone")]
    NotImpersonating(String),

    /// A reason is required by configuration.
    #[error("a reason is required for impersonation")]
    ReasonRequired,

    /// Storage failure.
    #[error("storage error: {0}")]
    Storage(String),
}

/// Trait for swap storage operations.
///
/// State is per-session: one record per original actor, no cross-request
/// contention.
#[async_trait]
pub trait ImpersonationStore: Send + Sync {
    /// Store a new swap record.
    async fn put(&self, swap: &ImpersonationSwap) -> Result<(), ImpersonationError>;

    /// Get the active swap for an original actor.
    async fn get(
        &self,
        original_actor_id: &str,
    ) -> Result<Option<ImpersonationSwap>, ImpersonationError>;

    /// Remove and return the active swap for an original actor.
    async fn take(
        &self,
        original_actor_id: &str,
    ) -> Result<Option<ImpersonationSwap>, ImpersonationError>;
}

#[async_trait]
impl ImpersonationStore for std::sync::Arc<dyn ImpersonationStore> {
    async fn put(&self, swap: &ImpersonationSwap) -> Result<(), ImpersonationError> {
        (**self).put(swap).await
    }

    async fn get(
        &self,
        original_actor_id: &str,
    ) -> Result<Option<ImpersonationSwap>, ImpersonationError> {
        (**self).get(original_actor_id).await
    }

    async fn take(
        &self,
        original_actor_id: &str,
    ) -> Result<Option<ImpersonationSwap>, ImpersonationError> {
        (**self).take(original_actor_id).await
    }
}

/// Manager for identity swap operations.
pub struct Impersonations<S: ImpersonationStore> {
    store: S,
    config: ImpersonationConfig,
}

impl<S: ImpersonationStore> Impersonations<S> {
    /// Create a new swap manager.
    #[must_use]
    pub fn new(store: S, config: ImpersonationConfig) -> Self {
        Self { store, config }
    }

    /// Create with default configuration.
    #[must_use]
    pub fn with_defaults(store: S) -> Self {
        Self::new(store, ImpersonationConfig::default())
    }

    /// Record an identity swap for an actor.
    ///
    /// Rejects stacked impersonation: an actor with an active swap must
    /// stop it before starting another.
    pub async fn start(
        &self,
        original_actor_id: &str,
        target_user_id: &str,
        reason: Option<String>,
    ) -> Result<ImpersonationSwap, ImpersonationError> {
        if self.config.require_reason && reason.is_none() {
            return Err(ImpersonationError::ReasonRequired);
        }

        if self.store.get(original_actor_id).await?.is_some() {
            return Err(ImpersonationError::AlreadyImpersonating(
                original_actor_id.to_string(),
            ));
        }

        let swap = ImpersonationSwap {
            original_actor_id: original_actor_id.to_string(),
            impersonated_user_id: target_user_id.to_string(),
            reason: reason.map(|r| truncate_string(&r, MAX_REASON_LENGTH)),
            started_at: current_timestamp(),
        };
        self.store.put(&swap).await?;

        tracing::info!(
            target: "auth.impersonation.started",
            original_actor_id = %swap.original_actor_id,
            impersonated_user_id = %swap.impersonated_user_id,
            reason = swap.reason.as_deref().unwrap_or("none"),
            "Impersonation started"
        );

        Ok(swap)
    }

    /// Restore the original identity for an actor.
    pub async fn stop(
        &self,
        original_actor_id: &str,
    ) -> Result<ImpersonationSwap, ImpersonationError> {
        let swap = self
            .store
            .take(original_actor_id)
            .await?
            .ok_or_else(|| ImpersonationError::NotImpersonating(original_actor_id.to_string()))?;

        tracing::info!(
            target: "auth.impersonation.ended",
            original_actor_id = %swap.original_actor_id,
            impersonated_user_id = %swap.impersonated_user_id,
            "Impersonation ended"
        );

        Ok(swap)
    }

    /// Get the active swap for an actor, if any.
    pub async fn active(
        &self,
        original_actor_id: &str,
    ) -> Result<Option<ImpersonationSwap>, ImpersonationError> {
        self.store.get(original_actor_id).await
    }

    /// Get the current configuration.
    #[must_use]
    pub fn config(&self) -> &ImpersonationConfig {
        &self.config
    }
}

/// Get current Unix timestamp in seconds.
#[inline]
fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Truncate a string to a maximum length (UTF-8 safe).
fn truncate_string(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        let mut end = max_len;
        while end > 0 && !s.is_char_boundary(end) {
            end -= 1;
        }
        s[..end].to_string()
    }
}

/// In-memory store for testing.
#[cfg(any(test, feature = "test-support"))]
pub mod test {
    use super::*;
    use std::collections::HashMap;
    use std::sync::RwLock;

    /// In-memory swap store for testing.
    #[derive(Default)]
    pub struct InMemorySwapStore {
        swaps: RwLock<HashMap<String, ImpersonationSwap>>,
    }

    impl InMemorySwapStore {
        /// Create a new in-memory store.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl ImpersonationStore for InMemorySwapStore {
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
}
