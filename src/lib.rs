//! Quarterdeck - the authorization core of a multi-tenant admin console
//!
//! Quarterdeck decides, for any (actor, target, action) tuple, whether the
//! action is permitted on a platform with three roles (admin, manager,
//! member) and organization-scoped management. The decision lives in one
//! pure function so the API that executes mutations and the UI that renders
//! menus can never disagree.
//!
//! # Architecture
//!
//! Quarterdeck follows a modular architecture where the crate provides the
//! decision engine and thin adapters, while applications implement storage:
//!
//! - **[`authz`]**: the capability engine - roles, permission table,
//!   organization scope, and the single [`authz::evaluate`] decision point
//! - **[`admin`]**: the enforcement adapter and HTTP surface - guards every
//!   mutation with the same engine the capability query endpoint uses
//! - **[`auth`]**: impersonation session swaps - the engine itself only ever
//!   sees the effective actor
//!
//! # Example
//!
//! ```rust
//! use quarterdeck::authz::{compute_capabilities, Actor, PermissionTable, PlatformRole, Target};
//!
//! let table = PermissionTable::default();
//! let admin = Actor::new("usr_1", PlatformRole::Admin);
//! let member = Target::new("usr_2", PlatformRole::Member);
//!
//! let caps = compute_capabilities(&table, &admin, &member);
//! assert!(caps.actions.ban);
//! assert!(caps.actions.impersonate);
//! ```

pub mod admin;
pub mod auth;
pub mod authz;
mod error;

pub use error::{QuarterdeckError, Result};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging with sensible defaults.
///
/// This should be called early in your application, typically in main().
///
/// # Environment Variables
///
/// - `RUST_LOG`: Set log level (e.g., "info", "debug", "quarterdeck=debug")
/// - `QUARTERDECK_LOG_JSON`: Set to "true" for JSON formatted logs
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json_logs = std::env::var("QUARTERDECK_LOG_JSON")
        .map(|v| v.parse::<bool>().unwrap_or(false))
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
