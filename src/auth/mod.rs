//! Identity collaborators for the admin console.
//!
//! The crate delegates credential and session issuance to an external
//! identity provider; what lives here is the one piece of identity state
//! the admin console owns - the impersonation swap record.

mod impersonation;

pub use impersonation::{
    ImpersonationConfig, ImpersonationError, ImpersonationStore, ImpersonationSwap, Impersonations,
};

#[cfg(any(test, feature = "test-support"))]
pub use impersonation::test::InMemorySwapStore;
