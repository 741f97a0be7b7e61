//! Caller identity contract.
//!
//! Authentication happens outside the engine. The embedding application
//! resolves a session to an [`Identity`] and hands the engine an
//! [`IdentityProvider`]; every public operation fails with
//! [`crate::OrderActionError::Unauthorized`] when the provider returns none.

use orderline_core::ActorId;
use serde::{Deserialize, Serialize};

/// An authenticated actor performing order operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Unique actor ID.
    pub actor_id: ActorId,
    /// Display email, when known.
    pub email: Option<String>,
}

impl Identity {
    /// Create an identity for the given actor.
    #[must_use]
    pub const fn new(actor_id: ActorId, email: Option<String>) -> Self {
        Self { actor_id, email }
    }
}

/// Source of the current caller identity.
pub trait IdentityProvider: Send + Sync {
    /// The actor on whose behalf the current operation runs, if any.
    fn current_actor(&self) -> Option<Identity>;
}

/// Provider that always reports the same actor.
///
/// Useful for embedding contexts where the caller resolves identity per
/// request, and for tests.
#[derive(Debug, Clone)]
pub struct FixedIdentity(Identity);

impl FixedIdentity {
    /// Wrap an already-resolved identity.
    #[must_use]
    pub const fn new(identity: Identity) -> Self {
        Self(identity)
    }

    /// A fixed identity with a fresh random actor ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(Identity::new(ActorId::generate(), None))
    }
}

impl IdentityProvider for FixedIdentity {
    fn current_actor(&self) -> Option<Identity> {
        Some(self.0.clone())
    }
}

/// Provider that reports no authenticated actor.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoIdentity;

impl IdentityProvider for NoIdentity {
    fn current_actor(&self) -> Option<Identity> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_identity_reports_actor() {
        let provider = FixedIdentity::generate();
        assert!(provider.current_actor().is_some());
    }

    #[test]
    fn test_no_identity_reports_none() {
        assert!(NoIdentity.current_actor().is_none());
    }
}
