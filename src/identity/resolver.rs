//! Port for mapping inbound credentials to principals.

use super::Principal;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use thiserror::Error;

/// Errors returned while resolving a credential.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdentityError {
    /// The credential does not map to any principal.
    #[error("credential is not recognised")]
    Unauthenticated,

    /// The resolver backend failed.
    #[error("identity backend failure: {0}")]
    Backend(String),
}

/// Resolves an opaque credential (for example a bearer token) to a principal.
///
/// Token format and verification belong to the request layer; this port
/// only fixes the shape of the answer.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Resolves `credential` to the principal it was issued for.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::Unauthenticated`] for unknown credentials.
    async fn resolve(&self, credential: &str) -> Result<Principal, IdentityError>;
}

/// Fixed credential table, used by tests and local tooling.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentityResolver {
    credentials: Arc<RwLock<HashMap<String, Principal>>>,
}

impl StaticIdentityResolver {
    /// Creates an empty resolver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `credential` for `principal`, replacing any earlier mapping.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::Backend`] if the credential table lock is
    /// poisoned.
    pub fn insert(
        &self,
        credential: impl Into<String>,
        principal: Principal,
    ) -> Result<(), IdentityError> {
        let mut credentials = self
            .credentials
            .write()
            .map_err(|err| IdentityError::Backend(err.to_string()))?;
        credentials.insert(credential.into(), principal);
        Ok(())
    }
}

#[async_trait]
impl IdentityResolver for StaticIdentityResolver {
    async fn resolve(&self, credential: &str) -> Result<Principal, IdentityError> {
        let credentials = self
            .credentials
            .read()
            .map_err(|err| IdentityError::Backend(err.to_string()))?;
        credentials
            .get(credential)
            .copied()
            .ok_or(IdentityError::Unauthenticated)
    }
}
