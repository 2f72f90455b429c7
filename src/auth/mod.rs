//! Tenant authentication seam.
//!
//! Every SCIM request is scoped to a tenant by its path prefix and carries the
//! tenant's pre-shared bearer token. A [`TenantAuthenticator`] runs before any
//! other component and either admits the request or rejects it with
//! [`ScimError::Unauthorized`]. The default [`BearerTokenAuthenticator`] checks
//! tokens from [`ScimConfig`]; deployments with their own credential store plug
//! in a different implementation.

use crate::config::ScimConfig;
use crate::error::{ScimError, ScimResult};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::future::Future;

/// Decides whether a request may act on a tenant.
pub trait TenantAuthenticator: Send + Sync {
    /// Admit or reject `bearer_token` for `tenant_id`.
    ///
    /// Implementations return [`ScimError::TenantNotFound`] for unknown tenants
    /// and [`ScimError::Unauthorized`] for missing or wrong credentials.
    fn authenticate(
        &self,
        tenant_id: &str,
        bearer_token: Option<&str>,
    ) -> impl Future<Output = ScimResult<()>> + Send;
}

/// Checks the pre-shared bearer token configured per tenant.
///
/// Only SHA-256 digests of the configured tokens are kept in memory.
#[derive(Debug, Clone)]
pub struct BearerTokenAuthenticator {
    // tenant_id -> digest of the expected token (None = no token required)
    tokens: HashMap<String, Option<[u8; 32]>>,
}

impl BearerTokenAuthenticator {
    pub fn from_config(config: &ScimConfig) -> Self {
        let tokens = config
            .tenants()
            .iter()
            .map(|t| (t.tenant_id.clone(), t.bearer_token.as_deref().map(digest)))
            .collect();
        Self { tokens }
    }
}

fn digest(token: &str) -> [u8; 32] {
    Sha256::digest(token.as_bytes()).into()
}

impl TenantAuthenticator for BearerTokenAuthenticator {
    async fn authenticate(&self, tenant_id: &str, bearer_token: Option<&str>) -> ScimResult<()> {
        let expected = self
            .tokens
            .get(tenant_id)
            .ok_or_else(|| ScimError::tenant_not_found(tenant_id))?;

        let Some(expected) = expected else {
            return Ok(());
        };

        match bearer_token {
            Some(token) if digest(token.trim()) == *expected => Ok(()),
            Some(_) => Err(ScimError::unauthorized("invalid bearer token")),
            None => Err(ScimError::unauthorized("missing bearer token")),
        }
    }
}

/// Extract the credential from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(authorization: &str) -> Option<&str> {
    let (scheme, token) = authorization.trim().split_once(' ')?;
    if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() {
        Some(token.trim())
    } else {
        None
    }
}
