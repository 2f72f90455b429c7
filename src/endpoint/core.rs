//! Request/response types and the main dispatcher.

use super::handlers;
use super::routing::{self, Route};
use crate::auth::{self, BearerTokenAuthenticator, TenantAuthenticator};
use crate::config::ScimConfig;
use crate::error::{ScimError, ScimResult};
use crate::schema::SchemaRegistry;
use crate::schema_discovery::SchemaDiscovery;
use crate::serializer;
use crate::storage::IdentityStore;
use crate::synchronizer::IdentitySynchronizer;
use log::{debug, info, warn};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Media type of every SCIM response body.
pub const SCIM_CONTENT_TYPE: &str = "application/scim+json";

/// HTTP methods the endpoint understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        })
    }
}

/// Transport-neutral SCIM request.
#[derive(Debug, Clone, PartialEq)]
pub struct ScimRequest {
    pub method: HttpMethod,
    /// Tenant-prefixed path, e.g. `/acme/Users/{id}`
    pub path: String,
    /// Decoded query parameters
    pub query: HashMap<String, String>,
    /// Credential taken from the `Authorization: Bearer` header
    pub bearer_token: Option<String>,
    /// Raw request body
    pub body: Option<String>,
}

impl ScimRequest {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: HashMap::new(),
            bearer_token: None,
            body: None,
        }
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Take the credential from a raw `Authorization` header value.
    pub fn with_authorization(mut self, header: &str) -> Self {
        self.bearer_token = auth::bearer_token(header).map(str::to_string);
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_json_body(self, body: &Value) -> Self {
        self.with_body(body.to_string())
    }

    /// Query parameter by name, ignoring case.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Transport-neutral SCIM response.
#[derive(Debug, Clone, PartialEq)]
pub struct ScimResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ScimResponse {
    /// A response with a SCIM JSON body.
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            headers: vec![("Content-Type".to_string(), SCIM_CONTENT_TYPE.to_string())],
            body: Some(body),
        }
    }

    pub fn no_content() -> Self {
        Self {
            status: 204,
            headers: Vec::new(),
            body: None,
        }
    }

    /// Render an error as an RFC 7644 error document.
    pub fn error(error: &ScimError) -> Self {
        Self::json(error.status_code(), serializer::error_document(error))
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Header value by name, ignoring case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// The SCIM service: authentication, routing and error mapping over an
/// [`IdentitySynchronizer`].
pub struct ScimEndpoint<S: IdentityStore, A: TenantAuthenticator = BearerTokenAuthenticator> {
    pub(super) config: ScimConfig,
    pub(super) synchronizer: IdentitySynchronizer<S>,
    pub(super) discovery: SchemaDiscovery,
    authenticator: A,
}

impl<S: IdentityStore> ScimEndpoint<S> {
    /// Build an endpoint authenticating with the bearer tokens from `config`.
    pub fn new(config: ScimConfig, store: S) -> ScimResult<Self> {
        let authenticator = BearerTokenAuthenticator::from_config(&config);
        Self::with_authenticator(config, store, authenticator)
    }
}

impl<S: IdentityStore, A: TenantAuthenticator> ScimEndpoint<S, A> {
    /// Build an endpoint with a custom tenant authenticator.
    pub fn with_authenticator(config: ScimConfig, store: S, authenticator: A) -> ScimResult<Self> {
        let registry = Arc::new(SchemaRegistry::new()?);
        Ok(Self {
            config,
            synchronizer: IdentitySynchronizer::new(store, Arc::clone(&registry)),
            discovery: SchemaDiscovery::new(registry),
            authenticator,
        })
    }

    pub fn config(&self) -> &ScimConfig {
        &self.config
    }

    pub fn synchronizer(&self) -> &IdentitySynchronizer<S> {
        &self.synchronizer
    }

    /// Handle one request. Never fails: errors become error responses.
    pub async fn handle(&self, request: ScimRequest) -> ScimResponse {
        info!("SCIM {} {}", request.method, request.path);

        match self.dispatch(&request).await {
            Ok(response) => {
                debug!(
                    "SCIM {} {} completed with {}",
                    request.method, request.path, response.status
                );
                response
            }
            Err(e) => {
                warn!(
                    "SCIM {} {} failed with {}: {}",
                    request.method,
                    request.path,
                    e.status_code(),
                    e
                );
                ScimResponse::error(&e)
            }
        }
    }

    async fn dispatch(&self, request: &ScimRequest) -> ScimResult<ScimResponse> {
        let (tenant_id, route) = routing::parse_path(&request.path)?;

        self.authenticator
            .authenticate(tenant_id, request.bearer_token.as_deref())
            .await?;
        let tenant = self
            .config
            .tenant(tenant_id)
            .ok_or_else(|| ScimError::tenant_not_found(tenant_id))?;

        match (request.method, route) {
            (HttpMethod::Get, Route::ServiceProviderConfig) => {
                handlers::service_provider_config(self, tenant)
            }
            (HttpMethod::Get, Route::Schemas(urn)) => handlers::schemas(self, tenant, urn),
            (HttpMethod::Get, Route::ResourceTypes(name)) => {
                handlers::resource_types(self, tenant, name)
            }
            (HttpMethod::Get, Route::Users(None)) => handlers::list_users(self, tenant, request).await,
            (HttpMethod::Get, Route::Users(Some(id))) => handlers::get_user(self, tenant, id).await,
            (HttpMethod::Post, Route::Users(None)) => {
                handlers::create_user(self, tenant, request).await
            }
            (HttpMethod::Put, Route::Users(Some(id))) => {
                handlers::replace_user(self, tenant, id, request).await
            }
            (HttpMethod::Patch, Route::Users(Some(id))) => {
                handlers::patch_user(self, tenant, id, request).await
            }
            (HttpMethod::Delete, Route::Users(Some(id))) => {
                handlers::delete_user(self, tenant, id).await
            }
            (method, route) => Err(ScimError::unsupported_operation(format!(
                "{} on {}",
                method, route
            ))),
        }
    }
}
