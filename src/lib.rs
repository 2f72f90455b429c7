//! Multi-tenant SCIM 2.0 User provisioning for Rust.
//!
//! Lets an external identity provider create, query and update tenant member
//! identities, while keeping a derived group graph in step with the Enterprise
//! extension's `manager` attribute.
//!
//! # Core Components
//!
//! - [`SchemaRegistry`] - Static schemas with case-insensitive attribute resolution
//! - [`AttributeNormalizer`] - Arbitrarily-cased payloads to canonical attribute paths
//! - [`PatchEngine`] - Ordered `add`/`replace` PATCH operations
//! - [`Filter`] - The `<attribute> eq "<value>"` filter subset
//! - [`IdentitySynchronizer`] - Members, accounts and the manager/group state machine
//! - [`ScimEndpoint`] - Framework-agnostic request handling and error mapping
//! - [`IdentityStore`] - Transactional persistence seam
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use scim_provisioning::{HttpMethod, ScimConfig, ScimEndpoint, ScimRequest};
//! use scim_provisioning::storage::InMemoryIdentityStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ScimConfig::from_json_str(
//!     r#"{"base_url": "https://scim.example.com",
//!         "tenants": [{"tenant_id": "acme", "bearer_token": "s3cret", "default_role": "viewer"}]}"#,
//! )?;
//! let endpoint = ScimEndpoint::new(config, InMemoryIdentityStore::new())?;
//!
//! let response = endpoint
//!     .handle(ScimRequest::new(HttpMethod::Get, "/acme/Users").with_authorization("Bearer s3cret"))
//!     .await;
//! assert_eq!(response.status, 200);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod filter;
pub mod model;
pub mod normalizer;
pub mod patch;
pub mod schema;
pub mod schema_discovery;
pub mod serializer;
pub mod storage;
pub mod synchronizer;

// Re-export commonly used types for convenience
pub use auth::{BearerTokenAuthenticator, TenantAuthenticator};
pub use config::{ScimConfig, TenantSettings};
pub use endpoint::{HttpMethod, ScimEndpoint, ScimRequest, ScimResponse};
pub use error::{ScimError, ScimResult};
pub use filter::Filter;
pub use model::{GroupMembership, MemberIdentity, MembershipRole, ScimUser, UnderlyingAccount};
pub use normalizer::{AttributeNormalizer, CanonicalAttributes};
pub use patch::{PatchEngine, PatchRequest};
pub use schema::{Schema, SchemaRegistry};
pub use schema_discovery::{AuthenticationScheme, SchemaDiscovery, ServiceProviderConfig};
pub use storage::{IdentityStore, InMemoryIdentityStore, StoreTransaction};
pub use synchronizer::{IdentitySynchronizer, UserPage};
