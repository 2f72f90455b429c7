//! Framework-agnostic SCIM endpoint layer.
//!
//! [`ScimEndpoint`] takes a transport-neutral [`ScimRequest`] (method,
//! tenant-prefixed path, decoded query parameters, bearer token, raw body),
//! authenticates it, routes it to discovery or to the identity synchronizer and
//! returns a [`ScimResponse`] carrying the HTTP status, headers and SCIM JSON
//! body. Errors are rendered as RFC 7644 error documents. Wiring it into an
//! HTTP framework is a matter of converting requests and responses.
//!
//! # Example Usage
//!
//! ```rust
//! use scim_provisioning::config::{ScimConfig, TenantSettings};
//! use scim_provisioning::endpoint::{HttpMethod, ScimEndpoint, ScimRequest};
//! use scim_provisioning::storage::InMemoryIdentityStore;
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ScimConfig::new("https://scim.example.com").with_tenant(
//!     TenantSettings::new("acme")
//!         .with_bearer_token("s3cret")
//!         .with_default_role("viewer"),
//! );
//! let endpoint = ScimEndpoint::new(config, InMemoryIdentityStore::new())?;
//!
//! let response = endpoint
//!     .handle(
//!         ScimRequest::new(HttpMethod::Post, "/acme/Users")
//!             .with_bearer_token("s3cret")
//!             .with_json_body(&json!({"userName": "bjensen@example.com"})),
//!     )
//!     .await;
//! assert_eq!(response.status, 201);
//! assert!(response.header("Location").is_some());
//! # Ok(())
//! # }
//! ```

pub mod core;
mod handlers;
pub mod routing;

pub use self::core::{HttpMethod, SCIM_CONTENT_TYPE, ScimEndpoint, ScimRequest, ScimResponse};
pub use self::routing::Route;
