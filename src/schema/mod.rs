//! Schema definitions for the SCIM User resource.
//!
//! This module provides the static, process-wide schema registry: the core User
//! schema, the Enterprise extension, the derived User resource type and the
//! precomputed case-insensitive attribute path index.
//!
//! # Examples
//!
//! ```rust
//! use scim_provisioning::schema::{SchemaRegistry, paths};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = SchemaRegistry::new()?;
//! let attr = registry.resolve("UsErNaMe").expect("userName is registered");
//! assert_eq!(attr.canonical, paths::USER_NAME);
//! # Ok(())
//! # }
//! ```

pub mod embedded;
pub mod paths;
pub mod registry;
pub mod types;


pub use embedded::{CORE_USER_SCHEMA, ENTERPRISE_USER_SCHEMA};
pub use registry::{ResolvedAttribute, SchemaRegistry};
pub use types::{
    AttributeDefinition, AttributeType, Mutability, ResourceTypeDescriptor, Returned, Schema,
    SchemaExtension, Uniqueness,
};
