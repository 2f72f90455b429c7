//! Schema registry for the User resource and its Enterprise extension.
//!
//! The registry is built once at start-up and never mutated afterwards, so it can
//! be shared behind an `Arc` and read concurrently without locking. Besides the
//! schema documents themselves it precomputes the lower-case attribute path index
//! that the normalizer, the patch engine and the filter evaluator resolve against.

use super::embedded::{self, CORE_USER_SCHEMA};
use super::types::{
    AttributeDefinition, AttributeType, Mutability, ResourceTypeDescriptor, Schema,
    SchemaExtension,
};
use crate::error::ScimResult;

use std::collections::HashMap;

/// An attribute path resolved against the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAttribute {
    /// Lower-case canonical path, the key used in canonical attribute maps
    pub canonical: String,
    /// Canonically-cased dotted name, e.g. `name.formatted`
    pub name: String,
    /// URN of the schema defining the attribute
    pub schema_id: String,
    pub data_type: AttributeType,
    pub mutability: Mutability,
}

impl ResolvedAttribute {
    pub fn is_complex(&self) -> bool {
        self.data_type == AttributeType::Complex
    }

    /// Whether the attribute lives in an extension schema rather than the core one.
    pub fn is_extension(&self) -> bool {
        self.schema_id != CORE_USER_SCHEMA
    }
}

/// Registry for SCIM schemas with case-insensitive attribute resolution.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    core_user_schema: Schema,
    enterprise_user_schema: Schema,
    resource_types: Vec<ResourceTypeDescriptor>,
    attribute_index: HashMap<String, ResolvedAttribute>,
    core_prefix: String,
}

impl SchemaRegistry {
    /// Create a registry from the embedded schema definitions.
    pub fn new() -> ScimResult<Self> {
        let core_user_schema: Schema = serde_json::from_str(embedded::core_user_schema())?;
        let enterprise_user_schema: Schema =
            serde_json::from_str(embedded::enterprise_user_schema())?;

        let resource_types = vec![ResourceTypeDescriptor {
            id: "User".to_string(),
            name: "User".to_string(),
            endpoint: "/Users".to_string(),
            description: "User Account".to_string(),
            schema: core_user_schema.id.clone(),
            schema_extensions: vec![SchemaExtension {
                schema: enterprise_user_schema.id.clone(),
                required: false,
            }],
        }];

        let mut attribute_index = HashMap::new();
        Self::index_schema(&mut attribute_index, &core_user_schema, None);
        Self::index_schema(
            &mut attribute_index,
            &enterprise_user_schema,
            Some(&enterprise_user_schema.id),
        );

        Ok(Self {
            core_user_schema,
            enterprise_user_schema,
            resource_types,
            attribute_index,
            core_prefix: format!("{}:", CORE_USER_SCHEMA.to_ascii_lowercase()),
        })
    }

    fn index_schema(
        index: &mut HashMap<String, ResolvedAttribute>,
        schema: &Schema,
        urn_prefix: Option<&str>,
    ) {
        for attr in &schema.attributes {
            let name = match urn_prefix {
                Some(urn) => format!("{}:{}", urn, attr.name),
                None => attr.name.clone(),
            };
            Self::index_attribute(index, schema, attr, name);
        }
    }

    fn index_attribute(
        index: &mut HashMap<String, ResolvedAttribute>,
        schema: &Schema,
        attr: &AttributeDefinition,
        name: String,
    ) {
        for sub_attr in &attr.sub_attributes {
            let sub_name = format!("{}.{}", name, sub_attr.name);
            Self::index_attribute(index, schema, sub_attr, sub_name);
        }

        let canonical = name.to_ascii_lowercase();
        index.insert(
            canonical.clone(),
            ResolvedAttribute {
                canonical,
                name,
                schema_id: schema.id.clone(),
                data_type: attr.data_type,
                mutability: attr.mutability,
            },
        );
    }

    /// Resolve an arbitrarily-cased attribute path.
    ///
    /// Accepts bare core paths (`userName`, `NAME.formatted`), core-URN-prefixed
    /// paths and extension-URN-prefixed paths (`urn:...:enterprise:2.0:User:manager`).
    pub fn resolve(&self, path: &str) -> Option<&ResolvedAttribute> {
        let lowered = path.trim().to_ascii_lowercase();
        if let Some(found) = self.attribute_index.get(&lowered) {
            return Some(found);
        }
        lowered
            .strip_prefix(&self.core_prefix)
            .and_then(|rest| self.attribute_index.get(rest))
    }

    /// Match a JSON key against the registered extension schema URNs.
    pub fn extension_schema(&self, key: &str) -> Option<&Schema> {
        if key.trim().eq_ignore_ascii_case(&self.enterprise_user_schema.id) {
            Some(&self.enterprise_user_schema)
        } else {
            None
        }
    }

    /// Whether a JSON key names the core User schema itself.
    pub fn is_core_schema(&self, key: &str) -> bool {
        key.trim().eq_ignore_ascii_case(&self.core_user_schema.id)
    }

    /// Get all available schemas, core first.
    pub fn get_schemas(&self) -> Vec<&Schema> {
        vec![&self.core_user_schema, &self.enterprise_user_schema]
    }

    /// Get a specific schema by URN, ignoring case.
    pub fn get_schema(&self, id: &str) -> Option<&Schema> {
        self.get_schemas()
            .into_iter()
            .find(|schema| schema.id.eq_ignore_ascii_case(id.trim()))
    }

    pub fn get_user_schema(&self) -> &Schema {
        &self.core_user_schema
    }

    pub fn resource_types(&self) -> &[ResourceTypeDescriptor] {
        &self.resource_types
    }

    /// Get a resource type by name, ignoring case.
    pub fn resource_type(&self, name: &str) -> Option<&ResourceTypeDescriptor> {
        self.resource_types
            .iter()
            .find(|rt| rt.name.eq_ignore_ascii_case(name.trim()))
    }
}

