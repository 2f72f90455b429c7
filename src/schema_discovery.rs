//! Schema discovery: the `/ServiceProviderConfig`, `/ResourceTypes` and
//! `/Schemas` endpoints.
//!
//! All documents are derived from the immutable [`SchemaRegistry`] and the
//! static [`ServiceProviderConfig`]; only the `meta.location` URLs depend on the
//! requesting tenant.

use crate::config::ScimConfig;
use crate::error::{ScimError, ScimResult};
use crate::schema::SchemaRegistry;
use crate::schema::embedded::{
    RESOURCE_TYPE_SCHEMA, SCHEMA_SCHEMA, SERVICE_PROVIDER_CONFIG_SCHEMA,
};
use crate::serializer;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;

/// Service provider configuration as defined in RFC 7643 §5.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceProviderConfig {
    pub documentation_uri: Option<String>,
    pub patch: Supported,
    pub bulk: BulkSupport,
    pub filter: FilterSupport,
    pub change_password: Supported,
    pub sort: Supported,
    pub etag: Supported,
    pub authentication_schemes: Vec<AuthenticationScheme>,
}

/// A capability that is either on or off.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Supported {
    pub supported: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BulkSupport {
    pub supported: bool,
    pub max_operations: u32,
    pub max_payload_size: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FilterSupport {
    pub supported: bool,
    pub max_results: u32,
}

/// Authentication scheme definition for service provider config.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationScheme {
    /// Authentication type, e.g. `oauthbearertoken`
    #[serde(rename = "type")]
    pub auth_type: String,
    pub name: String,
    pub description: String,
    pub spec_uri: Option<String>,
    pub documentation_uri: Option<String>,
    pub primary: bool,
}

impl Default for ServiceProviderConfig {
    /// PATCH only; filtering is limited to single-attribute equality and so
    /// is not advertised.
    fn default() -> Self {
        Self {
            documentation_uri: None,
            patch: Supported { supported: true },
            bulk: BulkSupport {
                supported: false,
                max_operations: 0,
                max_payload_size: 0,
            },
            filter: FilterSupport {
                supported: false,
                max_results: crate::config::MAX_PAGE_SIZE as u32,
            },
            change_password: Supported { supported: false },
            sort: Supported { supported: false },
            etag: Supported { supported: false },
            authentication_schemes: vec![AuthenticationScheme {
                auth_type: "oauthbearertoken".to_string(),
                name: "OAuth Bearer Token".to_string(),
                description: "Pre-shared bearer token issued per tenant".to_string(),
                spec_uri: Some("https://www.rfc-editor.org/info/rfc6750".to_string()),
                documentation_uri: None,
                primary: true,
            }],
        }
    }
}

/// Renders the discovery documents for a tenant.
#[derive(Debug, Clone)]
pub struct SchemaDiscovery {
    registry: Arc<SchemaRegistry>,
    service_config: ServiceProviderConfig,
}

impl SchemaDiscovery {
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        Self::with_service_config(registry, ServiceProviderConfig::default())
    }

    pub fn with_service_config(
        registry: Arc<SchemaRegistry>,
        service_config: ServiceProviderConfig,
    ) -> Self {
        Self {
            registry,
            service_config,
        }
    }

    pub fn service_config(&self) -> &ServiceProviderConfig {
        &self.service_config
    }

    /// `GET /ServiceProviderConfig`
    pub fn service_provider_config(&self, config: &ScimConfig, tenant_id: &str) -> ScimResult<Value> {
        let mut document = serde_json::to_value(&self.service_config)?;
        document["schemas"] = json!([SERVICE_PROVIDER_CONFIG_SCHEMA]);
        document["meta"] = json!({
            "resourceType": "ServiceProviderConfig",
            "location": format!("{}/{}/ServiceProviderConfig", config.base_url(), tenant_id),
        });
        Ok(document)
    }

    /// `GET /Schemas`
    pub fn schemas(&self, config: &ScimConfig, tenant_id: &str) -> ScimResult<Value> {
        let resources = self
            .registry
            .get_schemas()
            .into_iter()
            .map(|schema| self.schema_document(config, tenant_id, &schema.id))
            .collect::<ScimResult<Vec<_>>>()?;
        let total = resources.len();
        Ok(serializer::list_response(resources, total, 1))
    }

    /// `GET /Schemas/{urn}`; the URN matches case-insensitively.
    pub fn schema(&self, config: &ScimConfig, tenant_id: &str, urn: &str) -> ScimResult<Value> {
        let schema = self
            .registry
            .get_schema(urn)
            .ok_or_else(|| ScimError::schema_not_found(urn))?;
        self.schema_document(config, tenant_id, &schema.id)
    }

    fn schema_document(&self, config: &ScimConfig, tenant_id: &str, id: &str) -> ScimResult<Value> {
        let schema = self
            .registry
            .get_schema(id)
            .ok_or_else(|| ScimError::schema_not_found(id))?;
        let mut document = serde_json::to_value(schema)?;
        document["schemas"] = json!([SCHEMA_SCHEMA]);
        document["meta"] = json!({
            "resourceType": "Schema",
            "location": config.location(tenant_id, "Schemas", &schema.id),
        });
        Ok(document)
    }

    /// `GET /ResourceTypes`
    pub fn resource_types(&self, config: &ScimConfig, tenant_id: &str) -> ScimResult<Value> {
        let resources = self
            .registry
            .resource_types()
            .iter()
            .map(|rt| self.resource_type_document(config, tenant_id, &rt.name))
            .collect::<ScimResult<Vec<_>>>()?;
        let total = resources.len();
        Ok(serializer::list_response(resources, total, 1))
    }

    /// `GET /ResourceTypes/{name}`; the name matches case-insensitively.
    pub fn resource_type(&self, config: &ScimConfig, tenant_id: &str, name: &str) -> ScimResult<Value> {
        self.resource_type_document(config, tenant_id, name)
    }

    fn resource_type_document(
        &self,
        config: &ScimConfig,
        tenant_id: &str,
        name: &str,
    ) -> ScimResult<Value> {
        let resource_type = self
            .registry
            .resource_type(name)
            .ok_or_else(|| ScimError::schema_not_found(name))?;
        let mut document = serde_json::to_value(resource_type)?;
        document["schemas"] = json!([RESOURCE_TYPE_SCHEMA]);
        document["meta"] = json!({
            "resourceType": "ResourceType",
            "location": config.location(tenant_id, "ResourceTypes", &resource_type.name),
        });
        Ok(document)
    }
}
