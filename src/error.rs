//! Error types for SCIM provisioning operations.
//!
//! Every failure the adapter can report is a [`ScimError`] variant. The endpoint
//! layer maps each variant 1:1 onto an HTTP status code and an RFC 7644 error
//! document; no other layer inspects error kinds for control flow, with the single
//! exception of the group create-or-fetch path in the synchronizer.

use crate::storage::StorageError;

/// Main error type for SCIM provisioning operations.
#[derive(Debug, thiserror::Error)]
pub enum ScimError {
    /// Unknown resource id
    #[error("Resource not found: {resource_type} with ID {id}")]
    ResourceNotFound { resource_type: String, id: String },

    /// Unknown schema URN or resource type name
    #[error("Schema not found: {schema_id}")]
    SchemaNotFound { schema_id: String },

    /// The path-prefixed tenant is not configured
    #[error("Tenant not found: {tenant_id}")]
    TenantNotFound { tenant_id: String },

    /// A tenant-unique attribute is already taken
    #[error("Attribute '{attribute}' value '{value}' is already in use")]
    Conflict { attribute: String, value: String },

    /// The tenant lacks the configuration needed to provision members
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// PATCH `remove`, or an unimplemented filter operator
    #[error("Unsupported operation: {operation}")]
    UnsupportedOperation { operation: String },

    /// Malformed request payload or parameters
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// Missing or mismatching tenant credential
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// Persistence layer failure
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal server errors
    #[error("Internal server error: {message}")]
    Internal { message: String },
}

impl ScimError {
    /// Create a resource not found error
    pub fn resource_not_found(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::ResourceNotFound {
            resource_type: resource_type.into(),
            id: id.into(),
        }
    }

    /// Create a schema not found error
    pub fn schema_not_found(schema_id: impl Into<String>) -> Self {
        Self::SchemaNotFound {
            schema_id: schema_id.into(),
        }
    }

    pub fn tenant_not_found(tenant_id: impl Into<String>) -> Self {
        Self::TenantNotFound {
            tenant_id: tenant_id.into(),
        }
    }

    /// Create a uniqueness conflict error
    pub fn conflict(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Conflict {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Create a tenant configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn unsupported_operation(operation: impl Into<String>) -> Self {
        Self::UnsupportedOperation {
            operation: operation.into(),
        }
    }

    /// Create an invalid request error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Create an internal server error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// HTTP status code the endpoint layer answers with for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::ResourceNotFound { .. }
            | Self::SchemaNotFound { .. }
            | Self::TenantNotFound { .. } => 404,
            Self::Conflict { .. } => 409,
            Self::Configuration { .. }
            | Self::UnsupportedOperation { .. }
            | Self::InvalidRequest { .. }
            | Self::Json(_) => 400,
            Self::Unauthorized { .. } => 401,
            Self::Storage(StorageError::UniqueViolation { .. }) => 409,
            Self::Storage(_) | Self::Internal { .. } => 500,
        }
    }

    /// RFC 7644 §3.12 `scimType` detail, where one applies.
    pub fn scim_type(&self) -> Option<&'static str> {
        match self {
            Self::Conflict { .. } | Self::Storage(StorageError::UniqueViolation { .. }) => {
                Some("uniqueness")
            }
            Self::InvalidRequest { .. } => Some("invalidValue"),
            Self::Json(_) => Some("invalidSyntax"),
            Self::UnsupportedOperation { operation } if operation.starts_with("filter") => {
                Some("invalidFilter")
            }
            _ => None,
        }
    }
}

// Result type aliases for convenience
pub type ScimResult<T> = Result<T, ScimError>;
