//! Storage-specific error types.
//!
//! These errors describe persistence failures only; they carry no SCIM semantics.
//! The provisioning layer converts them into [`crate::ScimError`] values.

/// Errors that can occur during storage operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// The row to update or delete does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A uniqueness constraint rejected an insert or update.
    #[error("Unique constraint violated for {entity}: {key}")]
    UniqueViolation { entity: String, key: String },

    /// Generic backend failure.
    #[error("Storage failure: {message}")]
    Internal { message: String },
}

impl StorageError {
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn unique_violation(entity: impl Into<String>, key: impl Into<String>) -> Self {
        Self::UniqueViolation {
            entity: entity.into(),
            key: key.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation { .. })
    }
}

pub type StorageResult<T> = Result<T, StorageError>;
