//! Error types for schema wiring and per-instance field access.
//!
//! Errors fall into two groups. Schema-build errors (`Configuration`,
//! `DuplicateRegistration`) abort the whole entity definition. Per-instance
//! errors (`RestrictedField`, `Validation`) are raised at the offending
//! access and leave the other fields of the instance untouched.

use std::fmt;
use thiserror::Error;

/// Direct field operations checked by the access guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOperation {
    /// Reading a field value
    Get,
    /// Writing a field value
    Set,
    /// Removing a field value
    Delete,
}

impl fmt::Display for FieldOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldOperation::Get => write!(f, "access"),
            FieldOperation::Set => write!(f, "set"),
            FieldOperation::Delete => write!(f, "delete"),
        }
    }
}

/// Main error type for remodel operations.
#[derive(Debug, Error)]
pub enum RemodelError {
    /// Malformed entity or relation declaration
    #[error("Configuration error in '{entity}': {message}")]
    Configuration { entity: String, message: String },

    /// An entity name was registered twice
    #[error("Entity '{entity}' is already registered")]
    DuplicateRegistration { entity: String },

    /// Direct access to a field owned by a relation descriptor
    #[error("Cannot {operation} {field}: field is restricted")]
    RestrictedField {
        field: String,
        operation: FieldOperation,
    },

    /// A value was rejected by its field descriptor
    #[error("{message}")]
    Validation { message: String },

    /// The record store failed while resolving a relation
    #[error("Record store operation failed: {context}")]
    Store {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Serialization or deserialization failed
    #[error("Serialization failed: {context}")]
    Serialization {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Convenience type alias for Results with RemodelError
pub type Result<T> = std::result::Result<T, RemodelError>;

impl RemodelError {
    /// Creates a configuration error for the given entity
    pub fn configuration(entity: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration {
            entity: entity.into(),
            message: message.into(),
        }
    }

    /// Creates a duplicate registration error
    pub fn duplicate(entity: impl Into<String>) -> Self {
        Self::DuplicateRegistration {
            entity: entity.into(),
        }
    }

    /// Creates a restricted field error
    pub fn restricted(field: impl Into<String>, operation: FieldOperation) -> Self {
        Self::RestrictedField {
            field: field.into(),
            operation,
        }
    }

    /// Creates a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates a store error with context
    pub fn store_failed<E>(context: impl Into<String>, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Store {
            context: context.into(),
            source: Box::new(error),
        }
    }

    /// Returns true for the duplicate-registration condition.
    pub fn is_duplicate_registration(&self) -> bool {
        matches!(self, Self::DuplicateRegistration { .. })
    }
}
