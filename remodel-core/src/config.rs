//! Naming conventions used when relation declarations omit explicit keys.
//!
//! The defaults reproduce the conventional layout: primary key `id`,
//! foreign keys `<entity>_id`, join entities prefixed with `_`, and fields
//! starting with `_` treated as internal.

use serde::{Deserialize, Serialize};

/// Naming conventions applied by the relation parser and access guard.
///
/// # Example
/// ```rust
/// use remodel_core::config::NamingConfig;
///
/// let config = NamingConfig::new()
///     .with_primary_key("pk")
///     .with_foreign_key_suffix("_ref");
///
/// assert!(config.validate().is_ok());
/// assert_eq!(config.foreign_key("User"), "user_ref");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    /// Primary key field name on every entity
    pub primary_key: String,
    /// Suffix appended to a lowercased entity name to form a foreign key
    pub foreign_key_suffix: String,
    /// Prefix of synthesized join-entity names
    pub join_prefix: String,
    /// Fields starting with this prefix are internal and never mapped out
    pub internal_prefix: String,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            primary_key: "id".to_string(),
            foreign_key_suffix: "_id".to_string(),
            join_prefix: "_".to_string(),
            internal_prefix: "_".to_string(),
        }
    }
}

impl NamingConfig {
    /// Creates a naming config with the conventional defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates naming parameters.
    ///
    /// # Errors
    /// Returns a configuration error if any name part is empty or contains
    /// whitespace.
    pub fn validate(&self) -> crate::Result<()> {
        let parts = [
            ("primary_key", &self.primary_key),
            ("foreign_key_suffix", &self.foreign_key_suffix),
            ("join_prefix", &self.join_prefix),
            ("internal_prefix", &self.internal_prefix),
        ];

        for (label, value) in parts {
            if value.is_empty() {
                return Err(crate::error::RemodelError::configuration(
                    "naming",
                    format!("{} cannot be empty", label),
                ));
            }
            if value.chars().any(char::is_whitespace) {
                return Err(crate::error::RemodelError::configuration(
                    "naming",
                    format!("{} cannot contain whitespace", label),
                ));
            }
        }

        Ok(())
    }

    /// Builder method to set the primary key name.
    pub fn with_primary_key(mut self, primary_key: impl Into<String>) -> Self {
        self.primary_key = primary_key.into();
        self
    }

    /// Builder method to set the foreign key suffix.
    pub fn with_foreign_key_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.foreign_key_suffix = suffix.into();
        self
    }

    /// Builder method to set the join-entity prefix.
    pub fn with_join_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.join_prefix = prefix.into();
        self
    }

    /// Builder method to set the internal field prefix.
    pub fn with_internal_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.internal_prefix = prefix.into();
        self
    }

    /// Conventional foreign key pointing at `entity`: `<lowercase(entity)><suffix>`.
    pub fn foreign_key(&self, entity: &str) -> String {
        format!("{}{}", entity.to_lowercase(), self.foreign_key_suffix)
    }

    /// Whether a field name is internal (hidden from mappings).
    pub fn is_internal(&self, field: &str) -> bool {
        field.starts_with(&self.internal_prefix)
    }
}
