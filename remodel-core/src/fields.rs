//! Field descriptors: per-field validation and value conversion.
//!
//! A descriptor never stores values. The record layer consults it on every
//! assignment (`validate`, then `to_storage`) and read (`to_native`). The
//! entity schema keeps one descriptor per declared plain field.

use crate::error::{RemodelError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Validation and conversion contract for a single field.
///
/// `Value::Null` is the absent value. Conversions default to identity;
/// specialized descriptors (dates, money, ...) override them.
pub trait FieldDescriptor: fmt::Debug + Send + Sync {
    /// Field name, when the descriptor is bound to one.
    fn name(&self) -> Option<&str>;

    /// Checks a value before it is stored.
    ///
    /// # Errors
    /// Returns [`RemodelError::Validation`] when the value is rejected.
    fn validate(&self, value: &Value) -> Result<()>;

    /// Converts a stored value to its native representation.
    fn to_native(&self, value: Value) -> Value {
        value
    }

    /// Converts a native value to its storage representation.
    fn to_storage(&self, value: Value) -> Value {
        value
    }
}

/// Base field: accepts any present value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Field {
    name: Option<String>,
}

impl Field {
    /// Creates a field bound to `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }

    /// Creates a field not bound to any name.
    pub fn unnamed() -> Self {
        Self::default()
    }
}

// Presence check shared by every built-in descriptor.
fn require_present(name: Option<&str>, value: &Value, kind: &str) -> Result<()> {
    if !value.is_null() {
        return Ok(());
    }

    Err(match name {
        Some(name) => RemodelError::validation(format!("{} type is not a valid type", name)),
        None => RemodelError::validation(format!("{} type is not a valid type", kind)),
    })
}

impl FieldDescriptor for Field {
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn validate(&self, value: &Value) -> Result<()> {
        require_present(self.name(), value, "Field")
    }
}

/// Numeric field: requires an integer or floating-point number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NumericField {
    name: Option<String>,
}

impl NumericField {
    /// Creates a numeric field bound to `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }

    /// Creates a numeric field not bound to any name.
    pub fn unnamed() -> Self {
        Self::default()
    }
}

impl FieldDescriptor for NumericField {
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn validate(&self, value: &Value) -> Result<()> {
        require_present(self.name(), value, "NumericField")?;

        if value.is_number() {
            return Ok(());
        }

        Err(match self.name() {
            Some(name) => {
                RemodelError::validation(format!("{} is not a numeric type: {}", name, value))
            }
            None => RemodelError::validation(format!("{} is not a numeric type", value)),
        })
    }
}

/// String field: requires a textual value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringField {
    name: Option<String>,
}

impl StringField {
    /// Creates a string field bound to `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }

    /// Creates a string field not bound to any name.
    pub fn unnamed() -> Self {
        Self::default()
    }
}

impl FieldDescriptor for StringField {
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn validate(&self, value: &Value) -> Result<()> {
        if value.is_string() {
            return Ok(());
        }

        Err(match self.name() {
            Some(name) => {
                RemodelError::validation(format!("{} is not a string type: {}", name, value))
            }
            None => RemodelError::validation(format!("\"{}\" is not a string type", value)),
        })
    }
}

/// Built-in field kinds available to declarative definitions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Any present value
    #[default]
    Any,
    /// Integer or floating-point number
    Numeric,
    /// Text
    String,
    /// Caller-supplied descriptor (not expressible in JSON)
    #[serde(skip)]
    Custom(Arc<dyn FieldDescriptor>),
}

/// Declaration of a plain (non-relation) field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Field name
    pub name: String,
    /// Validation and conversion rule
    #[serde(default)]
    pub kind: FieldKind,
    /// Value seeded into new instances
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl FieldSpec {
    /// Declares a field accepting any present value.
    pub fn any(name: impl Into<String>) -> Self {
        Self::with_kind(name, FieldKind::Any)
    }

    /// Declares a numeric field.
    pub fn numeric(name: impl Into<String>) -> Self {
        Self::with_kind(name, FieldKind::Numeric)
    }

    /// Declares a string field.
    pub fn string(name: impl Into<String>) -> Self {
        Self::with_kind(name, FieldKind::String)
    }

    /// Declares a field backed by a custom descriptor.
    pub fn custom(name: impl Into<String>, descriptor: Arc<dyn FieldDescriptor>) -> Self {
        Self::with_kind(name, FieldKind::Custom(descriptor))
    }

    fn with_kind(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            default: None,
        }
    }

    /// Builder method to set the default value.
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Builds the descriptor for this field, bound to the field name.
    pub fn descriptor(&self) -> Arc<dyn FieldDescriptor> {
        match &self.kind {
            FieldKind::Any => Arc::new(Field::new(&self.name)),
            FieldKind::Numeric => Arc::new(NumericField::new(&self.name)),
            FieldKind::String => Arc::new(StringField::new(&self.name)),
            FieldKind::Custom(descriptor) => Arc::clone(descriptor),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_base_field_requires_presence() {
        let field = Field::new("title");
        assert!(field.validate(&json!("hello")).is_ok());
        assert!(field.validate(&json!(0)).is_ok());

        let error = field.validate(&Value::Null).expect_err("null must fail");
        assert!(matches!(error, RemodelError::Validation { .. }));
        assert_eq!(error.to_string(), "title type is not a valid type");

        let error = Field::unnamed()
            .validate(&Value::Null)
            .expect_err("null must fail");
        assert_eq!(error.to_string(), "Field type is not a valid type");
    }

    #[test]
    fn test_numeric_field_validation() {
        let field = NumericField::unnamed();
        assert!(field.validate(&json!(3)).is_ok());
        assert!(field.validate(&json!(3.5)).is_ok());
        assert!(field.validate(&json!(-7)).is_ok());

        assert!(matches!(
            field.validate(&Value::Null),
            Err(RemodelError::Validation { .. })
        ));

        let error = field.validate(&json!("3")).expect_err("string must fail");
        assert_eq!(error.to_string(), "\"3\" is not a numeric type");

        assert!(field.validate(&json!(true)).is_err());
        assert!(field.validate(&json!([1, 2])).is_err());
    }

    #[test]
    fn test_numeric_field_names_offending_value() {
        let field = NumericField::new("views");
        let error = field.validate(&json!("many")).expect_err("string must fail");
        assert_eq!(error.to_string(), "views is not a numeric type: \"many\"");

        let error = field.validate(&Value::Null).expect_err("null must fail");
        assert_eq!(error.to_string(), "views type is not a valid type");
    }

    #[test]
    fn test_string_field_validation() {
        let field = StringField::unnamed();
        assert!(field.validate(&json!("x")).is_ok());
        assert!(field.validate(&json!("")).is_ok());

        let error = field.validate(&json!(3)).expect_err("number must fail");
        assert!(matches!(error, RemodelError::Validation { .. }));
        assert_eq!(error.to_string(), "\"3\" is not a string type");

        let named = StringField::new("title");
        let error = named.validate(&Value::Null).expect_err("null must fail");
        assert_eq!(error.to_string(), "title is not a string type: null");
    }

    #[test]
    fn test_conversions_default_to_identity() {
        let field = StringField::new("title");
        assert_eq!(field.to_native(json!("a")), json!("a"));
        assert_eq!(field.to_storage(json!("a")), json!("a"));
    }

    #[test]
    fn test_field_spec_descriptor_is_bound() {
        let spec = FieldSpec::numeric("views").with_default(json!(0));
        let descriptor = spec.descriptor();
        assert_eq!(descriptor.name(), Some("views"));
        assert_eq!(spec.default, Some(json!(0)));
        assert!(descriptor.validate(&json!("x")).is_err());
    }

    #[test]
    fn test_field_spec_from_json() {
        let spec: FieldSpec =
            serde_json::from_str(r#"{"name": "title", "kind": "string"}"#).expect("deserialize");
        assert!(matches!(spec.kind, FieldKind::String));
        assert!(spec.default.is_none());

        let spec: FieldSpec = serde_json::from_str(r#"{"name": "note"}"#).expect("deserialize");
        assert!(matches!(spec.kind, FieldKind::Any));
    }
}
