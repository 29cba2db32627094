//! # Enum Registry
//!
//! Named enumerations loaded once at process start from external definitions
//! of the shape `{enumKey: {datas: [{enumName, ...}]}}`. The registry is
//! read-only for the process lifetime; share it as `Arc<EnumRegistry>` and
//! read concurrently without locking.
//!
//! Lookups are fail-closed: an unknown enum key yields an empty value set
//! (logged at `warn`), so any array condition validated against it rejects
//! every value.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One entry of an enum definition. Only `enumName` participates in
/// membership checks; everything else is carried as opaque metadata.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumEntry {
    /// The value as stored in the database and matched by filters
    pub enum_name: String,
    /// Display labels, sort weights and whatever else the definitions carry
    #[serde(flatten)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// A named enumeration: the set of valid values is exactly
/// `datas.iter().map(|d| &d.enum_name)`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EnumDefinition {
    /// The entries, in definition order
    pub datas: Vec<EnumEntry>,
}

/// Result of validating an array of values against one enum.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrayValidation {
    /// True only when `invalid_values` is empty
    pub valid: bool,
    /// Values that are not members of the enum
    pub invalid_values: Vec<String>,
    /// Values that are members, in input order
    pub valid_values: Vec<String>,
    /// Human-readable summary
    pub message: String,
}

/// Immutable lookup of named enumerations.
#[derive(Debug, Clone, Default)]
pub struct EnumRegistry {
    enums: HashMap<String, EnumDefinition>,
}

impl EnumRegistry {
    /// Build a registry from already-deserialized definitions.
    #[must_use]
    pub fn from_definitions(enums: HashMap<String, EnumDefinition>) -> Self {
        Self { enums }
    }

    /// Build a registry from the raw JSON definition map.
    ///
    /// # Errors
    ///
    /// Returns the serde error when the JSON does not match the
    /// `{enumKey: {datas: [{enumName, ...}]}}` shape.
    pub fn from_json(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        let enums: HashMap<String, EnumDefinition> = serde_json::from_value(value)?;
        Ok(Self { enums })
    }

    /// Number of registered enums.
    #[must_use]
    pub fn len(&self) -> usize {
        self.enums.len()
    }

    /// True when no enums are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.enums.is_empty()
    }

    /// The valid values for `enum_key`, in definition order.
    ///
    /// Unknown keys log a warning and return an empty vec - never `None`,
    /// never a panic.
    #[must_use]
    pub fn get_values(&self, enum_key: &str) -> Vec<String> {
        match self.enums.get(enum_key) {
            Some(def) => def.datas.iter().map(|d| d.enum_name.clone()).collect(),
            None => {
                tracing::warn!(enum_key, "Unknown enum key, treating value set as empty");
                Vec::new()
            }
        }
    }

    /// Membership test for a single value.
    #[must_use]
    pub fn is_valid(&self, enum_key: &str, value: &str) -> bool {
        self.enums
            .get(enum_key)
            .is_some_and(|def| def.datas.iter().any(|d| d.enum_name == value))
    }

    /// Partition `values` into valid/invalid against `enum_key`.
    pub fn validate_array<V: ToString>(&self, enum_key: &str, values: &[V]) -> ArrayValidation {
        let allowed = self.get_values(enum_key);
        let mut invalid_values = Vec::new();
        let mut valid_values = Vec::new();
        for value in values {
            let value = value.to_string();
            if allowed.contains(&value) {
                valid_values.push(value);
            } else {
                invalid_values.push(value);
            }
        }
        let valid = invalid_values.is_empty();
        let message = if valid {
            format!("All {} value(s) valid for '{enum_key}'", valid_values.len())
        } else {
            format!(
                "Invalid values [{}] for enum '{enum_key}', allowed values are [{}]",
                invalid_values.join(", "),
                allowed.join(", ")
            )
        };
        ArrayValidation {
            valid,
            invalid_values,
            valid_values,
            message,
        }
    }

    /// The allowed value set, for error reporting.
    #[must_use]
    pub fn allowed_values(&self, enum_key: &str) -> Vec<String> {
        self.get_values(enum_key)
    }
}
