//! Declarative per-table field rules.
//!
//! Rules are loaded from configuration at startup (plain serde shapes, so
//! JSON or YAML both work) and are immutable afterwards, like the enum
//! registry. Validation collects every violated rule's message rather than
//! stopping at the first, so a client can fix a payload in one round trip.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::enums::EnumRegistry;

/// Expected shape of a field's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Any JSON value (the default: shape unchecked)
    #[default]
    Any,
    /// JSON string
    String,
    /// JSON integer
    Integer,
    /// JSON number
    Float,
    /// JSON boolean, or 0/1
    Boolean,
    /// JSON object or array, or a JSON-encoded string
    Json,
}

impl FieldKind {
    fn matches(self, value: &Value) -> bool {
        match self {
            Self::Any => true,
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Float => value.is_number(),
            Self::Boolean => {
                value.is_boolean() || matches!(value.as_i64(), Some(0) | Some(1))
            }
            Self::Json => {
                value.is_object()
                    || value.is_array()
                    || value
                        .as_str()
                        .is_some_and(|s| serde_json::from_str::<Value>(s).is_ok())
            }
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "number",
            Self::Boolean => "boolean",
            Self::Json => "json",
        }
    }
}

/// One field's declared constraints.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldRule {
    /// DB-side (snake_case) field name
    pub name: String,
    /// Must be present and non-null on inserts
    pub required: bool,
    /// Expected value shape
    pub kind: FieldKind,
    /// Maximum string length (characters)
    pub max_length: Option<usize>,
    /// Minimum numeric value
    pub min: Option<f64>,
    /// Maximum numeric value
    pub max: Option<f64>,
    /// Enum key the value must belong to
    pub enum_key: Option<String>,
}

impl Default for FieldRule {
    fn default() -> Self {
        Self {
            name: String::new(),
            required: false,
            kind: FieldKind::Any,
            max_length: None,
            min: None,
            max: None,
            enum_key: None,
        }
    }
}

impl FieldRule {
    /// Shorthand for a required field of the given kind.
    #[must_use]
    pub fn required(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            required: true,
            kind,
            ..Self::default()
        }
    }

    /// Shorthand for an optional field of the given kind.
    #[must_use]
    pub fn optional(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            ..Self::default()
        }
    }

    /// Attach a maximum string length.
    #[must_use]
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    /// Attach a numeric range.
    #[must_use]
    pub fn with_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    /// Require membership in the named enum.
    #[must_use]
    pub fn with_enum(mut self, enum_key: impl Into<String>) -> Self {
        self.enum_key = Some(enum_key.into());
        self
    }

    fn check(&self, value: &Value, registry: &EnumRegistry, errors: &mut Vec<String>) {
        if value.is_null() {
            // Nullability is the `required` check's concern (insert only)
            return;
        }
        if !self.kind.matches(value) {
            errors.push(format!(
                "Field '{}' must be of type {}",
                self.name,
                self.kind.label()
            ));
            return;
        }
        if let (Some(max_length), Some(s)) = (self.max_length, value.as_str())
            && s.chars().count() > max_length
        {
            errors.push(format!(
                "Field '{}' must be at most {max_length} characters",
                self.name
            ));
        }
        if let Some(n) = value.as_f64() {
            if let Some(min) = self.min
                && n < min
            {
                errors.push(format!("Field '{}' must be at least {min}", self.name));
            }
            if let Some(max) = self.max
                && n > max
            {
                errors.push(format!("Field '{}' must be at most {max}", self.name));
            }
        }
        if let Some(enum_key) = &self.enum_key {
            let as_string = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                _ => value.to_string(),
            };
            if !registry.is_valid(enum_key, &as_string) {
                errors.push(format!(
                    "Field '{}' value '{as_string}' is not a member of enum '{enum_key}'",
                    self.name
                ));
            }
        }
    }
}

/// All rules for one table.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TableRules {
    /// Field rules, in declaration order
    pub fields: Vec<FieldRule>,
}

/// The configured rule sets, keyed by table name.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RuleSet {
    #[serde(flatten)]
    tables: HashMap<String, TableRules>,
}

impl RuleSet {
    /// Build from already-assembled table rules.
    #[must_use]
    pub fn from_tables(tables: HashMap<String, TableRules>) -> Self {
        Self { tables }
    }

    /// Build from the raw configuration JSON
    /// (`{"cms_workout": {"fields": [...]}}`).
    ///
    /// # Errors
    ///
    /// Returns the serde error when the JSON does not match the rule shape.
    pub fn from_json(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Rules for a table; tables without configured rules validate
    /// vacuously.
    #[must_use]
    pub fn table(&self, table: &str) -> Option<&TableRules> {
        self.tables.get(table)
    }

    /// Validate a DB-shaped payload (snake_case keys) against a table's
    /// rules. `for_insert` additionally enforces `required` presence.
    /// Returns every violation message; empty means valid.
    #[must_use]
    pub fn validate(
        &self,
        table: &str,
        data: &serde_json::Map<String, Value>,
        registry: &EnumRegistry,
        for_insert: bool,
    ) -> Vec<String> {
        let Some(rules) = self.tables.get(table) else {
            return Vec::new();
        };
        let mut errors = Vec::new();
        for rule in &rules.fields {
            if let Some(value) = data.get(&rule.name) {
                rule.check(value, registry, &mut errors);
            }
            if for_insert
                && rule.required
                && data.get(&rule.name).is_none_or(Value::is_null)
            {
                errors.push(format!("Field '{}' is required", rule.name));
            }
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry() -> EnumRegistry {
        EnumRegistry::from_json(json!({
            "StatusEnum": { "datas": [{ "enumName": "ENABLED" }, { "enumName": "DISABLED" }] }
        }))
        .unwrap()
    }

    fn rules() -> RuleSet {
        let mut tables = HashMap::new();
        tables.insert(
            "cms_workout".to_string(),
            TableRules {
                fields: vec![
                    FieldRule::required("name", FieldKind::String).with_max_length(50),
                    FieldRule::optional("status", FieldKind::String).with_enum("StatusEnum"),
                    FieldRule::optional("sort_order", FieldKind::Integer)
                        .with_range(Some(0.0), Some(999.0)),
                ],
            },
        );
        RuleSet::from_tables(tables)
    }

    fn as_map(value: Value) -> serde_json::Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn valid_insert_passes() {
        let errors = rules().validate(
            "cms_workout",
            &as_map(json!({"name": "Leg Day", "status": "ENABLED", "sort_order": 5})),
            &registry(),
            true,
        );
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn missing_required_fails_insert_only() {
        let data = as_map(json!({"status": "ENABLED"}));
        let reg = registry();
        let rs = rules();

        let errors = rs.validate("cms_workout", &data, &reg, true);
        assert_eq!(errors, vec!["Field 'name' is required"]);

        // Updates may omit required fields
        let errors = rs.validate("cms_workout", &data, &reg, false);
        assert!(errors.is_empty());
    }

    #[test]
    fn all_violations_collected() {
        let errors = rules().validate(
            "cms_workout",
            &as_map(json!({
                "name": "x".repeat(60),
                "status": "BOGUS",
                "sort_order": 5000
            })),
            &registry(),
            true,
        );
        assert_eq!(errors.len(), 3, "{errors:?}");
    }

    #[test]
    fn type_mismatch_reported() {
        let errors = rules().validate(
            "cms_workout",
            &as_map(json!({"name": 3, "sort_order": "five"})),
            &registry(),
            false,
        );
        assert!(errors.iter().any(|e| e.contains("'name'") && e.contains("string")));
        assert!(errors.iter().any(|e| e.contains("'sort_order'") && e.contains("integer")));
    }

    #[test]
    fn unconfigured_table_validates_vacuously() {
        let errors = rules().validate(
            "cms_unknown",
            &as_map(json!({"anything": "goes"})),
            &registry(),
            true,
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn rules_deserialize_from_config_json() {
        let rs = RuleSet::from_json(json!({
            "cms_music": {
                "fields": [
                    { "name": "title", "required": true, "kind": "string", "maxLength": 80 },
                    { "name": "status", "kind": "string", "enumKey": "StatusEnum" }
                ]
            }
        }))
        .unwrap();
        let table = rs.table("cms_music").unwrap();
        assert_eq!(table.fields.len(), 2);
        assert!(table.fields[0].required);
        assert_eq!(table.fields[0].max_length, Some(80));
        assert_eq!(table.fields[1].enum_key.as_deref(), Some("StatusEnum"));
    }
}
