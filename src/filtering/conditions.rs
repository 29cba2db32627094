//! # Condition Builder
//!
//! Accumulates typed filter predicates and renders them into one
//! parameterized WHERE fragment. Each predicate is a `(fragment, values)`
//! pair; rendering joins the fragments and flattens the value lists in the
//! same order, so placeholder order always matches parameter order. That
//! alignment is the one load-bearing invariant of this module: values are
//! only ever bound, never spliced into SQL text. Identifiers (field names)
//! are the only interpolated strings and must pass a strict character check.
//!
//! The `add_*` methods are deliberately silent no-ops on absent input so a
//! handler can call them unconditionally for every optional query parameter.
//! Only validation failures (unknown enum value, bad operator or match type,
//! bad identifier) return errors - those indicate a programming error or
//! hostile input, not "the user didn't filter by this field".

use sea_orm::Value;
use std::sync::Arc;

use crate::enums::EnumRegistry;
use crate::errors::CrudError;

/// Comparison operators accepted by [`ConditionBuilder::add_number_condition`].
const NUMBER_OPERATORS: [&str; 6] = ["=", ">", "<", ">=", "<=", "!="];

/// One bound filter fragment plus its parameter values, immutable once built.
#[derive(Debug, Clone)]
pub struct Predicate {
    fragment: String,
    values: Vec<Value>,
}

/// How predicates are joined when rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Connector {
    /// `AND` (the default)
    #[default]
    And,
    /// `OR`
    Or,
}

impl Connector {
    const fn as_sql(self) -> &'static str {
        match self {
            Self::And => " AND ",
            Self::Or => " OR ",
        }
    }
}

/// A rendered WHERE fragment: `clause` is `""` when no predicates exist, and
/// callers must treat that as "no filtering" - never substitute `1=1`.
#[derive(Debug, Clone, Default)]
pub struct WhereClause {
    /// The joined fragments, without the `WHERE` keyword
    pub clause: String,
    /// Bound values, in placeholder order
    pub params: Vec<Value>,
}

impl WhereClause {
    /// True when no filtering applies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clause.is_empty()
    }

    /// `" WHERE <clause>"`, or `""` when empty - ready to append to a
    /// `SELECT ... FROM table` statement.
    #[must_use]
    pub fn prefixed(&self) -> String {
        if self.clause.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clause)
        }
    }
}

/// Strict identifier check for anything interpolated into SQL text.
///
/// Lowercase snake_case with optional dots (for qualified columns), no
/// leading underscore or digit, at most 100 chars.
#[must_use]
pub fn is_valid_identifier(name: &str) -> bool {
    if name.is_empty() || name.len() > 100 {
        return false;
    }
    if name.starts_with('_') || name.starts_with('.') || name.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        return false;
    }
    name.chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '.')
}

fn check_identifier(name: &str) -> Result<(), CrudError> {
    if is_valid_identifier(name) {
        Ok(())
    } else {
        Err(CrudError::invalid_identifier(name))
    }
}

/// Mutable accumulator of [`Predicate`]s. Created per request, used once,
/// discarded; `Clone` exists so the smart keyword search can snapshot the
/// non-keyword filters before its two-phase probe.
#[derive(Debug, Clone, Default)]
pub struct ConditionBuilder {
    predicates: Vec<Predicate>,
    enums: Option<Arc<EnumRegistry>>,
}

impl ConditionBuilder {
    /// A builder without enum validation support.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A builder whose array conditions may be validated against the given
    /// registry.
    #[must_use]
    pub fn with_enums(enums: Arc<EnumRegistry>) -> Self {
        Self {
            predicates: Vec::new(),
            enums: Some(enums),
        }
    }

    /// Number of accumulated predicates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    /// True when no predicates were added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Clear all predicates and parameters.
    pub fn reset(&mut self) -> &mut Self {
        self.predicates.clear();
        self
    }

    /// Append a snapshot of another builder's predicates, preserving order.
    pub fn extend(&mut self, other: &Self) -> &mut Self {
        self.predicates.extend(other.predicates.iter().cloned());
        self
    }

    /// Add `field <op> ?` for a numeric value.
    ///
    /// Silent no-op when `value` is `None` or NaN. The operator must be one
    /// of `=`, `>`, `<`, `>=`, `<=`, `!=`.
    ///
    /// # Errors
    ///
    /// `UnsupportedOperator` for an operator outside the whitelist,
    /// `InvalidIdentifier` for a malformed field name.
    pub fn add_number_condition<N>(
        &mut self,
        field: &str,
        value: Option<N>,
        operator: &str,
    ) -> Result<&mut Self, CrudError>
    where
        N: Into<Value> + PartialEq + Copy,
    {
        let Some(v) = value else {
            return Ok(self);
        };
        // NaN is the only value that compares unequal to itself
        #[allow(clippy::eq_op)]
        if v != v {
            return Ok(self);
        }
        if !NUMBER_OPERATORS.contains(&operator) {
            return Err(CrudError::unsupported_operator(operator));
        }
        check_identifier(field)?;
        self.predicates.push(Predicate {
            fragment: format!("{field} {operator} ?"),
            values: vec![v.into()],
        });
        Ok(self)
    }

    /// Add a string predicate: `exact` → `field = ?`, `like` → `%v%`,
    /// `start` → `v%`, `end` → `%v`.
    ///
    /// Silent no-op when `value` is `None` or empty.
    ///
    /// # Errors
    ///
    /// `UnsupportedMatchType` for a match type outside
    /// `exact|like|start|end`, `InvalidIdentifier` for a malformed field name.
    pub fn add_string_condition(
        &mut self,
        field: &str,
        value: Option<&str>,
        match_type: &str,
    ) -> Result<&mut Self, CrudError> {
        let Some(v) = value else {
            return Ok(self);
        };
        if v.is_empty() {
            return Ok(self);
        }
        let (fragment_op, bound) = match match_type {
            "exact" => ("= ?", v.to_string()),
            "like" => ("LIKE ?", format!("%{v}%")),
            "start" => ("LIKE ?", format!("{v}%")),
            "end" => ("LIKE ?", format!("%{v}")),
            other => return Err(CrudError::unsupported_match_type(other)),
        };
        check_identifier(field)?;
        self.predicates.push(Predicate {
            fragment: format!("{field} {fragment_op}"),
            values: vec![bound.into()],
        });
        Ok(self)
    }

    /// Add `field IN (?,...)` with one placeholder per value, input order
    /// preserved.
    ///
    /// Silent no-op when `values` is `None` or empty. With `enum_key`, every
    /// element must belong to that enum's value set; any miss rejects the
    /// whole condition and leaves previously added predicates untouched.
    ///
    /// # Errors
    ///
    /// `EnumValidationFailed` when `enum_key` is given and any value is
    /// outside the set (an unknown key has an empty set, so everything is
    /// rejected), `InvalidIdentifier` for a malformed field name.
    pub fn add_array_condition<V>(
        &mut self,
        field: &str,
        values: Option<&[V]>,
        enum_key: Option<&str>,
    ) -> Result<&mut Self, CrudError>
    where
        V: Into<Value> + ToString + Clone,
    {
        let Some(values) = values else {
            return Ok(self);
        };
        if values.is_empty() {
            return Ok(self);
        }
        if let Some(enum_key) = enum_key {
            let validation = match &self.enums {
                Some(registry) => registry.validate_array(enum_key, values),
                None => {
                    tracing::warn!(enum_key, "No enum registry attached, rejecting all values");
                    return Err(CrudError::enum_validation_failed(
                        enum_key,
                        values.iter().map(ToString::to_string).collect(),
                        Vec::new(),
                    ));
                }
            };
            if !validation.valid {
                let allowed = self
                    .enums
                    .as_ref()
                    .map(|r| r.allowed_values(enum_key))
                    .unwrap_or_default();
                return Err(CrudError::enum_validation_failed(
                    enum_key,
                    validation.invalid_values,
                    allowed,
                ));
            }
        }
        check_identifier(field)?;
        let placeholders = vec!["?"; values.len()].join(",");
        self.predicates.push(Predicate {
            fragment: format!("{field} IN ({placeholders})"),
            values: values.iter().cloned().map(Into::into).collect(),
        });
        Ok(self)
    }

    /// Render with `AND` between predicates.
    #[must_use]
    pub fn build(&self) -> WhereClause {
        self.build_with(Connector::And)
    }

    /// Render with an explicit connector. An empty builder renders to
    /// `{clause: "", params: []}`.
    #[must_use]
    pub fn build_with(&self, connector: Connector) -> WhereClause {
        if self.predicates.is_empty() {
            return WhereClause::default();
        }
        let clause = self
            .predicates
            .iter()
            .map(|p| p.fragment.as_str())
            .collect::<Vec<_>>()
            .join(connector.as_sql());
        let params = self
            .predicates
            .iter()
            .flat_map(|p| p.values.iter().cloned())
            .collect();
        WhereClause { clause, params }
    }
}
