//! # Parameter Parsing
//!
//! Raw HTTP query values arrive as strings (or, from body payloads, as JSON
//! numbers/arrays). This module normalizes them into typed values with a
//! deliberately lenient contract: malformed input silently becomes the
//! default, never an error. Validation that can *reject* input lives
//! elsewhere (enum membership in [`crate::filtering`], field rules in
//! [`crate::engine`]); this pass only normalizes.

use serde_json::Value;

use crate::models::ListParams;

// Shared defaults and bounds
const DEFAULT_PAGE_INDEX: u64 = 1;
const DEFAULT_PAGE_SIZE: u64 = 10;
const MAX_PAGE_SIZE: u64 = 100;

/// Resolved pagination values, always in range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// 1-based page number, `>= 1`
    pub page_index: u64,
    /// Rows per page, `1..=100`
    pub page_size: u64,
    /// `(page_index - 1) * page_size`
    pub offset: u64,
}

/// Sort direction restricted to the two SQL keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    /// `ASC`
    Asc,
    /// `DESC` (the default for admin listings: newest first)
    #[default]
    Desc,
}

impl SortDirection {
    /// Parse a raw direction string, case-insensitive, defaulting to `DESC`.
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some(s) if s.eq_ignore_ascii_case("ASC") => Self::Asc,
            _ => Self::Desc,
        }
    }

    /// The SQL keyword.
    #[must_use]
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Clamp a parsed value into `[min, max]`, substituting `default` when the
/// input was absent or unparsable.
///
/// Intentionally lenient: no input can produce an error or an out-of-range
/// result.
#[must_use]
pub fn clamp(value: Option<u64>, min: u64, max: u64, default: u64) -> u64 {
    value.map_or(default, |v| v.clamp(min, max))
}

/// Parse an integer out of a raw query value (string or number).
#[must_use]
pub fn parse_int_param(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Parse a float out of a raw query value (string or number).
#[must_use]
pub fn parse_float_param(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Parse a boolean out of a raw query value.
///
/// Accepts `true`/`false`, `"true"`/`"false"` (case-insensitive) and the
/// numeric forms `1`/`0` in either representation.
#[must_use]
pub fn parse_bool_param(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        Value::String(s) => match s.trim() {
            t if t.eq_ignore_ascii_case("true") || t == "1" => Some(true),
            t if t.eq_ignore_ascii_case("false") || t == "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Parse a list parameter: a comma-separated string (`"a, b ,c"`) or a JSON
/// array of scalars. Pieces are trimmed, empty pieces dropped; `None` when
/// nothing remains (so `",,,"` is `None`, not an empty filter).
#[must_use]
pub fn parse_array_param(value: &Value) -> Option<Vec<String>> {
    let items: Vec<String> = match value {
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(ToString::to_string)
            .collect(),
        Value::Array(arr) => arr
            .iter()
            .filter_map(|v| match v {
                Value::String(s) => {
                    let t = s.trim();
                    (!t.is_empty()).then(|| t.to_string())
                }
                Value::Number(n) => Some(n.to_string()),
                Value::Bool(b) => Some(b.to_string()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };
    if items.is_empty() { None } else { Some(items) }
}

/// Resolve pagination from the raw list parameters.
///
/// `pageIndex` clamps to `[1, ∞)` with default 1; `pageSize` clamps to
/// `[1, 100]` with default 10. Unparsable input takes the default.
#[must_use]
pub fn parse_pagination(params: &ListParams) -> Pagination {
    let page_index = clamp(
        params
            .page_index
            .as_ref()
            .and_then(parse_int_param)
            .and_then(|v| u64::try_from(v).ok()),
        1,
        u64::MAX,
        DEFAULT_PAGE_INDEX,
    );
    let page_size = clamp(
        params
            .page_size
            .as_ref()
            .and_then(parse_int_param)
            .and_then(|v| u64::try_from(v).ok()),
        1,
        MAX_PAGE_SIZE,
        DEFAULT_PAGE_SIZE,
    );
    Pagination {
        page_index,
        page_size,
        offset: page_index.saturating_sub(1).saturating_mul(page_size),
    }
}

/// Resolve the sort column and direction.
///
/// The column is whitelisted against `allowed` (it lands in `ORDER BY`
/// verbatim); anything not on the list falls back to `default_column`.
#[must_use]
pub fn parse_sort<'a>(
    params: &ListParams,
    allowed: &[&'a str],
    default_column: &'a str,
) -> (&'a str, SortDirection) {
    let direction = SortDirection::parse(params.order_direction.as_deref());
    let column = params
        .order_by
        .as_deref()
        .and_then(|requested| allowed.iter().find(|col| **col == requested))
        .map_or(default_column, |col| *col);
    (column, direction)
}
