use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

use crate::errors::CrudError;

/// Query parameters shared by every paginated list endpoint.
///
/// # Keyword search
/// The `keywords` parameter drives the smart keyword search: an all-digit
/// value is first probed as an exact ID match and falls back to a fuzzy name
/// search when no row matches. Anything else goes straight to the fuzzy name
/// search.
///
/// # Pagination
/// `pageIndex` (1-based, default 1) and `pageSize` (default 10, capped at 100).
/// Values arrive as strings from the query layer; malformed or out-of-range
/// input is silently clamped, never rejected.
///
/// # Sorting
/// `orderBy` names a column (whitelisted per resource) and `orderDirection`
/// is `ASC` or `DESC`, case-insensitive, defaulting to `DESC`.
#[derive(Debug, Deserialize, IntoParams, ToSchema, Default)]
#[serde(rename_all = "camelCase", default)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// Free-text keyword. All-digit input is treated as an ID lookup first.
    ///
    /// Example: `7` or `Leg Day`
    #[param(example = "Leg Day")]
    pub keywords: Option<String>,
    /// 1-based page number; clamped to `[1, ∞)`, default `1`.
    #[param(value_type = String, example = "1")]
    pub page_index: Option<serde_json::Value>,
    /// Page size; clamped to `[1, 100]`, default `10`.
    #[param(value_type = String, example = "10")]
    pub page_size: Option<serde_json::Value>,
    /// Sort column, whitelisted against the resource's sortable columns.
    #[param(example = "create_time")]
    pub order_by: Option<String>,
    /// `ASC` or `DESC` (case-insensitive), default `DESC`.
    #[param(example = "DESC")]
    pub order_direction: Option<String>,
}

impl ListParams {
    /// Convenience constructor for callers that already hold typed values
    /// (mostly tests and internal fan-out).
    #[must_use]
    pub fn with_keywords(keywords: impl Into<String>) -> Self {
        Self {
            keywords: Some(keywords.into()),
            ..Self::default()
        }
    }
}

/// One page of converted records plus paging metadata.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageEnvelope {
    /// The records, already converted to API shape (camelCase keys,
    /// processed values)
    pub data: Vec<serde_json::Value>,
    /// Total row count across all pages
    pub total: u64,
    /// 1-based page number actually used
    pub page_index: u64,
    /// Page size actually used
    pub page_size: u64,
    /// `ceil(total / page_size)`
    pub total_pages: u64,
}

impl PageEnvelope {
    /// Assemble a page, deriving `total_pages` from `total` and `page_size`.
    #[must_use]
    pub fn new(data: Vec<serde_json::Value>, total: u64, page_index: u64, page_size: u64) -> Self {
        let total_pages = if page_size == 0 {
            0
        } else {
            total.div_ceil(page_size)
        };
        Self {
            data,
            total,
            page_index,
            page_size,
            total_pages,
        }
    }
}

/// Uniform result envelope shared by all validated CRUD operations.
///
/// Route handlers branch purely on `success`; expected failure modes
/// (validation, not-found, conflict) never surface as `Err`, they come back as
/// `success: false` with an `error` code and HTTP-ish `status_code`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CrudOutcome {
    /// Whether the operation succeeded
    pub success: bool,
    /// Payload for reads; a [`PageEnvelope`] for paginated ops
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    /// Stable error code (e.g. `RECORD_NOT_FOUND`) when `success` is false
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Human-readable message when `success` is false
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// HTTP status code the route layer should answer with
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    /// Auto-increment ID of the inserted row, for inserts only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insert_id: Option<i64>,
}

impl CrudOutcome {
    /// Successful operation with a payload
    #[must_use]
    pub fn ok(data: serde_json::Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: None,
            status_code: None,
            insert_id: None,
        }
    }

    /// Successful operation without a payload (updates, deletes)
    #[must_use]
    pub fn ok_empty() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
            message: None,
            status_code: None,
            insert_id: None,
        }
    }

    /// Successful insert carrying the new row's ID
    #[must_use]
    pub fn created(insert_id: i64) -> Self {
        Self {
            success: true,
            data: Some(json!({ "id": insert_id })),
            error: None,
            message: None,
            status_code: None,
            insert_id: Some(insert_id),
        }
    }

    /// Successful paginated read
    #[must_use]
    pub fn page(envelope: PageEnvelope) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(envelope).ok(),
            error: None,
            message: None,
            status_code: None,
            insert_id: None,
        }
    }

    /// Expected failure, folded from a [`CrudError`]
    #[must_use]
    pub fn failure(error: &CrudError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.code().to_string()),
            message: Some(error.user_message()),
            status_code: Some(error.status_code().as_u16()),
            insert_id: None,
        }
    }
}
