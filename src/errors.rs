//! # Error Handling
//!
//! A single error type shared by the condition builder, the converters and the
//! CRUD engine. Each variant maps to an HTTP status code and a stable string
//! code that route handlers (and the [`crate::models::CrudOutcome`] envelope)
//! dispatch on.
//!
//! ## Philosophy
//!
//! **Never expose internal errors to users.** Database errors and driver
//! details are logged server-side via `tracing` but the response body only
//! carries a generic message. Expected business outcomes (validation failure,
//! not-found, uniqueness conflict) are *not* exceptional: the engine folds them
//! into its result envelope, and only unexpected failures propagate as `Err`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde::Serialize;
use std::fmt;

/// Error type for the data-access layer.
///
/// The first group of variants are caller-facing (4xx); the second group are
/// programmer errors or driver failures (5xx) that should not occur in normal
/// operation.
#[derive(Debug)]
pub enum CrudError {
    /// 400 Bad Request - field rules rejected the payload
    ValidationFailed {
        /// One message per violated rule
        errors: Vec<String>,
    },

    /// 400 Bad Request - an array filter contained values outside the enum
    EnumValidationFailed {
        /// Enum key the values were checked against
        enum_key: String,
        /// Values that are not members of the enum
        invalid_values: Vec<String>,
        /// The full allowed value set
        allowed_values: Vec<String>,
    },

    /// 404 Not Found - lookup or update target missing
    RecordNotFound {
        /// Entity label (e.g. "Workout", "Playlist")
        entity: String,
        /// Optional ID that wasn't found
        id: Option<String>,
    },

    /// 409 Conflict - a pre-write uniqueness probe found an existing row
    UniqueConstraintConflict {
        /// Entity label
        entity: String,
        /// Field that collided
        field: String,
    },

    /// 500-class - comparison operator outside the whitelist
    UnsupportedOperator {
        /// The operator as supplied
        operator: String,
    },

    /// 500-class - string match type outside the whitelist
    UnsupportedMatchType {
        /// The match type as supplied
        match_type: String,
    },

    /// 500-class - a field or table name failed the identifier check
    InvalidIdentifier {
        /// The rejected identifier
        identifier: String,
    },

    /// 500 Internal Server Error - database failure (details logged, not exposed)
    Database {
        /// User-facing generic message
        message: String,
        /// Internal error (logged, not sent to user)
        internal: DbErr,
    },

    /// 500 Internal Server Error - anything else unexpected
    Internal {
        /// User-facing generic message
        message: String,
        /// Internal details (logged, not sent to user)
        internal: Option<String>,
    },
}

impl CrudError {
    // ============================================================================
    // Constructors
    // ============================================================================

    /// Create a 400 validation error from collected rule messages
    pub fn validation_failed(errors: Vec<String>) -> Self {
        Self::ValidationFailed { errors }
    }

    /// Create a 400 enum-validation error naming both the rejected and the
    /// allowed values
    pub fn enum_validation_failed(
        enum_key: impl Into<String>,
        invalid_values: Vec<String>,
        allowed_values: Vec<String>,
    ) -> Self {
        Self::EnumValidationFailed {
            enum_key: enum_key.into(),
            invalid_values,
            allowed_values,
        }
    }

    /// Create a 404 error
    ///
    /// # Example
    /// ```rust,ignore
    /// return Err(CrudError::record_not_found("Workout", Some(id.to_string())));
    /// ```
    pub fn record_not_found(entity: impl Into<String>, id: Option<String>) -> Self {
        Self::RecordNotFound {
            entity: entity.into(),
            id,
        }
    }

    /// Create a 409 conflict error for a uniqueness collision
    pub fn unique_conflict(entity: impl Into<String>, field: impl Into<String>) -> Self {
        Self::UniqueConstraintConflict {
            entity: entity.into(),
            field: field.into(),
        }
    }

    /// Create an unsupported-operator error (programmer error)
    pub fn unsupported_operator(operator: impl Into<String>) -> Self {
        Self::UnsupportedOperator {
            operator: operator.into(),
        }
    }

    /// Create an unsupported-match-type error (programmer error)
    pub fn unsupported_match_type(match_type: impl Into<String>) -> Self {
        Self::UnsupportedMatchType {
            match_type: match_type.into(),
        }
    }

    /// Create an invalid-identifier error (programmer error or hostile input)
    pub fn invalid_identifier(identifier: impl Into<String>) -> Self {
        Self::InvalidIdentifier {
            identifier: identifier.into(),
        }
    }

    /// Create a 500 error from a database failure
    ///
    /// The driver error is logged but NOT sent to the user.
    pub fn database(err: DbErr) -> Self {
        Self::Database {
            message: "A database error occurred".to_string(),
            internal: err,
        }
    }

    /// Create a 500 error with optional internal details
    pub fn internal(message: impl Into<String>, internal: Option<String>) -> Self {
        Self::Internal {
            message: message.into(),
            internal,
        }
    }

    // ============================================================================
    // Accessors
    // ============================================================================

    /// Stable string code surfaced in the result envelope's `error` field
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::ValidationFailed { .. } => "VALIDATION_FAILED",
            Self::EnumValidationFailed { .. } => "ENUM_VALIDATION_FAILED",
            Self::RecordNotFound { .. } => "RECORD_NOT_FOUND",
            Self::UniqueConstraintConflict { .. } => "UNIQUE_CONSTRAINT_CONFLICT",
            Self::UnsupportedOperator { .. } => "UNSUPPORTED_OPERATOR",
            Self::UnsupportedMatchType { .. } => "UNSUPPORTED_MATCH_TYPE",
            Self::InvalidIdentifier { .. } => "INVALID_IDENTIFIER",
            Self::Database { .. } => "DATABASE_ERROR",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    /// HTTP status code for this error
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ValidationFailed { .. } | Self::EnumValidationFailed { .. } => {
                StatusCode::BAD_REQUEST
            }
            Self::RecordNotFound { .. } => StatusCode::NOT_FOUND,
            Self::UniqueConstraintConflict { .. } => StatusCode::CONFLICT,
            Self::UnsupportedOperator { .. }
            | Self::UnsupportedMatchType { .. }
            | Self::InvalidIdentifier { .. }
            | Self::Database { .. }
            | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// True for outcomes a route handler is expected to branch on (4xx);
    /// the engine folds these into the envelope instead of returning `Err`.
    #[must_use]
    pub fn is_expected(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// User-facing message (sanitized)
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::ValidationFailed { errors } => {
                if errors.len() == 1 {
                    errors[0].clone()
                } else {
                    format!("Validation failed: {}", errors.join(", "))
                }
            }
            Self::EnumValidationFailed {
                enum_key,
                invalid_values,
                allowed_values,
            } => format!(
                "Invalid values [{}] for enum '{}', allowed values are [{}]",
                invalid_values.join(", "),
                enum_key,
                allowed_values.join(", ")
            ),
            Self::RecordNotFound { entity, id } => {
                if let Some(id) = id {
                    format!("{entity} with ID '{id}' not found")
                } else {
                    format!("{entity} not found")
                }
            }
            Self::UniqueConstraintConflict { entity, field } => {
                format!("{entity} with the same {field} already exists")
            }
            Self::UnsupportedOperator { operator } => {
                format!("Unsupported comparison operator '{operator}'")
            }
            Self::UnsupportedMatchType { match_type } => {
                format!("Unsupported match type '{match_type}'")
            }
            Self::InvalidIdentifier { identifier } => {
                format!("Invalid field or table identifier '{identifier}'")
            }
            Self::Database { message, .. } | Self::Internal { message, .. } => message.clone(),
        }
    }

    /// Log internal error details (not sent to user)
    ///
    /// Uses the `tracing` crate - silent unless the caller set up a subscriber.
    fn log_internal(&self) {
        match self {
            Self::Database { internal, .. } => {
                tracing::error!(error = ?internal, "Database error occurred");
            }
            Self::Internal {
                internal: Some(details),
                ..
            } => {
                tracing::error!(details = %details, "Internal error occurred");
            }
            Self::UnsupportedOperator { .. }
            | Self::UnsupportedMatchType { .. }
            | Self::InvalidIdentifier { .. } => {
                tracing::error!(error = %self.user_message(), "Query construction misuse");
            }
            _ => {
                tracing::debug!(
                    error = %self.user_message(),
                    status = %self.status_code(),
                    "Data-access error"
                );
            }
        }
    }
}

/// Error response sent to users (sanitized)
#[derive(Serialize)]
struct ErrorResponse {
    /// Stable error code
    error: String,
    /// Human-readable message
    message: String,
    /// Optional list of validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Vec<String>>,
}

impl IntoResponse for CrudError {
    fn into_response(self) -> Response {
        self.log_internal();

        let status = self.status_code();
        let response = match &self {
            Self::ValidationFailed { errors } => ErrorResponse {
                error: self.code().to_string(),
                message: "Validation failed".to_string(),
                details: Some(errors.clone()),
            },
            _ => ErrorResponse {
                error: self.code().to_string(),
                message: self.user_message(),
                details: None,
            },
        };

        (status, Json(response)).into_response()
    }
}

impl fmt::Display for CrudError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.user_message())
    }
}

impl std::error::Error for CrudError {}

impl From<DbErr> for CrudError {
    fn from(err: DbErr) -> Self {
        match &err {
            DbErr::RecordNotFound(msg) => {
                let entity = msg.split_whitespace().next().unwrap_or("Record");
                Self::RecordNotFound {
                    entity: entity.to_string(),
                    id: None,
                }
            }
            _ => Self::Database {
                message: "A database error occurred".to_string(),
                internal: err,
            },
        }
    }
}
