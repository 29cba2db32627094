//! # Smart Keyword Search
//!
//! The two-phase keyword protocol shared by every list endpoint: an all-digit
//! keyword usually means "look up this ID", so the ID interpretation is tried
//! first with a COUNT probe; when no row matches, the ID predicate is
//! discarded and the same digits are re-run as a fuzzy name search, with the
//! caller's other filters re-attached. Non-numeric keywords skip the probe
//! and go straight to the name search.

use sea_orm::ConnectionTrait;

use super::conditions::{ConditionBuilder, is_valid_identifier};
use crate::database::count_rows;
use crate::errors::CrudError;

fn is_all_digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

/// Resolve the `keywords` parameter into a condition builder.
///
/// `base` holds the non-keyword filters already accumulated by the caller;
/// it is snapshotted, never mutated. The returned builder contains the
/// keyword predicate (if any) followed by the base filters, so the rendered
/// clause reads `name LIKE ? AND <base>` or `id = ? AND <base>`.
///
/// The COUNT probe for the ID interpretation includes the base filters: an
/// ID that exists but is filtered out still falls back to the name search.
///
/// # Errors
///
/// `InvalidIdentifier` for malformed column or table names,
/// `CrudError::Database` when the probe fails.
pub async fn smart_keyword_condition<C: ConnectionTrait>(
    db: &C,
    table: &str,
    keywords: Option<&str>,
    id_column: &str,
    name_column: &str,
    base: &ConditionBuilder,
) -> Result<ConditionBuilder, CrudError> {
    let keywords = keywords.map(str::trim).filter(|k| !k.is_empty());
    let Some(keywords) = keywords else {
        return Ok(base.clone());
    };
    if !is_valid_identifier(table) {
        return Err(CrudError::invalid_identifier(table));
    }

    if is_all_digits(keywords) {
        if let Ok(id) = keywords.parse::<i64>() {
            let mut probe = ConditionBuilder::new();
            probe.add_number_condition(id_column, Some(id), "=")?;
            probe.extend(base);

            let built = probe.build();
            let sql = format!("SELECT COUNT(*) AS total FROM {table}{}", built.prefixed());
            let total = count_rows(db, &sql, built.params).await?;
            if total > 0 {
                return Ok(probe);
            }
            tracing::debug!(
                table,
                keywords,
                "No row matched the ID interpretation, falling back to name search"
            );
        }
    }

    let mut builder = ConditionBuilder::new();
    builder.add_string_condition(name_column, Some(keywords), "like")?;
    builder.extend(base);
    Ok(builder)
}
