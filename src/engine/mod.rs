//! # Validated CRUD Engine
//!
//! The "…with validation" contract every resource module calls identically:
//! insert/update/find/paginate against a named table, orchestrated as
//! validate → probe → perform, all returning the uniform
//! [`CrudOutcome`] envelope. Expected business outcomes (validation failure,
//! not-found, uniqueness conflict) are folded into the envelope; only
//! unexpected driver or programmer failures surface as `Err`, so route
//! handlers branch on `success` instead of catching exceptions.
//!
//! The engine is stateless per request; the rule set and enum registry it
//! holds are loaded once at startup and never mutated. Multi-statement
//! atomicity stays with the caller via `sea_orm::TransactionTrait` - the
//! engine's single-row operations are not implicitly transactional.

pub mod rules;

use sea_orm::ConnectionTrait;
use serde_json::Value as JsonValue;
use std::sync::Arc;

use crate::convert::{ConvertOptions, to_api_record, to_api_records, to_db_record};
use crate::database::{count_rows, execute, fetch_all_json, fetch_one_json};
use crate::enums::EnumRegistry;
use crate::errors::CrudError;
use crate::filtering::{WhereClause, is_valid_identifier};
use crate::models::{CrudOutcome, ListParams, PageEnvelope};
use crate::params::{parse_pagination, parse_sort};

pub use rules::{FieldKind, FieldRule, RuleSet, TableRules};

/// Options for [`CrudEngine::paginate_with_validation`].
#[derive(Debug, Clone, Default)]
pub struct PaginateOptions {
    /// Caller-built filter (via the condition builder, typically through the
    /// smart keyword search)
    pub where_clause: WhereClause,
    /// Replacement SELECT (e.g. with joins); the WHERE/ORDER/LIMIT suffix is
    /// still appended by the engine
    pub custom_select: Option<String>,
    /// Replacement COUNT query; must alias the count as `total`
    pub custom_count: Option<String>,
    /// Columns the client may sort by
    pub order_columns: Vec<String>,
    /// Sort column used when the client names none (or an unlisted one)
    pub default_order: String,
    /// Outbound conversion options applied to every row
    pub convert: ConvertOptions,
}

impl PaginateOptions {
    /// Options with a filter and the given sortable columns, defaulting the
    /// sort to the first of them.
    #[must_use]
    pub fn new(where_clause: WhereClause, order_columns: &[&str]) -> Self {
        Self {
            where_clause,
            order_columns: order_columns.iter().map(ToString::to_string).collect(),
            default_order: order_columns.first().map_or_else(|| "id".to_string(), ToString::to_string),
            ..Self::default()
        }
    }
}

/// The validated CRUD engine. Cheap to clone; holds only the startup-loaded
/// configuration.
#[derive(Debug, Clone)]
pub struct CrudEngine {
    rules: RuleSet,
    enums: Arc<EnumRegistry>,
    soft_delete_column: Option<String>,
}

/// Convert a JSON field value into a bindable SQL value. Structured values
/// are stored as JSON text (the converse of the outbound json processor).
fn bind_value(value: &JsonValue) -> sea_orm::Value {
    match value {
        JsonValue::Null => sea_orm::Value::String(None),
        JsonValue::Bool(b) => (*b).into(),
        JsonValue::Number(n) => n
            .as_i64()
            .map_or_else(|| n.as_f64().unwrap_or(0.0).into(), Into::into),
        JsonValue::String(s) => s.clone().into(),
        JsonValue::Array(_) | JsonValue::Object(_) => value.to_string().into(),
    }
}

fn insert_sql(table: &str, columns: &[&str]) -> String {
    let placeholders = vec!["?"; columns.len()].join(",");
    format!(
        "INSERT INTO {table} ({}) VALUES ({placeholders})",
        columns.join(",")
    )
}

fn update_sql(table: &str, columns: &[&str], id_column: &str) -> String {
    let assignments = columns
        .iter()
        .map(|c| format!("{c} = ?"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("UPDATE {table} SET {assignments} WHERE {id_column} = ?")
}

impl CrudEngine {
    /// An engine with the given rule set and enum registry. Soft-deleted
    /// rows are excluded from existence and uniqueness probes via
    /// `is_deleted = 0` by default.
    #[must_use]
    pub fn new(rules: RuleSet, enums: Arc<EnumRegistry>) -> Self {
        Self {
            rules,
            enums,
            soft_delete_column: Some("is_deleted".to_string()),
        }
    }

    /// Override or disable the soft-delete column appended to probes.
    #[must_use]
    pub fn with_soft_delete_column(mut self, column: Option<String>) -> Self {
        self.soft_delete_column = column;
        self
    }

    /// The enum registry this engine validates against.
    #[must_use]
    pub fn enums(&self) -> Arc<EnumRegistry> {
        Arc::clone(&self.enums)
    }

    fn soft_delete_guard(&self) -> String {
        self.soft_delete_column
            .as_deref()
            .map_or_else(String::new, |col| format!(" AND {col} = 0"))
    }

    /// Fold an expected failure into the envelope, propagate the rest.
    fn settle(err: CrudError) -> Result<CrudOutcome, CrudError> {
        if err.is_expected() {
            Ok(CrudOutcome::failure(&err))
        } else {
            Err(err)
        }
    }

    fn checked_table(table: &str) -> Result<(), CrudError> {
        if is_valid_identifier(table) {
            Ok(())
        } else {
            Err(CrudError::invalid_identifier(table))
        }
    }

    /// Convert an API-shaped payload to DB shape and validate it.
    fn prepare_payload(
        &self,
        table: &str,
        data: &JsonValue,
        for_insert: bool,
    ) -> Result<serde_json::Map<String, JsonValue>, CrudError> {
        let db_shaped = to_db_record(data);
        let Some(map) = db_shaped.as_object() else {
            return Err(CrudError::validation_failed(vec![
                "Request body must be an object".to_string(),
            ]));
        };
        let errors = self.rules.validate(table, map, &self.enums, for_insert);
        if !errors.is_empty() {
            return Err(CrudError::validation_failed(errors));
        }
        for key in map.keys() {
            if !is_valid_identifier(key) {
                return Err(CrudError::invalid_identifier(key));
            }
        }
        Ok(map.clone())
    }

    /// Probe `unique_fields` for a pre-existing row carrying the same value,
    /// excluding soft-deleted rows (and `exclude_id` on updates).
    async fn check_unique<C: ConnectionTrait>(
        &self,
        db: &C,
        table: &str,
        data: &serde_json::Map<String, JsonValue>,
        unique_fields: &[&str],
        exclude_id: Option<i64>,
        entity_label: &str,
    ) -> Result<(), CrudError> {
        for field in unique_fields {
            let Some(value) = data.get(*field) else {
                continue;
            };
            if value.is_null() {
                continue;
            }
            if !is_valid_identifier(field) {
                return Err(CrudError::invalid_identifier(*field));
            }
            let mut sql = format!(
                "SELECT COUNT(*) AS total FROM {table} WHERE {field} = ?{}",
                self.soft_delete_guard()
            );
            let mut params = vec![bind_value(value)];
            if let Some(id) = exclude_id {
                sql.push_str(" AND id != ?");
                params.push(id.into());
            }
            let total = count_rows(db, &sql, params).await?;
            if total > 0 {
                return Err(CrudError::unique_conflict(entity_label, *field));
            }
        }
        Ok(())
    }

    /// Validate and insert one row.
    ///
    /// `data` is the API-shaped request body (camelCase keys); it is case
    /// converted, checked against the table's field rules, probed for
    /// uniqueness conflicts on `unique_fields`, and inserted in a single
    /// statement - the row is never partially written.
    ///
    /// # Errors
    ///
    /// Only unexpected failures (driver errors, invalid identifiers);
    /// validation failures and conflicts come back as `success: false`.
    pub async fn insert_with_validation<C: ConnectionTrait>(
        &self,
        db: &C,
        table: &str,
        data: &JsonValue,
        unique_fields: &[&str],
        entity_label: &str,
    ) -> Result<CrudOutcome, CrudError> {
        Self::checked_table(table)?;
        let map = match self.prepare_payload(table, data, true) {
            Ok(map) => map,
            Err(err) => return Self::settle(err),
        };
        if map.is_empty() {
            // `INSERT INTO t () VALUES ()` is MySQL-only syntax
            return Self::settle(CrudError::validation_failed(vec![
                "Request body must contain at least one field".to_string(),
            ]));
        }
        if let Err(err) = self
            .check_unique(db, table, &map, unique_fields, None, entity_label)
            .await
        {
            return Self::settle(err);
        }

        let columns: Vec<&str> = map.keys().map(String::as_str).collect();
        let params: Vec<sea_orm::Value> = map.values().map(bind_value).collect();
        let (_, insert_id) = execute(db, &insert_sql(table, &columns), params).await?;
        tracing::debug!(table, insert_id, "Inserted row");
        Ok(CrudOutcome::created(insert_id))
    }

    /// Validate and update one row by ID.
    ///
    /// The target row must exist (soft-deleted rows excluded); a missing row
    /// yields `{success: false, error: "RECORD_NOT_FOUND"}` rather than a
    /// silently "successful" zero-row update. `id` and the soft-delete column
    /// are addressing fields, not writable ones; they are dropped from the
    /// payload before the SET list is built.
    ///
    /// # Errors
    ///
    /// Only unexpected failures; see [`Self::insert_with_validation`].
    pub async fn update_with_validation<C: ConnectionTrait>(
        &self,
        db: &C,
        table: &str,
        id: i64,
        data: &JsonValue,
        unique_fields: &[&str],
        entity_label: &str,
    ) -> Result<CrudOutcome, CrudError> {
        Self::checked_table(table)?;
        let mut map = match self.prepare_payload(table, data, false) {
            Ok(map) => map,
            Err(err) => return Self::settle(err),
        };
        // The target is addressed by the WHERE clause; a round-tripped `id`
        // in the body must never re-key the row, and the soft-delete flag is
        // not writable through updates.
        map.remove("id");
        if let Some(col) = self.soft_delete_column.as_deref() {
            map.remove(col);
        }

        let probe_sql = format!(
            "SELECT COUNT(*) AS total FROM {table} WHERE id = ?{}",
            self.soft_delete_guard()
        );
        if count_rows(db, &probe_sql, vec![id.into()]).await? == 0 {
            return Self::settle(CrudError::record_not_found(
                entity_label,
                Some(id.to_string()),
            ));
        }

        if let Err(err) = self
            .check_unique(db, table, &map, unique_fields, Some(id), entity_label)
            .await
        {
            return Self::settle(err);
        }

        if map.is_empty() {
            return Ok(CrudOutcome::ok_empty());
        }
        let columns: Vec<&str> = map.keys().map(String::as_str).collect();
        let mut params: Vec<sea_orm::Value> = map.values().map(bind_value).collect();
        params.push(id.into());
        execute(db, &update_sql(table, &columns, "id"), params).await?;
        tracing::debug!(table, id, "Updated row");
        Ok(CrudOutcome::ok_empty())
    }

    /// Fetch one row by ID, with extra equality filters (typically
    /// `{"is_deleted": 0}`), converted to API shape.
    ///
    /// Not-found is an envelope outcome, distinct from a query error.
    ///
    /// # Errors
    ///
    /// Only unexpected failures.
    pub async fn find_by_id_with_validation<C: ConnectionTrait>(
        &self,
        db: &C,
        table: &str,
        id: i64,
        extra_where: &serde_json::Map<String, JsonValue>,
        entity_label: &str,
        convert: &ConvertOptions,
    ) -> Result<CrudOutcome, CrudError> {
        Self::checked_table(table)?;
        let mut clause = "id = ?".to_string();
        let mut params: Vec<sea_orm::Value> = vec![id.into()];
        for (field, value) in extra_where {
            if !is_valid_identifier(field) {
                return Err(CrudError::invalid_identifier(field));
            }
            clause.push_str(&format!(" AND {field} = ?"));
            params.push(bind_value(value));
        }
        let sql = format!("SELECT * FROM {table} WHERE {clause}");
        match fetch_one_json(db, &sql, params).await? {
            Some(row) => Ok(CrudOutcome::ok(to_api_record(&row, convert))),
            None => Self::settle(CrudError::record_not_found(
                entity_label,
                Some(id.to_string()),
            )),
        }
    }

    /// Run the count + bounded page queries and wrap the converted rows in a
    /// [`PageEnvelope`].
    ///
    /// The filter in `options.where_clause` is caller-built (usually through
    /// [`crate::filtering::smart_keyword_condition`]); pagination and sort
    /// come from `params` with the lenient clamping contract. A zero count
    /// skips the page query.
    ///
    /// # Errors
    ///
    /// Only unexpected failures.
    pub async fn paginate_with_validation<C: ConnectionTrait>(
        &self,
        db: &C,
        table: &str,
        params: &ListParams,
        options: &PaginateOptions,
    ) -> Result<CrudOutcome, CrudError> {
        Self::checked_table(table)?;
        let pagination = parse_pagination(params);
        let allowed: Vec<&str> = options.order_columns.iter().map(String::as_str).collect();
        let default_order = if options.default_order.is_empty() {
            "id"
        } else {
            options.default_order.as_str()
        };
        let (order_column, direction) = parse_sort(params, &allowed, default_order);
        if !is_valid_identifier(order_column) {
            return Err(CrudError::invalid_identifier(order_column));
        }

        let where_sql = options.where_clause.prefixed();
        let count_base = options
            .custom_count
            .clone()
            .unwrap_or_else(|| format!("SELECT COUNT(*) AS total FROM {table}"));
        let total = count_rows(
            db,
            &format!("{count_base}{where_sql}"),
            options.where_clause.params.clone(),
        )
        .await?;

        if total == 0 {
            return Ok(CrudOutcome::page(PageEnvelope::new(
                Vec::new(),
                0,
                pagination.page_index,
                pagination.page_size,
            )));
        }

        let select_base = options
            .custom_select
            .clone()
            .unwrap_or_else(|| format!("SELECT * FROM {table}"));
        let sql = format!(
            "{select_base}{where_sql} ORDER BY {order_column} {} LIMIT ? OFFSET ?",
            direction.as_sql()
        );
        let mut query_params = options.where_clause.params.clone();
        query_params.push(pagination.page_size.into());
        query_params.push(pagination.offset.into());

        let rows = fetch_all_json(db, &sql, query_params).await?;
        let data = to_api_records(&rows, &options.convert);
        Ok(CrudOutcome::page(PageEnvelope::new(
            data,
            total,
            pagination.page_index,
            pagination.page_size,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_sql_shape() {
        assert_eq!(
            insert_sql("cms_workout", &["name", "status"]),
            "INSERT INTO cms_workout (name,status) VALUES (?,?)"
        );
    }

    #[test]
    fn update_sql_shape() {
        assert_eq!(
            update_sql("cms_workout", &["name", "status"], "id"),
            "UPDATE cms_workout SET name = ?, status = ? WHERE id = ?"
        );
    }

    #[test]
    fn bind_value_shapes() {
        assert_eq!(bind_value(&serde_json::json!(null)), sea_orm::Value::String(None));
        assert_eq!(bind_value(&serde_json::json!(3)), sea_orm::Value::from(3_i64));
        assert_eq!(
            bind_value(&serde_json::json!("x")),
            sea_orm::Value::from("x".to_string())
        );
        // Structured values are stored as JSON text
        assert_eq!(
            bind_value(&serde_json::json!([1, 2])),
            sea_orm::Value::from("[1,2]".to_string())
        );
    }
}
