//! Raw-statement helpers over `sea_orm::ConnectionTrait`.
//!
//! Everything in this crate writes SQL with `?` placeholders and a flat,
//! order-matched parameter list; this module is the single place where that
//! discipline meets the driver. Rows come back as `serde_json::Value` maps
//! (the layer is table-name driven, not entity-typed). No retry, timeout or
//! cancellation policy lives here - driver failures propagate as `DbErr` and
//! are mapped to [`CrudError::Database`] at this boundary.

use sea_orm::{ConnectionTrait, FromQueryResult, JsonValue, Statement, Value};

use crate::errors::CrudError;

/// Rewrite `?` placeholders to the backend's native form.
///
/// MySQL and SQLite take `?` as-is; Postgres needs `$1..$n`. The rewrite is a
/// plain scan - statements built by this crate never contain literal `?`
/// characters because values are always bound, never spliced.
#[must_use]
pub fn finalize_placeholders(sql: &str, backend: sea_orm::DatabaseBackend) -> String {
    if backend != sea_orm::DatabaseBackend::Postgres {
        return sql.to_string();
    }
    let mut out = String::with_capacity(sql.len() + 8);
    let mut n = 0;
    for c in sql.chars() {
        if c == '?' {
            n += 1;
            out.push('$');
            out.push_str(&n.to_string());
        } else {
            out.push(c);
        }
    }
    out
}

fn statement<C: ConnectionTrait>(db: &C, sql: &str, params: Vec<Value>) -> Statement {
    let backend = db.get_database_backend();
    Statement::from_sql_and_values(backend, finalize_placeholders(sql, backend), params)
}

/// Fetch all rows of a query as JSON maps (snake_case DB keys).
///
/// # Errors
///
/// `CrudError::Database` on driver failure.
pub async fn fetch_all_json<C: ConnectionTrait>(
    db: &C,
    sql: &str,
    params: Vec<Value>,
) -> Result<Vec<JsonValue>, CrudError> {
    JsonValue::find_by_statement(statement(db, sql, params))
        .all(db)
        .await
        .map_err(CrudError::database)
}

/// Fetch at most one row as a JSON map. `Ok(None)` means not-found, which
/// callers must keep distinct from `Err` (query failure).
///
/// # Errors
///
/// `CrudError::Database` on driver failure.
pub async fn fetch_one_json<C: ConnectionTrait>(
    db: &C,
    sql: &str,
    params: Vec<Value>,
) -> Result<Option<JsonValue>, CrudError> {
    JsonValue::find_by_statement(statement(db, sql, params))
        .one(db)
        .await
        .map_err(CrudError::database)
}

/// Run a `SELECT COUNT(*) AS total` style query and extract the count.
///
/// # Errors
///
/// `CrudError::Database` on driver failure or a count query that yields no
/// row.
pub async fn count_rows<C: ConnectionTrait>(
    db: &C,
    sql: &str,
    params: Vec<Value>,
) -> Result<u64, CrudError> {
    let row = db
        .query_one(statement(db, sql, params))
        .await
        .map_err(CrudError::database)?
        .ok_or_else(|| CrudError::internal("Count query returned no row", None))?;
    let total: i64 = row.try_get("", "total").map_err(CrudError::database)?;
    Ok(u64::try_from(total).unwrap_or(0))
}

/// Execute a write statement, returning `(rows_affected, last_insert_id)`.
///
/// # Errors
///
/// `CrudError::Database` on driver failure.
pub async fn execute<C: ConnectionTrait>(
    db: &C,
    sql: &str,
    params: Vec<Value>,
) -> Result<(u64, i64), CrudError> {
    let result = db
        .execute(statement(db, sql, params))
        .await
        .map_err(CrudError::database)?;
    #[allow(clippy::cast_possible_wrap)]
    Ok((result.rows_affected(), result.last_insert_id() as i64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::DatabaseBackend;

    #[test]
    fn placeholders_untouched_for_mysql_and_sqlite() {
        let sql = "SELECT * FROM t WHERE a = ? AND b IN (?,?)";
        assert_eq!(finalize_placeholders(sql, DatabaseBackend::MySql), sql);
        assert_eq!(finalize_placeholders(sql, DatabaseBackend::Sqlite), sql);
    }

    #[test]
    fn placeholders_numbered_for_postgres() {
        let sql = "SELECT * FROM t WHERE a = ? AND b IN (?,?)";
        assert_eq!(
            finalize_placeholders(sql, DatabaseBackend::Postgres),
            "SELECT * FROM t WHERE a = $1 AND b IN ($2,$3)"
        );
    }

    #[test]
    fn no_placeholders_is_identity() {
        let sql = "SELECT COUNT(*) AS total FROM t";
        assert_eq!(finalize_placeholders(sql, DatabaseBackend::Postgres), sql);
    }
}
