//! End-to-end coverage of the two-phase keyword search protocol against a
//! mock connection, including the transaction log of the COUNT probe.

use std::collections::BTreeMap;
use std::sync::Arc;

use admincrud::{ConditionBuilder, EnumRegistry, smart_keyword_condition};
use sea_orm::{DatabaseBackend, MockDatabase, Transaction, Value};
use serde_json::json;

fn registry() -> Arc<EnumRegistry> {
    Arc::new(
        EnumRegistry::from_json(json!({
            "StatusEnum": {
                "datas": [{ "enumName": "ENABLED" }, { "enumName": "DISABLED" }]
            }
        }))
        .unwrap(),
    )
}

fn count_row(total: i64) -> BTreeMap<&'static str, Value> {
    BTreeMap::from([("total", Value::BigInt(Some(total)))])
}

fn base_with_status() -> ConditionBuilder {
    let mut base = ConditionBuilder::with_enums(registry());
    base.add_array_condition("status", Some(&["ENABLED".to_string()]), Some("StatusEnum"))
        .unwrap();
    base
}

#[tokio::test]
async fn numeric_keyword_with_no_match_falls_back_to_name_like() {
    // Rows exist (e.g. {id: 1, name: "Leg Day"}) but none with id 7, so the
    // probe reports 0 and the digits become a fuzzy name search.
    let db = MockDatabase::new(DatabaseBackend::MySql)
        .append_query_results([vec![count_row(0)]])
        .into_connection();

    let result =
        smart_keyword_condition(&db, "cms_workout", Some("7"), "id", "name", &base_with_status())
            .await
            .unwrap();

    let built = result.build();
    assert_eq!(built.clause, "name LIKE ? AND status IN (?)");
    assert_eq!(
        built.params,
        vec![
            Value::from("%7%".to_string()),
            Value::from("ENABLED".to_string())
        ]
    );

    // The probe carried the ID interpretation plus the non-keyword filters
    let log = db.into_transaction_log();
    assert_eq!(
        log,
        vec![Transaction::from_sql_and_values(
            DatabaseBackend::MySql,
            "SELECT COUNT(*) AS total FROM cms_workout WHERE id = ? AND status IN (?)",
            [Value::BigInt(Some(7)), Value::from("ENABLED".to_string())],
        )]
    );
}

#[tokio::test]
async fn numeric_keyword_with_match_keeps_id_predicate() {
    let db = MockDatabase::new(DatabaseBackend::MySql)
        .append_query_results([vec![count_row(1)]])
        .into_connection();

    let result =
        smart_keyword_condition(&db, "cms_workout", Some("7"), "id", "name", &base_with_status())
            .await
            .unwrap();

    let built = result.build();
    assert_eq!(built.clause, "id = ? AND status IN (?)");
    assert_eq!(
        built.params,
        vec![
            Value::BigInt(Some(7)),
            Value::from("ENABLED".to_string())
        ]
    );
}

#[tokio::test]
async fn text_keyword_skips_the_probe() {
    let db = MockDatabase::new(DatabaseBackend::MySql).into_connection();

    let result = smart_keyword_condition(
        &db,
        "cms_workout",
        Some("Leg Day"),
        "id",
        "name",
        &base_with_status(),
    )
    .await
    .unwrap();

    let built = result.build();
    assert_eq!(built.clause, "name LIKE ? AND status IN (?)");
    assert_eq!(built.params[0], Value::from("%Leg Day%".to_string()));

    // No probe was issued
    assert!(db.into_transaction_log().is_empty());
}

#[tokio::test]
async fn absent_or_blank_keywords_return_base_unchanged() {
    let db = MockDatabase::new(DatabaseBackend::MySql).into_connection();
    let base = base_with_status();

    for keywords in [None, Some(""), Some("  ")] {
        let result = smart_keyword_condition(&db, "cms_workout", keywords, "id", "name", &base)
            .await
            .unwrap();
        assert_eq!(result.build().clause, "status IN (?)");
    }
    assert!(db.into_transaction_log().is_empty());
}

#[tokio::test]
async fn empty_base_renders_keyword_only() {
    let db = MockDatabase::new(DatabaseBackend::MySql)
        .append_query_results([vec![count_row(0)]])
        .into_connection();

    let base = ConditionBuilder::new();
    let result = smart_keyword_condition(&db, "cms_music", Some("42"), "id", "title", &base)
        .await
        .unwrap();

    let built = result.build();
    assert_eq!(built.clause, "title LIKE ?");
    assert_eq!(built.params, vec![Value::from("%42%".to_string())]);
}

#[tokio::test]
async fn malformed_table_name_is_rejected() {
    let db = MockDatabase::new(DatabaseBackend::MySql).into_connection();
    let err = smart_keyword_condition(
        &db,
        "cms_workout; DROP TABLE users",
        Some("7"),
        "id",
        "name",
        &ConditionBuilder::new(),
    )
    .await
    .unwrap_err();
    assert_eq!(err.code(), "INVALID_IDENTIFIER");
}
