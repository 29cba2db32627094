//! Record-level conversion between DB shape (snake_case keys, raw column
//! values) and API shape (camelCase keys, processed values).
//!
//! Outbound conversion ([`to_api_record`]) renames keys, drops excluded
//! fields, and runs the field-value processors. Inbound conversion
//! ([`to_db_record`]) only renames keys - processors never run on request
//! bodies, otherwise a client-supplied pre-formatted time string would be
//! processed twice.

use serde_json::{Map, Value};
use std::collections::HashMap;

use super::case::{to_camel, to_snake};
use super::processors;

/// Options steering outbound conversion.
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    /// DB-side (snake_case) field names to drop from the output
    pub exclude_fields: Vec<String>,
    /// Label table for the status processor; `None` leaves status values raw
    pub status_labels: Option<HashMap<String, String>>,
}

impl ConvertOptions {
    /// Options that exclude the given DB-side field names.
    #[must_use]
    pub fn excluding<S: Into<String>>(fields: impl IntoIterator<Item = S>) -> Self {
        Self {
            exclude_fields: fields.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    fn is_excluded(&self, snake_name: &str) -> bool {
        self.exclude_fields.iter().any(|f| f == snake_name)
    }
}

/// Run the first matching processor for `name`, in the fixed order
/// time → money → status → json. Returns `None` when no processor matches,
/// in which case the raw value passes through (possibly recursed into).
fn apply_processor(name: &str, value: &Value, options: &ConvertOptions) -> Option<Value> {
    if processors::is_time_field(name) {
        Some(processors::process_time(value))
    } else if processors::is_money_field(name) {
        Some(processors::process_money(value))
    } else if processors::is_status_field(name) {
        Some(processors::process_status(
            value,
            options.status_labels.as_ref(),
        ))
    } else if processors::is_json_field(name) {
        Some(processors::process_json(value))
    } else {
        None
    }
}

/// Convert a DB row (or an array of rows) to API shape.
///
/// Keys become camelCase, excluded fields are dropped, and exactly one
/// processor may fire per field. Nested objects and arrays that no processor
/// claimed are converted recursively. The conversion never fails; malformed
/// values pass through unchanged.
#[must_use]
pub fn to_api_record(value: &Value, options: &ConvertOptions) -> Value {
    match value {
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (key, field_value) in map {
                let snake = to_snake(key);
                if options.is_excluded(&snake) {
                    continue;
                }
                let converted = match apply_processor(key, field_value, options) {
                    Some(processed) => processed,
                    None => match field_value {
                        Value::Object(_) | Value::Array(_) => to_api_record(field_value, options),
                        other => other.clone(),
                    },
                };
                out.insert(to_camel(key), converted);
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| to_api_record(item, options))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Convert a list of rows to API shape.
#[must_use]
pub fn to_api_records(rows: &[Value], options: &ConvertOptions) -> Vec<Value> {
    rows.iter().map(|row| to_api_record(row, options)).collect()
}

/// Convert an API payload to DB shape: camelCase keys become snake_case,
/// recursively. No value processing happens on the inbound path.
#[must_use]
pub fn to_db_record(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (key, field_value) in map {
                out.insert(to_snake(key), to_db_record(field_value));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(to_db_record).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn outbound_renames_and_processes() {
        let row = json!({
            "id": 3,
            "workout_name": "Leg Day",
            "create_time": "2024-03-01 09:30:00",
            "exercise_ids": "[1,2,3]",
            "execution_rest_audio_end_time": 45
        });
        let api = to_api_record(&row, &ConvertOptions::default());
        assert_eq!(api["id"], json!(3));
        assert_eq!(api["workoutName"], json!("Leg Day"));
        assert_eq!(api["createTime"], json!("2024-03-01 09:30:00"));
        assert_eq!(api["exerciseIds"], json!([1, 2, 3]));
        // Integer seconds, not a timestamp
        assert_eq!(api["executionRestAudioEndTime"], json!(45));
    }

    #[test]
    fn outbound_excludes_fields() {
        let row = json!({ "id": 1, "is_deleted": 0, "password_hash": "x" });
        let api = to_api_record(&row, &ConvertOptions::excluding(["is_deleted", "password_hash"]));
        assert_eq!(api, json!({ "id": 1 }));
    }

    #[test]
    fn exactly_one_processor_fires() {
        // `price_data` only matches the json marker (it does not end in
        // `_price`), `order_amount` only matches money.
        let row = json!({ "price_data": "[10]", "order_amount": 990 });
        let api = to_api_record(&row, &ConvertOptions::default());
        assert_eq!(api["priceData"], json!([10]));
        assert_eq!(api["orderAmount"], json!("9.90"));
    }

    #[test]
    fn time_beats_json_for_ambiguous_names() {
        // Ends in `_at` and contains `_data`: the time processor is checked
        // first, so the value is treated as a timestamp.
        let row = json!({ "sync_data_finished_at": "2024-01-02 03:04:05" });
        let api = to_api_record(&row, &ConvertOptions::default());
        assert_eq!(api["syncDataFinishedAt"], json!("2024-01-02 03:04:05"));
    }

    #[test]
    fn malformed_value_never_aborts_record() {
        let row = json!({
            "create_time": "garbage",
            "config_json": "{broken",
            "name": "ok"
        });
        let api = to_api_record(&row, &ConvertOptions::default());
        assert_eq!(api["createTime"], json!("garbage"));
        assert_eq!(api["configJson"], json!("{broken"));
        assert_eq!(api["name"], json!("ok"));
    }

    #[test]
    fn nested_structures_recurse() {
        let row = json!({
            "template_items": [
                { "item_name": "a", "sort_order": 1 },
                { "item_name": "b", "sort_order": 2 }
            ]
        });
        let api = to_api_record(&row, &ConvertOptions::default());
        assert_eq!(api["templateItems"][0]["itemName"], json!("a"));
        assert_eq!(api["templateItems"][1]["sortOrder"], json!(2));
    }

    #[test]
    fn inbound_renames_only() {
        let body = json!({
            "workoutName": "x",
            "createTime": "2024-03-01 09:30:00",
            "exerciseIds": "[1,2]"
        });
        let db = to_db_record(&body);
        assert_eq!(db["workout_name"], json!("x"));
        // No processing on the inbound path: values are untouched
        assert_eq!(db["create_time"], json!("2024-03-01 09:30:00"));
        assert_eq!(db["exercise_ids"], json!("[1,2]"));
    }

    #[test]
    fn arrays_of_rows_convert() {
        let rows = vec![json!({"a_b": 1}), json!({"c_d": 2})];
        let api = to_api_records(&rows, &ConvertOptions::default());
        assert_eq!(api[0], json!({"aB": 1}));
        assert_eq!(api[1], json!({"cD": 2}));
    }
}
