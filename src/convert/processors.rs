//! Per-field-name value processors applied during outbound (DB → API)
//! conversion. Four processors exist - time, money, status, json - and at
//! most one fires per field, first match wins, in exactly that order.
//!
//! Every processor is fail-open: a value it cannot interpret is returned
//! verbatim. A malformed value must never abort the conversion of the record
//! it belongs to.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use serde_json::Value;
use std::collections::HashMap;

use super::case::to_snake;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// Substrings marking second-count fields that merely *look* like timestamps
// (audio offsets and durations stored as integer seconds).
const TIME_EXCLUSIONS: [&str; 3] = ["start_time", "end_time", "duration"];

const JSON_MARKERS: [&str; 4] = ["_ids", "_data", "_config", "_json"];

/// Whether a field name denotes a real timestamp.
///
/// `create_time`/`update_time` (either case style) always qualify. Other
/// names qualify when they end in `_time` or `_at` and contain none of the
/// exclusion substrings - `execution_rest_audio_end_time` stores seconds,
/// not a timestamp, and must never be coerced to a date string.
#[must_use]
pub fn is_time_field(name: &str) -> bool {
    let snake = to_snake(name);
    if snake == "create_time" || snake == "update_time" {
        return true;
    }
    if !(snake.ends_with("_time") || snake.ends_with("_at")) {
        return false;
    }
    !TIME_EXCLUSIONS.iter().any(|ex| snake.contains(ex))
}

/// Whether a field name denotes a money amount (stored as integer cents).
#[must_use]
pub fn is_money_field(name: &str) -> bool {
    let snake = to_snake(name);
    snake == "price"
        || snake == "amount"
        || snake.ends_with("_price")
        || snake.ends_with("_amount")
        || snake.ends_with("_fee")
}

/// Whether a field name denotes a status code eligible for label mapping.
#[must_use]
pub fn is_status_field(name: &str) -> bool {
    let snake = to_snake(name);
    snake == "status" || snake.ends_with("_status")
}

/// Whether a field name denotes a JSON-encoded column.
#[must_use]
pub fn is_json_field(name: &str) -> bool {
    let snake = to_snake(name);
    JSON_MARKERS.iter().any(|marker| snake.contains(marker))
}

/// Render a timestamp value as local `YYYY-MM-DD HH:mm:ss`.
///
/// Accepts RFC 3339 strings, already-formatted strings, and epoch
/// seconds/milliseconds. Null passes through; anything unparsable is
/// returned verbatim.
#[must_use]
pub fn process_time(value: &Value) -> Value {
    match value {
        Value::Null => Value::Null,
        Value::String(s) => {
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Value::String(dt.with_timezone(&Local).format(TIME_FORMAT).to_string());
            }
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, TIME_FORMAT) {
                return Value::String(naive.format(TIME_FORMAT).to_string());
            }
            // SQL DATETIME with fractional seconds or a 'T' separator
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
                return Value::String(naive.format(TIME_FORMAT).to_string());
            }
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
                return Value::String(naive.format(TIME_FORMAT).to_string());
            }
            value.clone()
        }
        Value::Number(n) => {
            let Some(raw) = n.as_i64() else {
                return value.clone();
            };
            // Heuristic: values past the year 2286 in seconds are milliseconds
            let (secs, millis) = if raw.abs() >= 10_000_000_000 {
                (raw / 1000, raw % 1000)
            } else {
                (raw, 0)
            };
            match Local.timestamp_opt(secs, u32::try_from(millis.abs()).unwrap_or(0) * 1_000_000) {
                chrono::LocalResult::Single(dt) => {
                    Value::String(dt.format(TIME_FORMAT).to_string())
                }
                _ => value.clone(),
            }
        }
        _ => value.clone(),
    }
}

/// Render an integer cent count as a two-decimal string (`1234` → `"12.34"`).
/// Non-integer values pass through verbatim.
#[must_use]
pub fn process_money(value: &Value) -> Value {
    match value {
        Value::Number(n) => n.as_i64().map_or_else(
            || value.clone(),
            |cents| {
                #[allow(clippy::cast_precision_loss)]
                Value::String(format!("{:.2}", cents as f64 / 100.0))
            },
        ),
        _ => value.clone(),
    }
}

/// Map a status value through the caller-supplied label table. Missing table
/// or missing entry leaves the value untouched.
#[must_use]
pub fn process_status(value: &Value, labels: Option<&HashMap<String, String>>) -> Value {
    let Some(labels) = labels else {
        return value.clone();
    };
    let key = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return value.clone(),
    };
    labels
        .get(&key)
        .map_or_else(|| value.clone(), |label| Value::String(label.clone()))
}

/// Decode a JSON-encoded string column. Parse failure returns the original
/// string; non-string values pass through (they are already decoded).
#[must_use]
pub fn process_json(value: &Value) -> Value {
    match value {
        Value::String(s) => serde_json::from_str::<Value>(s).unwrap_or_else(|_| value.clone()),
        _ => value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // ============================================================================
    // Field-name classification
    // ============================================================================

    #[test]
    fn time_field_classification() {
        assert!(is_time_field("create_time"));
        assert!(is_time_field("createTime"));
        assert!(is_time_field("update_time"));
        assert!(is_time_field("published_at"));
        assert!(is_time_field("publishedAt"));

        // Second-count fields must never be treated as timestamps
        assert!(!is_time_field("execution_rest_audio_end_time"));
        assert!(!is_time_field("executionRestAudioEndTime"));
        assert!(!is_time_field("music_audio_start_time"));
        assert!(!is_time_field("video_duration"));
        assert!(!is_time_field("start_time"));
        assert!(!is_time_field("end_time"));

        assert!(!is_time_field("name"));
        assert!(!is_time_field("timecode"));
    }

    #[test]
    fn money_and_status_and_json_classification() {
        assert!(is_money_field("price"));
        assert!(is_money_field("total_amount"));
        assert!(is_money_field("member_fee"));
        assert!(!is_money_field("pricing_note"));

        assert!(is_status_field("status"));
        assert!(is_status_field("audit_status"));
        assert!(!is_status_field("status_note"));

        assert!(is_json_field("exercise_ids"));
        assert!(is_json_field("playlist_config"));
        assert!(is_json_field("extra_data"));
        assert!(is_json_field("payloadJson"));
        assert!(!is_json_field("name"));
    }

    // ============================================================================
    // Value processing (fail-open everywhere)
    // ============================================================================

    #[test]
    fn time_processor_formats_datetime_strings() {
        assert_eq!(
            process_time(&json!("2024-03-01 09:30:00")),
            json!("2024-03-01 09:30:00")
        );
        assert_eq!(
            process_time(&json!("2024-03-01T09:30:00.123")),
            json!("2024-03-01 09:30:00")
        );
    }

    #[test]
    fn time_processor_passes_null_and_garbage() {
        assert_eq!(process_time(&Value::Null), Value::Null);
        assert_eq!(process_time(&json!("not a date")), json!("not a date"));
        assert_eq!(process_time(&json!(["nested"])), json!(["nested"]));
    }

    #[test]
    fn time_processor_accepts_epoch_numbers() {
        let out = process_time(&json!(1_700_000_000));
        let Value::String(s) = out else {
            panic!("expected formatted string");
        };
        assert_eq!(s.len(), "2023-11-14 22:13:20".len());
        assert!(s.starts_with("20"));

        // Milliseconds collapse to the same rendering
        let out_ms = process_time(&json!(1_700_000_000_000_i64));
        assert_eq!(Value::String(s), out_ms);
    }

    #[test]
    fn money_processor_renders_cents() {
        assert_eq!(process_money(&json!(1234)), json!("12.34"));
        assert_eq!(process_money(&json!(5)), json!("0.05"));
        assert_eq!(process_money(&json!("already")), json!("already"));
    }

    #[test]
    fn status_processor_maps_when_table_present() {
        let labels: HashMap<String, String> =
            [("ENABLED".to_string(), "Enabled".to_string())].into();
        assert_eq!(
            process_status(&json!("ENABLED"), Some(&labels)),
            json!("Enabled")
        );
        assert_eq!(
            process_status(&json!("UNKNOWN"), Some(&labels)),
            json!("UNKNOWN")
        );
        assert_eq!(process_status(&json!("ENABLED"), None), json!("ENABLED"));
    }

    #[test]
    fn json_processor_decodes_strings_leniently() {
        assert_eq!(process_json(&json!("[1,2,3]")), json!([1, 2, 3]));
        assert_eq!(process_json(&json!("{\"a\":1}")), json!({"a": 1}));
        assert_eq!(process_json(&json!("not json {")), json!("not json {"));
        assert_eq!(process_json(&json!([1, 2])), json!([1, 2]));
    }
}
