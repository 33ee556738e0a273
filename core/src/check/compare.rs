//! Strict structural comparison of an expected body against the actual one.

use serde_json::{Number, Value};

use super::result::CheckResult;

/// Diff keys the client writes itself. A top-level body field with one of
/// these names, or starting with one of the prefixes, is reported as
/// `body.<name>` instead.
const RESERVED: [&str; 4] = ["body", "headers", "schema", "status"];
const RESERVED_PREFIXES: [&str; 2] = ["body.", "headers."];

/// Record every difference between `expected` and `actual` in `result`.
///
/// Objects are compared key by key over the union of both key sets; a missing
/// key counts as `null`. Arrays of equal length are compared element-wise,
/// otherwise reported whole. Numbers compare by value, so `1` equals `1.0`.
/// A root mismatch is keyed `body`.
pub fn compare(expected: &Value, actual: &Value, result: &mut CheckResult) {
    walk(expected, actual, "", result);
}

fn walk(expected: &Value, actual: &Value, path: &str, result: &mut CheckResult) {
    match (expected, actual) {
        (Value::Object(want), Value::Object(got)) => {
            for (key, value) in want {
                let other = got.get(key).unwrap_or(&Value::Null);
                walk(value, other, &child(path, key), result);
            }
            for (key, value) in got {
                if !want.contains_key(key) && !value.is_null() {
                    result.record(child(path, key), Value::Null, value.clone());
                }
            }
        }
        (Value::Array(want), Value::Array(got)) if want.len() == got.len() => {
            for (index, (value, other)) in want.iter().zip(got).enumerate() {
                walk(value, other, &format!("{path}[{index}]"), result);
            }
        }
        (Value::Number(want), Value::Number(got)) => {
            if !same_number(want, got) {
                record_at(path, expected, actual, result);
            }
        }
        _ if expected != actual => record_at(path, expected, actual, result),
        _ => {}
    }
}

fn record_at(path: &str, expected: &Value, actual: &Value, result: &mut CheckResult) {
    let key = if path.is_empty() { "body" } else { path };
    result.record(key, expected.clone(), actual.clone());
}

fn same_number(a: &Number, b: &Number) -> bool {
    if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
        return a == b;
    }
    if let (Some(a), Some(b)) = (a.as_u64(), b.as_u64()) {
        return a == b;
    }
    match (a.as_f64(), b.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn child(path: &str, key: &str) -> String {
    if !path.is_empty() {
        format!("{path}.{key}")
    } else if RESERVED.contains(&key)
        || RESERVED_PREFIXES.iter().any(|prefix| key.starts_with(prefix))
    {
        format!("body.{key}")
    } else {
        key.to_string()
    }
}
