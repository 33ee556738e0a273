//! `{{name}}` placeholder resolution for request and response bodies.
//!
//! A string that consists of exactly one placeholder is replaced by the mapped
//! value with its JSON type intact, so `"{{count}}"` can become the number
//! `3`. Placeholders embedded in longer strings are interpolated as text.
//! A placeholder without a value is an error, never left in place.

use serde_json::{Map, Value};

use crate::error::TemplateError;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Resolve every placeholder inside `template` using `values`.
///
/// Object keys are left untouched; only string leaves are templated.
pub fn format(template: &Value, values: &Map<String, Value>) -> Result<Value, TemplateError> {
    match template {
        Value::String(s) => format_leaf(s, values),
        Value::Array(items) => items
            .iter()
            .map(|item| format(item, values))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Value::Object(fields) => {
            let mut out = Map::with_capacity(fields.len());
            for (key, value) in fields {
                out.insert(key.clone(), format(value, values)?);
            }
            Ok(Value::Object(out))
        }
        scalar => Ok(scalar.clone()),
    }
}

/// Interpolate placeholders inside a plain string (paths, header values).
pub fn format_str(input: &str, values: &Map<String, Value>) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find(OPEN) {
        out.push_str(&rest[..start]);
        let after = &rest[start + OPEN.len()..];
        let end = after.find(CLOSE).ok_or_else(|| TemplateError::Unterminated {
            input: input.to_string(),
        })?;
        out.push_str(&text(lookup(&after[..end], values)?));
        rest = &after[end + CLOSE.len()..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Text form of a value: strings verbatim, everything else as compact JSON.
pub(crate) fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn format_leaf(s: &str, values: &Map<String, Value>) -> Result<Value, TemplateError> {
    if let Some(name) = whole_placeholder(s) {
        return lookup(name, values).cloned();
    }
    format_str(s, values).map(Value::String)
}

/// `Some(name)` when `s` is a single placeholder and nothing else.
fn whole_placeholder(s: &str) -> Option<&str> {
    let inner = s.strip_prefix(OPEN)?.strip_suffix(CLOSE)?;
    if inner.contains(OPEN) || inner.contains(CLOSE) {
        return None;
    }
    Some(inner)
}

fn lookup<'a>(raw_name: &str, values: &'a Map<String, Value>) -> Result<&'a Value, TemplateError> {
    let name = raw_name.trim();
    values.get(name).ok_or_else(|| TemplateError::MissingValue {
        name: name.to_string(),
    })
}
