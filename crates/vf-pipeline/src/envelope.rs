//! Payload extraction from analysis-service answers.
//!
//! The analysis endpoint does not answer in one stable shape. Observed forms:
//!
//! - a bare value: `00:12`, `(00:12)`, `"(00:12)"`
//! - a JSON envelope: `{"id": "...", "data": "(00:12)", "usage": {...}}`
//! - a loosely delimited envelope: `{id:...,data:(00:12),usage:...}`
//!
//! [`extract_payload`] reduces all of them to the payload text, without
//! surrounding quotes and without one level of enclosing parentheses.

use std::sync::LazyLock;

use regex::Regex;

/// `data:(payload)` inside a loosely delimited envelope.
static RE_DATA_PARENS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"data\s*:\s*\(([^)]+)\)").expect("valid data regex"));

/// `data:payload` up to the next field separator.
static RE_DATA_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"data\s*:\s*([^,}]+)").expect("valid data field regex"));

/// Extract the payload of an analysis answer.
///
/// Returns `None` for empty answers and for a literal `null` payload.
pub fn extract_payload(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        return match &value {
            serde_json::Value::Object(map) if !map.contains_key("data") => from_text(trimmed),
            _ => from_json(&value),
        };
    }

    from_text(trimmed)
}

fn from_json(value: &serde_json::Value) -> Option<String> {
    use serde_json::Value;

    match value {
        Value::Null => None,
        Value::String(s) => normalize(s),
        Value::Object(map) => match map.get("data")? {
            Value::Null => None,
            Value::String(s) => normalize(s),
            other => normalize(&other.to_string()),
        },
        other => normalize(&other.to_string()),
    }
}

fn from_text(text: &str) -> Option<String> {
    let unquoted = text.replace('"', "");
    let unquoted = unquoted.trim();

    if unquoted.starts_with('{') {
        if let Some(caps) = RE_DATA_PARENS.captures(unquoted) {
            return normalize(&caps[1]);
        }
        if let Some(caps) = RE_DATA_FIELD.captures(unquoted) {
            return normalize(&caps[1]);
        }
    }

    normalize(unquoted)
}

/// Trim, drop surrounding quotes, and unwrap one level of parentheses.
fn normalize(s: &str) -> Option<String> {
    let mut v = s.trim();

    while v.len() >= 2
        && ((v.starts_with('"') && v.ends_with('"')) || (v.starts_with('\'') && v.ends_with('\'')))
    {
        v = v[1..v.len() - 1].trim();
    }

    if v.len() >= 2 && v.starts_with('(') && v.ends_with(')') {
        v = v[1..v.len() - 1].trim();
    }

    if v.is_empty() || v.eq_ignore_ascii_case("null") {
        None
    } else {
        Some(v.to_string())
    }
}
