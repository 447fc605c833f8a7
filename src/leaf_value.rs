//! Leaf value heuristic
//!
//! Picks a plausible placeholder for the last segment of a model path from
//! its name alone. Matching is case-insensitive and the first rule wins.

use serde_json::Value;

/// Sample date used for every date/time-like leaf
pub const SAMPLE_DATE: &str = "2026-01-01";

/// Sample address used for every email-like leaf
pub const SAMPLE_EMAIL: &str = "sample@example.com";

const BOOLEAN_PREFIXES: &[&str] = &["is", "has", "can", "should", "enabled", "active"];

const NUMERIC_MARKERS: &[&str] = &[
    "count", "total", "amount", "price", "point", "score", "num", "size", "balance", "age",
    "rate", "percent",
];

/// Infer a sample value for a model key
///
/// ```
/// use serde_json::json;
/// use template_infer::leaf_value::infer_leaf_value;
///
/// assert_eq!(infer_leaf_value("isActive"), json!(false));
/// assert_eq!(infer_leaf_value("totalCount"), json!(0));
/// assert_eq!(infer_leaf_value("displayName"), json!("Sample displayName"));
/// ```
pub fn infer_leaf_value(name: &str) -> Value {
    let normalized = name.to_lowercase();

    if BOOLEAN_PREFIXES.iter().any(|p| normalized.starts_with(p)) {
        return Value::Bool(false);
    }
    // Checked before the numeric markers: "errorMessage" contains "age".
    if normalized.contains("message") {
        return sample_text(name);
    }
    if NUMERIC_MARKERS.iter().any(|m| normalized.contains(m)) {
        return Value::from(0);
    }
    if normalized.contains("date") || normalized.contains("time") {
        return Value::String(SAMPLE_DATE.to_string());
    }
    if normalized.contains("email") {
        return Value::String(SAMPLE_EMAIL.to_string());
    }
    sample_text(name)
}

fn sample_text(name: &str) -> Value {
    Value::String(format!("Sample {name}"))
}
