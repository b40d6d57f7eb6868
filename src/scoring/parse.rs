//! Tolerant coercion of persisted grade values.
//!
//! Stored documents carry grades as plain numbers, as numeric strings, or as
//! extended-JSON doubles (`{"$numberDouble": "72.5"}`). Every read of a
//! persisted grade goes through [`parse_grade`] before any arithmetic.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::trace;

/// Marker key of an extended-JSON double.
pub const NUMBER_DOUBLE_KEY: &str = "$numberDouble";

/// Coerce a persisted grade into a number.
///
/// - `{"$numberDouble": s}`: `s` parsed as a float
/// - string: parsed as a float, `fallback` if it is not numeric
/// - number: returned unchanged
/// - anything else, including a missing value: `fallback`
pub fn parse_grade(value: Option<&Value>, fallback: f64) -> f64 {
    match value {
        Some(Value::Object(map)) if map.contains_key(NUMBER_DOUBLE_KEY) => {
            match map.get(NUMBER_DOUBLE_KEY) {
                Some(Value::String(s)) => parse_float(s).unwrap_or(fallback),
                Some(Value::Number(n)) => n.as_f64().unwrap_or(fallback),
                _ => fallback,
            }
        }
        Some(Value::String(s)) => parse_float(s).unwrap_or_else(|| {
            trace!(value = %s, fallback, "non-numeric grade string");
            fallback
        }),
        Some(Value::Number(n)) => n.as_f64().unwrap_or(fallback),
        _ => fallback,
    }
}

/// Parse the longest numeric prefix of `s`, ignoring leading whitespace.
///
/// Legacy documents contain values such as `"72.5 "` or `"80%"`; these
/// must keep reading as numbers. Returns `None` when no digits lead the
/// string or the result is NaN.
pub fn parse_float(s: &str) -> Option<f64> {
    let s = s.trim_start();
    for word in ["Infinity", "+Infinity", "-Infinity"] {
        if s.starts_with(word) {
            return Some(if word.starts_with('-') {
                f64::NEG_INFINITY
            } else {
                f64::INFINITY
            });
        }
    }

    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }
    if digits == 0 {
        return None;
    }

    // Exponent only counts when followed by at least one digit
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+') | Some(b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    let parsed: f64 = s[..end].parse().ok()?;
    if parsed.is_nan() {
        None
    } else {
        Some(parsed)
    }
}

/// `deserialize_with` adapter for grade fields; never fails on odd shapes.
pub fn deserialize_grade<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(parse_grade(value.as_ref(), 0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_number_double_marker() {
        assert_eq!(parse_grade(Some(&json!({"$numberDouble": "72.5"})), 0.0), 72.5);
    }

    #[test]
    fn test_non_numeric_string_uses_fallback() {
        assert_eq!(parse_grade(Some(&json!("not-a-number")), 9.0), 9.0);
    }

    #[test]
    fn test_number_unchanged() {
        assert_eq!(parse_grade(Some(&json!(42)), 0.0), 42.0);
        assert_eq!(parse_grade(Some(&json!(-3.25)), 0.0), -3.25);
    }

    #[test]
    fn test_missing_uses_fallback() {
        assert_eq!(parse_grade(None, 3.0), 3.0);
        assert_eq!(parse_grade(Some(&Value::Null), 3.0), 3.0);
        assert_eq!(parse_grade(Some(&json!([1, 2])), 3.0), 3.0);
        assert_eq!(parse_grade(Some(&json!(true)), 3.0), 3.0);
    }

    #[test]
    fn test_numeric_string() {
        assert_eq!(parse_grade(Some(&json!("88.25")), 0.0), 88.25);
        assert_eq!(parse_grade(Some(&json!("  61")), 0.0), 61.0);
    }

    #[test]
    fn test_numeric_prefix_is_tolerated() {
        assert_eq!(parse_float("80%"), Some(80.0));
        assert_eq!(parse_float("72.5 points"), Some(72.5));
        assert_eq!(parse_float("1e2x"), Some(100.0));
        assert_eq!(parse_float("3e"), Some(3.0));
        assert_eq!(parse_float(".5"), Some(0.5));
        assert_eq!(parse_float("-Infinity"), Some(f64::NEG_INFINITY));
    }

    #[test]
    fn test_non_numeric_prefix_rejected() {
        assert_eq!(parse_float(""), None);
        assert_eq!(parse_float("."), None);
        assert_eq!(parse_float("-"), None);
        assert_eq!(parse_float("NaN"), None);
        assert_eq!(parse_float("abc12"), None);
    }

    #[test]
    fn test_bad_marker_payload_uses_fallback() {
        assert_eq!(parse_grade(Some(&json!({"$numberDouble": "oops"})), 7.0), 7.0);
        assert_eq!(parse_grade(Some(&json!({"$numberDouble": null})), 7.0), 7.0);
    }

    #[test]
    fn test_other_objects_use_fallback() {
        assert_eq!(parse_grade(Some(&json!({"$numberInt": "5"})), 1.0), 1.0);
    }

    #[test]
    fn test_deserialize_grade_adapter() {
        #[derive(Deserialize)]
        struct Doc {
            #[serde(deserialize_with = "deserialize_grade")]
            grade: f64,
        }
        let a: Doc = serde_json::from_str(r#"{"grade": {"$numberDouble": "55.5"}}"#).unwrap();
        let b: Doc = serde_json::from_str(r#"{"grade": "40"}"#).unwrap();
        let c: Doc = serde_json::from_str(r#"{"grade": null}"#).unwrap();
        assert_eq!(a.grade, 55.5);
        assert_eq!(b.grade, 40.0);
        assert_eq!(c.grade, 0.0);
    }
}
