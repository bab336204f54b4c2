//! Coercion of loosely typed JSON scalars.
//!
//! The source mixes numbers and numeric strings for the same field, and ids
//! arrive as strings or integers. Everything funnels through these helpers so
//! the rest of the crate only ever sees strict types.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

/// Epoch values above this are taken to be milliseconds.
const MILLIS_THRESHOLD: f64 = 100_000_000_000.0;

/// Read an identifier: a non-empty string or an integer.
pub fn as_key(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                None
            } else {
                Some(s.to_string())
            }
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Read a number from a JSON number or a numeric string.
///
/// A trailing `%` is accepted so `"45%"` and `45` read the same.
pub fn as_number(value: &Value) -> Result<f64, String> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| format!("number {} out of range", n)),
        Value::String(s) => {
            let trimmed = s.trim();
            let trimmed = trimmed.strip_suffix('%').unwrap_or(trimmed).trim();
            trimmed
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .ok_or_else(|| format!("'{}' is not numeric", s))
        }
        Value::Null => Err("value is null".to_string()),
        other => Err(format!("expected number, found {}", other)),
    }
}

/// Read a non-negative whole count; fractional values are rounded.
pub fn as_count(value: &Value) -> Result<u32, String> {
    let n = as_number(value)?;
    if n < 0.0 {
        return Err(format!("negative count {}", n));
    }
    Ok(n.round().min(u32::MAX as f64) as u32)
}

/// Optional variant of [`as_count`] that drops unusable values.
pub fn opt_count(value: Option<&Value>) -> Option<u32> {
    value.and_then(|v| as_count(v).ok())
}

/// Read a timestamp from epoch seconds (number or numeric string), epoch
/// milliseconds, or an RFC 3339 string.
pub fn as_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    if let Value::String(s) = value {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s.trim()) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    let n = as_number(value).ok()?;
    if n <= 0.0 {
        return None;
    }
    let millis = if n >= MILLIS_THRESHOLD { n } else { n * 1000.0 };
    Utc.timestamp_millis_opt(millis as i64).single()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_as_key() {
        assert_eq!(as_key(&json!("m1")), Some("m1".to_string()));
        assert_eq!(as_key(&json!(" m1 ")), Some("m1".to_string()));
        assert_eq!(as_key(&json!(42)), Some("42".to_string()));
        assert_eq!(as_key(&json!("")), None);
        assert_eq!(as_key(&json!(null)), None);
        assert_eq!(as_key(&json!({"id": 1})), None);
    }

    #[test]
    fn test_as_number_accepts_strings() {
        assert_eq!(as_number(&json!(12)), Ok(12.0));
        assert_eq!(as_number(&json!("12")), Ok(12.0));
        assert_eq!(as_number(&json!(" 45.5 ")), Ok(45.5));
        assert_eq!(as_number(&json!("45%")), Ok(45.0));
        assert!(as_number(&json!("abc")).is_err());
        assert!(as_number(&json!(null)).is_err());
        assert!(as_number(&json!("NaN")).is_err());
    }

    #[test]
    fn test_as_count() {
        assert_eq!(as_count(&json!("16")), Ok(16));
        assert_eq!(as_count(&json!(2.6)), Ok(3));
        assert!(as_count(&json!(-1)).is_err());
        assert_eq!(opt_count(Some(&json!("x"))), None);
        assert_eq!(opt_count(None), None);
    }

    #[test]
    fn test_as_timestamp_seconds_and_millis() {
        let secs = as_timestamp(&json!(1_720_000_000)).unwrap();
        let millis = as_timestamp(&json!(1_720_000_000_000i64)).unwrap();
        assert_eq!(secs, millis);
        assert_eq!(secs.timestamp(), 1_720_000_000);
    }

    #[test]
    fn test_as_timestamp_rfc3339() {
        let ts = as_timestamp(&json!("2025-07-10T18:00:00Z")).unwrap();
        assert_eq!(ts.timestamp(), 1_752_170_400);
        assert_eq!(as_timestamp(&json!("1752170400")).unwrap(), ts);
    }

    #[test]
    fn test_as_timestamp_rejects_garbage() {
        assert!(as_timestamp(&json!("tomorrow")).is_none());
        assert!(as_timestamp(&json!(0)).is_none());
        assert!(as_timestamp(&json!(null)).is_none());
    }
}
