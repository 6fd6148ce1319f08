//! Lenient casting of JSON request fields into stored types.
//!
//! Clients send loosely typed JSON (`"year": "1999"`, `"title": 42`). Each
//! caster accepts the shapes that have an obvious meaning, maps `null` to
//! `None` and rejects the rest with a message naming what was received.
//! The `lenient_*` and `patch_*` functions plug the casters into serde via
//! `deserialize_with`; `patch_*` keep "absent" (`None`) apart from "null"
//! (`Some(None)`).

use bson::oid::ObjectId;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{de::Error as _, Deserialize, Deserializer};
use serde_json::Value;

use crate::error::{StoreError, StoreResult};

/// Strings pass through; numbers and booleans are stringified.
pub fn text(value: &Value) -> Result<Option<String>, String> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        other => Err(format!("cannot cast {} to a string", kind(other))),
    }
}

/// Numbers, numeric strings and booleans. Blank strings are `None`.
pub fn number(value: &Value) -> Result<Option<f64>, String> {
    match value {
        Value::Null => Ok(None),
        Value::Bool(b) => Ok(Some(if *b { 1.0 } else { 0.0 })),
        Value::Number(n) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| format!("cannot cast {} to a number", n)),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            match trimmed.parse::<f64>() {
                Ok(f) if f.is_finite() => Ok(Some(f)),
                _ => Err(format!("cannot cast \"{}\" to a number", s)),
            }
        }
        other => Err(format!("cannot cast {} to a number", kind(other))),
    }
}

/// JSON form of a stored number: integral values come out as integers.
pub fn json_number(value: f64) -> Option<serde_json::Number> {
    // 2^53 bounds the integers an f64 holds exactly
    if value.fract() == 0.0 && value.abs() < 9_007_199_254_740_992.0 {
        Some(serde_json::Number::from(value as i64))
    } else {
        serde_json::Number::from_f64(value)
    }
}

/// RFC 3339 strings, `YYYY-MM-DD` dates (midnight UTC) or epoch milliseconds.
pub fn timestamp(value: &Value) -> Result<Option<DateTime<Utc>>, String> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => parse_timestamp(s.trim()).map(Some),
        Value::Number(n) => n
            .as_i64()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(Some)
            .ok_or_else(|| format!("{} is not a valid epoch timestamp", n)),
        other => Err(format!("cannot cast {} to a date", kind(other))),
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
        .ok_or_else(|| format!("cannot cast \"{}\" to a date", raw))
}

/// A 24-hex id, an empty string (no reference) or an object carrying `_id`.
pub fn object_id(value: &Value) -> Result<Option<ObjectId>, String> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) if s.is_empty() => Ok(None),
        Value::String(s) => ObjectId::parse_str(s)
            .map(Some)
            .map_err(|_| format!("cannot cast \"{}\" to an ObjectId", s)),
        Value::Object(fields) => match fields.get("_id") {
            Some(id @ Value::String(_)) => object_id(id),
            _ => Err("cannot cast an object without a string _id to an ObjectId".to_string()),
        },
        other => Err(format!("cannot cast {} to an ObjectId", kind(other))),
    }
}

/// Parse an identifier taken from a URL path.
pub fn path_id(raw: &str) -> StoreResult<ObjectId> {
    ObjectId::parse_str(raw).map_err(|_| StoreError::InvalidId(raw.to_string()))
}

/// Deserialize a request body, insisting on a JSON object at the top level.
pub fn body<T: serde::de::DeserializeOwned>(value: Value) -> StoreResult<T> {
    if !value.is_object() {
        return Err(StoreError::Validation(format!(
            "expected a JSON object, got {}",
            kind(&value)
        )));
    }
    serde_json::from_value(value).map_err(|e| StoreError::Validation(e.to_string()))
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn via<'de, D, T, F>(deserializer: D, cast: F) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    F: Fn(&Value) -> Result<Option<T>, String>,
{
    let value = Value::deserialize(deserializer)?;
    cast(&value).map_err(D::Error::custom)
}

pub fn lenient_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    via(d, text)
}

pub fn lenient_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    via(d, number)
}

pub fn lenient_timestamp<'de, D: Deserializer<'de>>(
    d: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    via(d, timestamp)
}

pub fn lenient_object_id<'de, D: Deserializer<'de>>(d: D) -> Result<Option<ObjectId>, D::Error> {
    via(d, object_id)
}

pub fn patch_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Option<String>>, D::Error> {
    via(d, text).map(Some)
}

pub fn patch_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Option<f64>>, D::Error> {
    via(d, number).map(Some)
}

pub fn patch_timestamp<'de, D: Deserializer<'de>>(
    d: D,
) -> Result<Option<Option<DateTime<Utc>>>, D::Error> {
    via(d, timestamp).map(Some)
}

pub fn patch_object_id<'de, D: Deserializer<'de>>(
    d: D,
) -> Result<Option<Option<ObjectId>>, D::Error> {
    via(d, object_id).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_stringifies_scalars() {
        assert_eq!(text(&json!("Dune")).unwrap(), Some("Dune".to_string()));
        assert_eq!(text(&json!(42)).unwrap(), Some("42".to_string()));
        assert_eq!(text(&json!(true)).unwrap(), Some("true".to_string()));
        assert_eq!(text(&json!(null)).unwrap(), None);
        assert!(text(&json!(["a"])).is_err());
    }

    #[test]
    fn number_accepts_numeric_strings_and_fractions() {
        assert_eq!(number(&json!(1965)).unwrap(), Some(1965.0));
        assert_eq!(number(&json!(" 1965 ")).unwrap(), Some(1965.0));
        assert_eq!(number(&json!("2.5")).unwrap(), Some(2.5));
        assert_eq!(number(&json!(1999.5)).unwrap(), Some(1999.5));
        assert_eq!(number(&json!("")).unwrap(), None);
        assert_eq!(number(&json!(false)).unwrap(), Some(0.0));
    }

    #[test]
    fn number_rejects_words() {
        assert!(number(&json!("abc")).is_err());
        assert!(number(&json!("NaN")).is_err());
        assert!(number(&json!("inf")).is_err());
        assert!(number(&json!({ "n": 1 })).is_err());
    }

    #[test]
    fn json_number_keeps_integers_integral() {
        assert_eq!(json_number(1965.0), Some(serde_json::Number::from(1965)));
        assert_eq!(json!(json_number(2.5)), json!(2.5));
        assert_eq!(json!(json_number(-3.0)), json!(-3));
        assert_eq!(json_number(f64::NAN), None);
    }

    #[test]
    fn timestamp_accepts_rfc3339_dates_and_millis() {
        let parsed = timestamp(&json!("2020-05-01T10:00:00+02:00")).unwrap().unwrap();
        assert_eq!(parsed.to_rfc3339(), "2020-05-01T08:00:00+00:00");

        let date = timestamp(&json!("2020-05-01")).unwrap().unwrap();
        assert_eq!(date.to_rfc3339(), "2020-05-01T00:00:00+00:00");

        let millis = timestamp(&json!(0)).unwrap().unwrap();
        assert_eq!(millis.timestamp(), 0);

        assert!(timestamp(&json!("yesterday")).is_err());
    }

    #[test]
    fn object_id_accepts_hex_and_populated_objects() {
        let id = ObjectId::new();
        assert_eq!(object_id(&json!(id.to_hex())).unwrap(), Some(id));
        assert_eq!(
            object_id(&json!({ "_id": id.to_hex(), "firstName": "Jane" })).unwrap(),
            Some(id)
        );
        assert_eq!(object_id(&json!("")).unwrap(), None);
        assert!(object_id(&json!("not-an-id")).is_err());
        assert!(object_id(&json!(12)).is_err());
    }

    #[test]
    fn path_id_reports_the_raw_value() {
        let err = path_id("123").unwrap_err();
        assert!(matches!(err, StoreError::InvalidId(ref raw) if raw == "123"));
    }

    #[test]
    fn body_requires_an_object() {
        #[derive(Debug, Deserialize)]
        struct Empty {}

        assert!(body::<Empty>(json!({})).is_ok());
        assert!(matches!(
            body::<Empty>(json!([1, 2])),
            Err(StoreError::Validation(_))
        ));
    }
}
