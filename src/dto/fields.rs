//! Field readers for bodies sent by form-driven clients, where numbers often
//! arrive as strings.

use serde::{Deserialize, Deserializer, de::Error};
use serde_json::Value;

fn saturate(value: i64) -> i32 {
    i32::try_from(value).unwrap_or(if value < 0 { i32::MIN } else { i32::MAX })
}

/// Number or numeric string. Anything unparsable reads as absent, which the
/// services treat as a quantity of 1. Out-of-range values saturate so the
/// bounds checks still see them.
pub fn quantity<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i32>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .and_then(|value| match value {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        })
        .map(saturate))
}

fn parse_id<E: Error>(value: Value) -> Result<i64, E> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| E::custom(format!("invalid id {n}"))),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| E::custom(format!("invalid id {s:?}"))),
        other => Err(E::custom(format!("invalid id {other}"))),
    }
}

/// Integer id, also accepted as a numeric string.
pub fn id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    parse_id(Value::deserialize(deserializer)?)
}

/// Like [`id`], with `null` read as absent. Pair with `#[serde(default)]`.
pub fn optional_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    match Option::<Value>::deserialize(deserializer)? {
        None => Ok(None),
        Some(value) => parse_id(value).map(Some),
    }
}

/// Tells an explicit `null` (`Some(None)`) apart from a missing field (`None`).
/// Pair with `#[serde(default)]`.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Line {
        #[serde(deserialize_with = "super::id")]
        product: i64,
        #[serde(default, deserialize_with = "super::quantity")]
        quantity: Option<i32>,
    }

    #[derive(Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "super::nullable")]
        location: Option<Option<String>>,
    }

    fn line(json: &str) -> Result<Line, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[test]
    fn quantity_accepts_numbers_and_numeric_strings() {
        assert_eq!(line(r#"{"product":1,"quantity":2}"#).unwrap().quantity, Some(2));
        assert_eq!(line(r#"{"product":1,"quantity":"2"}"#).unwrap().quantity, Some(2));
        assert_eq!(line(r#"{"product":1,"quantity":" 7 "}"#).unwrap().quantity, Some(7));
    }

    #[test]
    fn unparsable_quantity_reads_as_absent() {
        assert_eq!(line(r#"{"product":1,"quantity":"abc"}"#).unwrap().quantity, None);
        assert_eq!(line(r#"{"product":1,"quantity":null}"#).unwrap().quantity, None);
        assert_eq!(line(r#"{"product":1}"#).unwrap().quantity, None);
    }

    #[test]
    fn oversized_quantity_saturates() {
        let parsed = line(r#"{"product":1,"quantity":99999999999}"#).unwrap();
        assert_eq!(parsed.quantity, Some(i32::MAX));
        let parsed = line(r#"{"product":1,"quantity":"-99999999999"}"#).unwrap();
        assert_eq!(parsed.quantity, Some(i32::MIN));
    }

    #[test]
    fn id_accepts_numeric_strings_only() {
        assert_eq!(line(r#"{"product":"12"}"#).unwrap().product, 12);
        let err = line(r#"{"product":"abc"}"#).err().unwrap();
        assert!(err.to_string().contains("invalid id"));
        assert!(line(r#"{"product":true}"#).is_err());
    }

    #[test]
    fn nullable_separates_null_from_missing() {
        let missing: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.location, None);
        let cleared: Patch = serde_json::from_str(r#"{"location":null}"#).unwrap();
        assert_eq!(cleared.location, Some(None));
        let set: Patch = serde_json::from_str(r#"{"location":"Pune"}"#).unwrap();
        assert_eq!(set.location, Some(Some("Pune".to_string())));
    }
}
