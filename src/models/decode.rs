//! Boundary decoders for fields the server may send in degraded shapes.
//!
//! Used through `#[serde(deserialize_with = "...")]`. None of these functions
//! ever return an error for a bad value: a field that cannot be read becomes
//! its empty default and the surrounding record still deserializes.

use serde::Deserializer;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Field transmitted as JSON-encoded text (`"[\"a\",\"b\"]"`) or as the
/// structured value itself. Invalid or missing data yields `T::default()`.
pub fn encoded<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(decode_encoded(value))
}

/// Encoded mapping whose values are rendered as strings
pub fn encoded_string_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let value = match value {
        Value::String(text) => serde_json::from_str(&text).unwrap_or(Value::Null),
        other => other,
    };
    Ok(string_map(&value))
}

/// Structured field whose shape is not trusted; a mismatch yields the default
pub fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Sequence whose entries are individually untrusted; bad entries are skipped
pub fn lenient_seq<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(seq_of(value))
}

/// Scalar text: strings pass through, numbers and booleans are rendered, anything else is empty
pub fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(scalar_text(&value).unwrap_or_default())
}

/// Optional text under the same rules as [`lenient_string`]
pub fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(scalar_text(&value).filter(|s| !s.is_empty()))
}

pub(crate) fn decode_encoded<T>(value: Value) -> T
where
    T: DeserializeOwned + Default,
{
    match value {
        Value::String(text) => serde_json::from_str(&text).unwrap_or_default(),
        other => serde_json::from_value(other).unwrap_or_default(),
    }
}

pub(crate) fn seq_of<T>(value: Value) -> Vec<T>
where
    T: DeserializeOwned,
{
    match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    }
}

pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub(crate) fn string_map(value: &Value) -> BTreeMap<String, String> {
    match value {
        Value::Object(map) => map
            .iter()
            .filter_map(|(key, value)| scalar_text(value).map(|text| (key.clone(), text)))
            .collect(),
        _ => BTreeMap::new(),
    }
}
