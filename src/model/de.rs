//! Lenient field decoders.
//!
//! Drafts written by older versions of the admin panel contain `null` where
//! newer ones write a string or a list, and numeric ids where newer ones write
//! strings. A malformed leaf decodes to its default instead of failing the
//! whole document.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Strings, numbers and booleans become a string; anything else is empty.
pub(crate) fn loose_string<'de, D>(d: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_to_string(Value::deserialize(d)?))
}

/// A list whose elements that fail to decode are dropped. Non-lists are empty.
pub(crate) fn loose_seq<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Value::deserialize(d)? {
        Value::Array(items) => Ok(items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect()),
        _ => Ok(Vec::new()),
    }
}

/// A list of strings. Scalars inside are stringified, empty entries dropped.
pub(crate) fn loose_string_seq<'de, D>(d: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(d)? {
        Value::Array(items) => Ok(items
            .into_iter()
            .map(value_to_string)
            .filter(|s| !s.is_empty())
            .collect()),
        _ => Ok(Vec::new()),
    }
}

/// Any `T: Default`; a value that does not decode becomes `T::default()`.
pub(crate) fn loose<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(serde_json::from_value(Value::deserialize(d)?).unwrap_or_default())
}

fn value_to_string(v: Value) -> String {
    match v {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}
