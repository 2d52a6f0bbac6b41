//! Character avatar lists.
//!
//! Avatars were stored as a single reference, as a JSON array, and (through
//! a long-lived admin panel bug) as a JSON array serialized into a string,
//! sometimes with single quotes. [`AssetRefList`] is decoded from any of
//! those once, at the boundary, and always written back as a plain array.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use super::asset_ref::AssetRef;

/// Ordered list of asset references.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetRefList(Vec<String>);

impl AssetRefList {
    pub fn new(refs: Vec<String>) -> Self {
        Self(refs.into_iter().filter(|r| !r.trim().is_empty()).collect())
    }

    /// Normalizes any historical avatar encoding. Never fails; unreadable
    /// input becomes an empty list.
    pub fn from_value(v: &Value) -> Self {
        Self(normalize_value(v))
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn first(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    pub fn push(&mut self, reference: impl Into<String>) {
        let reference = reference.into();
        if !reference.trim().is_empty() {
            self.0.push(reference);
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn asset_refs(&self) -> impl Iterator<Item = AssetRef> + '_ {
        self.iter().map(AssetRef::parse)
    }
}

impl From<Vec<&str>> for AssetRefList {
    fn from(v: Vec<&str>) -> Self {
        Self::new(v.into_iter().map(str::to_string).collect())
    }
}

impl Serialize for AssetRefList {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> Deserialize<'de> for AssetRefList {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let v = Value::deserialize(d)?;
        Ok(Self::from_value(&v))
    }
}

fn normalize_value(v: &Value) -> Vec<String> {
    match v {
        Value::Array(items) => items.iter().filter_map(repair_element).collect(),
        Value::String(s) => normalize_str(s, 0),
        _ => Vec::new(),
    }
}

// Unwrapping double encodings shrinks the string, so depth stays small in
// practice; the cap only guards against pathological input.
const MAX_DEPTH: usize = 4;

fn normalize_str(raw: &str, depth: usize) -> Vec<String> {
    let s = raw.trim();
    if s.is_empty() || depth > MAX_DEPTH {
        return Vec::new();
    }

    if s.starts_with('[') {
        return parse_bracketed(s)
            .map(|items| items.iter().filter_map(repair_element).collect())
            .unwrap_or_default();
    }

    if s.starts_with('"') {
        if let Ok(inner) = serde_json::from_str::<String>(s) {
            return normalize_str(&inner, depth + 1);
        }
    }

    if s.contains(',') && !s.starts_with("data:") {
        return s
            .replace('\'', "\"")
            .split(',')
            .map(|part| part.trim().trim_matches('"').trim().to_string())
            .filter(|part| !part.is_empty())
            .collect();
    }

    vec![s.to_string()]
}

/// A list element; a string that is itself a serialized list is replaced by
/// its first entry.
fn repair_element(item: &Value) -> Option<String> {
    let s = item.as_str()?.trim();
    if s.is_empty() {
        return None;
    }
    if s.starts_with('[') {
        return parse_bracketed(s)?
            .iter()
            .find_map(|v| v.as_str().map(str::trim).filter(|v| !v.is_empty()))
            .map(str::to_string);
    }
    Some(s.to_string())
}

fn parse_bracketed(s: &str) -> Option<Vec<Value>> {
    let parsed = serde_json::from_str::<Value>(s)
        .or_else(|_| serde_json::from_str::<Value>(&s.replace('\'', "\"")))
        .ok()?;
    match parsed {
        Value::Array(items) => Some(items),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn norm(v: Value) -> Vec<String> {
        AssetRefList::from_value(&v).as_slice().to_vec()
    }

    #[test]
    fn all_encodings_agree() {
        let expected = vec!["img/a.png".to_string(), "img/b.png".to_string()];
        assert_eq!(norm(json!(["img/a.png", "img/b.png"])), expected);
        assert_eq!(norm(json!("[\"img/a.png\",\"img/b.png\"]")), expected);
        assert_eq!(norm(json!("['img/a.png','img/b.png']")), expected);
        assert_eq!(norm(json!("img/a.png,img/b.png")), expected);
    }

    #[test]
    fn single_reference() {
        assert_eq!(norm(json!("img/a.png")), vec!["img/a.png"]);
        assert_eq!(
            norm(json!("https://api.dicebear.com/7.x/adventurer/svg?seed=A")),
            vec!["https://api.dicebear.com/7.x/adventurer/svg?seed=A"]
        );
    }

    #[test]
    fn data_urls_are_not_split() {
        let url = "data:image/png;base64,AAAA";
        assert_eq!(norm(json!(url)), vec![url]);
    }

    #[test]
    fn double_encoded_elements_are_repaired() {
        assert_eq!(
            norm(json!(["['img/a.png']", "img/b.png"])),
            vec!["img/a.png", "img/b.png"]
        );
    }

    #[test]
    fn double_encoded_string_is_unwrapped() {
        let once = serde_json::to_string(&json!(["img/a.png"])).unwrap();
        let twice = serde_json::to_string(&once).unwrap();
        assert_eq!(norm(json!(twice)), vec!["img/a.png"]);
    }

    #[test]
    fn garbage_degrades_to_empty() {
        assert!(norm(json!("[not json")).is_empty());
        assert!(norm(json!(null)).is_empty());
        assert!(norm(json!(12)).is_empty());
        assert!(norm(json!({"a": 1})).is_empty());
        assert!(norm(json!("")).is_empty());
        assert!(norm(json!([1, null, ""])).is_empty());
    }

    #[test]
    fn serializes_as_plain_array() {
        let list = AssetRefList::from_value(&json!("['img/a.png']"));
        assert_eq!(serde_json::to_value(&list).unwrap(), json!(["img/a.png"]));
    }
}
