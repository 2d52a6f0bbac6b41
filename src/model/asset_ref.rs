//! Asset names and asset references.
//!
//! An asset reference is the string stored in the document. `img/<name>`
//! names a blob in the asset store; everything else (http URLs, data URLs,
//! transient `blob:` handles) is passed through untouched.

use std::fmt::{self, Display};
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;

use crate::errors::AssetNameError;

/// Prefix marking a reference into the asset store.
pub const ASSET_PREFIX: &str = "img/";

const MAX_NAME_LEN: usize = 255;

/// Validated key of a blob in the asset store.
///
/// The store itself treats names as opaque keys; validation only happens
/// where names enter from the outside (references in documents, uploads).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetName(String);

impl AssetName {
    pub fn parse(name: &str) -> Result<Self, AssetNameError> {
        if name.is_empty() {
            return Err(AssetNameError::Empty);
        }
        if name.len() > MAX_NAME_LEN {
            return Err(AssetNameError::TooLong(name.len()));
        }
        if name == "." || name == ".." || name.contains("..") {
            return Err(AssetNameError::PathTraversal);
        }
        if let Some(c) = name.chars().find(|c| c.is_control() || matches!(c, '/' | '\\')) {
            return Err(AssetNameError::InvalidCharacter(c));
        }
        Ok(Self(name.to_string()))
    }

    /// Generates a fresh `<kind>_<unix-millis>_<0..1000>.<ext>` name.
    ///
    /// Uniqueness is the caller's concern; the timestamp plus random suffix
    /// keeps collisions unlikely for interactive uploads.
    pub fn generate(kind: &str, ext: &str) -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let suffix: u16 = rand::rng().random_range(0..1000);
        let ext = ext.trim_start_matches('.');
        let kind = if kind.is_empty() { "asset" } else { kind };
        Self(format!("{kind}_{millis}_{suffix}.{ext}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The reference stored in documents for this asset.
    pub fn to_reference(&self) -> String {
        format!("{ASSET_PREFIX}{}", self.0)
    }
}

impl Display for AssetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A parsed asset reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetRef {
    /// `img/<name>`: a blob in the asset store.
    Stored(AssetName),
    /// Anything else, used as-is for display.
    External(String),
}

impl AssetRef {
    pub fn parse(reference: &str) -> Self {
        match reference.strip_prefix(ASSET_PREFIX) {
            Some(name) => match AssetName::parse(name) {
                Ok(name) => AssetRef::Stored(name),
                Err(_) => AssetRef::External(reference.to_string()),
            },
            None => AssetRef::External(reference.to_string()),
        }
    }

    pub fn stored_name(&self) -> Option<&AssetName> {
        match self {
            AssetRef::Stored(name) => Some(name),
            AssetRef::External(_) => None,
        }
    }
}

impl Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetRef::Stored(name) => write!(f, "{ASSET_PREFIX}{name}"),
            AssetRef::External(s) => f.write_str(s),
        }
    }
}

/// True for references a viewer can display without the asset store.
pub fn is_directly_displayable(reference: &str) -> bool {
    ["http://", "https://", "data:", "blob:"]
        .iter()
        .any(|p| reference.starts_with(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_stored_reference() {
        let r = AssetRef::parse("img/char_1_2.png");
        assert_eq!(r.stored_name().map(|n| n.as_str()), Some("char_1_2.png"));
        assert_eq!(r.to_string(), "img/char_1_2.png");
    }

    #[test]
    fn urls_are_external() {
        let r = AssetRef::parse("https://example.com/a.png");
        assert_eq!(r, AssetRef::External("https://example.com/a.png".into()));
    }

    #[test]
    fn traversal_is_not_a_stored_reference() {
        assert!(matches!(AssetRef::parse("img/../secret"), AssetRef::External(_)));
        assert!(matches!(AssetRef::parse("img/"), AssetRef::External(_)));
        assert!(matches!(AssetRef::parse("img/sub/dir.png"), AssetRef::External(_)));
    }

    #[test]
    fn name_validation() {
        assert_eq!(AssetName::parse(""), Err(AssetNameError::Empty));
        assert_eq!(AssetName::parse("a\\b"), Err(AssetNameError::InvalidCharacter('\\')));
        assert_eq!(AssetName::parse(".."), Err(AssetNameError::PathTraversal));
        assert!(matches!(AssetName::parse(&"x".repeat(300)), Err(AssetNameError::TooLong(300))));
        assert!(AssetName::parse("world_cover_1700000000000.jpg").is_ok());
    }

    #[test]
    fn generated_names_follow_pattern() {
        let name = AssetName::generate("char", ".png");
        let s = name.as_str();
        assert!(s.starts_with("char_"));
        assert!(s.ends_with(".png"));
        assert_eq!(s.split('_').count(), 3);
        assert!(AssetName::parse(s).is_ok());
        assert_eq!(name.to_reference(), format!("img/{s}"));
    }

    #[test]
    fn displayable_prefixes() {
        assert!(is_directly_displayable("data:image/png;base64,AAAA"));
        assert!(is_directly_displayable("blob:oc-universe/1234"));
        assert!(!is_directly_displayable("img/a.png"));
    }
}
