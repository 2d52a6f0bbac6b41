//! Import and export.
//!
//! Imports are validated before anything is written: the input must be a JSON
//! object carrying at least a `worldView` object and a `characters` array. Accepted input is
//! migrated like any other loaded document.
//!
//! Exports are read-only snapshots of the current document plus every stored
//! asset. Packaging them (ZIP or otherwise) is left to the caller; the
//! snapshot only lays out the paths a static bundle expects.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;

use crate::errors::{ImportError, StorageResult};
use crate::migrate;
use crate::model::Document;
use crate::storage::StorageService;

/// Top-level keys an importable document must carry.
pub const REQUIRED_IMPORT_FIELDS: [&str; 2] = ["worldView", "characters"];

fn has_import_shape(field: &str, value: &Value) -> bool {
    match field {
        "worldView" => value.is_object(),
        "characters" => value.is_array(),
        _ => true,
    }
}

/// Path of the document inside an exported bundle.
pub const BUNDLE_DATA_PATH: &str = "js/data.json";
/// Directory of the assets inside an exported bundle.
pub const BUNDLE_ASSET_DIR: &str = "img";

/// Validates and migrates an imported JSON text.
pub fn parse_import(text: &str) -> Result<Document, ImportError> {
    let value: Value = serde_json::from_str(text).map_err(|e| ImportError::InvalidJson(e.to_string()))?;
    let Value::Object(map) = &value else {
        return Err(ImportError::NotAnObject);
    };
    for field in REQUIRED_IMPORT_FIELDS {
        match map.get(field) {
            None | Some(Value::Null) => return Err(ImportError::MissingField(field)),
            Some(value) if !has_import_shape(field, value) => return Err(ImportError::WrongType(field)),
            Some(_) => {}
        }
    }
    Ok(migrate::patch(Some(value)))
}

/// The current document and every stored asset, as handed to a packager.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSnapshot {
    pub document: Document,
    /// Asset bytes keyed by asset name.
    pub assets: BTreeMap<String, Vec<u8>>,
}

impl ExportSnapshot {
    /// Reads every asset listed by the store. Assets removed between listing
    /// and reading are left out.
    pub async fn collect(storage: &StorageService, document: Document) -> StorageResult<Self> {
        let mut assets = BTreeMap::new();
        for name in storage.list_asset_keys().await? {
            if let Some(bytes) = storage.get_asset(&name).await? {
                assets.insert(name, bytes);
            }
        }
        Ok(Self { document, assets })
    }

    /// The document as pretty-printed JSON, the format of `js/data.json`.
    pub fn document_json_pretty(&self) -> StorageResult<String> {
        Ok(serde_json::to_string_pretty(&self.document)?)
    }

    /// Every file of a static bundle: the document, then each asset under `img/`.
    pub fn bundle_files(&self) -> StorageResult<Vec<(String, Vec<u8>)>> {
        let mut files = Vec::with_capacity(self.assets.len() + 1);
        files.push((BUNDLE_DATA_PATH.to_string(), self.document_json_pretty()?.into_bytes()));
        for (name, bytes) in &self.assets {
            files.push((format!("{BUNDLE_ASSET_DIR}/{name}"), bytes.clone()));
        }
        Ok(files)
    }
}

/// File name for a standalone JSON export: `oc_universe_data_<unix-millis>.json`.
pub fn export_file_name() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    format!("oc_universe_data_{millis}.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn import_requires_world_view_and_characters() {
        let err = parse_import(r#"{"worldView": {}}"#).unwrap_err();
        assert!(matches!(err, ImportError::MissingField("characters")));

        let err = parse_import(r#"{"characters": [], "worldView": null}"#).unwrap_err();
        assert!(matches!(err, ImportError::MissingField("worldView")));

        assert!(matches!(parse_import("[1]").unwrap_err(), ImportError::NotAnObject));
        assert!(matches!(parse_import("{oops").unwrap_err(), ImportError::InvalidJson(_)));
    }

    #[test]
    fn import_rejects_non_collection_fields() {
        let err = parse_import(r#"{"worldView": "oops", "characters": 5}"#).unwrap_err();
        assert!(matches!(err, ImportError::WrongType("worldView")));

        let err = parse_import(r#"{"worldView": {}, "characters": {"id": "c1"}}"#).unwrap_err();
        assert!(matches!(err, ImportError::WrongType("characters")));

        // an empty cast is still a cast
        assert!(parse_import(r#"{"worldView": {}, "characters": []}"#).is_ok());
    }

    #[test]
    fn accepted_import_is_migrated() {
        let doc = parse_import(r#"{"worldView": {"title": "W"}, "characters": [{"id": "c1", "avatar": "img/a.png"}]}"#)
            .unwrap();
        assert_eq!(doc.world_view.title, "W");
        assert_eq!(doc.characters[0].avatar.as_slice(), ["img/a.png"]);
        assert_eq!(doc.novel_categories.len(), 2);
    }

    #[tokio::test]
    async fn snapshot_lays_out_bundle() {
        let storage = StorageService::in_memory();
        storage.put_asset("b.png", vec![2]).await.unwrap();
        storage.put_asset("a.png", vec![1]).await.unwrap();
        let snapshot = ExportSnapshot::collect(&storage, migrate::patch(Some(json!({})))).await.unwrap();

        let files = snapshot.bundle_files().unwrap();
        let paths: Vec<_> = files.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(paths, vec!["js/data.json", "img/a.png", "img/b.png"]);

        let data: Value = serde_json::from_slice(&files[0].1).unwrap();
        assert_eq!(data["worldView"]["title"], json!("未命名"));
    }

    #[test]
    fn export_name_shape() {
        let name = export_file_name();
        assert!(name.starts_with("oc_universe_data_"));
        assert!(name.ends_with(".json"));
    }
}
