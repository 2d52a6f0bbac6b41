//! Schema migration.
//!
//! [`patch`] turns whatever was persisted (or nothing at all) into a document
//! of the current schema. It is total: it never fails, and unreadable input
//! yields the built-in starter document. It is idempotent: patching a patched
//! document changes nothing.
//!
//! This is the only place schema defaults are decided. Rules, in order:
//!
//! 1. Absent or non-object input becomes the built-in document.
//! 2. `worldView` exists (default title `未命名`, empty description) and
//!    `worldView.modules` is a list.
//! 3. `novelCategories` exists (default: starter categories).
//! 4. `siteSettings` exists (default theme values).
//! 5. Every character has a `relationships` list.
//! 6. Every storyline event has a non-empty `era`.
//! 7. Every novel has a `categoryId`.

use log::{debug, warn};
use serde_json::{json, Map, Value};

use crate::model::defaults::{builtin_document_value, starter_categories};
use crate::model::{Document, SiteSettings, DEFAULT_CATEGORY_ID, DEFAULT_ERA};

/// Title given to a world view that was missing entirely.
pub const UNTITLED_WORLD: &str = "未命名";

/// Migrates a raw stored document to the current schema.
pub fn patch(raw: Option<Value>) -> Document {
    let mut map = match raw {
        Some(Value::Object(map)) => map,
        Some(other) => {
            debug!("migrate: input is not an object ({}), using built-in document", kind_of(&other));
            return builtin();
        }
        None => {
            debug!("migrate: no input, using built-in document");
            return builtin();
        }
    };

    patch_presence(&mut map);

    match serde_json::from_value::<Document>(Value::Object(map)) {
        Ok(doc) => patch_fields(doc),
        Err(e) => {
            warn!("migrate: document could not be decoded ({e}), using built-in document");
            builtin()
        }
    }
}

/// Migrates serialized JSON text. Unparseable text yields the built-in document.
pub fn patch_str(raw: &str) -> Document {
    match serde_json::from_str::<Value>(raw) {
        Ok(v) => patch(Some(v)),
        Err(e) => {
            warn!("migrate: stored text is not JSON ({e}), using built-in document");
            builtin()
        }
    }
}

/// Re-applies migration to an in-memory document.
pub fn patch_document(doc: Document) -> Document {
    match serde_json::to_value(&doc) {
        Ok(v) => patch(Some(v)),
        Err(_) => patch_fields(doc),
    }
}

/// A fresh copy of the built-in document.
pub fn builtin() -> Document {
    // The built-in value always decodes; fall back to field patching of an
    // empty document rather than panic if it ever stops doing so.
    let doc = serde_json::from_value::<Document>(builtin_document_value()).unwrap_or_default();
    patch_fields(doc)
}

// Rules 2-4 depend on whether a key was present at all, which the typed
// model cannot tell, so they run on the raw map.
fn patch_presence(map: &mut Map<String, Value>) {
    match map.get_mut("worldView") {
        Some(Value::Object(world)) => {
            if !world.get("modules").is_some_and(Value::is_array) {
                world.insert("modules".into(), json!([]));
            }
        }
        _ => {
            map.insert(
                "worldView".into(),
                json!({ "title": UNTITLED_WORLD, "description": "", "modules": [] }),
            );
        }
    }

    if !map.get("novelCategories").is_some_and(Value::is_array) {
        map.insert("novelCategories".into(), starter_categories());
    }

    if !map.get("siteSettings").is_some_and(Value::is_object) {
        let defaults = serde_json::to_value(SiteSettings::default()).unwrap_or_else(|_| json!({}));
        map.insert("siteSettings".into(), defaults);
    }
}

// Rule 5 is guaranteed by decoding (a missing list decodes empty); rules 6
// and 7 fill in sentinels.
fn patch_fields(mut doc: Document) -> Document {
    for event in &mut doc.storyline {
        if event.era.trim().is_empty() {
            event.era = DEFAULT_ERA.to_string();
        }
    }
    for novel in &mut doc.novels {
        if novel.category_id.trim().is_empty() {
            novel.category_id = DEFAULT_CATEGORY_ID.to_string();
        }
    }
    doc
}

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
