//! The universe document and its editing operations.
//!
//! One [`Document`] holds all world-building content. It is persisted
//! wholesale; the editing operations below only mutate the in-memory copy and
//! the caller saves it afterwards.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::asset_ref::AssetRef;
use super::avatar::AssetRefList;
use super::de;
use super::ids::generate_id;

/// Category id used when a novel names none.
pub const DEFAULT_CATEGORY_ID: &str = "cat_main";
/// Era used when a storyline event names none.
pub const DEFAULT_ERA: &str = "默认纪元";
/// Section title given to legacy `bio` text.
pub const LEGACY_BIO_TITLE: &str = "背景故事";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Document {
    #[serde(deserialize_with = "de::loose")]
    pub world_view: WorldView,
    #[serde(deserialize_with = "de::loose_seq")]
    pub characters: Vec<Character>,
    #[serde(deserialize_with = "de::loose_seq")]
    pub storyline: Vec<Event>,
    #[serde(deserialize_with = "de::loose_seq")]
    pub novels: Vec<Novel>,
    #[serde(deserialize_with = "de::loose_seq")]
    pub novel_categories: Vec<NovelCategory>,
    #[serde(deserialize_with = "de::loose")]
    pub site_settings: SiteSettings,
    /// Top-level keys this version does not know about, kept so a save never
    /// drops data written by a newer admin panel.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WorldView {
    #[serde(deserialize_with = "de::loose_string")]
    pub title: String,
    #[serde(deserialize_with = "de::loose_string")]
    pub subtitle: String,
    #[serde(deserialize_with = "de::loose_string")]
    pub description: String,
    /// Asset reference or URL.
    #[serde(deserialize_with = "de::loose_string")]
    pub cover_image: String,
    #[serde(deserialize_with = "de::loose_seq")]
    pub modules: Vec<Module>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Module {
    #[serde(deserialize_with = "de::loose_string")]
    pub id: String,
    #[serde(deserialize_with = "de::loose_string")]
    pub name: String,
    #[serde(deserialize_with = "de::loose_seq")]
    pub entries: Vec<Entry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Entry {
    #[serde(deserialize_with = "de::loose_string")]
    pub id: String,
    #[serde(deserialize_with = "de::loose_string")]
    pub title: String,
    /// Rich text.
    #[serde(deserialize_with = "de::loose_string")]
    pub content: String,
    #[serde(
        rename = "linkedCharIds",
        alias = "linkedCharacterIds",
        deserialize_with = "de::loose_string_seq"
    )]
    pub linked_character_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Character {
    #[serde(deserialize_with = "de::loose_string")]
    pub id: String,
    #[serde(deserialize_with = "de::loose_string")]
    pub name: String,
    #[serde(deserialize_with = "de::loose_string")]
    pub english_name: String,
    #[serde(deserialize_with = "de::loose_string")]
    pub identity: String,
    #[serde(deserialize_with = "de::loose_string_seq")]
    pub tags: Vec<String>,
    pub avatar: AssetRefList,
    #[serde(deserialize_with = "de::loose_seq")]
    pub info: Vec<InfoItem>,
    #[serde(deserialize_with = "de::loose_seq")]
    pub custom_sections: Vec<CustomSection>,
    #[serde(deserialize_with = "de::loose_seq")]
    pub relationships: Vec<Relationship>,
    /// Free text from before custom sections existed.
    #[serde(deserialize_with = "de::loose_string", skip_serializing_if = "String::is_empty")]
    pub bio: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InfoItem {
    #[serde(deserialize_with = "de::loose_string")]
    pub label: String,
    #[serde(deserialize_with = "de::loose_string")]
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomSection {
    #[serde(deserialize_with = "de::loose_string")]
    pub title: String,
    #[serde(deserialize_with = "de::loose_string")]
    pub content: String,
}

/// Directed relationship to another character. `target_id` may dangle until
/// the target is deleted through [`Document::delete_character`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Relationship {
    #[serde(deserialize_with = "de::loose_string")]
    pub target_id: String,
    #[serde(deserialize_with = "de::loose_string")]
    pub label: String,
}

/// Storyline event. `era` groups events; `date` is free text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Event {
    #[serde(deserialize_with = "de::loose_string")]
    pub id: String,
    #[serde(deserialize_with = "de::loose_string")]
    pub era: String,
    #[serde(deserialize_with = "de::loose_string")]
    pub date: String,
    #[serde(deserialize_with = "de::loose_string")]
    pub title: String,
    #[serde(deserialize_with = "de::loose_string")]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Novel {
    #[serde(deserialize_with = "de::loose_string")]
    pub id: String,
    #[serde(deserialize_with = "de::loose_string")]
    pub category_id: String,
    #[serde(deserialize_with = "de::loose_string")]
    pub title: String,
    #[serde(deserialize_with = "de::loose_string")]
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NovelCategory {
    #[serde(deserialize_with = "de::loose_string")]
    pub id: String,
    #[serde(deserialize_with = "de::loose_string")]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SiteSettings {
    #[serde(deserialize_with = "de::loose_string")]
    pub title: String,
    #[serde(deserialize_with = "de::loose_string")]
    pub favicon: String,
    #[serde(deserialize_with = "de::loose_string", skip_serializing_if = "String::is_empty")]
    pub nav_world: String,
    #[serde(deserialize_with = "de::loose_string", skip_serializing_if = "String::is_empty")]
    pub nav_char: String,
    #[serde(deserialize_with = "de::loose_string", skip_serializing_if = "String::is_empty")]
    pub nav_time: String,
    #[serde(deserialize_with = "de::loose_string", skip_serializing_if = "String::is_empty")]
    pub nav_novel: String,
    #[serde(deserialize_with = "de::loose_string")]
    pub theme_layout: String,
    #[serde(deserialize_with = "de::loose_string")]
    pub theme_color: String,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            title: String::new(),
            favicon: String::new(),
            nav_world: String::new(),
            nav_char: String::new(),
            nav_time: String::new(),
            nav_novel: String::new(),
            theme_layout: "default".to_string(),
            theme_color: "dark".to_string(),
        }
    }
}

impl Character {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: generate_id("char"),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Sections to show for this character. Characters saved before custom
    /// sections existed get their `bio` as a single section.
    pub fn sections(&self) -> Vec<CustomSection> {
        if !self.custom_sections.is_empty() {
            return self.custom_sections.clone();
        }
        if !self.bio.trim().is_empty() {
            return vec![CustomSection {
                title: LEGACY_BIO_TITLE.to_string(),
                content: self.bio.clone(),
            }];
        }
        Vec::new()
    }
}

impl Document {
    pub fn character(&self, id: &str) -> Option<&Character> {
        self.characters.iter().find(|c| c.id == id)
    }

    /// Inserts or replaces (by id) a character. Returns `true` on replace.
    /// A character without an id gets a fresh one.
    pub fn upsert_character(&mut self, mut character: Character) -> bool {
        if character.id.is_empty() {
            character.id = generate_id("char");
        }
        match self.characters.iter_mut().find(|c| c.id == character.id) {
            Some(existing) => {
                *existing = character;
                true
            }
            None => {
                self.characters.push(character);
                false
            }
        }
    }

    /// Removes a character and every relationship pointing at it.
    pub fn delete_character(&mut self, id: &str) -> Option<Character> {
        let pos = self.characters.iter().position(|c| c.id == id)?;
        let removed = self.characters.remove(pos);
        for c in &mut self.characters {
            c.relationships.retain(|r| r.target_id != id);
        }
        Some(removed)
    }

    /// Reorders characters to follow `order`. Unknown ids are ignored;
    /// characters missing from `order` keep their relative order at the end.
    pub fn reorder_characters(&mut self, order: &[&str]) {
        let rank = |id: &str| order.iter().position(|o| *o == id).unwrap_or(order.len());
        self.characters.sort_by_key(|c| rank(&c.id));
    }

    /// Appends a new empty module and returns its id.
    pub fn add_module(&mut self, name: impl Into<String>) -> String {
        let id = generate_id("mod");
        self.world_view.modules.push(Module {
            id: id.clone(),
            name: name.into(),
            entries: Vec::new(),
        });
        id
    }

    /// Inserts or replaces an entry inside a module. Returns the entry id,
    /// or `None` when the module does not exist.
    pub fn upsert_entry(&mut self, module_id: &str, mut entry: Entry) -> Option<String> {
        let module = self.world_view.modules.iter_mut().find(|m| m.id == module_id)?;
        if entry.id.is_empty() {
            entry.id = generate_id("entry");
        }
        let id = entry.id.clone();
        match module.entries.iter_mut().find(|e| e.id == id) {
            Some(existing) => *existing = entry,
            None => module.entries.push(entry),
        }
        Some(id)
    }

    /// Inserts or replaces a storyline event and returns its id.
    pub fn upsert_event(&mut self, mut event: Event) -> String {
        if event.id.is_empty() {
            event.id = generate_id("story");
        }
        if event.era.trim().is_empty() {
            event.era = DEFAULT_ERA.to_string();
        }
        let id = event.id.clone();
        match self.storyline.iter_mut().find(|e| e.id == id) {
            Some(existing) => *existing = event,
            None => self.storyline.push(event),
        }
        id
    }

    pub fn delete_event(&mut self, id: &str) -> Option<Event> {
        let pos = self.storyline.iter().position(|e| e.id == id)?;
        Some(self.storyline.remove(pos))
    }

    /// Appends a novel category and returns its id.
    pub fn add_category(&mut self, name: impl Into<String>) -> String {
        let id = generate_id("cat");
        self.novel_categories.push(NovelCategory {
            id: id.clone(),
            name: name.into(),
        });
        id
    }

    /// Inserts or replaces a novel and returns its id.
    pub fn upsert_novel(&mut self, mut novel: Novel) -> String {
        if novel.id.is_empty() {
            novel.id = generate_id("novel");
        }
        if novel.category_id.is_empty() {
            novel.category_id = DEFAULT_CATEGORY_ID.to_string();
        }
        let id = novel.id.clone();
        match self.novels.iter_mut().find(|n| n.id == id) {
            Some(existing) => *existing = novel,
            None => self.novels.push(novel),
        }
        id
    }

    pub fn delete_novel(&mut self, id: &str) -> Option<Novel> {
        let pos = self.novels.iter().position(|n| n.id == id)?;
        Some(self.novels.remove(pos))
    }

    /// Category a novel is listed under. A dangling `category_id` falls back
    /// to the default category, then to the first category.
    pub fn category_for(&self, novel: &Novel) -> Option<&NovelCategory> {
        let find = |id: &str| self.novel_categories.iter().find(|c| c.id == id);
        find(&novel.category_id)
            .or_else(|| find(DEFAULT_CATEGORY_ID))
            .or_else(|| self.novel_categories.first())
    }

    /// Every asset reference held by the document: cover image, favicon and
    /// all avatars, in document order. Empty references are skipped.
    pub fn asset_refs(&self) -> Vec<AssetRef> {
        let mut refs = Vec::new();
        let mut push = |s: &str| {
            if !s.trim().is_empty() {
                refs.push(AssetRef::parse(s));
            }
        };
        push(&self.world_view.cover_image);
        push(&self.site_settings.favicon);
        for c in &self.characters {
            for a in c.avatar.iter() {
                push(a);
            }
        }
        refs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rel(target: &str, label: &str) -> Relationship {
        Relationship {
            target_id: target.into(),
            label: label.into(),
        }
    }

    #[test]
    fn delete_character_cascades_relationships() {
        let mut doc = Document::default();
        let a = Character::new("A");
        let a_id = a.id.clone();
        let mut b = Character::new("B");
        b.relationships.push(rel(&a_id, "ally"));
        let mut c = Character::new("C");
        c.relationships.push(rel(&a_id, "rival"));
        c.relationships.push(rel(&b.id, "friend"));
        let b_id = b.id.clone();

        doc.upsert_character(a);
        doc.upsert_character(b);
        doc.upsert_character(c);

        let removed = doc.delete_character(&a_id).unwrap();
        assert_eq!(removed.name, "A");
        assert_eq!(doc.characters.len(), 2);
        assert!(doc.character(&b_id).unwrap().relationships.is_empty());
        let c = &doc.characters[1];
        assert_eq!(c.relationships, vec![rel(&b_id, "friend")]);
    }

    #[test]
    fn delete_unknown_character_is_noop() {
        let mut doc = Document::default();
        doc.upsert_character(Character::new("A"));
        assert!(doc.delete_character("nope").is_none());
        assert_eq!(doc.characters.len(), 1);
    }

    #[test]
    fn upsert_replaces_in_place() {
        let mut doc = Document::default();
        let mut a = Character::new("A");
        doc.upsert_character(a.clone());
        doc.upsert_character(Character::new("B"));
        a.name = "A2".into();
        assert!(doc.upsert_character(a));
        assert_eq!(doc.characters[0].name, "A2");
        assert_eq!(doc.characters.len(), 2);
    }

    #[test]
    fn reorder_follows_explicit_order() {
        let mut doc = Document::default();
        for (id, name) in [("c1", "A"), ("c2", "B"), ("c3", "C"), ("c4", "D")] {
            doc.upsert_character(Character { id: id.into(), name: name.into(), ..Default::default() });
        }
        doc.reorder_characters(&["c3", "ghost", "c1"]);
        let ids: Vec<_> = doc.characters.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c3", "c1", "c2", "c4"]);
    }

    #[test]
    fn entries_live_in_their_module() {
        let mut doc = Document::default();
        let module = doc.add_module("Factions");
        let entry_id = doc
            .upsert_entry(&module, Entry { title: "Core".into(), ..Default::default() })
            .unwrap();
        assert!(entry_id.starts_with("entry_"));
        assert_eq!(doc.world_view.modules[0].entries.len(), 1);
        assert!(doc.upsert_entry("missing", Entry::default()).is_none());
    }

    #[test]
    fn new_events_and_novels_get_sentinels() {
        let mut doc = Document::default();
        let ev = doc.upsert_event(Event { title: "Start".into(), ..Default::default() });
        assert_eq!(doc.storyline[0].era, DEFAULT_ERA);
        assert!(doc.delete_event(&ev).is_some());

        doc.upsert_novel(Novel { title: "N".into(), ..Default::default() });
        assert_eq!(doc.novels[0].category_id, DEFAULT_CATEGORY_ID);
    }

    #[test]
    fn dangling_category_falls_back() {
        let mut doc = Document::default();
        doc.novel_categories = vec![
            NovelCategory { id: "cat_side".into(), name: "Side".into() },
            NovelCategory { id: DEFAULT_CATEGORY_ID.into(), name: "Main".into() },
        ];
        let novel = Novel { category_id: "cat_gone".into(), ..Default::default() };
        assert_eq!(doc.category_for(&novel).unwrap().name, "Main");

        doc.novel_categories.remove(1);
        assert_eq!(doc.category_for(&novel).unwrap().name, "Side");
    }

    #[test]
    fn legacy_bio_becomes_section() {
        let mut c = Character::new("A");
        c.bio = "Once upon a time".into();
        let sections = c.sections();
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].title, LEGACY_BIO_TITLE);

        c.custom_sections.push(CustomSection { title: "Now".into(), content: "x".into() });
        assert_eq!(c.sections()[0].title, "Now");
    }

    #[test]
    fn asset_refs_walks_document() {
        let doc: Document = serde_json::from_value(json!({
            "worldView": { "coverImage": "img/cover.jpg" },
            "siteSettings": { "favicon": "https://example.com/f.svg" },
            "characters": [ { "id": "c1", "avatar": "['img/a.png','img/b.png']" } ]
        }))
        .unwrap();
        let refs: Vec<String> = doc.asset_refs().iter().map(|r| r.to_string()).collect();
        assert_eq!(refs, vec!["img/cover.jpg", "https://example.com/f.svg", "img/a.png", "img/b.png"]);
    }

    #[test]
    fn legacy_field_names_and_unknown_keys_survive() {
        let doc: Document = serde_json::from_value(json!({
            "worldView": { "modules": [ { "id": 1, "entries": [ { "id": "e", "linkedCharacterIds": ["c1"] } ] } ] },
            "futureFeature": { "enabled": true }
        }))
        .unwrap();
        assert_eq!(doc.world_view.modules[0].id, "1");
        assert_eq!(doc.world_view.modules[0].entries[0].linked_character_ids, vec!["c1"]);

        let out = serde_json::to_value(&doc).unwrap();
        assert_eq!(out["futureFeature"], json!({ "enabled": true }));
        assert_eq!(out["worldView"]["modules"][0]["entries"][0]["linkedCharIds"], json!(["c1"]));
    }
}
