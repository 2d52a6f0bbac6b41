//! Document model for the universe editor.
//!
//! - [`Document`]: the single root entity with world view, characters,
//!   storyline, novels and site settings.
//! - [`AssetRefList`]: avatar references, normalized from every historical encoding.
//! - [`AssetRef`], [`AssetName`]: stable references into the asset store.
//! - [`timeline`]: era grouping for the storyline view.

/// Asset names and references.
pub mod asset_ref;
/// Avatar reference lists.
pub mod avatar;
/// Lenient field decoders.
pub(crate) mod de;
/// Built-in starter document.
pub mod defaults;
/// Document types and editing operations.
pub mod document;
/// Id generation.
pub mod ids;
/// Storyline grouping.
pub mod timeline;

pub use asset_ref::{is_directly_displayable, AssetName, AssetRef, ASSET_PREFIX};
pub use avatar::AssetRefList;
pub use document::{
    Character, CustomSection, Document, Entry, Event, InfoItem, Module, Novel, NovelCategory,
    Relationship, SiteSettings, WorldView, DEFAULT_CATEGORY_ID, DEFAULT_ERA, LEGACY_BIO_TITLE,
};
pub use ids::generate_id;
