//! Load/fallback resolution.
//!
//! [`Loader::load`] always produces a migrated document. It asks an ordered
//! list of [`DocumentProvider`]s and takes the first usable answer:
//!
//! 1. the persisted draft,
//! 2. a document injected into a packaged build,
//! 3. the bundled default document (HTTP or file),
//! 4. the built-in starter document.
//!
//! The last tier is not a provider: it is what `load` returns when every
//! provider came up empty or failed. Adding or removing a tier is a single
//! `with_provider` call.

use std::fmt;

use log::{debug, info, warn};
use serde_json::Value;

use crate::config::UniverseConfig;
use crate::migrate;
use crate::model::Document;
use crate::net::RemoteClient;
use crate::storage::StorageService;

pub mod providers;

pub use providers::{
    BundledDefaultProvider, DocumentProvider, DraftProvider, ProviderResult, StaticExportProvider,
};

/// Which tier produced a loaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    Draft,
    StaticExport,
    BundledDefault,
    BuiltIn,
}

impl fmt::Display for LoadSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LoadSource::Draft => "draft",
            LoadSource::StaticExport => "static export",
            LoadSource::BundledDefault => "bundled default",
            LoadSource::BuiltIn => "built-in default",
        };
        f.write_str(s)
    }
}

/// A migrated document and where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded {
    pub document: Document,
    pub source: LoadSource,
}

#[derive(Default)]
pub struct Loader {
    providers: Vec<Box<dyn DocumentProvider>>,
}

impl fmt::Debug for Loader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.providers.iter().map(|p| p.name()).collect();
        f.debug_struct("Loader").field("providers", &names).finish()
    }
}

impl Loader {
    /// A loader with no providers; `load` returns the built-in document.
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard chain for `config`. Tiers the config does not enable are
    /// left out.
    pub fn from_config(config: &UniverseConfig, storage: StorageService, client: Option<RemoteClient>) -> Self {
        let mut loader = Self::new().with_provider(DraftProvider::new(storage));
        if let Some(doc) = &config.static_export {
            loader = loader.with_provider(StaticExportProvider::new(Some(doc.clone())));
        }
        if let Some(source) = &config.default_document {
            loader = loader.with_provider(BundledDefaultProvider::new(source.clone(), client));
        }
        loader
    }

    /// Appends a tier after the existing ones.
    pub fn with_provider(mut self, provider: impl DocumentProvider + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    pub fn providers(&self) -> impl Iterator<Item = &dyn DocumentProvider> {
        self.providers.iter().map(|p| p.as_ref())
    }

    /// Loads the first usable document. Never fails.
    pub async fn load(&self) -> Loaded {
        for provider in &self.providers {
            match provider.fetch().await {
                Ok(Some(Value::Object(map))) => {
                    info!("loader: using {}", provider.name());
                    return Loaded {
                        document: migrate::patch(Some(Value::Object(map))),
                        source: provider.source(),
                    };
                }
                Ok(Some(_)) => {
                    warn!("loader: {} returned something that is not a document, skipping", provider.name());
                }
                Ok(None) => {
                    debug!("loader: {} has no document", provider.name());
                }
                Err(e) => {
                    warn!("loader: {} failed: {e}", provider.name());
                }
            }
        }
        info!("loader: using {}", LoadSource::BuiltIn);
        Loaded {
            document: migrate::builtin(),
            source: LoadSource::BuiltIn,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{ProviderError, StorageError};
    use crate::model::Character;
    use futures::future::BoxFuture;
    use futures::FutureExt;
    use serde_json::json;

    struct Failing;

    impl DocumentProvider for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }
        fn source(&self) -> LoadSource {
            LoadSource::Draft
        }
        fn fetch(&self) -> BoxFuture<'_, ProviderResult> {
            async { Err(ProviderError::Storage(StorageError::Unavailable("down".into()))) }.boxed()
        }
    }

    #[tokio::test]
    async fn empty_chain_yields_builtin() {
        let loaded = Loader::new().load().await;
        assert_eq!(loaded.source, LoadSource::BuiltIn);
        assert_eq!(loaded.document, migrate::builtin());
    }

    #[tokio::test]
    async fn draft_wins_over_later_tiers() {
        let storage = StorageService::in_memory();
        let mut doc = Document::default();
        doc.upsert_character(Character::new("Saved"));
        storage.set_draft(&doc).await.unwrap();

        let config = UniverseConfig::builder()
            .static_export(json!({ "worldView": { "title": "Exported" }, "characters": [] }))
            .build()
            .unwrap();
        let loaded = Loader::from_config(&config, storage, None).load().await;
        assert_eq!(loaded.source, LoadSource::Draft);
        assert_eq!(loaded.document.characters[0].name, "Saved");
    }

    #[tokio::test]
    async fn failures_and_non_objects_fall_through() {
        let loaded = Loader::new()
            .with_provider(Failing)
            .with_provider(StaticExportProvider::new(Some(json!("just a string"))))
            .with_provider(StaticExportProvider::new(Some(json!({ "worldView": { "title": "Exported" } }))))
            .load()
            .await;
        assert_eq!(loaded.source, LoadSource::StaticExport);
        assert_eq!(loaded.document.world_view.title, "Exported");
        // migrated on the way in
        assert!(!loaded.document.novel_categories.is_empty());
    }

    #[tokio::test]
    async fn corrupt_draft_falls_through() {
        use crate::storage::{DataStore, InMemoryStore, DRAFT_KEY};
        use std::sync::Arc;

        let store = Arc::new(InMemoryStore::new());
        store.put(DRAFT_KEY, "{truncated").unwrap();
        let storage = StorageService::new(store.clone(), store);
        let loaded = Loader::from_config(&UniverseConfig::default(), storage, None).load().await;
        assert_eq!(loaded.source, LoadSource::BuiltIn);
    }

    #[test]
    fn chain_follows_config() {
        let config = UniverseConfig::builder()
            .static_export(json!({}))
            .default_document_path("data.json")
            .build()
            .unwrap();
        let loader = Loader::from_config(&config, StorageService::in_memory(), None);
        let names: Vec<_> = loader.providers().map(|p| p.name()).collect();
        assert_eq!(names, vec!["draft", "static export", "bundled default"]);
    }
}
