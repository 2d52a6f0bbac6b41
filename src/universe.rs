//! The persistence facade used by the editor.
//!
//! A [`Universe`] ties together the storage service, the load chain, the save
//! pipeline and the asset resolver for one editing session. The UI holds the
//! in-memory [`Document`]; this type only loads, saves and resolves it.

use std::future::Future;
use std::sync::Arc;

use log::{info, warn};
use tokio::task::JoinHandle;

use crate::config::{DefaultDocumentSource, UniverseConfig};
use crate::errors::{ImportError, StorageResult};
use crate::loader::{Loaded, Loader};
use crate::model::{AssetName, Document};
use crate::net::RemoteClient;
use crate::resolve::AssetResolver;
use crate::save::{SavePipeline, SaveReport};
use crate::storage::{StorageService, Subscription};
use crate::transfer::{self, ExportSnapshot};

pub struct Universe {
    config: UniverseConfig,
    storage: StorageService,
    loader: Loader,
    saver: SavePipeline,
    resolver: Arc<AssetResolver>,
    watcher: JoinHandle<()>,
}

impl std::fmt::Debug for Universe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Universe")
            .field("loader", &self.loader)
            .field("mirror", &self.saver.mirror_url())
            .finish_non_exhaustive()
    }
}

impl Drop for Universe {
    fn drop(&mut self) {
        self.watcher.abort();
    }
}

impl Universe {
    /// Opens the storage backend named by `config` and wires up a session.
    pub async fn open(config: UniverseConfig) -> StorageResult<Self> {
        let storage = StorageService::open(&config).await?;
        Ok(Self::with_storage(config, storage))
    }

    /// Wires up a session over an existing storage service. Must be called
    /// from within a Tokio runtime.
    pub fn with_storage(config: UniverseConfig, storage: StorageService) -> Self {
        let client = remote_client(&config);

        let loader = Loader::from_config(&config, storage.clone(), client.clone());
        let mut saver = SavePipeline::new(storage.clone());
        if let (Some(url), Some(client)) = (config.remote_save_url.clone(), client) {
            saver = saver.with_mirror(client, url);
        }
        let resolver = Arc::new(AssetResolver::new(storage.clone()));
        let watcher = resolver.watch(storage.subscribe());

        Self {
            config,
            storage,
            loader,
            saver,
            resolver,
            watcher,
        }
    }

    pub fn config(&self) -> &UniverseConfig {
        &self.config
    }

    pub fn storage(&self) -> &StorageService {
        &self.storage
    }

    pub fn resolver(&self) -> &AssetResolver {
        &self.resolver
    }

    pub fn subscribe(&self) -> Subscription {
        self.storage.subscribe()
    }

    /// Loads the working document. Never fails.
    pub async fn load(&self) -> Loaded {
        self.loader.load().await
    }

    /// Saves the whole document locally, then mirrors it if configured.
    /// Saves apply in call order.
    pub fn save(&self, doc: &Document) -> impl Future<Output = StorageResult<SaveReport>> + Send + 'static {
        self.saver.save(doc)
    }

    /// Validates an imported JSON text and, only if it is acceptable, makes it
    /// the draft. Returns the migrated document that was stored.
    pub async fn import_json(&self, text: &str) -> Result<Document, ImportError> {
        let doc = transfer::parse_import(text).inspect_err(|e| warn!("import rejected: {e}"))?;
        self.storage.set_draft(&doc).await?;
        info!("import: stored document with {} characters", doc.characters.len());
        Ok(doc)
    }

    /// Stores an uploaded asset under a fresh `<kind>_<millis>_<rand>.<ext>`
    /// name and returns the reference to put into the document.
    pub async fn store_asset(&self, kind: &str, ext: &str, bytes: impl Into<Vec<u8>>) -> StorageResult<String> {
        let name = AssetName::generate(kind, ext);
        self.storage.put_asset(name.as_str(), bytes).await?;
        Ok(name.to_reference())
    }

    /// Snapshot of `doc` and every stored asset for packaging.
    pub async fn export_snapshot(&self, doc: &Document) -> StorageResult<ExportSnapshot> {
        ExportSnapshot::collect(&self.storage, doc.clone()).await
    }

    /// Wipes the draft and all assets. The next `load` falls back past the draft.
    pub async fn reset(&self) -> StorageResult<()> {
        self.storage.clear_all().await?;
        self.resolver.revoke_all();
        Ok(())
    }
}

fn remote_client(config: &UniverseConfig) -> Option<RemoteClient> {
    let needed = config.remote_save_url.is_some()
        || matches!(config.default_document, Some(DefaultDocumentSource::Url(_)));
    if !needed {
        return None;
    }
    match RemoteClient::new(config) {
        Ok(client) => Some(client),
        Err(e) => {
            warn!("remote endpoints disabled: {e}");
            None
        }
    }
}
