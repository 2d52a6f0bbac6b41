use std::collections::BTreeSet;
use std::fmt::Debug;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use log::{debug, error};
use serde_json::Value;
use tokio::sync::{broadcast, Mutex};

use super::area::{AssetStore, DataStore};
use super::event::StorageEvent;
use super::memory::InMemoryStore;
use crate::config::UniverseConfig;
use crate::errors::{StorageError, StorageResult};
use crate::model::Document;

/// Key under which the draft document is stored.
pub const DRAFT_KEY: &str = "current_draft";

/// Default capacity of the event bus when none is configured.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// A handle for receiving storage change notifications.
pub type Subscription = broadcast::Receiver<StorageEvent>;

#[derive(Debug)]
struct StorageBus {
    tx: broadcast::Sender<StorageEvent>,
}

impl StorageBus {
    fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    fn subscribe(&self) -> Subscription {
        self.tx.subscribe()
    }

    fn publish(&self, ev: StorageEvent) {
        // Fails only when nobody listens, which is fine.
        let _ = self.tx.send(ev);
    }
}

/// What became of a draft write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftWrite {
    /// The draft was replaced. `ticket` is the write's place in call order.
    Applied { ticket: u64 },
    /// Skipped because a later write had already been applied.
    Superseded,
}

/// Orders draft writes by issuance. Tickets are handed out when `set_draft`
/// is called; a write whose ticket is older than the last applied one is
/// dropped so it can never overwrite newer data.
#[derive(Debug, Default)]
struct SaveOrder {
    issued: AtomicU64,
    applied: Mutex<u64>,
}

impl SaveOrder {
    fn issue(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// Async access to the draft and the asset store.
///
/// Backends are synchronous; every call runs on the blocking pool so the
/// executor is never stalled by disk I/O. Errors are logged here and returned
/// to the caller unchanged.
#[derive(Clone)]
pub struct StorageService {
    data: Arc<dyn DataStore>,
    assets: Arc<dyn AssetStore>,
    bus: Arc<StorageBus>,
    saves: Arc<SaveOrder>,
}

impl Debug for StorageService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageService").finish_non_exhaustive()
    }
}

impl StorageService {
    pub fn new(data: Arc<dyn DataStore>, assets: Arc<dyn AssetStore>) -> Self {
        Self::with_capacity(data, assets, DEFAULT_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(data: Arc<dyn DataStore>, assets: Arc<dyn AssetStore>, capacity: usize) -> Self {
        Self {
            data,
            assets,
            bus: Arc::new(StorageBus::new(capacity)),
            saves: Arc::new(SaveOrder::default()),
        }
    }

    /// Draft and assets sharing one in-memory store.
    pub fn in_memory() -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self::new(store.clone(), store)
    }

    /// Opens the backend described by `config`: SQLite when a database path is
    /// set, in-memory otherwise.
    pub async fn open(config: &UniverseConfig) -> StorageResult<Self> {
        let capacity = config.event_channel_capacity;
        let Some(path) = config.database_path.clone() else {
            let store = Arc::new(match config.quota_bytes {
                Some(q) => InMemoryStore::with_quota(q),
                None => InMemoryStore::new(),
            });
            return Ok(Self::with_capacity(store.clone(), store, capacity));
        };
        Self::open_sqlite(path, config.clone()).await
    }

    #[cfg(feature = "sqlite_store")]
    async fn open_sqlite(path: std::path::PathBuf, config: UniverseConfig) -> StorageResult<Self> {
        let capacity = config.event_channel_capacity;
        let store = tokio::task::spawn_blocking(move || super::SqliteStore::open(&path, &config))
            .await?
            .inspect_err(|e| error!("storage: cannot open database: {e}"))?;
        let store = Arc::new(store);
        Ok(Self::with_capacity(store.clone(), store, capacity))
    }

    #[cfg(not(feature = "sqlite_store"))]
    async fn open_sqlite(path: std::path::PathBuf, _config: UniverseConfig) -> StorageResult<Self> {
        Err(StorageError::Unavailable(format!(
            "{} requested but SQLite support is not compiled in",
            path.display()
        )))
    }

    pub fn subscribe(&self) -> Subscription {
        self.bus.subscribe()
    }

    /// Runs `f` against the backends on the blocking pool.
    async fn blocking<T, F>(&self, op: &'static str, f: F) -> StorageResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&dyn DataStore, &dyn AssetStore) -> StorageResult<T> + Send + 'static,
    {
        let data = self.data.clone();
        let assets = self.assets.clone();
        let result = match tokio::task::spawn_blocking(move || f(data.as_ref(), assets.as_ref())).await {
            Ok(r) => r,
            Err(e) => Err(e.into()),
        };
        result.inspect_err(|e| error!("storage: {op} failed: {e}"))
    }

    /// Reads the draft. A stored value that is not JSON is reported as
    /// [`StorageError::Corrupt`].
    pub async fn get_draft(&self) -> StorageResult<Option<Value>> {
        let Some(text) = self.blocking("get_draft", |data, _| data.get(DRAFT_KEY)).await? else {
            return Ok(None);
        };
        serde_json::from_str(&text).map(Some).map_err(|e| StorageError::Corrupt {
            key: DRAFT_KEY.to_string(),
            reason: e.to_string(),
        })
    }

    /// Replaces the draft with `doc`.
    ///
    /// The write is ordered at the moment of this call, before the returned
    /// future is first polled: if a later call has already been applied when
    /// this one gets its turn, this write is skipped and reported as
    /// [`DraftWrite::Superseded`].
    pub fn set_draft(&self, doc: &Document) -> impl Future<Output = StorageResult<DraftWrite>> + Send + 'static {
        let ticket = self.saves.issue();
        let serialized = serde_json::to_string(doc);
        let this = self.clone();
        async move {
            let text = serialized?;
            let mut applied = this.saves.applied.lock().await;
            if ticket < *applied {
                debug!("storage: draft write #{ticket} superseded by #{}", *applied);
                return Ok(DraftWrite::Superseded);
            }
            let bytes = text.len();
            this.blocking("set_draft", move |data, _| data.put(DRAFT_KEY, &text)).await?;
            *applied = ticket;
            drop(applied);
            this.bus.publish(StorageEvent::DraftSaved { bytes });
            Ok(DraftWrite::Applied { ticket })
        }
    }

    pub async fn remove_draft(&self) -> StorageResult<()> {
        self.blocking("remove_draft", |data, _| data.remove(DRAFT_KEY)).await
    }

    pub async fn put_asset(&self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> StorageResult<()> {
        let name = name.into();
        let bytes = bytes.into();
        let key = name.clone();
        self.blocking("put_asset", move |_, assets| assets.put_asset(&key, &bytes)).await?;
        self.bus.publish(StorageEvent::AssetStored { name });
        Ok(())
    }

    pub async fn get_asset(&self, name: &str) -> StorageResult<Option<Vec<u8>>> {
        let key = name.to_string();
        self.blocking("get_asset", move |_, assets| assets.get_asset(&key)).await
    }

    pub async fn list_asset_keys(&self) -> StorageResult<BTreeSet<String>> {
        self.blocking("list_asset_keys", |_, assets| assets.list_asset_keys()).await
    }

    pub async fn remove_asset(&self, name: &str) -> StorageResult<()> {
        let key = name.to_string();
        self.blocking("remove_asset", move |_, assets| assets.remove_asset(&key)).await?;
        self.bus.publish(StorageEvent::AssetRemoved { name: name.to_string() });
        Ok(())
    }

    /// Wipes the draft and every asset.
    pub async fn clear_all(&self) -> StorageResult<()> {
        let _order = self.saves.applied.lock().await;
        self.blocking("clear_all", |data, assets| {
            data.clear()?;
            assets.clear_assets()
        })
        .await?;
        self.bus.publish(StorageEvent::Cleared);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Character;
    use serde_json::json;

    fn doc_named(title: &str) -> Document {
        let mut doc = Document::default();
        doc.world_view.title = title.to_string();
        doc
    }

    #[tokio::test]
    async fn draft_roundtrip_and_event() {
        let svc = StorageService::in_memory();
        let mut rx = svc.subscribe();
        assert!(svc.get_draft().await.unwrap().is_none());

        let mut doc = doc_named("World");
        doc.upsert_character(Character::new("A"));
        svc.set_draft(&doc).await.unwrap();

        let stored = svc.get_draft().await.unwrap().unwrap();
        assert_eq!(stored["worldView"]["title"], json!("World"));
        assert!(matches!(rx.recv().await.unwrap(), StorageEvent::DraftSaved { .. }));
    }

    #[tokio::test]
    async fn earlier_save_never_overwrites_later_one() {
        let svc = StorageService::in_memory();
        let first = svc.set_draft(&doc_named("first"));
        let second = svc.set_draft(&doc_named("second"));

        // the later save completes before the earlier one is even polled
        assert_eq!(second.await.unwrap(), DraftWrite::Applied { ticket: 2 });
        assert_eq!(first.await.unwrap(), DraftWrite::Superseded);

        let stored = svc.get_draft().await.unwrap().unwrap();
        assert_eq!(stored["worldView"]["title"], json!("second"));
    }

    #[tokio::test]
    async fn corrupt_draft_is_reported() {
        let store = Arc::new(InMemoryStore::new());
        store.put(DRAFT_KEY, "{not json").unwrap();
        let svc = StorageService::new(store.clone(), store);
        let err = svc.get_draft().await.unwrap_err();
        assert!(matches!(err, StorageError::Corrupt { key, .. } if key == DRAFT_KEY));
    }

    #[tokio::test]
    async fn assets_and_clear_all() {
        let svc = StorageService::in_memory();
        let mut rx = svc.subscribe();
        svc.put_asset("avatar_1_1.png", vec![1, 2]).await.unwrap();
        svc.set_draft(&doc_named("x")).await.unwrap();

        assert_eq!(svc.get_asset("avatar_1_1.png").await.unwrap(), Some(vec![1, 2]));
        assert!(svc.list_asset_keys().await.unwrap().contains("avatar_1_1.png"));

        svc.clear_all().await.unwrap();
        assert!(svc.get_draft().await.unwrap().is_none());
        assert!(svc.list_asset_keys().await.unwrap().is_empty());

        let mut seen = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            seen.push(ev);
        }
        assert_eq!(seen.first(), Some(&StorageEvent::AssetStored { name: "avatar_1_1.png".into() }));
        assert_eq!(seen.last(), Some(&StorageEvent::Cleared));
    }

    #[tokio::test]
    async fn quota_failure_surfaces_and_keeps_previous_draft() {
        let store = Arc::new(InMemoryStore::with_quota(400));
        let svc = StorageService::new(store.clone(), store);
        svc.set_draft(&doc_named("small")).await.unwrap();

        let big = doc_named(&"x".repeat(500));
        let err = svc.set_draft(&big).await.unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { .. }));

        let stored = svc.get_draft().await.unwrap().unwrap();
        assert_eq!(stored["worldView"]["title"], json!("small"));
    }

    #[tokio::test]
    async fn open_without_path_is_in_memory() {
        let svc = StorageService::open(&UniverseConfig::default()).await.unwrap();
        svc.put_asset("a", vec![0]).await.unwrap();
        assert_eq!(svc.list_asset_keys().await.unwrap().len(), 1);
    }
}
