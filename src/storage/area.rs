use std::collections::BTreeSet;

use crate::errors::StorageResult;

/// Object-safe keyed store for structured documents (serialized JSON text).
///
/// Implementations are synchronous; async callers go through
/// [`StorageService`](super::StorageService).
pub trait DataStore: Send + Sync {
    /// Retrieves the value stored under `key`, or `None` if there is none.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value. A single put
    /// is atomic: on error nothing was written.
    fn put(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Removes the value under `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> StorageResult<()>;

    /// Removes every value.
    fn clear(&self) -> StorageResult<()>;
}

/// Object-safe keyed store for binary assets.
///
/// Names are opaque lookup keys. Writing an existing name overwrites it.
pub trait AssetStore: Send + Sync {
    fn put_asset(&self, name: &str, bytes: &[u8]) -> StorageResult<()>;

    fn get_asset(&self, name: &str) -> StorageResult<Option<Vec<u8>>>;

    /// Every stored asset name, sorted.
    fn list_asset_keys(&self) -> StorageResult<BTreeSet<String>>;

    fn remove_asset(&self, name: &str) -> StorageResult<()>;

    /// Removes every asset.
    fn clear_assets(&self) -> StorageResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStore;
    use std::sync::Arc;

    #[test]
    fn datastore_basic_contract() {
        let store: Arc<dyn DataStore> = Arc::new(InMemoryStore::new());

        // starts empty
        assert!(store.get("missing").unwrap().is_none());

        store.put("a", "1").unwrap();
        store.put("b", "2").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));

        // last write wins
        store.put("a", "ONE").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("ONE"));

        store.remove("b").unwrap();
        assert!(store.get("b").unwrap().is_none());
        store.remove("b").unwrap();

        store.clear().unwrap();
        assert!(store.get("a").unwrap().is_none());
    }

    #[test]
    fn assetstore_basic_contract() {
        let store: Arc<dyn AssetStore> = Arc::new(InMemoryStore::new());
        assert!(store.list_asset_keys().unwrap().is_empty());

        store.put_asset("b.png", &[2]).unwrap();
        store.put_asset("a.png", &[1, 1]).unwrap();
        let keys: Vec<_> = store.list_asset_keys().unwrap().into_iter().collect();
        assert_eq!(keys, vec!["a.png", "b.png"]);

        store.put_asset("a.png", &[9]).unwrap();
        assert_eq!(store.get_asset("a.png").unwrap(), Some(vec![9]));

        store.remove_asset("a.png").unwrap();
        assert!(store.get_asset("a.png").unwrap().is_none());

        store.clear_assets().unwrap();
        assert!(store.list_asset_keys().unwrap().is_empty());
    }
}
