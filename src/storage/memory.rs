use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard};

use crate::errors::{StorageError, StorageResult};
use crate::storage::area::{AssetStore, DataStore};

/// In-memory draft and asset storage (no persistence). Used when no database
/// path is configured, and by tests.
#[derive(Default)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
    quota: Option<u64>,
}

#[derive(Default)]
struct Inner {
    data: HashMap<String, String>,
    assets: BTreeMap<String, Vec<u8>>,
}

impl Inner {
    fn used_bytes(&self) -> u64 {
        let data: usize = self.data.values().map(String::len).sum();
        let assets: usize = self.assets.values().map(Vec::len).sum();
        (data + assets) as u64
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store refusing writes that would push the total stored bytes over `quota`.
    pub fn with_quota(quota: u64) -> Self {
        Self {
            inner: Mutex::default(),
            quota: Some(quota),
        }
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| StorageError::Backend("in-memory store lock poisoned".into()))
    }

    /// `replaced` is the size of the value being overwritten, if any.
    fn check_quota(&self, inner: &Inner, replaced: usize, incoming: usize) -> StorageResult<()> {
        let Some(quota) = self.quota else {
            return Ok(());
        };
        let needed = inner.used_bytes() - replaced as u64 + incoming as u64;
        if needed > quota {
            return Err(StorageError::QuotaExceeded { needed, quota });
        }
        Ok(())
    }
}

impl DataStore for InMemoryStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.lock()?.data.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut inner = self.lock()?;
        let replaced = inner.data.get(key).map_or(0, String::len);
        self.check_quota(&inner, replaced, value.len())?;
        inner.data.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.lock()?.data.remove(key);
        Ok(())
    }

    fn clear(&self) -> StorageResult<()> {
        self.lock()?.data.clear();
        Ok(())
    }
}

impl AssetStore for InMemoryStore {
    fn put_asset(&self, name: &str, bytes: &[u8]) -> StorageResult<()> {
        let mut inner = self.lock()?;
        let replaced = inner.assets.get(name).map_or(0, Vec::len);
        self.check_quota(&inner, replaced, bytes.len())?;
        inner.assets.insert(name.to_string(), bytes.to_vec());
        Ok(())
    }

    fn get_asset(&self, name: &str) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.lock()?.assets.get(name).cloned())
    }

    fn list_asset_keys(&self) -> StorageResult<BTreeSet<String>> {
        Ok(self.lock()?.assets.keys().cloned().collect())
    }

    fn remove_asset(&self, name: &str) -> StorageResult<()> {
        self.lock()?.assets.remove(name);
        Ok(())
    }

    fn clear_assets(&self) -> StorageResult<()> {
        self.lock()?.assets.clear();
        Ok(())
    }
}
