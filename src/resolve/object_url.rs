use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use uuid::Uuid;

/// Scheme and authority of every handle handed out by the registry.
pub const OBJECT_URL_PREFIX: &str = "blob:oc-universe/";

/// Transient URLs bound to in-memory asset bytes.
///
/// A handle stays valid until it is revoked; revoking releases the bytes.
/// Handles are never persisted.
#[derive(Clone, Default)]
pub struct ObjectUrlRegistry {
    urls: Arc<Mutex<HashMap<String, Arc<[u8]>>>>,
}

impl std::fmt::Debug for ObjectUrlRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectUrlRegistry").field("live", &self.len()).finish()
    }
}

impl ObjectUrlRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn urls(&self) -> MutexGuard<'_, HashMap<String, Arc<[u8]>>> {
        // The map is always left consistent, so a poisoned lock is still usable.
        self.urls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Binds `bytes` to a fresh handle.
    pub fn create(&self, bytes: impl Into<Arc<[u8]>>) -> String {
        let url = format!("{OBJECT_URL_PREFIX}{}", Uuid::new_v4());
        self.urls().insert(url.clone(), bytes.into());
        url
    }

    /// Bytes behind a live handle.
    pub fn get(&self, url: &str) -> Option<Arc<[u8]>> {
        self.urls().get(url).cloned()
    }

    /// Releases a handle. Returns `false` if it was not live.
    pub fn revoke(&self, url: &str) -> bool {
        self.urls().remove(url).is_some()
    }

    /// Number of live handles.
    pub fn len(&self) -> usize {
        self.urls().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_get_revoke() {
        let reg = ObjectUrlRegistry::new();
        let a = reg.create(vec![1, 2, 3]);
        let b = reg.create(vec![1, 2, 3]);
        assert!(a.starts_with(OBJECT_URL_PREFIX));
        assert_ne!(a, b);
        assert_eq!(reg.len(), 2);
        assert_eq!(reg.get(&a).as_deref(), Some(&[1u8, 2, 3][..]));

        assert!(reg.revoke(&a));
        assert!(!reg.revoke(&a));
        assert!(reg.get(&a).is_none());
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn clones_share_handles() {
        let reg = ObjectUrlRegistry::new();
        let other = reg.clone();
        let url = reg.create(vec![7]);
        assert!(other.get(&url).is_some());
        other.revoke(&url);
        assert!(reg.is_empty());
    }
}
