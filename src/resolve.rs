//! Asset reference resolution for display.
//!
//! Documents store stable references (`img/<name>`). A viewer needs
//! something it can load, so the resolver reads the blob from the asset store
//! and binds it to a transient `blob:` handle. The document is never touched:
//! handles live only in the resolver's cache and are revoked once the asset
//! is no longer shown, replaced or removed.
//!
//! Per reference the cache moves through
//! `Unresolved -> Resolving -> Resolved(url) -> Revoked`, and a revoked
//! reference can be resolved again. Each entry into `Resolving` starts a new
//! generation; a read only installs its handle if its generation is still
//! current, so bytes read before a revoke are never shown after it.
//!
//! Resolution never fails: a missing or unreadable asset resolves to the raw
//! reference, the way a broken image would.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, warn};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::model::{is_directly_displayable, AssetRef, Document, ASSET_PREFIX};
use crate::storage::{StorageEvent, StorageService, Subscription};

pub mod object_url;

pub use object_url::{ObjectUrlRegistry, OBJECT_URL_PREFIX};

/// Where a single reference stands in its display lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveState {
    Unresolved,
    Resolving,
    Resolved(String),
    Revoked,
}

#[derive(Debug)]
struct Slot {
    state: ResolveState,
    generation: u64,
}

#[derive(Debug, Default)]
struct Cache {
    slots: HashMap<String, Slot>,
    next_generation: u64,
}

impl Cache {
    /// Moves `reference` to `Resolving` and returns the generation the
    /// caller's read belongs to. Joins a read already in flight.
    fn begin(&mut self, reference: &str) -> u64 {
        if let Some(slot) = self.slots.get(reference) {
            if slot.state == ResolveState::Resolving {
                return slot.generation;
            }
        }
        self.next_generation += 1;
        let generation = self.next_generation;
        self.slots.insert(
            reference.to_string(),
            Slot {
                state: ResolveState::Resolving,
                generation,
            },
        );
        generation
    }

    fn state(&self, reference: &str) -> Option<&ResolveState> {
        self.slots.get(reference).map(|slot| &slot.state)
    }

    fn set(&mut self, reference: &str, state: ResolveState) {
        if let Some(slot) = self.slots.get_mut(reference) {
            slot.state = state;
        }
    }
}

pub struct AssetResolver {
    storage: StorageService,
    registry: ObjectUrlRegistry,
    cache: Mutex<Cache>,
}

impl std::fmt::Debug for AssetResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetResolver")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl AssetResolver {
    pub fn new(storage: StorageService) -> Self {
        Self::with_registry(storage, ObjectUrlRegistry::new())
    }

    pub fn with_registry(storage: StorageService, registry: ObjectUrlRegistry) -> Self {
        Self {
            storage,
            registry,
            cache: Mutex::new(Cache::default()),
        }
    }

    pub fn registry(&self) -> &ObjectUrlRegistry {
        &self.registry
    }

    fn cache(&self) -> MutexGuard<'_, Cache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// A displayable URL for `reference`.
    ///
    /// URLs (`http(s)://`, `data:`, `blob:`) and anything that is not an
    /// `img/` reference come back unchanged. Stored references resolve to a
    /// cached handle, creating one on first use; if the asset is missing the
    /// reference itself is returned.
    pub async fn resolve(&self, reference: &str) -> String {
        if is_directly_displayable(reference) {
            return reference.to_string();
        }
        let name = match AssetRef::parse(reference) {
            AssetRef::Stored(name) => name,
            AssetRef::External(_) => return reference.to_string(),
        };

        let generation = {
            let mut cache = self.cache();
            if let Some(ResolveState::Resolved(url)) = cache.state(reference) {
                return url.clone();
            }
            cache.begin(reference)
        };

        let bytes = match self.storage.get_asset(name.as_str()).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                debug!("resolve: asset {name} is missing, showing the raw reference");
                self.forget(reference, generation);
                return reference.to_string();
            }
            Err(e) => {
                warn!("resolve: cannot read asset {name}: {e}");
                self.forget(reference, generation);
                return reference.to_string();
            }
        };

        let url = self.registry.create(bytes);
        let mut cache = self.cache();
        let Some(slot) = cache.slots.get_mut(reference) else {
            self.registry.revoke(&url);
            return reference.to_string();
        };
        let current = slot.generation == generation;
        if current && slot.state == ResolveState::Resolving {
            slot.state = ResolveState::Resolved(url.clone());
            return url;
        }
        // Another caller of the same generation finished first.
        if let (true, ResolveState::Resolved(existing)) = (current, &slot.state) {
            let existing = existing.clone();
            self.registry.revoke(&url);
            return existing;
        }
        // Revoked while the read was in flight, possibly re-resolved since.
        debug!("resolve: discarding stale read of {name}");
        self.registry.revoke(&url);
        reference.to_string()
    }

    /// Drops the entry for `reference` if it still belongs to `generation`.
    fn forget(&self, reference: &str, generation: u64) {
        let mut cache = self.cache();
        if cache.slots.get(reference).is_some_and(|slot| slot.generation == generation) {
            cache.slots.remove(reference);
        }
    }

    /// What to show for `reference` right now, without touching storage:
    /// the cached handle if there is one, the reference itself otherwise.
    pub fn display(&self, reference: &str) -> String {
        match self.cache().state(reference) {
            Some(ResolveState::Resolved(url)) => url.clone(),
            _ => reference.to_string(),
        }
    }

    pub fn state(&self, reference: &str) -> ResolveState {
        self.cache()
            .state(reference)
            .cloned()
            .unwrap_or(ResolveState::Unresolved)
    }

    /// Revokes the handle of `reference`. Returns `false` if none was live.
    pub fn revoke(&self, reference: &str) -> bool {
        let mut cache = self.cache();
        match cache.state(reference) {
            Some(ResolveState::Resolved(url)) => {
                self.registry.revoke(url);
                cache.set(reference, ResolveState::Revoked);
                true
            }
            Some(ResolveState::Resolving) => {
                cache.set(reference, ResolveState::Revoked);
                false
            }
            _ => false,
        }
    }

    /// Revokes every live handle and returns how many there were.
    pub fn revoke_all(&self) -> usize {
        let mut cache = self.cache();
        let mut revoked = 0;
        for slot in cache.slots.values_mut() {
            let state = &mut slot.state;
            match state {
                ResolveState::Resolved(url) => {
                    self.registry.revoke(url);
                    *state = ResolveState::Revoked;
                    revoked += 1;
                }
                ResolveState::Resolving => *state = ResolveState::Revoked,
                _ => {}
            }
        }
        revoked
    }

    /// Revokes handles for every reference not in `displayed`. Returns the
    /// number revoked.
    pub fn retain_only<'a>(&self, displayed: impl IntoIterator<Item = &'a str>) -> usize {
        let keep: HashSet<&str> = displayed.into_iter().collect();
        let stale: Vec<String> = self
            .cache()
            .slots
            .iter()
            .filter(|(r, s)| matches!(s.state, ResolveState::Resolved(_)) && !keep.contains(r.as_str()))
            .map(|(r, _)| r.clone())
            .collect();
        stale.iter().filter(|r| self.revoke(r)).count()
    }

    /// Display URLs for every reference the document holds, keyed by the
    /// stored reference. The document is left as it is.
    pub async fn resolve_document(&self, doc: &Document) -> BTreeMap<String, String> {
        let mut resolved = BTreeMap::new();
        for reference in doc.asset_refs() {
            let reference = reference.to_string();
            if resolved.contains_key(&reference) {
                continue;
            }
            let url = self.resolve(&reference).await;
            resolved.insert(reference, url);
        }
        resolved
    }

    /// Drops cached handles made stale by a storage change.
    pub fn invalidate(&self, event: &StorageEvent) {
        if let Some(name) = event.asset_name() {
            self.revoke(&format!("{ASSET_PREFIX}{name}"));
        } else if matches!(event, StorageEvent::Cleared) {
            self.revoke_all();
        }
    }

    /// Keeps the cache in step with `events`. The task ends when the bus
    /// closes or, at the next event, once the resolver has been dropped.
    pub fn watch(self: &Arc<Self>, mut events: Subscription) -> JoinHandle<()> {
        let resolver = Arc::downgrade(self);
        tokio::spawn(async move {
            loop {
                let received = events.recv().await;
                let Some(resolver) = resolver.upgrade() else {
                    break;
                };
                match received {
                    Ok(ev) => resolver.invalidate(&ev),
                    Err(RecvError::Lagged(missed)) => {
                        debug!("resolve: missed {missed} storage events, revoking all handles");
                        resolver.revoke_all();
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}
