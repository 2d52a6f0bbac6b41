//! Persistence for the universe editor.
//!
//! Two logical stores back every session:
//!
//! - **Data store**: the single draft document, serialized as JSON under a
//!   fixed key. Last write wins; a single put is atomic.
//! - **Asset store**: binary blobs (covers, avatars, favicons) under opaque
//!   caller-chosen names.
//!
//! Backends implement the synchronous [`DataStore`] and [`AssetStore`]
//! traits. [`StorageService`] wraps one of each into an async handle that
//! orders draft writes and publishes a [`StorageEvent`] for every change.
//!
//! # Choosing a backend
//!
//! - For persistent storage, use [`SqliteStore`] (feature `sqlite_store`).
//! - For tests or throwaway sessions, use [`InMemoryStore`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use oc_universe::config::UniverseConfig;
//! use oc_universe::storage::{SqliteStore, StorageService};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = UniverseConfig::default();
//! let store = Arc::new(SqliteStore::open("universe.db", &config)?);
//! let storage = StorageService::new(store.clone(), store);
//! # let _ = storage;
//! # Ok(()) }
//! ```

/// Backend traits.
pub mod area;
/// Change events.
pub mod event;
/// In-memory backend.
pub mod memory;
/// Async service over a pair of backends.
pub mod service;
/// SQLite backend.
#[cfg(feature = "sqlite_store")]
pub mod sqlite;

pub use area::{AssetStore, DataStore};
pub use event::StorageEvent;
pub use memory::InMemoryStore;
pub use service::{DraftWrite, StorageService, Subscription, DRAFT_KEY};
#[cfg(feature = "sqlite_store")]
pub use sqlite::SqliteStore;
