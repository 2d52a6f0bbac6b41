//! Client-side persistence for the OC Universe world-building editor.
//!
//! The editor keeps one [`Document`](model::Document) in memory. This crate
//! loads it through a fallback chain, migrates whatever was stored to the
//! current schema, saves it locally (optionally mirroring it to a remote
//! endpoint), stores uploaded assets and resolves asset references to
//! revocable display URLs.
//!
//! Start with [`Universe`](universe::Universe).

pub mod config;
pub mod errors;
pub mod loader;
pub mod migrate;
pub mod model;
pub mod net;
pub mod resolve;
pub mod save;
pub mod storage;
pub mod transfer;
pub mod universe;

pub use config::UniverseConfig;
pub use errors::{ImportError, RemoteError, StorageError, StorageResult};
pub use loader::{LoadSource, Loaded};
pub use migrate::patch;
pub use model::Document;
pub use universe::Universe;
