//! Error types for the universe storage layer.
//!
//! Storage failures surface to callers as [`StorageError`]; everything the
//! loader and resolver can recover from locally never leaves this crate as an
//! error (see [`loader`](crate::loader) and [`resolve`](crate::resolve)).

use std::time::Duration;

/// Errors from the data and asset stores.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Acquiring a connection took longer than the configured bound. Usually
    /// another process holds the database or an upgrade is pending.
    #[error("storage is blocked: no connection after {waited:?}")]
    Blocked { waited: Duration },

    /// The backend could not be opened at all.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// The write would exceed the configured quota.
    #[error("quota exceeded: {needed} bytes needed, {quota} bytes allowed")]
    QuotaExceeded { needed: u64, quota: u64 },

    /// A stored value could not be decoded.
    #[error("corrupt value under '{key}': {reason}")]
    Corrupt { key: String, reason: String },

    #[error("serialization error: {0}")]
    Serialization(String),

    /// Any other backend failure (SQL error, poisoned state, ...).
    #[error("backend error: {0}")]
    Backend(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A blocking storage task panicked or was cancelled.
    #[error("storage task failed: {0}")]
    TaskFailed(String),
}

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Serialization(e.to_string())
    }
}

impl From<tokio::task::JoinError> for StorageError {
    fn from(e: tokio::task::JoinError) -> Self {
        StorageError::TaskFailed(e.to_string())
    }
}

#[cfg(feature = "sqlite_store")]
impl From<r2d2_sqlite::rusqlite::Error> for StorageError {
    fn from(e: r2d2_sqlite::rusqlite::Error) -> Self {
        StorageError::Backend(e.to_string())
    }
}

/// Rejections of an imported document. Nothing is written when any of these occur.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("imported document must be a JSON object")]
    NotAnObject,

    #[error("imported document is missing required field '{0}'")]
    MissingField(&'static str),

    #[error("imported field '{0}' has the wrong type")]
    WrongType(&'static str),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Failures of the optional remote endpoints.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("network error: {0}")]
    Network(String),

    #[error("remote answered {status}: {message}")]
    Status { status: u16, message: String },

    /// The endpoint answered but reported a failure in its body.
    #[error("remote rejected the document: {0}")]
    Rejected(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        RemoteError::Network(e.to_string())
    }
}

/// An asset name failed validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssetNameError {
    #[error("asset name is empty")]
    Empty,

    #[error("asset name contains invalid character {0:?}")]
    InvalidCharacter(char),

    #[error("asset name must not traverse directories")]
    PathTraversal,

    #[error("asset name is too long ({0} bytes)")]
    TooLong(usize),
}

/// Why one tier of the load chain produced no document. The loader logs these
/// and moves on to the next tier; they never reach callers of `load`.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("cannot read default document: {0}")]
    Io(#[from] std::io::Error),

    #[error("default document is not valid JSON: {0}")]
    Parse(String),
}
