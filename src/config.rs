//! Universe configuration.
//!
//! `UniverseConfig` decides where the draft and assets live, how long the
//! storage layer may wait for a database connection, and which optional
//! remote endpoints take part in loading and saving.
//!
//! Sensible defaults come from [`Default`]; customize with the fluent
//! [`UniverseConfig::builder()`], whose `build()` validates the result.
//!
//! # Examples
//!
//! ```rust
//! use oc_universe::config::UniverseConfig;
//! use std::time::Duration;
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = UniverseConfig::builder()
//!     .database_path("universe.db")
//!     .connection_timeout(Duration::from_secs(2))
//!     .remote_save_url("http://localhost:8000/api/save".parse()?)
//!     .build()?;
//! assert_eq!(cfg.connection_timeout, Duration::from_secs(2));
//! # Ok(()) }
//! ```
//!
//! # Fields (summary)
//! - `database_path`: SQLite file for draft and assets. `None` keeps everything in memory.
//! - `connection_timeout`: bounded wait for a database connection (default: 5s).
//! - `busy_timeout`: SQLite busy timeout per statement (default: 500ms).
//! - `max_connections`: pool size (default: 4).
//! - `quota_bytes`: optional cap on total stored bytes.
//! - `remote_save_url`: optional mirror endpoint receiving every saved document.
//! - `default_document`: optional bundled default document (URL or file).
//! - `static_export`: default document injected into packaged builds.
//! - `request_timeout`: timeout for remote calls (default: 10s).
//! - `user_agent`: user agent sent with remote calls.
//! - `event_channel_capacity`: capacity of the storage event bus (default: 64).

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

const DEFAULT_USER_AGENT: &str = "OCUniverse/1.0 (storage)";

/// Where the bundled default document comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultDocumentSource {
    /// Fetched over HTTP(S).
    Url(Url),
    /// Read from the local filesystem.
    Path(PathBuf),
}

#[derive(Debug, Clone)]
pub struct UniverseConfig {
    pub database_path: Option<PathBuf>,
    pub connection_timeout: Duration,
    pub busy_timeout: Duration,
    pub max_connections: u32,
    pub quota_bytes: Option<u64>,
    pub remote_save_url: Option<Url>,
    pub default_document: Option<DefaultDocumentSource>,
    pub static_export: Option<serde_json::Value>,
    pub request_timeout: Duration,
    pub user_agent: String,
    pub event_channel_capacity: usize,
}

impl Default for UniverseConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            connection_timeout: Duration::from_secs(5),
            busy_timeout: Duration::from_millis(500),
            max_connections: 4,
            quota_bytes: None,
            remote_save_url: None,
            default_document: None,
            static_export: None,
            request_timeout: Duration::from_secs(10),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            event_channel_capacity: 64,
        }
    }
}

impl UniverseConfig {
    pub fn builder() -> UniverseConfigBuilder {
        UniverseConfigBuilder::default()
    }
}

/// Builder for [`UniverseConfig`].
#[derive(Debug, Clone, Default)]
pub struct UniverseConfigBuilder {
    inner: UniverseConfig,
}

impl UniverseConfigBuilder {
    #[inline]
    fn map(mut self, f: impl FnOnce(&mut UniverseConfig)) -> Self {
        f(&mut self.inner);
        self
    }

    pub fn database_path<P: Into<PathBuf>>(self, p: P) -> Self { self.map(|c| c.database_path = Some(p.into())) }
    pub fn in_memory(self) -> Self { self.map(|c| c.database_path = None) }
    pub fn connection_timeout(self, d: Duration) -> Self { self.map(|c| c.connection_timeout = d) }
    pub fn busy_timeout(self, d: Duration) -> Self { self.map(|c| c.busy_timeout = d) }
    pub fn max_connections(self, n: u32) -> Self { self.map(|c| c.max_connections = n) }
    pub fn quota_bytes(self, q: u64) -> Self { self.map(|c| c.quota_bytes = Some(q)) }
    pub fn remote_save_url(self, u: Url) -> Self { self.map(|c| c.remote_save_url = Some(u)) }
    pub fn default_document_url(self, u: Url) -> Self { self.map(|c| c.default_document = Some(DefaultDocumentSource::Url(u))) }
    pub fn default_document_path<P: Into<PathBuf>>(self, p: P) -> Self { self.map(|c| c.default_document = Some(DefaultDocumentSource::Path(p.into()))) }
    pub fn static_export(self, v: serde_json::Value) -> Self { self.map(|c| c.static_export = Some(v)) }
    pub fn request_timeout(self, d: Duration) -> Self { self.map(|c| c.request_timeout = d) }
    pub fn user_agent<S: Into<String>>(self, ua: S) -> Self { self.map(|c| c.user_agent = ua.into()) }
    pub fn event_channel_capacity(self, n: usize) -> Self { self.map(|c| c.event_channel_capacity = n) }

    /// Apply multiple changes in one go.
    pub fn with(self, f: impl FnOnce(&mut UniverseConfig)) -> Self { self.map(f) }

    /// Validate and build the final config.
    pub fn build(self) -> Result<UniverseConfig, ConfigError> {
        validate(&self.inner)?;
        Ok(self.inner)
    }
}

// ---------- Validation ----------

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    ZeroTimeout(&'static str),
    ZeroConnections,
    ZeroQuota,
    ZeroChannelCapacity,
    UnsupportedScheme(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroTimeout(name) => write!(f, "{name} must be greater than zero"),
            ConfigError::ZeroConnections => write!(f, "max_connections must be at least 1"),
            ConfigError::ZeroQuota => write!(f, "quota_bytes must be greater than zero when set"),
            ConfigError::ZeroChannelCapacity => write!(f, "event_channel_capacity must be at least 1"),
            ConfigError::UnsupportedScheme(s) =>
                write!(f, "remote endpoints must use http or https, got '{s}'"),
        }
    }
}
impl std::error::Error for ConfigError {}

fn validate(c: &UniverseConfig) -> Result<(), ConfigError> {
    if c.connection_timeout.is_zero() {
        return Err(ConfigError::ZeroTimeout("connection_timeout"));
    }
    if c.request_timeout.is_zero() {
        return Err(ConfigError::ZeroTimeout("request_timeout"));
    }
    if c.max_connections == 0 {
        return Err(ConfigError::ZeroConnections);
    }
    if c.quota_bytes == Some(0) {
        return Err(ConfigError::ZeroQuota);
    }
    if c.event_channel_capacity == 0 {
        return Err(ConfigError::ZeroChannelCapacity);
    }
    if let Some(u) = &c.remote_save_url {
        check_scheme(u)?;
    }
    if let Some(DefaultDocumentSource::Url(u)) = &c.default_document {
        check_scheme(u)?;
    }
    Ok(())
}

fn check_scheme(u: &Url) -> Result<(), ConfigError> {
    match u.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::UnsupportedScheme(other.to_string())),
    }
}
