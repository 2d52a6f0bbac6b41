use std::io::ErrorKind;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;

use super::LoadSource;
use crate::config::DefaultDocumentSource;
use crate::errors::ProviderError;
use crate::net::RemoteClient;
use crate::storage::StorageService;

/// Result of asking one tier for a document. `Ok(None)` means the tier has
/// nothing to offer; errors are logged by the loader and skipped.
pub type ProviderResult = Result<Option<Value>, ProviderError>;

/// One tier of the load chain.
pub trait DocumentProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Which tier a document from this provider is reported as.
    fn source(&self) -> LoadSource;

    fn fetch(&self) -> BoxFuture<'_, ProviderResult>;
}

/// The persisted draft.
pub struct DraftProvider {
    storage: StorageService,
}

impl DraftProvider {
    pub fn new(storage: StorageService) -> Self {
        Self { storage }
    }
}

impl DocumentProvider for DraftProvider {
    fn name(&self) -> &'static str {
        "draft"
    }

    fn source(&self) -> LoadSource {
        LoadSource::Draft
    }

    fn fetch(&self) -> BoxFuture<'_, ProviderResult> {
        async move { Ok(self.storage.get_draft().await?) }.boxed()
    }
}

/// A document embedded into a packaged build at export time.
pub struct StaticExportProvider {
    document: Option<Value>,
}

impl StaticExportProvider {
    pub fn new(document: Option<Value>) -> Self {
        Self { document }
    }
}

impl DocumentProvider for StaticExportProvider {
    fn name(&self) -> &'static str {
        "static export"
    }

    fn source(&self) -> LoadSource {
        LoadSource::StaticExport
    }

    fn fetch(&self) -> BoxFuture<'_, ProviderResult> {
        let document = self.document.clone();
        async move { Ok(document) }.boxed()
    }
}

/// The default document shipped next to the application, fetched over HTTP
/// or read from disk.
pub struct BundledDefaultProvider {
    source: DefaultDocumentSource,
    client: Option<RemoteClient>,
}

impl BundledDefaultProvider {
    /// `client` is required for URL sources; without one the tier is skipped.
    pub fn new(source: DefaultDocumentSource, client: Option<RemoteClient>) -> Self {
        Self { source, client }
    }
}

impl DocumentProvider for BundledDefaultProvider {
    fn name(&self) -> &'static str {
        "bundled default"
    }

    fn source(&self) -> LoadSource {
        LoadSource::BundledDefault
    }

    fn fetch(&self) -> BoxFuture<'_, ProviderResult> {
        async move {
            match &self.source {
                DefaultDocumentSource::Url(url) => {
                    let Some(client) = &self.client else {
                        return Ok(None);
                    };
                    Ok(Some(client.fetch_json(url).await?))
                }
                DefaultDocumentSource::Path(path) => {
                    let bytes = match tokio::fs::read(path).await {
                        Ok(b) => b,
                        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
                        Err(e) => return Err(e.into()),
                    };
                    serde_json::from_slice(&bytes)
                        .map(Some)
                        .map_err(|e| ProviderError::Parse(e.to_string()))
                }
            }
        }
        .boxed()
    }
}
