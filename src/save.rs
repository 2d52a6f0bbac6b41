//! Save pipeline.
//!
//! A save always writes the draft locally first; that write alone decides
//! whether the save succeeded. When a remote mirror is configured the same
//! document is then POSTed to it, and whatever happens there is reported in
//! the [`SaveReport`] as a warning, never as an error.
//!
//! The mirror sees saves in call order too: a save overtaken by a later one
//! is neither written locally nor posted.

use std::future::Future;
use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::Mutex;
use url::Url;

use crate::errors::StorageResult;
use crate::model::Document;
use crate::net::RemoteClient;
use crate::storage::{DraftWrite, StorageService};

/// What happened on the remote side of a save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteOutcome {
    NotConfigured,
    /// The mirror accepted the document; `message` is its answer.
    Mirrored { message: String },
    /// The mirror was unreachable or refused the document.
    Failed { reason: String },
    /// A later save overtook this one; nothing was posted.
    Superseded,
}

/// Outcome of a successful local save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReport {
    pub remote: RemoteOutcome,
}

impl SaveReport {
    /// A non-fatal warning to show the user, if any.
    pub fn warning(&self) -> Option<&str> {
        match &self.remote {
            RemoteOutcome::Failed { reason } => Some(reason),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
struct Mirror {
    client: RemoteClient,
    url: Url,
    /// Ticket of the last save posted.
    posted: Arc<Mutex<u64>>,
}

#[derive(Clone, Debug)]
pub struct SavePipeline {
    storage: StorageService,
    mirror: Option<Mirror>,
}

impl SavePipeline {
    /// A pipeline that only saves locally.
    pub fn new(storage: StorageService) -> Self {
        Self { storage, mirror: None }
    }

    /// Also mirror every save to `url`.
    pub fn with_mirror(mut self, client: RemoteClient, url: Url) -> Self {
        self.mirror = Some(Mirror {
            client,
            url,
            posted: Arc::new(Mutex::new(0)),
        });
        self
    }

    pub fn mirror_url(&self) -> Option<&Url> {
        self.mirror.as_ref().map(|m| &m.url)
    }

    /// Persists `doc`. Saves are applied in the order this method is called,
    /// even when their futures complete out of order.
    ///
    /// Fails only if the local write fails.
    pub fn save(&self, doc: &Document) -> impl Future<Output = StorageResult<SaveReport>> + Send + 'static {
        let local = self.storage.set_draft(doc);
        let mirror = self.mirror.clone().map(|m| (m, doc.clone()));
        async move {
            let ticket = match local.await? {
                DraftWrite::Applied { ticket } => ticket,
                DraftWrite::Superseded => {
                    return Ok(SaveReport {
                        remote: RemoteOutcome::Superseded,
                    })
                }
            };

            let Some((mirror, doc)) = mirror else {
                return Ok(SaveReport {
                    remote: RemoteOutcome::NotConfigured,
                });
            };
            let mut posted = mirror.posted.lock().await;
            if ticket < *posted {
                debug!("save: save #{ticket} not mirrored, #{} already was", *posted);
                return Ok(SaveReport {
                    remote: RemoteOutcome::Superseded,
                });
            }
            *posted = ticket;
            let remote = match mirror.client.post_document(&mirror.url, &doc).await {
                Ok(message) => {
                    info!("save: mirrored to {}", mirror.url);
                    RemoteOutcome::Mirrored { message }
                }
                Err(e) => {
                    warn!("save: local save succeeded but mirroring to {} failed: {e}", mirror.url);
                    RemoteOutcome::Failed { reason: e.to_string() }
                }
            };
            Ok(SaveReport { remote })
        }
    }
}
