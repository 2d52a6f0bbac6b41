use log::{debug, warn};
use serde_json::Value;
use url::Url;

use crate::config::UniverseConfig;
use crate::errors::RemoteError;
use crate::model::Document;
use crate::net::{Response, SaveAck};

/// HTTP client for the optional remote endpoints: the bundled default document
/// and the save mirror.
#[derive(Clone, Debug)]
pub struct RemoteClient {
    client: reqwest::Client,
}

impl RemoteClient {
    pub fn new(config: &UniverseConfig) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { client })
    }

    /// Loads an URL and returns the buffered response, whatever its status.
    pub async fn fetch(&self, url: &Url) -> Result<Response, RemoteError> {
        let res = self.client.get(url.clone()).send().await?;
        collect(res).await
    }

    /// Loads an URL and parses a 2xx body as JSON.
    pub async fn fetch_json(&self, url: &Url) -> Result<Value, RemoteError> {
        let resp = self.fetch(url).await?.error_for_status()?;
        resp.json()
    }

    /// POSTs the full document as JSON and interprets the endpoint's
    /// `{status, msg}` answer. Returns the message on success.
    pub async fn post_document(&self, url: &Url, doc: &Document) -> Result<String, RemoteError> {
        let res = self.client.post(url.clone()).json(doc).send().await?;
        let resp = collect(res).await?;

        let ack = match resp.json::<SaveAck>() {
            Ok(ack) => ack,
            Err(_) if !resp.is_success() => {
                return Err(RemoteError::Status {
                    status: resp.status,
                    message: resp.text_snippet(),
                });
            }
            Err(e) => return Err(e),
        };

        if !resp.is_success() {
            warn!("remote save answered {} {}", resp.status, resp.status_text);
            return Err(RemoteError::Status {
                status: resp.status,
                message: ack.msg,
            });
        }
        if !ack.is_success() {
            return Err(RemoteError::Rejected(ack.msg));
        }
        debug!("remote save accepted by {}: {}", resp.url, ack.msg);
        Ok(ack.msg)
    }
}

async fn collect(res: reqwest::Response) -> Result<Response, RemoteError> {
    let final_url = res.url().clone();
    let status = res.status().as_u16();
    let status_text = res.status().canonical_reason().unwrap_or("Unknown").to_string();
    let headers = res.headers().clone();

    // Fetch body. We don't do streaming
    let body = res.bytes().await?.to_vec();

    Ok(Response {
        url: final_url,
        status,
        status_text,
        headers,
        body,
    })
}
