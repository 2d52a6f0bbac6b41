//! Minimal HTTP response model.
//!
//! This struct represents a **fully buffered** HTTP response returned by the
//! network layer. It contains the final URL (after redirects), status code +
//! reason, response headers, and the raw body bytes.
//!
//! ## Notes
//! - `headers` is a `reqwest::header::HeaderMap`, which is **case-insensitive**
//!   for header names.
//! - `status_text` is derived from the status code's canonical reason phrase
//!   and may be `"Unknown"` for non-standard codes.
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::errors::RemoteError;

/// Simple structure for HTTP responses.
#[derive(Debug)]
pub struct Response {
    /// Final URL of the response (after redirects, if any).
    pub url: url::Url,

    /// Numeric HTTP status code (e.g., `200`, `404`).
    pub status: u16,

    /// Human-readable reason phrase (e.g., `"OK"`, `"Not Found"`).
    pub status_text: String,

    pub headers: HeaderMap,

    /// Raw response body bytes.
    pub body: Vec<u8>,
}

impl Response {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parses the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, RemoteError> {
        serde_json::from_slice(&self.body).map_err(|e| RemoteError::InvalidResponse(e.to_string()))
    }

    /// Body as text, with invalid UTF-8 replaced. Long bodies are cut.
    pub fn text_snippet(&self) -> String {
        const MAX: usize = 200;
        let text = String::from_utf8_lossy(&self.body);
        match text.char_indices().nth(MAX) {
            Some((idx, _)) => format!("{}...", &text[..idx]),
            None => text.into_owned(),
        }
    }

    /// Fails with [`RemoteError::Status`] unless the status is 2xx.
    pub fn error_for_status(self) -> Result<Self, RemoteError> {
        if self.is_success() {
            return Ok(self);
        }
        Err(RemoteError::Status {
            status: self.status,
            message: self.status_text.clone(),
        })
    }
}

/// Body returned by the save endpoint: `{"status": "success" | "error", "msg": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SaveAck {
    pub status: String,
    #[serde(default)]
    pub msg: String,
}

impl SaveAck {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &str) -> Response {
        Response {
            url: "http://localhost/api/save".parse().unwrap(),
            status,
            status_text: "OK".into(),
            headers: HeaderMap::new(),
            body: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn parses_save_ack() {
        let resp = response(200, r#"{"status":"success","msg":"saved"}"#);
        let ack: SaveAck = resp.json().unwrap();
        assert!(ack.is_success());
        assert_eq!(ack.msg, "saved");

        let resp = response(200, r#"{"status":"error"}"#);
        let ack: SaveAck = resp.json().unwrap();
        assert!(!ack.is_success());
        assert_eq!(ack.msg, "");
    }

    #[test]
    fn non_json_body_is_invalid_response() {
        let err = response(200, "<html>").json::<SaveAck>().unwrap_err();
        assert!(matches!(err, RemoteError::InvalidResponse(_)));
    }

    #[test]
    fn error_for_status() {
        assert!(response(204, "").error_for_status().is_ok());
        let err = response(404, "").error_for_status().unwrap_err();
        assert!(matches!(err, RemoteError::Status { status: 404, .. }));
    }

    #[test]
    fn snippet_is_bounded() {
        let long = "x".repeat(500);
        let snippet = response(500, &long).text_snippet();
        assert_eq!(snippet.len(), 203);
    }
}
