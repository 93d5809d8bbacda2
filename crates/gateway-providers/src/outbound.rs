//! The request shape a [`crate::signing::Signer`] mutates and a
//! [`crate::client::ProviderClient`] sends.

use bytes::Bytes;
use std::collections::HashMap;

/// A fully composed, not-yet-signed (or already-signed) outbound HTTP
/// request to a provider. Headers are keyed lower-case throughout, matching
/// the convention SigV4 canonicalization already requires.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    /// HTTP method, upper-case (`"POST"`, `"GET"`).
    pub method: String,
    /// Fully composed upstream URL, including query string.
    pub url: String,
    /// Lower-cased header names to values.
    pub headers: HashMap<String, String>,
    /// Request body bytes. Empty for bodyless requests.
    pub body: Bytes,
}

impl OutboundRequest {
    /// Build a bare, unsigned POST request with a JSON body.
    #[must_use]
    pub fn json_post(url: impl Into<String>, body: Bytes) -> Self {
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "application/json".to_string());
        Self {
            method: "POST".to_string(),
            url: url.into(),
            headers,
            body,
        }
    }

    /// Build a bare, unsigned GET request.
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: "GET".to_string(),
            url: url.into(),
            headers: HashMap::new(),
            body: Bytes::new(),
        }
    }

    /// Set (overwriting) a header, lower-casing its name.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
    }
}
