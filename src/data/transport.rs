//! HTTP transport.
//!
//! The client talks to the network through [`Transport`] so that retry and
//! normalization can be driven by scripted replies in tests.

use std::time::Duration;

use reqwest::blocking::Client;

use crate::error::{SeriesError, TransientFailure};

/// Raw HTTP reply: status code and body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Issues one GET request.
///
/// Implementations report only network-level failures
/// ([`TransientFailure::Timeout`] / [`TransientFailure::Connection`]); any
/// HTTP status, including errors, comes back as an [`HttpReply`].
pub trait Transport {
    fn get(&self, url: &str, query: &[(String, String)]) -> Result<HttpReply, TransientFailure>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get(&self, url: &str, query: &[(String, String)]) -> Result<HttpReply, TransientFailure> {
        (**self).get(url, query)
    }
}

/// Blocking `reqwest` transport.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, SeriesError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SeriesError::Configuration(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str, query: &[(String, String)]) -> Result<HttpReply, TransientFailure> {
        let resp = self
            .client
            .get(url)
            .query(query)
            .send()
            .map_err(classify)?;

        // Status classification belongs to the client: a 4xx must not be retried
        // but a 5xx must, and only the client knows which request it was.
        let status = resp.status().as_u16();
        // Reading the body can still time out on a slow upstream.
        let body = resp.text().map_err(classify)?;
        Ok(HttpReply { status, body })
    }
}

// The request URL carries the API key in its query string; drop it from the message.
fn classify(err: reqwest::Error) -> TransientFailure {
    let timed_out = err.is_timeout();
    let message = err.without_url().to_string();
    if timed_out {
        TransientFailure::Timeout(message)
    } else {
        TransientFailure::Connection(message)
    }
}
