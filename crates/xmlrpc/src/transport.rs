//! # Transport Abstraction
//!
//! A minimal, synchronous interface for one buffered request/response
//! exchange.
//!
//! - **Document-oriented**: the transport moves opaque XML text; it never
//!   interprets the payload.
//! - **One shot**: each exchange is an independent POST with the full body
//!   buffered both ways. Pooling and TLS configuration live inside the HTTP
//!   client, not in this contract.

use std::time::Duration;

use tracing::trace;

use crate::error::TransportError;

pub type Result<T> = std::result::Result<T, TransportError>;

/// Content type every exchange is posted with.
pub const CONTENT_TYPE: &str = "text/xml; charset=\"utf-8\"";

/// A mechanism to post a request document and read back the reply document.
///
/// Object-safe so engines can hold `Box<dyn Transport>`.
pub trait Transport: Send + Sync {
    /// Sends the serialized document and blocks until the full reply body has
    /// been read or the exchange fails.
    fn exchange(&self, body: &str) -> Result<String>;
}

/// HTTP POST transport backed by a blocking `reqwest` client.
///
/// The endpoint is fixed at construction and read-only afterwards, so a
/// single instance may be shared across threads.
pub struct HttpTransport {
    endpoint: String,
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    /// The protocol has no liveness signal of its own, so every request
    /// carries a timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        Self::with_timeout(endpoint, Self::DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Io(e.to_string()))?;
        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Transport for HttpTransport {
    fn exchange(&self, body: &str) -> Result<String> {
        trace!(endpoint = %self.endpoint, bytes = body.len(), "posting request document");
        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, CONTENT_TYPE)
            .body(body.to_owned())
            .send()
            .map_err(classify)?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }
        response.text().map_err(classify)
    }
}

fn classify(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_connect() {
        TransportError::Connection(err.to_string())
    } else {
        TransportError::Io(err.to_string())
    }
}
