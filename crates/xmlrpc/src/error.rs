//! # Error Definitions
//!
//! Failure taxonomy for one request/response cycle.
//!
//! `TransportError` is the exchange itself failing; `CallError` covers
//! everything that can go wrong with a call, transport included. Neither is
//! retried here; callers own retry policy.

use thiserror::Error;

/// Failures at the HTTP boundary.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The endpoint is unreachable or the connection was dropped.
    #[error("connection failed: {0}")]
    Connection(String),
    /// The server answered outside the 2xx range.
    #[error("http status {0}")]
    Status(u16),
    /// No response arrived within the configured timeout.
    #[error("request timed out")]
    Timeout,
    /// Any other I/O failure while sending or reading the body.
    #[error("i/o failure: {0}")]
    Io(String),
}

/// Failures of a single remote procedure call.
#[derive(Debug, Error)]
pub enum CallError {
    /// The HTTP exchange failed before a response document existed.
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),
    /// The response did not parse or decode; an unrecognized wire tag
    /// surfaces here as the codec's `UnsupportedType`.
    #[error("malformed response: {0}")]
    MalformedResponse(#[from] xmlpack::Error),
    /// The server reported a fault instead of a result.
    #[error("server fault {code}: {message}")]
    Fault { code: i64, message: String },
    /// The decoded top-level value was not the struct this protocol's
    /// responses promise.
    #[error("expected a struct result, got {found}")]
    UnexpectedResultShape { found: &'static str },
}

pub type Result<T> = std::result::Result<T, CallError>;
