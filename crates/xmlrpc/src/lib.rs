//! # xmlrpc
//!
//! A synchronous XML-RPC transaction engine over the `xmlpack` value model.
//!
//! One call is one independent request/response cycle: the engine serializes
//! a method name plus a struct of named arguments into a call document,
//! posts it through a [`Transport`], and decodes the single returned value
//! back into the value model. There is no session state, retry logic, or
//! connection management here; callers compose multi-step conversations
//! themselves.

pub mod call;
pub mod error;
pub mod transport;

pub use call::Client;

pub use error::CallError;
pub use error::Result;
pub use error::TransportError;

pub use transport::HttpTransport;
pub use transport::Transport;
pub use transport::CONTENT_TYPE;

#[cfg(test)]
mod tests;
