//! Domain-layer failures.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A call failed at the RPC layer.
    #[error(transparent)]
    Rpc(#[from] xmlrpc::CallError),
    /// The server answered, but without the result this method requires.
    #[error("the {0} method is not available on this server")]
    MethodUnavailable(&'static str),
    /// A required member was absent or carried the wrong variant.
    #[error("missing or mistyped {field} in the {method} response")]
    MissingField {
        method: &'static str,
        field: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
