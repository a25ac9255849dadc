//! # bugzilla
//!
//! A thin Bugzilla client over the XML-RPC transaction engine: log in for an
//! explicit session token, search bugs, append comments, change statuses,
//! list products. All protocol mechanics live in `xmlrpc` and `xmlpack`;
//! this crate only knows which method names and argument keys the server
//! expects and how to re-project decoded structs into entities.

pub mod client;
pub mod error;
pub mod model;

pub use client::Client;
pub use client::Config;
pub use client::Session;

pub use error::Error;
pub use error::Result;

pub use model::Bug;
pub use model::Product;
