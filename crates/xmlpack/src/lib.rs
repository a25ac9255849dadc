//! # xmlpack
//!
//! The XML-RPC value model and its wire codec.
//!
//! A `Value` is a closed tagged union over everything the wire format can
//! express: integers, booleans, doubles, strings, civil timestamps, nil,
//! heterogeneous arrays, and ordered unique-keyed structs, recursively
//! nestable. The encoder serializes a tree into the XML dialect and the
//! decoder reconstructs it losslessly, so `decode_fragment(encode_fragment(v))`
//! reproduces `v` structurally, member order included.
//!
//! The crate knows nothing about any particular remote service; transports
//! and request framing live upstream.

pub mod decoder;
pub mod encoder;
pub mod reader;
pub mod types;
pub mod writer;

pub use types::Error;
pub use types::Result;
pub use types::Struct;
pub use types::Value;

pub use encoder::encode_fragment;
pub use encoder::encode_struct;
pub use encoder::encode_value;
pub use encoder::DATE_TIME_FORMAT;

pub use decoder::decode_fragment;
pub use decoder::read_value_body;

pub use reader::Token;
pub use reader::XmlReader;

pub use writer::XmlWriter;
