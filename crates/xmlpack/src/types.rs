//! Core types for the XML-RPC value model.

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use thiserror::Error;

/// Ordered, unique-keyed mapping of member names to values.
///
/// Insertion order is preserved so re-serialization is deterministic; key
/// lookup stays O(1).
pub type Struct = IndexMap<String, Value>;

/// A single wire value.
///
/// The variants form a closed set: everything expressible on the wire maps to
/// exactly one case, and encode dispatch is a total match over these eight
/// tags. A tree is built once (by a caller or by the decoder) and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Bool(bool),
    Double(f64),
    String(String),
    /// Civil date-time with no timezone. Carried verbatim, never converted.
    DateTime(NaiveDateTime),
    Nil,
    Array(Vec<Value>),
    Struct(Struct),
}

impl Value {
    /// The wire tag this variant serializes under.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Bool(_) => "boolean",
            Value::Double(_) => "double",
            Value::String(_) => "string",
            Value::DateTime(_) => "dateTime",
            Value::Nil => "nil",
            Value::Array(_) => "array",
            Value::Struct(_) => "struct",
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Value::DateTime(ts) => Some(*ts),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&Struct> {
        match self {
            Value::Struct(members) => Some(members),
            _ => None,
        }
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::Double(d)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(ts: NaiveDateTime) -> Self {
        Value::DateTime(ts)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<Struct> for Value {
    fn from(members: Struct) -> Self {
        Value::Struct(members)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(inner) => inner.into(),
            None => Value::Nil,
        }
    }
}

impl TryFrom<u64> for Value {
    type Error = Error;

    fn try_from(n: u64) -> Result<Self> {
        i64::try_from(n)
            .map(Value::Int)
            .map_err(|_| Error::Unrepresentable(format!("u64 {n} exceeds the integer tag range")))
    }
}

/// Codec failures.
///
/// Encoding never fails for a well-formed tree; every variant here except
/// `Unrepresentable` (raised while lifting a native value into the model)
/// comes from the decode path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("unexpected end of document")]
    UnexpectedEof,
    #[error("malformed xml at byte {0}")]
    Syntax(usize),
    #[error("mismatched end tag </{found}>, expected </{expected}>")]
    MismatchedTag { expected: String, found: String },
    #[error("unknown entity reference &{0};")]
    UnknownEntity(String),
    #[error("unsupported wire type <{0}>")]
    UnsupportedType(String),
    #[error("invalid <{tag}> payload {text:?}")]
    InvalidScalar { tag: String, text: String },
    #[error("struct member missing <name>")]
    MissingMemberName,
    #[error("struct member missing <value>")]
    MissingMemberValue,
    #[error("duplicate struct member {0:?}")]
    DuplicateMember(String),
    #[error("value nesting exceeds the depth limit")]
    DepthLimit,
    #[error("value not representable on the wire: {0}")]
    Unrepresentable(String),
}

pub type Result<T> = std::result::Result<T, Error>;
