//! Issue-tracker entities, re-projected from decoded response structs.

use xmlpack::Struct;
use xmlpack::Value;

use crate::error::Error;
use crate::error::Result;

/// One bug as reported by `Bug.search`.
#[derive(Debug, Clone, PartialEq)]
pub struct Bug {
    pub id: i64,
    pub status: String,
    pub summary: String,
    /// All comment texts joined with newlines, empty when the server does
    /// not expose `Bug.comments`.
    pub description: String,
    /// The release the search was scoped to, if any.
    pub release: Option<String>,
    pub open: bool,
}

impl Bug {
    pub fn is_closed(&self) -> bool {
        !self.open
    }

    pub(crate) fn from_search(
        members: &Struct,
        description: String,
        release: Option<&str>,
    ) -> Result<Self> {
        let id = members
            .get("id")
            .and_then(Value::as_i64)
            .ok_or(Error::MissingField {
                method: "Bug.search",
                field: "id",
            })?;
        Ok(Self {
            id,
            status: text_of(members.get("status")).unwrap_or_default(),
            summary: text_of(members.get("summary")).unwrap_or_default(),
            description,
            release: release.map(str::to_owned),
            open: truthy(members.get("is_open")),
        })
    }
}

/// One product as reported by `Product.get`.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: Option<i64>,
    pub name: String,
    pub description: String,
}

impl Product {
    pub(crate) fn from_get(members: &Struct) -> Self {
        Self {
            id: members.get("id").and_then(Value::as_i64),
            name: text_of(members.get("name")).unwrap_or_default(),
            description: text_of(members.get("description")).unwrap_or_default(),
        }
    }
}

/// Renders a scalar member as display text, whatever its wire variant.
pub(crate) fn text_of(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Int(n) => Some(n.to_string()),
        Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_owned()),
        Value::Double(d) => Some(d.to_string()),
        _ => None,
    }
}

/// Servers report open/closed as a boolean, an integer, or a "0"/"1" string
/// depending on version.
pub(crate) fn truthy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Int(n)) => *n != 0,
        Some(Value::String(s)) => !s.is_empty() && s != "0",
        _ => true,
    }
}
