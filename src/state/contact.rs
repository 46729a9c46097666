//! Contact record
//!
//! A single directory entry. Every field is a plain string and every field is
//! optional on the wire: anything the client leaves out is stored as `""`.
//!
//! Request bodies are decoded leniently. A `null` body is an empty contact,
//! a `null` field is left empty, keys match field names case-insensitively
//! (an exact-case key wins over a folded one) and a repeated key keeps its
//! last value.

use serde::{de::Error as _, Deserialize, Serialize};
use serde_json::{Map, Value};

/// Wire names of the contact fields
const FIELDS: [&str; 5] = ["name", "department", "title", "phoneNumber", "email"];

/// A person's directory entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Contact {
    /// Display name
    pub name: String,
    /// Department or organisation path
    pub department: String,
    /// Job title
    pub title: String,
    /// Phone number, serialized as `phoneNumber`
    pub phone_number: String,
    /// Email address
    pub email: String,
}

impl Contact {
    /// Create a contact with only a name set
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Decode a request body into a contact
    pub fn from_json(data: &[u8]) -> Result<Self, serde_json::Error> {
        // Going through `Value` collapses repeated keys, last one wins
        match serde_json::from_slice::<Value>(data)? {
            Value::Null => Ok(Self::default()),
            Value::Object(fields) => Self::deserialize(Value::Object(fold_keys(fields))),
            other => Err(serde_json::Error::custom(format!(
                "expected a contact object, found {}",
                json_kind(&other)
            ))),
        }
    }
}

/// Map object keys onto the canonical field names
fn fold_keys(fields: Map<String, Value>) -> Map<String, Value> {
    let (exact, folded): (Vec<_>, Vec<_>) = fields
        .into_iter()
        .filter(|(_, value)| !value.is_null())
        .partition(|(key, _)| FIELDS.contains(&key.as_str()));

    let mut out = Map::new();
    for (key, value) in folded {
        if let Some(field) = FIELDS.iter().find(|f| f.eq_ignore_ascii_case(&key)) {
            out.insert((*field).to_string(), value);
        }
    }
    for (key, value) in exact {
        out.insert(key, value);
    }
    out
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
