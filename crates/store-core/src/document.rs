//! Document and write payload types.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::error::StoreError;

/// A slash-separated path addressing a collection of documents.
///
/// Paths alternate collection and document segments, so a valid
/// collection path always has an odd number of segments:
/// `tickets` addresses a top-level collection, while
/// `tickets/<id>/messages` addresses a sub-collection nested under one
/// document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionRef(String);

impl CollectionRef {
    /// Parse and validate a collection path.
    pub fn new(path: impl Into<String>) -> Result<Self, StoreError> {
        let path = path.into();
        let segments: Vec<&str> = path.split('/').collect();
        if segments.iter().any(|s| s.is_empty()) || segments.len() % 2 == 0 {
            return Err(StoreError::InvalidPath(path));
        }
        Ok(Self(path))
    }

    /// Address a sub-collection nested under one document of this
    /// collection: `tickets` + (`abc`, `messages`) → `tickets/abc/messages`.
    pub fn child(&self, doc_id: &str, collection: &str) -> Result<Self, StoreError> {
        Self::new(format!("{}/{}/{}", self.0, doc_id, collection))
    }

    /// The raw slash-separated path.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A document read back from the store: its id plus its fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Store-assigned opaque identifier, unique within its collection.
    pub id: String,
    /// The document's fields as loosely-typed JSON values.
    pub fields: Map<String, Value>,
}

impl Document {
    /// Read a string field, if present and a string.
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    /// Read a boolean field, if present and a boolean.
    pub fn bool_field(&self, name: &str) -> Option<bool> {
        self.fields.get(name).and_then(Value::as_bool)
    }

    /// Read a timestamp field, if present and a valid RFC 3339 string.
    ///
    /// A timestamp written in the same commit may not have resolved yet
    /// when the document is read back; callers must treat `None` as "now"
    /// for sorting purposes only, never for persistence.
    pub fn time_field(&self, name: &str) -> Option<DateTime<Utc>> {
        self.str_field(name)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|t| t.with_timezone(&Utc))
    }
}

/// A single field value in a write payload.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteValue {
    /// A concrete JSON value.
    Json(Value),
    /// Placeholder resolved to the store's clock at commit time.
    ServerTime,
}

/// The fields of a create or set operation.
///
/// Built with a fluent API:
///
/// ```rust
/// use store_core::WriteFields;
///
/// let fields = WriteFields::new()
///     .field("status", "open")
///     .field("unreadForAdmin", false)
///     .server_time("createdAt");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteFields(BTreeMap<String, WriteValue>);

impl WriteFields {
    /// An empty write payload.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field to a concrete JSON value.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(name.into(), WriteValue::Json(value.into()));
        self
    }

    /// Set a field to the store's clock at commit time.
    pub fn server_time(mut self, name: impl Into<String>) -> Self {
        self.0.insert(name.into(), WriteValue::ServerTime);
        self
    }

    /// Whether any fields have been set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &WriteValue)> {
        self.0.iter()
    }
}

impl IntoIterator for WriteFields {
    type Item = (String, WriteValue);
    type IntoIter = std::collections::btree_map::IntoIter<String, WriteValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_ref_accepts_odd_segment_paths() {
        assert!(CollectionRef::new("tickets").is_ok());
        assert!(CollectionRef::new("tickets/abc/messages").is_ok());
    }

    #[test]
    fn test_collection_ref_rejects_malformed_paths() {
        assert!(CollectionRef::new("").is_err());
        assert!(CollectionRef::new("tickets/abc").is_err());
        assert!(CollectionRef::new("tickets//messages").is_err());
    }

    #[test]
    fn test_child_builds_sub_collection_path() {
        let tickets = CollectionRef::new("tickets").unwrap();
        let messages = tickets.child("abc", "messages").unwrap();
        assert_eq!(messages.as_str(), "tickets/abc/messages");
    }

    #[test]
    fn test_time_field_parses_rfc3339() {
        let mut fields = Map::new();
        fields.insert(
            "createdAt".to_string(),
            Value::String("2026-01-15T10:30:00Z".to_string()),
        );
        fields.insert("subject".to_string(), Value::String("hi".to_string()));
        let doc = Document {
            id: "d1".to_string(),
            fields,
        };

        assert!(doc.time_field("createdAt").is_some());
        assert!(doc.time_field("subject").is_none());
        assert!(doc.time_field("missing").is_none());
    }
}
