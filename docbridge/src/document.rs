//! The store-facing document shape and its mapping to application records.

use crate::common::DOC_ID;
use crate::errors::{DbError, DbResult, ErrorKind};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt::{Debug, Display, Formatter};

/// A document as the store sees it: a JSON object whose reserved `_id` field
/// addresses it within its endpoint.
///
/// Field lookups through [Document::get_path] accept dotted paths
/// (`"address.city"`) the same way query filters do.
///
/// ```rust,ignore
/// use docbridge::doc;
///
/// let mut d = doc! { "_id": "u1", "name": "Alice" };
/// d.put("age", 30);
/// assert_eq!(d.id()?, "u1");
/// ```
#[derive(Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Document {
    fields: Map<String, Value>,
}

impl Document {
    pub fn new() -> Self {
        Document { fields: Map::new() }
    }

    pub fn from_map(fields: Map<String, Value>) -> Self {
        Document { fields }
    }

    /// Converts an application record into a document.
    ///
    /// The record must serialize to a JSON object. Identity is not checked
    /// here; see [Document::from_identified_record].
    pub fn from_record<T: Serialize + ?Sized>(record: &T) -> DbResult<Self> {
        match serde_json::to_value(record)? {
            Value::Object(fields) => Ok(Document { fields }),
            other => Err(DbError::new(
                &format!(
                    "Record must serialize to an object, found {}",
                    value_type_name(&other)
                ),
                ErrorKind::ObjectMappingError,
            )),
        }
    }

    /// Converts an application record into a document and validates its
    /// identity field, returning the id alongside.
    pub fn from_identified_record<T: Serialize + ?Sized>(record: &T) -> DbResult<(String, Self)> {
        let document = Document::from_record(record)?;
        let id = document.id()?.to_string();
        Ok((id, document))
    }

    /// Maps the document back onto an application record.
    pub fn into_record<T: DeserializeOwned>(self) -> DbResult<T> {
        Ok(serde_json::from_value(Value::Object(self.fields))?)
    }

    /// Returns the identity field.
    ///
    /// Fails with [ErrorKind::InvalidId] if `_id` is absent, not a string or
    /// empty.
    pub fn id(&self) -> DbResult<&str> {
        match self.fields.get(DOC_ID) {
            Some(Value::String(id)) if !id.is_empty() => Ok(id.as_str()),
            Some(Value::String(_)) => Err(DbError::new(
                "Document id must not be empty",
                ErrorKind::InvalidId,
            )),
            Some(other) => Err(DbError::new(
                &format!("Document id must be a string, found {}", value_type_name(other)),
                ErrorKind::InvalidId,
            )),
            None => Err(DbError::new(
                &format!("Document is missing the '{}' field", DOC_ID),
                ErrorKind::InvalidId,
            )),
        }
    }

    pub fn has_id(&self) -> bool {
        self.id().is_ok()
    }

    /// Returns a copy of this document without its identity field.
    pub fn without_id(&self) -> Document {
        let mut copy = self.clone();
        copy.fields.remove(DOC_ID);
        copy
    }

    pub fn put(&mut self, key: &str, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(key.to_string(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Resolves a dotted field path through nested objects.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        if let Some(value) = self.fields.get(path) {
            return Some(value);
        }

        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.fields.get(first)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Merges `other` into this document: top-level fields present in `other`
    /// replace the ones here, every other field is kept.
    pub fn merge(&mut self, other: &Document) {
        for (key, value) in other.fields.iter() {
            self.fields.insert(key.clone(), value.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.fields
    }
}

impl From<Map<String, Value>> for Document {
    fn from(fields: Map<String, Value>) -> Self {
        Document::from_map(fields)
    }
}

impl From<Document> for Value {
    fn from(document: Document) -> Self {
        Value::Object(document.fields)
    }
}

impl Debug for Document {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Document({})", Value::Object(self.fields.clone()))
    }
}

impl Display for Document {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", Value::Object(self.fields.clone()))
    }
}

pub(crate) fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Builds a [Document] from `key: value` pairs using `serde_json::json!`
/// value syntax.
///
/// Non-object input yields an empty document.
#[macro_export]
macro_rules! doc {
    () => {
        $crate::document::Document::new()
    };

    ($($body:tt)+) => {
        match $crate::__json!({ $($body)+ }) {
            $crate::__JsonValue::Object(fields) => $crate::document::Document::from_map(fields),
            _ => $crate::document::Document::new(),
        }
    };
}
