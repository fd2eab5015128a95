//! Document values exchanged with the store.
//!
//! [`Value`] covers both wire-level values (what the store driver hands back)
//! and domain-level values (what the entity model works with). The codec in
//! [`crate::adapter::codec`] moves a value between the two for each semantic
//! field type.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::ObjectId;

/// A schemaless document: field name to value.
pub type Document = BTreeMap<String, Value>;

/// Binary subtype used when wrapping raw bytes.
pub const GENERIC_BINARY_SUBTYPE: u8 = 0x00;

/// Store-native binary payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binary {
    pub subtype: u8,
    pub bytes: Vec<u8>,
}

impl Binary {
    /// Wrap raw bytes with the generic subtype.
    pub fn generic(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            subtype: GENERIC_BINARY_SUBTYPE,
            bytes: bytes.into(),
        }
    }
}

/// Cross-collection pointer stored inline on the owning document.
///
/// On the wire this is the pair `[collection, id]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(String, ObjectId)", into = "(String, ObjectId)")]
pub struct Reference {
    pub collection: String,
    pub id: ObjectId,
}

impl Reference {
    pub fn new(collection: impl Into<String>, id: impl Into<ObjectId>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
        }
    }
}

impl From<(String, ObjectId)> for Reference {
    fn from((collection, id): (String, ObjectId)) -> Self {
        Self { collection, id }
    }
}

impl From<Reference> for (String, ObjectId) {
    fn from(r: Reference) -> Self {
        (r.collection, r.id)
    }
}

/// A single field value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
    /// Opaque identifier in its store representation.
    ObjectId(ObjectId),
    DateTime(DateTime<Utc>),
    /// Store-native binary.
    Binary(Binary),
    /// Raw bytes as seen by the entity model.
    Bytes(Vec<u8>),
    Array(Vec<Value>),
    Document(Document),
    Reference(Reference),
    /// A relation field after hydration. Shared between every source
    /// document that points at the same target.
    Resolved(Arc<Document>),
}

impl Value {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Double(d) => Some(*d),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Value::Document(doc) => Some(doc),
            Value::Resolved(doc) => Some(doc),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_resolved(&self) -> Option<&Arc<Document>> {
        match self {
            Value::Resolved(doc) => Some(doc),
            _ => None,
        }
    }

    /// Extract the identifier this value points at.
    ///
    /// Accepts a wrapped identifier, a raw identifier string, or a reference
    /// tuple.
    #[must_use]
    pub fn as_object_id(&self) -> Option<ObjectId> {
        match self {
            Value::ObjectId(id) => Some(id.clone()),
            Value::String(s) => Some(ObjectId::new(s.as_str())),
            Value::Reference(r) => Some(r.id.clone()),
            _ => None,
        }
    }

    /// Total order used for sorting documents in memory.
    ///
    /// Values of different kinds order by kind; numbers compare across
    /// `Int`/`Double`.
    #[must_use]
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        if let (Some(a), Some(b)) = (self.as_f64(), other.as_f64()) {
            return a.partial_cmp(&b).unwrap_or(Ordering::Equal);
        }
        match (self, other) {
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::ObjectId(a), Value::ObjectId(b)) => a.cmp(b),
            (Value::DateTime(a), Value::DateTime(b)) => a.cmp(b),
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            _ => self.kind_rank().cmp(&other.kind_rank()),
        }
    }

    fn kind_rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Int(_) | Value::Double(_) => 1,
            Value::String(_) => 2,
            Value::Document(_) | Value::Resolved(_) => 3,
            Value::Array(_) => 4,
            Value::Binary(_) | Value::Bytes(_) => 5,
            Value::ObjectId(_) | Value::Reference(_) => 6,
            Value::Bool(_) => 7,
            Value::DateTime(_) => 8,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::Double(d)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<ObjectId> for Value {
    fn from(id: ObjectId) -> Self {
        Value::ObjectId(id)
    }
}

impl From<Reference> for Value {
    fn from(r: Reference) -> Self {
        Value::Reference(r)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(ts: DateTime<Utc>) -> Self {
        Value::DateTime(ts)
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        Value::Document(doc)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

/// Build a [`Document`] from `key => value` pairs.
///
/// ```
/// use docbridge::doc;
///
/// let d = doc! { "name" => "Ada", "age" => 36 };
/// assert_eq!(d.len(), 2);
/// ```
#[macro_export]
macro_rules! doc {
    () => { $crate::domain::value::Document::new() };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut d = $crate::domain::value::Document::new();
        $( d.insert(($key).to_string(), $crate::domain::value::Value::from($value)); )+
        d
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_round_trips_as_pair() {
        let value = Value::Reference(Reference::new("customers", "C1"));
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, r#"{"reference":["customers","C1"]}"#);

        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn document_with_references_round_trips() {
        let d = doc! {
            "customer" => Reference::new("customers", "C1"),
            "items" => vec![Reference::new("items", "I1"), Reference::new("items", "I2")],
        };
        let json = serde_json::to_string(&d).unwrap();
        let back: Document = serde_json::from_str(&json).unwrap();
        assert_eq!(back, d);
    }

    #[test]
    fn as_object_id_accepts_raw_and_wrapped() {
        assert_eq!(Value::from("C1").as_object_id(), Some(ObjectId::new("C1")));
        assert_eq!(
            Value::ObjectId(ObjectId::new("C1")).as_object_id(),
            Some(ObjectId::new("C1"))
        );
        assert_eq!(
            Value::Reference(Reference::new("c", "C1")).as_object_id(),
            Some(ObjectId::new("C1"))
        );
        assert_eq!(Value::Int(1).as_object_id(), None);
    }

    #[test]
    fn sort_cmp_mixes_int_and_double() {
        assert_eq!(Value::Int(2).sort_cmp(&Value::Double(1.5)), Ordering::Greater);
        assert_eq!(Value::from("a").sort_cmp(&Value::from("b")), Ordering::Less);
        assert_eq!(Value::Null.sort_cmp(&Value::Int(0)), Ordering::Less);
    }
}
