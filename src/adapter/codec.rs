//! Value codec: wire values to domain values and back.
//!
//! Both directions are idempotent. Coercing a value that is already in the
//! target representation returns it unchanged, and anything the codec cannot
//! interpret passes through as-is instead of failing.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::domain::{Binary, Document, EntityMetadata, FieldMetadata, FieldType, ObjectId, Value};

/// Layouts accepted for timestamps without an explicit offset.
const NAIVE_TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Coerce a domain value into its store representation for `field_type`.
#[must_use]
pub fn to_store(field_type: &FieldType, value: Value) -> Value {
    match (field_type, value) {
        (_, Value::Array(items)) => Value::Array(
            items
                .into_iter()
                .map(|item| to_store(field_type, item))
                .collect(),
        ),
        (FieldType::ObjectId, Value::String(s)) => Value::ObjectId(ObjectId::new(s)),
        (FieldType::Timestamp, value) => coerce_timestamp(value),
        (FieldType::Binary, Value::Bytes(bytes)) => Value::Binary(Binary::generic(bytes)),
        (FieldType::Embedded { fields }, Value::Document(doc)) => {
            Value::Document(encode_fields(fields, doc))
        }
        (_, value) => value,
    }
}

/// Coerce a store value into its domain representation for `field_type`.
#[must_use]
pub fn to_domain(field_type: &FieldType, value: Value) -> Value {
    match (field_type, value) {
        (_, Value::Array(items)) => Value::Array(
            items
                .into_iter()
                .map(|item| to_domain(field_type, item))
                .collect(),
        ),
        (FieldType::ObjectId, Value::ObjectId(id)) => Value::String(id.into_string()),
        (FieldType::Timestamp, value) => coerce_timestamp(value),
        (FieldType::Binary, Value::Binary(binary)) => Value::Bytes(binary.bytes),
        (FieldType::Embedded { fields }, Value::Document(doc)) => {
            Value::Document(decode_fields(fields, doc))
        }
        (_, value) => value,
    }
}

/// Encode a domain document for storage: declared fields are renamed to
/// their stored column and coerced; the identifier becomes an opaque id.
#[must_use]
pub fn encode_document(meta: &EntityMetadata, document: Document) -> Document {
    document
        .into_iter()
        .map(|(name, value)| {
            if meta.is_id_field(&name) {
                let value = to_store(&FieldType::ObjectId, value);
                return (name, value);
            }
            match meta.field(&name) {
                Some(field) => (field.column().to_string(), to_store(&field.field_type, value)),
                None => (name, value),
            }
        })
        .collect()
}

/// Decode a stored document: columns are renamed back to field names and
/// declared fields coerced to their domain representation.
#[must_use]
pub fn decode_document(meta: &EntityMetadata, document: Document) -> Document {
    document
        .into_iter()
        .map(|(column, value)| {
            if meta.is_id_field(&column) {
                let value = to_domain(&FieldType::ObjectId, value);
                return (column, value);
            }
            match meta.fields.iter().find(|f| f.column() == column) {
                Some(field) => (field.name.clone(), to_domain(&field.field_type, value)),
                None => (column, value),
            }
        })
        .collect()
}

fn encode_fields(fields: &[FieldMetadata], doc: Document) -> Document {
    doc.into_iter()
        .map(|(name, value)| match fields.iter().find(|f| f.name == name) {
            Some(field) => (field.column().to_string(), to_store(&field.field_type, value)),
            None => (name, value),
        })
        .collect()
}

fn decode_fields(fields: &[FieldMetadata], doc: Document) -> Document {
    doc.into_iter()
        .map(|(column, value)| match fields.iter().find(|f| f.column() == column) {
            Some(field) => (field.name.clone(), to_domain(&field.field_type, value)),
            None => (column, value),
        })
        .collect()
}

/// Timestamps share one representation on both sides of the codec.
fn coerce_timestamp(value: Value) -> Value {
    match value {
        Value::String(s) => match parse_timestamp(&s) {
            Some(ts) => Value::DateTime(ts),
            None => Value::String(s),
        },
        Value::Int(millis) => match DateTime::from_timestamp_millis(millis) {
            Some(ts) => Value::DateTime(ts),
            None => Value::Int(millis),
        },
        other => other,
    }
}

/// Parse RFC 3339, naive date-time (taken as UTC) or a bare date.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    for format in NAIVE_TIMESTAMP_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
