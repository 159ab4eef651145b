//! Schema-driven conversion between records and stored documents.
//!
//! Records are first bridged through serde into a BSON tree, then every
//! declared field is rewritten by the encode or decode function of its
//! [`FieldKind`]. Enum variants are the main reason this pass exists: serde
//! writes a unit variant as its name, while the store holds the member's
//! underlying value.

use bson::{Bson, Document, de::deserialize_from_bson, ser::serialize_to_bson};
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    error::{DocumentStoreError, DocumentStoreResult},
    schema::{EnumSchema, FieldKind, PrimitiveKind, Schema},
};

/// Converts a record into the document written to the store.
///
/// # Errors
///
/// Returns [`DocumentStoreError::Serialization`] if the record does not
/// serialize to a document or an enum field holds a variant its
/// [`EnumSchema`] does not declare.
pub fn encode<R: Serialize + ?Sized>(schema: &Schema, record: &R) -> DocumentStoreResult<Document> {
    match serialize_to_bson(record)? {
        Bson::Document(document) => schema.encode_fields(document, "", Encoding::Record),
        other => Err(DocumentStoreError::Serialization(format!(
            "{} must serialize to a document, found {:?}",
            schema.name(),
            other.element_type()
        ))),
    }
}

/// Converts a stored document back into a record.
///
/// Missing fields take the declared default, or null for optional kinds.
/// Stored fields the schema does not declare are dropped.
///
/// # Errors
///
/// Returns [`DocumentStoreError::Decode`] for missing required fields, enum
/// values without a matching member, values of the wrong type, and serde
/// failures while building the record.
pub fn decode<R: DeserializeOwned>(schema: &Schema, document: Document) -> DocumentStoreResult<R> {
    let decoded = schema.decode_fields(document, "")?;

    deserialize_from_bson(Bson::Document(decoded))
        .map_err(|err| DocumentStoreError::Decode(format!("{}: {}", schema.name(), err)))
}

/// Encodes a single value of the given kind, as used for filter values.
///
/// Unlike record encoding, an enum value already in its stored form is
/// accepted as is.
pub fn encode_value(kind: &FieldKind, value: Bson) -> DocumentStoreResult<Bson> {
    kind.encode(value, "value", Encoding::Filter)
}

/// Decodes a single stored value of the given kind.
pub fn decode_value(kind: &FieldKind, value: Bson) -> DocumentStoreResult<Bson> {
    kind.decode(value, "value")
}

/// What is being encoded; filter values may already be in stored form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Encoding {
    Record,
    Filter,
}

fn join(path: &str, segment: &str) -> String {
    if path.is_empty() {
        segment.to_string()
    } else {
        format!("{path}.{segment}")
    }
}

impl Schema {
    pub(crate) fn encode_fields(
        &self,
        document: Document,
        path: &str,
        encoding: Encoding,
    ) -> DocumentStoreResult<Document> {
        document
            .into_iter()
            .map(|(key, value)| -> DocumentStoreResult<(String, Bson)> {
                let encoded = match self.field(&key) {
                    Some(field) => field.kind().encode(value, &join(path, &key), encoding)?,
                    None => value,
                };

                Ok((key, encoded))
            })
            .collect()
    }

    pub(crate) fn decode_fields(&self, mut document: Document, path: &str) -> DocumentStoreResult<Document> {
        let mut decoded = Document::new();

        for field in self.fields() {
            let field_path = join(path, field.name());
            let stored = match document.remove(field.name()) {
                Some(value) => value,
                None => match field.default() {
                    Some(default) => default.clone(),
                    None if field.kind().is_optional() => Bson::Null,
                    None => {
                        return Err(DocumentStoreError::Decode(format!(
                            "{}: missing required field {}",
                            self.name(),
                            field_path
                        )));
                    }
                },
            };

            decoded.insert(field.name(), field.kind().decode(stored, &field_path)?);
        }

        Ok(decoded)
    }
}

impl FieldKind {
    pub(crate) fn encode(&self, value: Bson, path: &str, encoding: Encoding) -> DocumentStoreResult<Bson> {
        match self {
            FieldKind::Primitive(_) => Ok(value),
            FieldKind::Enum(schema) => schema.encode(value, path, encoding),
            FieldKind::Record(schema) => match value {
                Bson::Document(document) => Ok(Bson::Document(schema.encode_fields(document, path, encoding)?)),
                other => Ok(other),
            },
            FieldKind::List(element) => match value {
                Bson::Array(items) => items
                    .into_iter()
                    .enumerate()
                    .map(|(index, item)| element.encode(item, &join(path, &index.to_string()), encoding))
                    .collect::<DocumentStoreResult<Vec<_>>>()
                    .map(Bson::Array),
                other => Ok(other),
            },
            FieldKind::Optional(inner) => match value {
                Bson::Null => Ok(Bson::Null),
                other => inner.encode(other, path, encoding),
            },
        }
    }

    pub(crate) fn decode(&self, value: Bson, path: &str) -> DocumentStoreResult<Bson> {
        match self {
            FieldKind::Primitive(kind) => kind.decode(value, path),
            FieldKind::Enum(schema) => schema.decode(value, path),
            FieldKind::Record(schema) => match value {
                Bson::Document(document) => Ok(Bson::Document(schema.decode_fields(document, path)?)),
                other => Err(mismatch(path, "a nested document", &other)),
            },
            FieldKind::List(element) => match value {
                Bson::Array(items) => items
                    .into_iter()
                    .enumerate()
                    .map(|(index, item)| element.decode(item, &join(path, &index.to_string())))
                    .collect::<DocumentStoreResult<Vec<_>>>()
                    .map(Bson::Array),
                other => Err(mismatch(path, "an array", &other)),
            },
            FieldKind::Optional(inner) => match value {
                Bson::Null => Ok(Bson::Null),
                other => inner.decode(other, path),
            },
        }
    }
}

impl PrimitiveKind {
    fn decode(self, value: Bson, path: &str) -> DocumentStoreResult<Bson> {
        match (self, value) {
            (PrimitiveKind::Any, value) => Ok(value),
            (PrimitiveKind::String, value @ Bson::String(_)) => Ok(value),
            (PrimitiveKind::Int, value @ (Bson::Int32(_) | Bson::Int64(_))) => Ok(value),
            (PrimitiveKind::Float, value @ Bson::Double(_)) => Ok(value),
            (PrimitiveKind::Float, Bson::Int32(value)) => Ok(Bson::Double(value as f64)),
            (PrimitiveKind::Float, Bson::Int64(value)) => Ok(Bson::Double(value as f64)),
            (PrimitiveKind::Bool, value @ Bson::Boolean(_)) => Ok(value),
            (PrimitiveKind::Timestamp, value @ Bson::DateTime(_)) => Ok(value),
            (kind, other) => Err(mismatch(path, &format!("{kind:?}"), &other)),
        }
    }
}

impl EnumSchema {
    fn encode(&self, value: Bson, path: &str, encoding: Encoding) -> DocumentStoreResult<Bson> {
        if let Bson::String(variant) = &value {
            if let Some(member) = self.by_variant(variant) {
                return Ok(member.value.clone());
            }
        }

        if encoding == Encoding::Filter && self.by_value(&value).is_some() {
            return Ok(value);
        }

        Err(DocumentStoreError::Serialization(format!(
            "{path}: {value} is not a member of enum {}",
            self.name()
        )))
    }

    fn decode(&self, value: Bson, path: &str) -> DocumentStoreResult<Bson> {
        self.by_value(&value)
            .map(|member| Bson::String(member.variant.clone()))
            .ok_or_else(|| {
                DocumentStoreError::Decode(format!(
                    "{path}: no member of enum {} is stored as {value}",
                    self.name()
                ))
            })
    }
}

fn mismatch(path: &str, expected: &str, found: &Bson) -> DocumentStoreError {
    DocumentStoreError::Decode(format!(
        "{path}: expected {expected}, found {:?}",
        found.element_type()
    ))
}
