//! Explicit record schemas.
//!
//! A [`Schema`] lists the fields of a record type together with the
//! [`FieldKind`] that decides how each field is encoded and decoded. Schemas
//! are declared once per record type through [`Schema::builder`], usually in a
//! `static` so [`Record::schema`](crate::record::Record::schema) can hand out a
//! `&'static Schema`.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::LazyLock;
//! use docmap::schema::{EnumSchema, FieldKind, Schema};
//!
//! static PERSON: LazyLock<Schema> = LazyLock::new(|| {
//!     Schema::builder("Person")
//!         .field("email_address", FieldKind::string())
//!         .field("age", FieldKind::int())
//!         .field_with_default(
//!             "membership",
//!             FieldKind::enumeration(
//!                 EnumSchema::new("MembershipLevel")
//!                     .member("None", 1)
//!                     .member("Intermediate", 2)
//!                     .member("Full", 3),
//!             ),
//!             1,
//!         )
//!         .build()
//!         .expect("person schema")
//! });
//! ```

use std::collections::HashSet;

use bson::Bson;

use crate::error::{DocumentStoreError, DocumentStoreResult};

/// Primitive value kinds and the stored BSON types they accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    /// UTF-8 string.
    String,
    /// 32 or 64 bit integer.
    Int,
    /// Double. Integers are accepted and widened on decode.
    Float,
    /// Boolean.
    Bool,
    /// BSON datetime (`bson::DateTime` on the Rust side).
    Timestamp,
    /// Any stored value, copied unchecked.
    Any,
}

/// One member of an [`EnumSchema`].
#[derive(Debug, Clone, PartialEq)]
pub struct EnumMember {
    /// The variant name as serde writes it (unit variants serialize to their name).
    pub variant: String,
    /// The underlying value written to the store.
    pub value: Bson,
}

/// Maps the variants of a Rust enum onto the values stored for them.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumSchema {
    name: String,
    members: Vec<EnumMember>,
}

impl EnumSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), members: Vec::new() }
    }

    /// Adds a member stored as `value`.
    pub fn member(mut self, variant: impl Into<String>, value: impl Into<Bson>) -> Self {
        self.members.push(EnumMember { variant: variant.into(), value: value.into() });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn members(&self) -> &[EnumMember] {
        &self.members
    }

    /// Finds the member written for a serialized variant.
    pub fn by_variant(&self, variant: &str) -> Option<&EnumMember> {
        self.members
            .iter()
            .find(|member| member.variant == variant)
    }

    /// Finds the member whose stored value matches `value`.
    pub fn by_value(&self, value: &Bson) -> Option<&EnumMember> {
        self.members
            .iter()
            .find(|member| values_match(&member.value, value))
    }

    fn validate(&self) -> DocumentStoreResult<()> {
        if self.members.is_empty() {
            return Err(DocumentStoreError::InvalidSchema(format!("enum {} has no members", self.name)));
        }

        for (index, member) in self.members.iter().enumerate() {
            if !matches!(member.value, Bson::String(_) | Bson::Int32(_) | Bson::Int64(_)) {
                return Err(DocumentStoreError::InvalidSchema(format!(
                    "enum {} member {} must be stored as a string or integer",
                    self.name, member.variant
                )));
            }

            for other in &self.members[..index] {
                if other.variant == member.variant {
                    return Err(DocumentStoreError::InvalidSchema(format!(
                        "enum {} declares member {} twice",
                        self.name, member.variant
                    )));
                }

                if values_match(&other.value, &member.value) {
                    return Err(DocumentStoreError::InvalidSchema(format!(
                        "enum {} members {} and {} share the value {}",
                        self.name, other.variant, member.variant, member.value
                    )));
                }
            }
        }

        Ok(())
    }
}

/// The closed set of value kinds a field can have.
///
/// Each kind carries its own encode and decode function (see [`crate::codec`]);
/// the schema, not the runtime value, decides which one runs.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Primitive(PrimitiveKind),
    Enum(EnumSchema),
    Record(Box<Schema>),
    List(Box<FieldKind>),
    /// The inner kind, or null.
    Optional(Box<FieldKind>),
}

impl FieldKind {
    pub fn string() -> Self {
        FieldKind::Primitive(PrimitiveKind::String)
    }

    pub fn int() -> Self {
        FieldKind::Primitive(PrimitiveKind::Int)
    }

    pub fn float() -> Self {
        FieldKind::Primitive(PrimitiveKind::Float)
    }

    pub fn boolean() -> Self {
        FieldKind::Primitive(PrimitiveKind::Bool)
    }

    pub fn timestamp() -> Self {
        FieldKind::Primitive(PrimitiveKind::Timestamp)
    }

    pub fn any() -> Self {
        FieldKind::Primitive(PrimitiveKind::Any)
    }

    pub fn enumeration(schema: EnumSchema) -> Self {
        FieldKind::Enum(schema)
    }

    pub fn record(schema: Schema) -> Self {
        FieldKind::Record(Box::new(schema))
    }

    pub fn list(element: FieldKind) -> Self {
        FieldKind::List(Box::new(element))
    }

    pub fn optional(inner: FieldKind) -> Self {
        FieldKind::Optional(Box::new(inner))
    }

    /// Returns `true` if null is a valid value for this kind.
    pub fn is_optional(&self) -> bool {
        matches!(self, FieldKind::Optional(_) | FieldKind::Primitive(PrimitiveKind::Any))
    }

    /// The element kind of a list, looking through an optional wrapper.
    pub fn element(&self) -> Option<&FieldKind> {
        match self {
            FieldKind::List(element) => Some(&**element),
            FieldKind::Optional(inner) => inner.element(),
            _ => None,
        }
    }

    /// The nested schema reached through this kind, looking through
    /// optional and list wrappers.
    fn nested(&self) -> Option<&Schema> {
        match self {
            FieldKind::Record(schema) => Some(&**schema),
            FieldKind::Optional(inner) | FieldKind::List(inner) => inner.nested(),
            _ => None,
        }
    }

    fn validate(&self) -> DocumentStoreResult<()> {
        match self {
            FieldKind::Enum(schema) => schema.validate(),
            FieldKind::List(inner) | FieldKind::Optional(inner) => inner.validate(),
            // Nested schemas were validated by their own builder.
            FieldKind::Record(_) | FieldKind::Primitive(_) => Ok(()),
        }
    }
}

/// A declared field: name, kind and optional default.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    name: String,
    kind: FieldKind,
    default: Option<Bson>,
}

impl FieldSpec {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    /// The stored value used when a document lacks this field.
    pub fn default(&self) -> Option<&Bson> {
        self.default.as_ref()
    }
}

/// The declared fields of a record type.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    name: String,
    fields: Vec<FieldSpec>,
}

impl Schema {
    /// Starts declaring a schema for the record type called `name`.
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder::new(name)
    }

    /// The record type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The collection documents of this type live in: the lower-cased type name.
    pub fn collection_name(&self) -> String {
        self.name.to_lowercase()
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Looks up a top-level field.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields
            .iter()
            .find(|field| field.name == name)
    }

    /// Resolves a dotted field path (`"address.city"`) to the kind of its last segment.
    ///
    /// Intermediate segments must name nested record fields; optional and list
    /// wrappers around them are looked through.
    pub fn resolve(&self, path: &str) -> Option<&FieldKind> {
        let mut schema = self;
        let mut segments = path.split('.').peekable();

        while let Some(segment) = segments.next() {
            let kind = schema.field(segment)?.kind();

            if segments.peek().is_none() {
                return Some(kind);
            }

            schema = kind.nested()?;
        }

        None
    }
}

/// Builder for [`Schema`].
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        SchemaBuilder {
            schema: Schema { name: name.into(), fields: Vec::new() },
        }
    }

    /// Declares a field without a default; documents missing it fail to decode
    /// unless the kind is optional.
    pub fn field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.schema.fields.push(FieldSpec { name: name.into(), kind, default: None });
        self
    }

    /// Declares a field with a default, expressed as the stored value
    /// (for enums, the member's underlying value).
    pub fn field_with_default(
        mut self,
        name: impl Into<String>,
        kind: FieldKind,
        default: impl Into<Bson>,
    ) -> Self {
        self.schema.fields.push(FieldSpec {
            name: name.into(),
            kind,
            default: Some(default.into()),
        });
        self
    }

    /// Validates and returns the schema.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::InvalidSchema`] for empty or duplicate field
    /// names and for malformed enum schemas.
    pub fn build(self) -> DocumentStoreResult<Schema> {
        let schema = self.schema;

        if schema.name.is_empty() {
            return Err(DocumentStoreError::InvalidSchema("schema name is empty".into()));
        }

        let mut seen = HashSet::new();

        for field in &schema.fields {
            if field.name.is_empty() || field.name.contains('.') {
                return Err(DocumentStoreError::InvalidSchema(format!(
                    "{} declares an invalid field name {:?}",
                    schema.name, field.name
                )));
            }

            if !seen.insert(field.name.as_str()) {
                return Err(DocumentStoreError::InvalidSchema(format!(
                    "{} declares field {} twice",
                    schema.name, field.name
                )));
            }

            field.kind.validate()?;
        }

        Ok(schema)
    }
}

/// Compares stored scalars, treating integer widths and doubles as numbers.
///
/// Integers compare exactly; only a comparison involving a double goes
/// through `f64`.
pub(crate) fn values_match(left: &Bson, right: &Bson) -> bool {
    if let (Some(a), Some(b)) = (as_integer(left), as_integer(right)) {
        return a == b;
    }

    match (as_number(left), as_number(right)) {
        (Some(a), Some(b)) => a == b,
        _ => left == right,
    }
}

fn as_integer(value: &Bson) -> Option<i64> {
    match value {
        Bson::Int32(v) => Some(i64::from(*v)),
        Bson::Int64(v) => Some(*v),
        _ => None,
    }
}

fn as_number(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(v) => Some(f64::from(*v)),
        Bson::Int64(v) => Some(*v as f64),
        Bson::Double(v) => Some(*v),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn membership() -> EnumSchema {
        EnumSchema::new("MembershipLevel")
            .member("None", 1)
            .member("Intermediate", 2)
            .member("Full", 3)
    }

    fn address() -> Schema {
        Schema::builder("Address")
            .field("city", FieldKind::string())
            .field("zip", FieldKind::optional(FieldKind::string()))
            .build()
            .unwrap()
    }

    #[test]
    fn builds_schema_with_every_kind() {
        let schema = Schema::builder("User")
            .field("email_address", FieldKind::string())
            .field("family_members_count", FieldKind::int())
            .field("last_login_date", FieldKind::timestamp())
            .field_with_default("membership", FieldKind::enumeration(membership()), 3)
            .field("is_active", FieldKind::boolean())
            .field("addresses", FieldKind::list(FieldKind::record(address())))
            .build()
            .unwrap();

        assert_eq!(schema.name(), "User");
        assert_eq!(schema.collection_name(), "user");
        assert_eq!(schema.fields().len(), 6);
        assert_eq!(schema.field("membership").unwrap().default(), Some(&Bson::Int32(3)));
        assert!(schema.field("missing").is_none());
    }

    #[test]
    fn rejects_duplicate_fields() {
        let err = Schema::builder("User")
            .field("age", FieldKind::int())
            .field("age", FieldKind::float())
            .build()
            .unwrap_err();

        assert!(matches!(err, DocumentStoreError::InvalidSchema(_)));
    }

    #[test]
    fn rejects_dotted_field_names() {
        let err = Schema::builder("User")
            .field("a.b", FieldKind::int())
            .build()
            .unwrap_err();

        assert!(matches!(err, DocumentStoreError::InvalidSchema(_)));
    }

    #[test]
    fn rejects_enum_with_shared_values() {
        let broken = EnumSchema::new("Level")
            .member("Low", 1)
            .member("High", 1i64);
        let err = Schema::builder("User")
            .field("level", FieldKind::optional(FieldKind::enumeration(broken)))
            .build()
            .unwrap_err();

        assert!(matches!(err, DocumentStoreError::InvalidSchema(_)));
    }

    #[test]
    fn rejects_enum_with_non_scalar_values() {
        let broken = EnumSchema::new("Level").member("Low", 1.5);
        let err = Schema::builder("User")
            .field("level", FieldKind::enumeration(broken))
            .build()
            .unwrap_err();

        assert!(matches!(err, DocumentStoreError::InvalidSchema(_)));
    }

    #[test]
    fn resolves_nested_paths() {
        let schema = Schema::builder("User")
            .field("home", FieldKind::optional(FieldKind::record(address())))
            .field("previous", FieldKind::list(FieldKind::record(address())))
            .build()
            .unwrap();

        assert_eq!(schema.resolve("home.city"), Some(&FieldKind::string()));
        assert_eq!(
            schema.resolve("previous.zip"),
            Some(&FieldKind::optional(FieldKind::string()))
        );
        assert!(schema.resolve("home.street").is_none());
        assert!(schema.resolve("home.city.name").is_none());
    }

    #[test]
    fn enum_lookup_matches_across_integer_widths() {
        let levels = membership();

        assert_eq!(levels.by_value(&Bson::Int64(2)).unwrap().variant, "Intermediate");
        assert_eq!(levels.by_variant("Full").unwrap().value, Bson::Int32(3));
        assert!(levels.by_value(&Bson::Int32(9)).is_none());
        assert!(levels.by_value(&Bson::String("2".into())).is_none());
    }

    #[test]
    fn list_element_looks_through_optional() {
        let kind = FieldKind::optional(FieldKind::list(FieldKind::int()));

        assert_eq!(kind.element(), Some(&FieldKind::int()));
        assert!(FieldKind::int().element().is_none());
    }

    #[test]
    fn large_integer_members_stay_distinct() {
        let low = 1i64 << 53;
        let sizes = EnumSchema::new("Size")
            .member("Low", low)
            .member("High", low + 1);

        let schema = Schema::builder("Holder")
            .field("size", FieldKind::enumeration(sizes.clone()))
            .build();

        assert!(schema.is_ok());
        assert_eq!(sizes.by_value(&Bson::Int64(low + 1)).unwrap().variant, "High");
        assert_eq!(sizes.by_value(&Bson::Int64(low)).unwrap().variant, "Low");
    }

    #[test]
    fn integer_members_match_across_widths() {
        let levels = membership();

        assert_eq!(levels.by_value(&Bson::Int64(2)).unwrap().variant, "Intermediate");
        assert_eq!(levels.by_value(&Bson::Double(3.0)).unwrap().variant, "Full");
        assert!(levels.by_value(&Bson::Double(2.5)).is_none());
    }
}
