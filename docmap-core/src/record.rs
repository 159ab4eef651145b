//! The trait record types implement to be mapped onto a collection.

use serde::{Serialize, de::DeserializeOwned};

use crate::schema::Schema;

/// A record type persisted as one document per instance.
///
/// The identifier is kept outside the document body: mark the field
/// `#[serde(skip)]` and expose it through [`id`](Record::id) and
/// [`set_id`](Record::set_id). It is `None` until the record is created in,
/// or read from, the store.
///
/// # Example
///
/// ```ignore
/// use std::sync::LazyLock;
/// use docmap::prelude::*;
/// use serde::{Deserialize, Serialize};
///
/// static PERSON: LazyLock<Schema> = LazyLock::new(|| {
///     Schema::builder("Person")
///         .field("email_address", FieldKind::string())
///         .field("age", FieldKind::int())
///         .build()
///         .expect("person schema")
/// });
///
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// pub struct Person {
///     #[serde(skip)]
///     id: Option<String>,
///     pub email_address: String,
///     pub age: i32,
/// }
///
/// impl Record for Person {
///     fn schema() -> &'static Schema { &PERSON }
///     fn id(&self) -> Option<&str> { self.id.as_deref() }
///     fn set_id(&mut self, id: String) { self.id = Some(id) }
/// }
/// ```
pub trait Record: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// The declared fields of this record type.
    fn schema() -> &'static Schema;

    /// The store identifier, if the record has one.
    fn id(&self) -> Option<&str>;

    /// Records the identifier assigned by the store.
    fn set_id(&mut self, id: String);

    /// The collection documents of this type are stored in.
    ///
    /// Defaults to the lower-cased schema name.
    fn collection_name() -> String {
        Self::schema().collection_name()
    }
}
