//! Record mappers and typed query expressions.
//!
//! A [`Mapper`] binds one [`Record`] type to its collection and forwards
//! create/update/delete/get operations to the client installed in a
//! [`ClientHandle`]. [`Query`] accumulates filter clauses without executing
//! them; [`Query::stream`] runs the query and decodes results lazily.
//!
//! # Example
//!
//! ```ignore
//! use docmap::prelude::*;
//! use futures::TryStreamExt;
//!
//! let people = Mapper::<Person>::new(&handle);
//!
//! let mut person = Person::new("test@test.com", 30, MembershipLevel::Intermediate);
//! people.create(&mut person).await?;
//!
//! person.age = 31;
//! people.update(&person).await?;
//!
//! let adults: Vec<Person> = people
//!     .filter("age", FilterOp::Gte, 18)?
//!     .filter("membership", FilterOp::Eq, MembershipLevel::Full)?
//!     .stream()
//!     .await?
//!     .try_collect()
//!     .await?;
//! ```
//!
//! # Record lifecycle
//!
//! A record without an identifier is unsaved. [`Mapper::create`] stores it
//! and writes the identifier back, after which [`Mapper::update`] and
//! [`Mapper::delete`] address the stored document. Deleting leaves the
//! in-memory record untouched; it then refers to a document that no longer
//! exists. None of this is tracked at runtime.

use std::{fmt, marker::PhantomData};

use bson::{Bson, ser::serialize_to_bson};
use futures::{StreamExt, stream::BoxStream};
use serde::Serialize;

use crate::{
    client::ClientHandle,
    codec,
    error::{DocumentStoreError, DocumentStoreResult},
    query::{Clause, Direction, FilterOp, Order, StructuredQuery},
    record::Record,
    schema::Schema,
};

/// Lazy stream of decoded records.
pub type RecordStream<R> = BoxStream<'static, DocumentStoreResult<R>>;

/// Maps one record type onto its collection.
pub struct Mapper<R: Record> {
    handle: ClientHandle,
    collection: String,
    _marker: PhantomData<fn() -> R>,
}

impl<R: Record> Mapper<R> {
    /// Creates a mapper reading its client from `handle` on every operation.
    pub fn new(handle: &ClientHandle) -> Self {
        Self {
            handle: handle.clone(),
            collection: R::collection_name(),
            _marker: PhantomData,
        }
    }

    /// Returns the name of the collection this mapper writes to.
    pub fn collection_name(&self) -> &str {
        &self.collection
    }

    /// Stores a new document for `record` and writes the identifier back onto it.
    ///
    /// If the record already carries an identifier the document is created
    /// under it; otherwise the client generates one.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::NotInitialized`] if the handle has no
    /// client, and the client's own error (for example
    /// [`DocumentStoreError::DocumentAlreadyExists`]) if the insert fails.
    pub async fn create(&self, record: &mut R) -> DocumentStoreResult<String> {
        let client = self.handle.client().await?;
        let document = codec::encode(R::schema(), record)?;
        let id = client
            .create_document(&self.collection, record.id(), document)
            .await?;

        tracing::debug!(collection = %self.collection, id = %id, "created document");

        record.set_id(id.clone());

        Ok(id)
    }

    /// Overwrites the stored document with the current state of `record`.
    ///
    /// The whole document is rewritten; fields are never merged.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::NotInitialized`] if the handle has no
    /// client and [`DocumentStoreError::MissingIdentifier`] if the record was
    /// never created.
    pub async fn update(&self, record: &R) -> DocumentStoreResult<()> {
        let client = self.handle.client().await?;
        let id = self.require_id(record)?;
        let document = codec::encode(R::schema(), record)?;

        client
            .set_document(&self.collection, id, document)
            .await?;

        tracing::debug!(collection = %self.collection, id = %id, "updated document");

        Ok(())
    }

    /// Deletes the stored document of `record`.
    ///
    /// The record keeps its identifier. Deleting an already deleted document
    /// succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::NotInitialized`] if the handle has no
    /// client and [`DocumentStoreError::MissingIdentifier`] if the record was
    /// never created.
    pub async fn delete(&self, record: &R) -> DocumentStoreResult<()> {
        let client = self.handle.client().await?;
        let id = self.require_id(record)?;

        client
            .delete_document(&self.collection, id)
            .await?;

        tracing::debug!(collection = %self.collection, id = %id, "deleted document");

        Ok(())
    }

    /// Deletes the document stored under `id`, whether or not it exists.
    pub async fn delete_document(&self, id: &str) -> DocumentStoreResult<()> {
        let client = self.handle.client().await?;

        client
            .delete_document(&self.collection, id)
            .await?;

        tracing::debug!(collection = %self.collection, id = %id, "deleted document");

        Ok(())
    }

    /// Fetches and decodes the document stored under `id`.
    ///
    /// Returns `Ok(None)` if no such document exists.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Decode`] if the stored document does not
    /// match the record schema.
    pub async fn get_document(&self, id: &str) -> DocumentStoreResult<Option<R>> {
        let client = self.handle.client().await?;

        match client.get_document(&self.collection, id).await? {
            Some(document) => {
                let mut record: R = codec::decode(R::schema(), document)?;
                record.set_id(id.to_string());

                Ok(Some(record))
            }
            None => {
                tracing::debug!(collection = %self.collection, id = %id, "document not found");

                Ok(None)
            }
        }
    }

    /// An empty query over this mapper's collection.
    pub fn query(&self) -> Query<R> {
        Query {
            handle: self.handle.clone(),
            collection: self.collection.clone(),
            query: StructuredQuery::new(),
            _marker: PhantomData,
        }
    }

    /// A query with a single clause. See [`Query::filter`].
    pub fn filter(
        &self,
        field: impl Into<String>,
        op: FilterOp,
        value: impl Serialize,
    ) -> DocumentStoreResult<Query<R>> {
        self.query().filter(field, op, value)
    }

    /// Streams every record in the collection.
    pub async fn stream(&self) -> DocumentStoreResult<RecordStream<R>> {
        self.query().stream().await
    }

    fn require_id<'r>(&self, record: &'r R) -> DocumentStoreResult<&'r str> {
        record
            .id()
            .ok_or_else(|| DocumentStoreError::MissingIdentifier(self.collection.clone()))
    }
}

impl<R: Record> Clone for Mapper<R> {
    fn clone(&self) -> Self {
        Self {
            handle: self.handle.clone(),
            collection: self.collection.clone(),
            _marker: PhantomData,
        }
    }
}

impl<R: Record> fmt::Debug for Mapper<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mapper")
            .field("collection", &self.collection)
            .finish()
    }
}

/// An immutable, chainable query over one record type.
///
/// Every builder method returns a new query, so a partially built query can
/// serve as a template for several others.
pub struct Query<R: Record> {
    handle: ClientHandle,
    collection: String,
    query: StructuredQuery,
    _marker: PhantomData<fn() -> R>,
}

impl<R: Record> Query<R> {
    /// Returns a new query with `field op value` appended to the clauses.
    ///
    /// The value is serialized and then encoded with the kind the schema
    /// declares for `field` (dotted paths reach into nested records), so enum
    /// variants are compared against their stored values. For
    /// [`FilterOp::In`] each array element is encoded; for
    /// [`FilterOp::ArrayContains`] the list's element kind is used. Fields
    /// the schema does not declare are passed through untouched. Whether the
    /// operator suits the value is left to the store.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Serialization`] if the value cannot be
    /// represented as a document value.
    pub fn filter(
        &self,
        field: impl Into<String>,
        op: FilterOp,
        value: impl Serialize,
    ) -> DocumentStoreResult<Self> {
        let field = field.into();
        let value = encode_filter_value(R::schema(), &field, op, serialize_to_bson(&value)?)?;

        let mut next = self.clone();
        next.query
            .clauses
            .push(Clause { field, op, value });

        Ok(next)
    }

    /// Returns a new query ordered by `field`. Orderings apply in the order added.
    pub fn order_by(&self, field: impl Into<String>, direction: Direction) -> Self {
        let mut next = self.clone();
        next.query
            .order
            .push(Order { field: field.into(), direction });
        next
    }

    /// Returns a new query yielding at most `count` records.
    pub fn limit(&self, count: usize) -> Self {
        let mut next = self.clone();
        next.query.limit = Some(count);
        next
    }

    pub fn collection_name(&self) -> &str {
        &self.collection
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.query.clauses
    }

    /// The untyped form handed to the client.
    pub fn as_structured(&self) -> &StructuredQuery {
        &self.query
    }

    /// Executes the query and returns a lazy stream of decoded records.
    ///
    /// Each call runs the query again. Records are decoded as the stream is
    /// polled; a document that fails to decode yields an error item.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::NotInitialized`] if the handle has no
    /// client, and the client's error if the query is rejected.
    pub async fn stream(&self) -> DocumentStoreResult<RecordStream<R>> {
        let client = self.handle.client().await?;

        tracing::debug!(
            collection = %self.collection,
            clauses = self.query.clauses.len(),
            limit = ?self.query.limit,
            "executing query"
        );

        let documents = client
            .query_documents(&self.collection, &self.query)
            .await?;

        Ok(documents
            .map(|item| -> DocumentStoreResult<R> {
                let (id, document) = item?;
                let mut record: R = codec::decode(R::schema(), document)?;
                record.set_id(id);

                Ok(record)
            })
            .boxed())
    }
}

impl<R: Record> Clone for Query<R> {
    fn clone(&self) -> Self {
        Self {
            handle: self.handle.clone(),
            collection: self.collection.clone(),
            query: self.query.clone(),
            _marker: PhantomData,
        }
    }
}

impl<R: Record> fmt::Debug for Query<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("collection", &self.collection)
            .field("query", &self.query)
            .finish()
    }
}

fn encode_filter_value(
    schema: &Schema,
    field: &str,
    op: FilterOp,
    value: Bson,
) -> DocumentStoreResult<Bson> {
    let Some(kind) = schema.resolve(field) else {
        return Ok(value);
    };

    match (op, value) {
        (FilterOp::In, Bson::Array(items)) => items
            .into_iter()
            .map(|item| codec::encode_value(kind, item))
            .collect::<DocumentStoreResult<Vec<_>>>()
            .map(Bson::Array),
        (FilterOp::ArrayContains, value) => match kind.element() {
            Some(element) => codec::encode_value(element, value),
            None => Ok(value),
        },
        (_, value) => codec::encode_value(kind, value),
    }
}
