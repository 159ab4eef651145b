//! Error types and result types for record mapping operations.
//!
//! A single error enum covers both the errors this layer raises itself
//! (uninitialized handle, unsaved records, decode failures) and the errors
//! produced by [`DocumentClient`](crate::client::DocumentClient) implementations.
//! Mapper operations hand client errors back exactly as the client produced them.

use bson::error::Error as BsonError;
use thiserror::Error;

/// Represents all possible errors that can occur when mapping records to a document store.
#[derive(Error, Debug)]
pub enum DocumentStoreError {
    /// The [`ClientHandle`](crate::client::ClientHandle) has no client yet.
    #[error("Document client not initialized; call ClientHandle::initialize() first")]
    NotInitialized,
    /// An update or delete was requested for a record that was never saved.
    /// The argument is the collection name.
    #[error("Record in collection {0} has no identifier; create it first")]
    MissingIdentifier(String),
    /// A stored document cannot be mapped back onto the declared schema.
    #[error("Decode error: {0}")]
    Decode(String),
    /// A schema definition is malformed (duplicate fields, bad enum members).
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),
    /// A record or filter value could not be converted into a document value.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Error during client initialization or connection setup.
    #[error("Initialization error: {0}")]
    Initialization(String),
    /// A document with the given ID already exists in the collection.
    /// The first argument is the document ID, the second is the collection name.
    #[error("Document {0} already exists in collection {1}")]
    DocumentAlreadyExists(String, String),
    /// The requested document was not found in the collection.
    /// The first argument is the document ID, the second is the collection name.
    #[error("Document not found {0} in collection {1}")]
    DocumentNotFound(String, String),
    /// The store rejected a filter clause.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
    /// An error occurred in the underlying document store.
    #[error("Backend error: {0}")]
    Backend(String),
}

/// A specialized `Result` type for record mapping operations.
pub type DocumentStoreResult<T> = Result<T, DocumentStoreError>;

impl From<BsonError> for DocumentStoreError {
    fn from(err: BsonError) -> Self {
        DocumentStoreError::Serialization(err.to_string())
    }
}
