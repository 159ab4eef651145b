//! Document client abstraction and the handle mappers reach it through.
//!
//! # Overview
//!
//! The [`DocumentClient`] trait is the only boundary of this crate: it is the
//! capability an external document database (or the in-memory client used in
//! tests) provides. Clients are configured through a [`ClientBuilder`] and
//! installed into a [`ClientHandle`], which every
//! [`Mapper`](crate::mapper::Mapper) reads on each operation.
//!
//! # Examples
//!
//! ```ignore
//! use docmap::{client::{ClientBuilder, ClientHandle}, memory::InMemoryClient};
//!
//! let handle = ClientHandle::new();
//! handle.initialize(InMemoryClient::builder().build().await?).await;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::{fmt::Debug, sync::Arc};

use async_trait::async_trait;
use bson::Document;
use futures::stream::BoxStream;
use mea::rwlock::RwLock;

use crate::{
    error::{DocumentStoreError, DocumentStoreResult},
    query::StructuredQuery,
};

/// Lazy stream of `(identifier, document)` pairs produced by a query.
pub type DocumentStream = BoxStream<'static, DocumentStoreResult<(String, Document)>>;

/// Abstract interface to a document database.
///
/// Identifiers are strings scoped to a collection. Implementations report
/// their own failures through [`DocumentStoreError`]; mappers return those
/// errors to the caller unchanged.
#[async_trait]
pub trait DocumentClient: Send + Sync + Debug {
    /// Inserts a new document and returns its identifier.
    ///
    /// When `id` is `None` the client generates one.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::DocumentAlreadyExists`] if a document with
    /// the given identifier is already stored.
    async fn create_document(
        &self,
        collection: &str,
        id: Option<&str>,
        document: Document,
    ) -> DocumentStoreResult<String>;

    /// Writes the whole document at `id`, creating it if it does not exist.
    async fn set_document(
        &self,
        collection: &str,
        id: &str,
        document: Document,
    ) -> DocumentStoreResult<()>;

    /// Fetches one document, or `None` if nothing is stored at `id`.
    async fn get_document(
        &self,
        collection: &str,
        id: &str,
    ) -> DocumentStoreResult<Option<Document>>;

    /// Deletes one document. Deleting a missing document succeeds.
    async fn delete_document(&self, collection: &str, id: &str) -> DocumentStoreResult<()>;

    /// Executes a structured query and streams the matching documents.
    ///
    /// Each call runs the query again; the returned stream is single-pass.
    async fn query_documents(
        &self,
        collection: &str,
        query: &StructuredQuery,
    ) -> DocumentStoreResult<DocumentStream>;
}

#[async_trait]
impl<C> DocumentClient for Arc<C>
where
    C: DocumentClient + ?Sized,
{
    async fn create_document(
        &self,
        collection: &str,
        id: Option<&str>,
        document: Document,
    ) -> DocumentStoreResult<String> {
        (**self)
            .create_document(collection, id, document)
            .await
    }

    async fn set_document(
        &self,
        collection: &str,
        id: &str,
        document: Document,
    ) -> DocumentStoreResult<()> {
        (**self)
            .set_document(collection, id, document)
            .await
    }

    async fn get_document(
        &self,
        collection: &str,
        id: &str,
    ) -> DocumentStoreResult<Option<Document>> {
        (**self).get_document(collection, id).await
    }

    async fn delete_document(&self, collection: &str, id: &str) -> DocumentStoreResult<()> {
        (**self).delete_document(collection, id).await
    }

    async fn query_documents(
        &self,
        collection: &str,
        query: &StructuredQuery,
    ) -> DocumentStoreResult<DocumentStream> {
        (**self)
            .query_documents(collection, query)
            .await
    }
}

/// Factory for configured clients.
#[async_trait]
pub trait ClientBuilder {
    type Client: DocumentClient;

    async fn build(self) -> DocumentStoreResult<Self::Client>;
}

/// Shared slot holding the document client used by mappers.
///
/// The embedding application owns the client; the handle only keeps it
/// reachable. Clones of a handle share the same slot, so initializing one
/// initializes all of them. Until [`initialize`](ClientHandle::initialize) is
/// called every mapper operation fails with
/// [`DocumentStoreError::NotInitialized`].
#[derive(Debug, Clone, Default)]
pub struct ClientHandle {
    client: Arc<RwLock<Option<Arc<dyn DocumentClient>>>>,
}

impl ClientHandle {
    /// Creates an empty, uninitialized handle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a handle already holding `client`.
    pub fn with_client(client: impl DocumentClient + 'static) -> Self {
        Self {
            client: Arc::new(RwLock::new(Some(Arc::new(client)))),
        }
    }

    /// Installs the client. Initialization is expected once, before any
    /// record operation; a second call replaces the previous client.
    pub async fn initialize(&self, client: impl DocumentClient + 'static) {
        let mut slot = self.client.write().await;

        if slot.is_some() {
            tracing::debug!("replacing the document client of an initialized handle");
        }

        *slot = Some(Arc::new(client));
    }

    /// Drops the handle's reference to the client, returning it to the
    /// uninitialized state.
    pub async fn discard(&self) {
        self.client.write().await.take();
    }

    pub async fn is_initialized(&self) -> bool {
        self.client.read().await.is_some()
    }

    /// Returns the installed client for the duration of one operation.
    pub(crate) async fn client(&self) -> DocumentStoreResult<Arc<dyn DocumentClient>> {
        let slot = self.client.read().await;

        (*slot)
            .clone()
            .ok_or(DocumentStoreError::NotInitialized)
    }
}
