//! In-memory document client.
//!
//! Documents are kept as BSON documents in ordered maps guarded by an
//! async-aware read-write lock, so an unordered query returns documents in
//! identifier order.

use std::{collections::{BTreeMap, HashMap}, sync::Arc};

use async_trait::async_trait;
use bson::Document;
use futures::{stream, StreamExt};
use mea::rwlock::RwLock;
use uuid::Uuid;

use docmap_core::{
    client::{ClientBuilder, DocumentClient, DocumentStream},
    error::{DocumentStoreError, DocumentStoreResult},
    query::StructuredQuery,
};

use crate::evaluator::{compare_by, DocumentEvaluator};

type CollectionMap = BTreeMap<String, Document>;
type StoreMap = HashMap<String, CollectionMap>;

/// Thread-safe document client that keeps everything in memory.
///
/// `InMemoryClient` is cloneable; clones share the same underlying data, so a
/// test can keep one clone to inspect or corrupt stored documents while a
/// [`ClientHandle`](docmap_core::client::ClientHandle) holds another.
///
/// Queries scan the whole collection.
///
/// # Example
///
/// ```ignore
/// use docmap_memory::InMemoryClient;
/// use docmap_core::client::DocumentClient;
/// use bson::doc;
///
/// let client = InMemoryClient::new();
/// let id = client.create_document("users", None, doc! { "name": "Alice" }).await?;
///
/// assert!(client.get_document("users", &id).await?.is_some());
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryClient {
    /// collection name -> (document id -> document)
    store: Arc<RwLock<StoreMap>>,
}

impl InMemoryClient {
    /// Creates a new client with no collections.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> InMemoryClientBuilder {
        InMemoryClientBuilder::default()
    }

    /// Number of documents stored in `collection`.
    pub async fn len(&self, collection: &str) -> usize {
        self.store
            .read()
            .await
            .get(collection)
            .map_or(0, BTreeMap::len)
    }

    /// Removes every document of every collection.
    pub async fn clear(&self) {
        self.store.write().await.clear();
    }
}

fn generate_id() -> String {
    Uuid::new_v4().simple().to_string()
}

#[async_trait]
impl DocumentClient for InMemoryClient {
    async fn create_document(
        &self,
        collection: &str,
        id: Option<&str>,
        document: Document,
    ) -> DocumentStoreResult<String> {
        let mut store = self.store.write().await;
        let collection_map = store
            .entry(collection.to_string())
            .or_default();

        let key = match id {
            Some(id) => id.to_string(),
            None => loop {
                let candidate = generate_id();

                if !collection_map.contains_key(&candidate) {
                    break candidate;
                }
            },
        };

        if collection_map.contains_key(&key) {
            return Err(DocumentStoreError::DocumentAlreadyExists(key, collection.to_string()));
        }

        tracing::trace!(collection, id = %key, "inserting document");
        collection_map.insert(key.clone(), document);

        Ok(key)
    }

    async fn set_document(
        &self,
        collection: &str,
        id: &str,
        document: Document,
    ) -> DocumentStoreResult<()> {
        tracing::trace!(collection, id, "writing document");

        self.store
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), document);

        Ok(())
    }

    async fn get_document(
        &self,
        collection: &str,
        id: &str,
    ) -> DocumentStoreResult<Option<Document>> {
        Ok(
            self.store
                .read()
                .await
                .get(collection)
                .and_then(|collection_map| collection_map.get(id))
                .cloned()
        )
    }

    async fn delete_document(&self, collection: &str, id: &str) -> DocumentStoreResult<()> {
        let mut store = self.store.write().await;

        if let Some(collection_map) = store.get_mut(collection) {
            if collection_map.remove(id).is_none() {
                tracing::trace!(collection, id, "deleting a document that does not exist");
            }
        }

        Ok(())
    }

    async fn query_documents(
        &self,
        collection: &str,
        query: &StructuredQuery,
    ) -> DocumentStoreResult<DocumentStream> {
        let store = self.store.read().await;
        let Some(collection_map) = store.get(collection) else {
            return Ok(stream::empty().boxed());
        };

        let mut matched = Vec::new();

        for (id, document) in collection_map {
            if DocumentEvaluator::matches(document, query)? {
                matched.push((id.clone(), document.clone()));
            }
        }

        if !query.order.is_empty() {
            matched.sort_by(|(_, a), (_, b)| compare_by(&query.order, a, b));
        }

        if let Some(limit) = query.limit {
            matched.truncate(limit);
        }

        tracing::trace!(collection, matched = matched.len(), "query evaluated");

        Ok(
            stream::iter(matched.into_iter().map(Ok))
                .boxed()
        )
    }
}

/// Builder for [`InMemoryClient`] instances.
///
/// Documents added with [`with_document`](InMemoryClientBuilder::with_document)
/// are stored before the client is returned.
#[derive(Default, Debug)]
pub struct InMemoryClientBuilder {
    seed: Vec<(String, String, Document)>,
}

impl InMemoryClientBuilder {
    /// Pre-populates `collection` with `document` stored at `id`.
    pub fn with_document(
        mut self,
        collection: impl Into<String>,
        id: impl Into<String>,
        document: Document,
    ) -> Self {
        self.seed.push((collection.into(), id.into(), document));
        self
    }
}

#[async_trait]
impl ClientBuilder for InMemoryClientBuilder {
    type Client = InMemoryClient;

    async fn build(self) -> DocumentStoreResult<Self::Client> {
        let client = InMemoryClient::new();

        for (collection, id, document) in self.seed {
            client
                .create_document(&collection, Some(&id), document)
                .await?;
        }

        Ok(client)
    }
}
