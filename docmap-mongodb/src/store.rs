//! MongoDB document client.

use async_trait::async_trait;
use futures::{stream, StreamExt, TryStreamExt};
use bson::{Bson, Document, doc};
use mongodb::{
    Client, Collection as MongoCollection,
    error::{Error as MongoError, ErrorKind, WriteFailure},
    options::ClientOptions,
};
use uuid::Uuid;

use docmap_core::{
    client::{ClientBuilder, DocumentClient, DocumentStream},
    error::{DocumentStoreError, DocumentStoreResult},
    query::{ClauseVisitor, StructuredQuery},
};

use crate::{sanitizer::KeySanitizer, query::MongoQueryTranslator};

const DUPLICATE_KEY: i32 = 11000;

fn backend_error(error: MongoError) -> DocumentStoreError {
    DocumentStoreError::Backend(error.to_string())
}

fn is_duplicate_key(error: &MongoError) -> bool {
    matches!(
        &*error.kind,
        ErrorKind::Write(WriteFailure::WriteError(write_error)) if write_error.code == DUPLICATE_KEY
    )
}

/// Document client backed by a MongoDB database.
///
/// Each docmap collection maps to the MongoDB collection of the same name;
/// identifiers are stored as string `_id` values.
#[derive(Debug)]
pub struct MongoDbClient {
    client: Client,
    database: String,
}

impl MongoDbClient {
    pub fn new(client: Client, database: String) -> Self {
        Self { client, database }
    }

    pub fn builder(dsn: &str, database: &str) -> MongoDbClientBuilder {
        MongoDbClientBuilder::new(dsn, database)
    }

    fn get_collection(&self, collection_name: &str) -> MongoCollection<Document> {
        self.client
            .database(&self.database)
            .collection(&KeySanitizer::sanitize_key(collection_name))
    }

    fn prepare_document(id: &str, document: Document) -> Document {
        let mut prepared = KeySanitizer::sanitize_document(document);
        prepared.insert("_id", id);
        prepared
    }

    fn restore_document(mut document: Document) -> DocumentStoreResult<(String, Document)> {
        let id = match document.remove("_id") {
            Some(Bson::String(id)) => id,
            Some(other) => other.to_string(),
            None => return Err(DocumentStoreError::Backend("stored document has no _id".into())),
        };

        Ok((id, KeySanitizer::restore_document(document)))
    }

    /// Closes the underlying connection pool.
    pub async fn shutdown(self) -> DocumentStoreResult<()> {
        self.client.shutdown().await;

        Ok(())
    }
}

#[async_trait]
impl DocumentClient for MongoDbClient {
    async fn create_document(
        &self,
        collection: &str,
        id: Option<&str>,
        document: Document,
    ) -> DocumentStoreResult<String> {
        let id = id
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().simple().to_string());

        self.get_collection(collection)
            .insert_one(Self::prepare_document(&id, document))
            .await
            .map_err(|e| if is_duplicate_key(&e) {
                DocumentStoreError::DocumentAlreadyExists(id.clone(), collection.to_string())
            } else {
                backend_error(e)
            })?;

        tracing::trace!(collection, id = %id, "inserted document");

        Ok(id)
    }

    async fn set_document(
        &self,
        collection: &str,
        id: &str,
        document: Document,
    ) -> DocumentStoreResult<()> {
        self.get_collection(collection)
            .replace_one(doc! { "_id": id }, Self::prepare_document(id, document))
            .upsert(true)
            .await
            .map_err(backend_error)?;

        Ok(())
    }

    async fn get_document(
        &self,
        collection: &str,
        id: &str,
    ) -> DocumentStoreResult<Option<Document>> {
        self.get_collection(collection)
            .find_one(doc! { "_id": id })
            .await
            .map_err(backend_error)?
            .map(|document| Self::restore_document(document).map(|(_, document)| document))
            .transpose()
    }

    async fn delete_document(&self, collection: &str, id: &str) -> DocumentStoreResult<()> {
        let result = self.get_collection(collection)
            .delete_one(doc! { "_id": id })
            .await
            .map_err(backend_error)?;

        if result.deleted_count == 0 {
            tracing::trace!(collection, id, "deleting a document that does not exist");
        }

        Ok(())
    }

    async fn query_documents(
        &self,
        collection: &str,
        query: &StructuredQuery,
    ) -> DocumentStoreResult<DocumentStream> {
        let Some(options) = MongoQueryTranslator::find_options(query) else {
            return Ok(stream::empty().boxed());
        };

        let filter = MongoQueryTranslator.visit_query(query)?;
        tracing::trace!(collection, %filter, "running query");

        let cursor = self.get_collection(collection)
            .find(filter)
            .with_options(options)
            .await
            .map_err(backend_error)?;

        Ok(
            cursor
                .map_err(backend_error)
                .and_then(|document| async move { Self::restore_document(document) })
                .boxed()
        )
    }
}

/// Builder for [`MongoDbClient`] instances from a connection string.
pub struct MongoDbClientBuilder {
    dsn: String,
    database: String,
}

impl MongoDbClientBuilder {
    pub fn new(dsn: &str, database: &str) -> Self {
        Self {
            dsn: dsn.to_string(),
            database: database.to_string(),
        }
    }
}

#[async_trait]
impl ClientBuilder for MongoDbClientBuilder {
    type Client = MongoDbClient;

    async fn build(self) -> DocumentStoreResult<Self::Client> {
        Ok(MongoDbClient::new(
            Client::with_options(
                ClientOptions::parse(&self.dsn)
                    .await
                    .map_err(|e| DocumentStoreError::Initialization(e.to_string()))?,
            )
            .map_err(|e| DocumentStoreError::Initialization(e.to_string()))?,
            self.database,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_live_in_the_id_key() {
        let prepared = MongoDbClient::prepare_document("abc", doc! { "a.b": 1 });
        assert_eq!(prepared, doc! { "a__dot__b": 1, "_id": "abc" });

        let (id, restored) = MongoDbClient::restore_document(prepared).unwrap();
        assert_eq!(id, "abc");
        assert_eq!(restored, doc! { "a.b": 1 });
    }

    #[test]
    fn documents_without_id_are_rejected() {
        let result = MongoDbClient::restore_document(doc! { "a": 1 });

        assert!(matches!(result, Err(DocumentStoreError::Backend(_))));
    }
}
