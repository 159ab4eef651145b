//! Main docmap crate providing typed record mapping over document stores.
//!
//! This crate is the primary entry point for users of docmap. It re-exports
//! the core types from `docmap-core` and gives access to the shipped document
//! clients.
//!
//! # Features
//!
//! - **Typed records** - Define records with Serde and declare their fields in a schema
//! - **Stored enum values** - Enum fields persist as their underlying int or string value
//! - **Chainable queries** - Immutable query values, executed lazily as streams
//! - **Multiple clients** - In-memory and MongoDB clients behind one trait
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::LazyLock;
//!
//! use docmap::{prelude::*, memory::InMemoryClient};
//! use futures::TryStreamExt;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! enum Membership { Basic, Full }
//!
//! static USER: LazyLock<Schema> = LazyLock::new(|| {
//!     let membership = EnumSchema::new("Membership")
//!         .member("Basic", 1)
//!         .member("Full", 2);
//!
//!     Schema::builder("User")
//!         .field("email_address", FieldKind::string())
//!         .field("membership", FieldKind::enumeration(membership))
//!         .build()
//!         .expect("user schema")
//! });
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! struct User {
//!     #[serde(skip)]
//!     id: Option<String>,
//!     email_address: String,
//!     membership: Membership,
//! }
//!
//! impl Record for User {
//!     fn schema() -> &'static Schema { &USER }
//!     fn id(&self) -> Option<&str> { self.id.as_deref() }
//!     fn set_id(&mut self, id: String) { self.id = Some(id) }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let handle = ClientHandle::new();
//!     handle.initialize(InMemoryClient::builder().build().await?).await;
//!
//!     let users = Mapper::<User>::new(&handle);
//!
//!     let mut user = User {
//!         id: None,
//!         email_address: "alice@example.com".into(),
//!         membership: Membership::Full,
//!     };
//!     users.create(&mut user).await?;
//!
//!     let full: Vec<User> = users
//!         .filter("membership", FilterOp::Eq, Membership::Full)?
//!         .limit(10)
//!         .stream()
//!         .await?
//!         .try_collect()
//!         .await?;
//!
//!     println!("Full members: {full:?}");
//!
//!     Ok(())
//! }
//! ```
//!
//! # Clients
//!
//! - [`memory`] - In-memory client for development and testing
//! - `mongodb` - Persistent MongoDB client (requires the `mongodb` feature)

pub mod prelude;

pub use docmap_core::{client, codec, error, mapper, query, record, schema};

// Re-export BSON types for convenience
pub use bson;

/// In-memory document client.
pub mod memory {
    pub use docmap_memory::{InMemoryClient, InMemoryClientBuilder};
}

/// MongoDB document client.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use docmap_mongodb::{MongoDbClient, MongoDbClientBuilder};
}
