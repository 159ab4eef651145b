//! MongoDB document client for docmap.
//!
//! This crate provides a MongoDB-based implementation of the `DocumentClient`
//! trait, so records mapped with docmap persist in MongoDB and queries run on
//! MongoDB's query engine.
//!
//! To use this client, include the `mongodb` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! docmap = { version = "x.y.z", features = ["mongodb"] }
//! ```
//!
//! # Features
//!
//! - **Persistent storage** - Data is persisted to MongoDB Atlas or self-hosted MongoDB
//! - **Native queries** - Clauses, ordering and limits run on the server
//! - **Async/await** - Fully asynchronous API built on MongoDB's async driver
//!
//! # Example
//!
//! ```ignore
//! use docmap::{client::{ClientBuilder, ClientHandle}, mongodb::MongoDbClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = MongoDbClient::builder("mongodb://localhost:27017", "my_database")
//!         .build()
//!         .await?;
//!
//!     let handle = ClientHandle::new();
//!     handle.initialize(client).await;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as docmap_mongodb;

pub mod store;
mod query;
mod sanitizer;

pub use store::{MongoDbClient, MongoDbClientBuilder};
