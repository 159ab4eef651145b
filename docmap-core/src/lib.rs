//! Typed record mapping over remote document stores.
//!
//! This crate is the core of the docmap project and provides:
//!
//! - **Record schemas** ([`schema`]) - Explicit field declarations for record types
//! - **Codec** ([`codec`]) - Schema-driven conversion between records and documents
//! - **Record trait** ([`record`]) - What a type implements to be mapped onto a collection
//! - **Client abstraction** ([`client`]) - The document client seam and the handle that holds it
//! - **Query clauses** ([`query`]) - Filter operators and the structured query clients execute
//! - **Mappers** ([`mapper`]) - Typed CRUD operations and chainable, lazily executed queries
//! - **Error handling** ([`error`]) - The error enum and result alias
//!
//! # Example
//!
//! ```ignore
//! use docmap::prelude::*;
//!
//! let handle = ClientHandle::new();
//! handle.initialize(client).await;
//!
//! let people = Mapper::<Person>::new(&handle);
//! let mut person = Person::new("test@test.com", 30);
//! people.create(&mut person).await?;
//!
//! let found = people.get_document(person.id().unwrap()).await?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as docmap_core;

pub mod client;
pub mod codec;
pub mod error;
pub mod mapper;
pub mod query;
pub mod record;
pub mod schema;
