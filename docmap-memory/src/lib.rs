//! In-memory document client for docmap.
//!
//! This crate provides a thread-safe, in-memory implementation of the
//! `DocumentClient` trait. It uses async-aware read-write locks for concurrent
//! access and is meant for development and tests.
//!
//! # Features
//!
//! - **Thread-safe access** - Concurrent reads and writes using async-aware RwLock
//! - **Full query support** - Every filter operator, dotted field paths, ordering and limits
//! - **Generated identifiers** - Random 32-character hex ids when none is supplied
//!
//! # Quick Start
//!
//! ```ignore
//! use docmap::{prelude::*, memory::InMemoryClient};
//!
//! let handle = ClientHandle::new();
//! handle.initialize(InMemoryClient::builder().build().await?).await;
//!
//! let users = Mapper::<User>::new(&handle);
//! let mut user = User::new("alice@example.com");
//! users.create(&mut user).await?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as docmap_memory;

pub mod store;
mod evaluator;

pub use store::{InMemoryClient, InMemoryClientBuilder};
