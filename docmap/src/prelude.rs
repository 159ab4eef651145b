//! Convenient re-exports of commonly used types from docmap.
//!
//! ```ignore
//! use docmap::prelude::*;
//! ```
//!
//! This provides access to:
//! - Record schemas and the record trait
//! - The client trait, builder trait and handle
//! - Mappers, queries and filter operators
//! - Error types

pub use docmap_core::{
    client::{ClientBuilder, ClientHandle, DocumentClient, DocumentStream},
    error::{DocumentStoreError, DocumentStoreResult},
    mapper::{Mapper, Query, RecordStream},
    query::{Clause, ClauseVisitor, Direction, FilterOp, Order, StructuredQuery},
    record::Record,
    schema::{EnumSchema, FieldKind, FieldSpec, PrimitiveKind, Schema, SchemaBuilder},
};
