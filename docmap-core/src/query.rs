//! Filter clauses and the structured query handed to document clients.
//!
//! Typed, chainable queries are built through [`Mapper`](crate::mapper::Mapper)
//! and [`Query`](crate::mapper::Query); this module holds the untyped form
//! they lower to, which is what a [`DocumentClient`](crate::client::DocumentClient)
//! executes.
//!
//! # Operators
//!
//! [`FilterOp`] is a fixed set: equality, inequality, the four ordering
//! comparisons, array-contains and membership-in-set. Operators also parse
//! from their usual spelling:
//!
//! ```ignore
//! use docmap::query::FilterOp;
//!
//! let op: FilterOp = ">=".parse()?;
//! assert_eq!(op, FilterOp::Gte);
//! ```

use std::{fmt, str::FromStr};

use bson::Bson;

use crate::error::DocumentStoreError;

/// Comparison operators for filter clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOp {
    /// Equal to (`==`).
    Eq,
    /// Not equal to (`!=`).
    Ne,
    /// Less than (`<`).
    Lt,
    /// Less than or equal to (`<=`).
    Lte,
    /// Greater than (`>`).
    Gt,
    /// Greater than or equal to (`>=`).
    Gte,
    /// Array field contains the value (`array_contains`).
    ArrayContains,
    /// Field equals one of the values in an array (`in`).
    In,
}

impl FilterOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOp::Eq => "==",
            FilterOp::Ne => "!=",
            FilterOp::Lt => "<",
            FilterOp::Lte => "<=",
            FilterOp::Gt => ">",
            FilterOp::Gte => ">=",
            FilterOp::ArrayContains => "array_contains",
            FilterOp::In => "in",
        }
    }
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterOp {
    type Err = DocumentStoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "==" => Ok(FilterOp::Eq),
            "!=" => Ok(FilterOp::Ne),
            "<" => Ok(FilterOp::Lt),
            "<=" => Ok(FilterOp::Lte),
            ">" => Ok(FilterOp::Gt),
            ">=" => Ok(FilterOp::Gte),
            "array_contains" => Ok(FilterOp::ArrayContains),
            "in" => Ok(FilterOp::In),
            other => Err(DocumentStoreError::InvalidQuery(format!("unknown operator {other:?}"))),
        }
    }
}

/// One `(field, operator, value)` filter. The value is already in stored form.
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    /// Field path; dots address nested documents.
    pub field: String,
    pub op: FilterOp,
    pub value: Bson,
}

impl Clause {
    pub fn new(field: impl Into<String>, op: FilterOp, value: impl Into<Bson>) -> Self {
        Clause { field: field.into(), op, value: value.into() }
    }
}

/// Sort direction for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Ascending order (A to Z, 0 to 9, earliest to latest).
    Asc,
    /// Descending order (Z to A, 9 to 0, latest to earliest).
    Desc,
}

/// Ordering on one field.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub field: String,
    pub direction: Direction,
}

/// The untyped query a client executes against one collection.
///
/// Clauses are conjoined and kept in the order they were added. Without an
/// explicit [`Order`], result order is whatever the store returns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructuredQuery {
    pub clauses: Vec<Clause>,
    pub order: Vec<Order>,
    pub limit: Option<usize>,
}

impl StructuredQuery {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Walks the clauses of a [`StructuredQuery`].
///
/// Backends implement this to translate clauses into their native filter
/// language or to evaluate them directly.
pub trait ClauseVisitor {
    type Output;
    type Error: Into<DocumentStoreError>;

    /// Combines clauses that must all hold.
    fn visit_and(&mut self, clauses: &[Clause]) -> Result<Self::Output, Self::Error>;

    fn visit_clause(
        &mut self,
        field: &str,
        op: FilterOp,
        value: &Bson,
    ) -> Result<Self::Output, Self::Error>;

    fn visit_query(&mut self, query: &StructuredQuery) -> Result<Self::Output, Self::Error> {
        self.visit_and(&query.clauses)
    }
}
