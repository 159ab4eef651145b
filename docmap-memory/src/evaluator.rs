//! Clause evaluation for in-memory document filtering.
//!
//! This module evaluates the clauses of a [`StructuredQuery`] against stored
//! BSON documents and provides the comparison rules used for ordering.

use std::{cmp::Ordering, collections::HashMap};

use bson::{Bson, DateTime, Document};

use docmap_core::{
    error::DocumentStoreError,
    query::{Clause, ClauseVisitor, FilterOp, Order, Direction, StructuredQuery},
};

/// Type-erased, comparable representation of BSON values.
///
/// Numeric types are normalized to f64 so that values written with different
/// integer widths still compare equal.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    Null,
    Bool(bool),
    Number(f64),
    DateTime(DateTime),
    String(&'a str),
    Array(Vec<Comparable<'a>>),
    Map(HashMap<&'a str, Comparable<'a>>),
    /// Values with no comparison rules (binary, object ids, ...).
    Opaque,
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Number(*value as f64),
            Bson::Int64(value) => Comparable::Number(*value as f64),
            Bson::Double(value) => Comparable::Number(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::Array(arr) => Comparable::Array(
                arr
                    .iter()
                    .map(Comparable::from)
                    .collect()
            ),
            Bson::Document(doc) => Comparable::Map(
                doc
                    .iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect::<HashMap<_, _>>()
            ),
            _ => Comparable::Opaque,
        }
    }
}

impl<'a> PartialEq for Comparable<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl<'a> PartialOrd for Comparable<'a> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => Some(Ordering::Equal),
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

/// Resolves a dotted field path inside a document.
pub(crate) fn lookup<'d>(document: &'d Document, path: &str) -> Option<&'d Bson> {
    let mut segments = path.split('.');
    let mut current = document.get(segments.next()?)?;

    for segment in segments {
        current = current.as_document()?.get(segment)?;
    }

    Some(current)
}

impl<'a> Comparable<'a> {
    /// Position of the value's type in the sort order: missing and null
    /// first, then numbers, strings, documents, arrays, booleans, datetimes.
    fn rank(&self) -> u8 {
        match self {
            Comparable::Null => 0,
            Comparable::Number(_) => 1,
            Comparable::String(_) => 2,
            Comparable::Map(_) => 3,
            Comparable::Array(_) => 4,
            Comparable::Bool(_) => 5,
            Comparable::DateTime(_) => 6,
            Comparable::Opaque => 7,
        }
    }

    /// Total order used for sorting, across all value types.
    pub(crate) fn sort_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Comparable::Number(a), Comparable::Number(b)) => a.total_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.cmp(b),
            (Comparable::Bool(a), Comparable::Bool(b)) => a.cmp(b),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.cmp(b),
            (Comparable::Array(a), Comparable::Array(b)) => a
                .iter()
                .zip(b.iter())
                .map(|(x, y)| x.sort_cmp(y))
                .find(|ordering| ordering.is_ne())
                .unwrap_or_else(|| a.len().cmp(&b.len())),
            (Comparable::Map(a), Comparable::Map(b)) => {
                let mut left = a.iter().collect::<Vec<_>>();
                let mut right = b.iter().collect::<Vec<_>>();
                left.sort_by_key(|(key, _)| **key);
                right.sort_by_key(|(key, _)| **key);

                left
                    .iter()
                    .zip(right.iter())
                    .map(|((ka, va), (kb, vb))| ka.cmp(kb).then_with(|| va.sort_cmp(vb)))
                    .find(|ordering| ordering.is_ne())
                    .unwrap_or_else(|| left.len().cmp(&right.len()))
            },
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

/// Compares two documents by a list of orderings. Missing fields sort as null.
pub(crate) fn compare_by(order: &[Order], left: &Document, right: &Document) -> Ordering {
    for Order { field, direction } in order {
        let a = lookup(left, field).map(Comparable::from).unwrap_or(Comparable::Null);
        let b = lookup(right, field).map(Comparable::from).unwrap_or(Comparable::Null);

        let ordering = match direction {
            Direction::Asc => a.sort_cmp(&b),
            Direction::Desc => b.sort_cmp(&a),
        };

        if ordering.is_ne() {
            return ordering;
        }
    }

    Ordering::Equal
}

pub(crate) struct DocumentEvaluator<'a> {
    document: &'a Document,
}

impl<'a> DocumentEvaluator<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self { document }
    }

    /// Returns `true` if the document satisfies every clause of the query.
    pub fn matches(document: &'a Document, query: &StructuredQuery) -> Result<bool, DocumentStoreError> {
        DocumentEvaluator::new(document).visit_query(query)
    }
}

impl<'a> ClauseVisitor for DocumentEvaluator<'a> {
    type Output = bool;
    type Error = DocumentStoreError;

    fn visit_and(&mut self, clauses: &[Clause]) -> Result<Self::Output, Self::Error> {
        for clause in clauses {
            if !self.visit_clause(&clause.field, clause.op, &clause.value)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn visit_clause(&mut self, field: &str, op: FilterOp, value: &Bson) -> Result<Self::Output, Self::Error> {
        // Documents lacking the field never match, whatever the operator.
        let Some(field_value) = lookup(self.document, field) else {
            return Ok(false);
        };

        let left = Comparable::from(field_value);
        let right = Comparable::from(value);

        match op {
            FilterOp::Eq => Ok(left == right),
            FilterOp::Ne => Ok(left != right),
            FilterOp::Lt | FilterOp::Lte | FilterOp::Gt | FilterOp::Gte => {
                Ok(match left.partial_cmp(&right) {
                    Some(ordering) => match op {
                        FilterOp::Lt => ordering == Ordering::Less,
                        FilterOp::Lte => ordering != Ordering::Greater,
                        FilterOp::Gt => ordering == Ordering::Greater,
                        _ => ordering != Ordering::Less,
                    },
                    None => false,
                })
            },
            FilterOp::ArrayContains => match left {
                Comparable::Array(items) => Ok(items.iter().any(|item| item == &right)),
                _ => Ok(false),
            },
            FilterOp::In => match right {
                Comparable::Array(candidates) => Ok(candidates.iter().any(|candidate| candidate == &left)),
                _ => Err(DocumentStoreError::InvalidQuery(format!(
                    "'in' filter on {field} requires an array value"
                ))),
            },
        }
    }
}
