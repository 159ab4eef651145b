//! Clause translation to MongoDB query syntax.
//!
//! This module translates docmap's structured queries into MongoDB BSON
//! filter documents for execution by the MongoDB query engine.

use bson::{Bson, Document, doc};
use mongodb::options::FindOptions;

use docmap_core::{
    query::{Clause, ClauseVisitor, Direction, FilterOp, Order, StructuredQuery},
    error::DocumentStoreError,
};

use crate::sanitizer::KeySanitizer;

/// Translates structured queries into MongoDB filter documents.
pub(crate) struct MongoQueryTranslator;

impl MongoQueryTranslator {
    /// Builds the sort specification for a list of orderings.
    pub(crate) fn sort(order: &[Order]) -> Document {
        order
            .iter()
            .map(|Order { field, direction }| (
                KeySanitizer::sanitize_path(field),
                Bson::Int32(match direction {
                    Direction::Asc => 1,
                    Direction::Desc => -1,
                }),
            ))
            .collect()
    }

    /// Find options for the ordering and limit of `query`, or `None` when the
    /// query cannot return anything. MongoDB reads a zero limit as "no
    /// limit", so that case never reaches the server.
    pub(crate) fn find_options(query: &StructuredQuery) -> Option<FindOptions> {
        let mut options = FindOptions::default();

        match query.limit {
            Some(0) => return None,
            Some(limit) => options.limit = Some(limit as i64),
            None => {},
        }
        if !query.order.is_empty() {
            options.sort = Some(Self::sort(&query.order));
        }

        Some(options)
    }
}

impl ClauseVisitor for MongoQueryTranslator {
    type Output = Document;
    type Error = DocumentStoreError;

    fn visit_and(&mut self, clauses: &[Clause]) -> Result<Self::Output, Self::Error> {
        // MongoDB rejects an empty `$and`.
        if clauses.is_empty() {
            return Ok(doc! {});
        }

        Ok(doc! {
            "$and": clauses
                .iter()
                .map(|clause| self.visit_clause(&clause.field, clause.op, &clause.value))
                .collect::<Result<Vec<_>, _>>()?,
        })
    }

    fn visit_clause(&mut self, field: &str, op: FilterOp, value: &Bson) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            KeySanitizer::sanitize_path(field): match op {
                FilterOp::Eq => doc! { "$eq": value },
                // `$ne` alone also matches documents lacking the field.
                FilterOp::Ne => doc! { "$exists": true, "$ne": value },
                FilterOp::Gt => doc! { "$gt": value },
                FilterOp::Gte => doc! { "$gte": value },
                FilterOp::Lt => doc! { "$lt": value },
                FilterOp::Lte => doc! { "$lte": value },
                FilterOp::ArrayContains => doc! { "$elemMatch": { "$eq": value } },
                FilterOp::In => match value {
                    Bson::Array(arr) => doc! { "$in": arr },
                    _ => return Err(DocumentStoreError::InvalidQuery(format!(
                        "'in' filter on {field} requires an array value"
                    ))),
                },
            }
        })
    }
}
