//! Core traits for derived fields and record sources
//!
//! These are the seams where per-entity behaviour and the outside world plug
//! into the otherwise generic query and loading machinery.

use std::future::Future;

use crate::core::entities::EntityKind;
use crate::types::{Collection, DashboardError, Record, Value};

/// Computes a field that is not stored on the record
///
/// Derivers run once per record before filtering. Their output is visible to
/// predicates and sorting for the duration of one query but is never written
/// back into the record.
pub trait FieldDeriver: Send + Sync {
    /// Name under which the derived value is exposed
    fn name(&self) -> &str;

    /// Compute the value for one record
    fn derive(&self, record: &Record) -> Value;
}

/// A change submitted to a collection
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Add a new record
    Create(Record),
    /// Overwrite the given fields of the record with this id
    Update { id: String, changes: Record },
    /// Remove the record with this id
    Delete { id: String },
}

/// Trait for fetching and mutating entity collections
///
/// Every call is a single attempt: implementations must not retry, and a
/// failure is returned verbatim so the presentation layer can show it.
pub trait RecordSource: Send + Sync {
    /// Fetch the full collection for an entity
    fn fetch(
        &self,
        kind: EntityKind,
    ) -> impl Future<Output = Result<Collection, DashboardError>> + Send;

    /// Apply a mutation and return the affected record
    fn mutate(
        &self,
        kind: EntityKind,
        mutation: Mutation,
    ) -> impl Future<Output = Result<Record, DashboardError>> + Send;
}
