//! Entity query engine
//!
//! This module provides the QueryEngine that turns a collection of homogeneous
//! records plus a declarative query into a filtered, ordered view.
//!
//! The engine applies, in order:
//! - a derive pass (each [`FieldDeriver`](crate::core::traits::FieldDeriver)
//!   runs once per record, results cached for this query only)
//! - free-text search over the entity's searchable fields
//! - every constraining predicate, combined with AND
//! - an optional stable sort
//!
//! It is pure: the same records, filters and sort always give the same output,
//! and malformed field values never cause a panic or an error.

use chrono::{NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use std::cmp::Ordering;

use crate::core::derive::fold;
use crate::core::entities::{EntityKind, EntitySchema};
use crate::core::parsers::{bool_of, date_of, number_of};
use crate::types::{
    DashboardError, FieldKind, FilterSpec, Predicate, Record, SortDirection, SortSpec, Value,
};

/// A record plus the derived values computed for the current query
struct Row<'a> {
    record: &'a Record,
    derived: Vec<(&'a str, Value)>,
}

impl<'a> Row<'a> {
    fn get(&self, field: &str) -> Option<&Value> {
        self.derived
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, value)| value)
            .or_else(|| self.record.get(field))
    }
}

/// Comparable form of a field, computed once per row before sorting
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum SortKey {
    Number(Decimal),
    Moment(Option<NaiveDateTime>),
    Flag(Option<bool>),
    Text(String),
}

/// Query engine for one entity kind
#[derive(Debug)]
pub struct QueryEngine {
    schema: EntitySchema,
}

impl QueryEngine {
    pub fn new(schema: EntitySchema) -> Self {
        QueryEngine { schema }
    }

    /// Engine configured with the built-in schema of an entity kind
    pub fn for_entity(kind: EntityKind) -> Self {
        QueryEngine::new(kind.schema())
    }

    pub fn schema(&self) -> &EntitySchema {
        &self.schema
    }

    /// Filter and order `records`
    ///
    /// # Arguments
    ///
    /// * `records` - Input collection, assumed to be in upstream order (newest first)
    /// * `filters` - Search term and field predicates
    /// * `sort` - Optional sort; `None` keeps input order
    ///
    /// # Returns
    ///
    /// The matching records, cloned, in output order. Derived fields are not
    /// included in the returned records.
    pub fn query(
        &self,
        records: &[Record],
        filters: &FilterSpec,
        sort: Option<&SortSpec>,
    ) -> Vec<Record> {
        if records.is_empty() {
            return Vec::new();
        }

        let mut rows: Vec<Row<'_>> = records.iter().map(|record| self.prepare(record)).collect();

        if let Some(term) = filters.search_term() {
            let needle = fold(term);
            rows.retain(|row| self.matches_search(row, &needle));
        }

        let predicates: Vec<(&str, &Predicate)> = filters.active_predicates().collect();
        if !predicates.is_empty() {
            rows.retain(|row| {
                predicates
                    .iter()
                    .all(|(field, predicate)| self.matches(row, field, predicate))
            });
        }

        if let Some(sort) = sort {
            rows = self.sorted(rows, sort);
        }

        rows.into_iter().map(|row| row.record.clone()).collect()
    }

    /// Copies of `records` with every derived field written in
    ///
    /// For consumers that group or export by a derived value, such as a
    /// gender distribution. [`query`](Self::query) never does this.
    pub fn with_derived(&self, records: &[Record]) -> Vec<Record> {
        records
            .iter()
            .map(|record| {
                let row = self.prepare(record);
                let mut enriched = record.clone();
                for (name, value) in row.derived {
                    enriched.insert(name, value);
                }
                enriched
            })
            .collect()
    }

    /// Find the first record whose `field` equals `key`, case-insensitively
    ///
    /// # Errors
    ///
    /// Returns `DashboardError::NotFound` when nothing matches, e.g. a profile
    /// lookup for a name that has no user.
    pub fn find_one(
        &self,
        records: &[Record],
        field: &str,
        key: &str,
    ) -> Result<Record, DashboardError> {
        let filters = FilterSpec::new().with(field, Predicate::Exact(key.to_string()));
        self.query(records, &filters, None)
            .into_iter()
            .next()
            .ok_or_else(|| DashboardError::not_found(self.schema.kind.singular_key(), key))
    }

    fn prepare<'a>(&'a self, record: &'a Record) -> Row<'a> {
        let derived = self
            .schema
            .derivers
            .iter()
            .map(|deriver| (deriver.name(), deriver.derive(record)))
            .collect();
        Row { record, derived }
    }

    fn matches_search(&self, row: &Row<'_>, needle: &str) -> bool {
        self.schema.searchable.iter().any(|field| {
            row.get(field)
                .filter(|value| !value.is_null())
                .is_some_and(|value| fold(&value.to_string()).contains(needle))
        })
    }

    fn matches(&self, row: &Row<'_>, field: &str, predicate: &Predicate) -> bool {
        let value = row.get(field).unwrap_or(&Value::Null);

        match predicate {
            Predicate::Exact(expected) => {
                !value.is_null() && fold(value.to_string().trim()) == fold(expected.trim())
            }
            Predicate::Contains(fragment) => {
                !value.is_null() && fold(&value.to_string()).contains(&fold(fragment.trim()))
            }
            Predicate::Range { min, max } => {
                match number_of(value, self.schema.kind_of(field)) {
                    Some(number) => {
                        min.map_or(true, |min| number >= min) && max.map_or(true, |max| number <= max)
                    }
                    None => false,
                }
            }
            Predicate::DateRange { from, to } => match date_of(value) {
                Some(moment) => {
                    let after_start = from.map_or(true, |day| moment >= day.and_time(NaiveTime::MIN));
                    let before_end = to.map_or(true, |day| {
                        day.and_hms_milli_opt(23, 59, 59, 999)
                            .is_some_and(|end| moment <= end)
                    });
                    after_start && before_end
                }
                None => false,
            },
            Predicate::Bool(expected) => bool_of(value) == Some(*expected),
        }
    }

    fn sort_key(&self, row: &Row<'_>, field: &str, kind: FieldKind) -> SortKey {
        let value = row.get(field).unwrap_or(&Value::Null);
        match kind {
            FieldKind::Number | FieldKind::Currency | FieldKind::Percent => {
                SortKey::Number(number_of(value, kind).unwrap_or(Decimal::ZERO))
            }
            FieldKind::Date => SortKey::Moment(date_of(value)),
            FieldKind::Bool => SortKey::Flag(bool_of(value)),
            FieldKind::Text | FieldKind::Enum => SortKey::Text(fold(&value.to_string())),
        }
    }

    /// Stable sort; rows with equal keys keep their input order in both directions
    fn sorted<'a>(&self, rows: Vec<Row<'a>>, sort: &SortSpec) -> Vec<Row<'a>> {
        let kind = self.schema.kind_of(&sort.field);
        let mut keyed: Vec<(SortKey, Row<'a>)> = rows
            .into_iter()
            .map(|row| (self.sort_key(&row, &sort.field, kind), row))
            .collect();

        keyed.sort_by(|(a, _), (b, _)| {
            let ordering: Ordering = a.cmp(b);
            match sort.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });

        keyed.into_iter().map(|(_, row)| row).collect()
    }
}
