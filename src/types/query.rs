//! Query description types
//!
//! A query is a [`FilterSpec`] (free-text search plus per-field predicates,
//! combined with AND) and an optional [`SortSpec`]. Both are plain data; the
//! [`crate::core::QueryEngine`] interprets them against an entity schema.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::error::DashboardError;

/// How a field's raw value is interpreted for comparison and ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text, compared case-insensitively and accent-folded
    Text,
    /// Small closed vocabulary (status, role, category)
    Enum,
    /// Plain number
    Number,
    /// Localized money amount such as `"€50.000"`
    Currency,
    /// Localized percentage such as `"9,00%"`
    Percent,
    /// ISO or localized date / date-time
    Date,
    /// Boolean flag
    Bool,
}

impl FieldKind {
    pub fn is_numeric(self) -> bool {
        matches!(self, FieldKind::Number | FieldKind::Currency | FieldKind::Percent)
    }
}

/// Constraint on a single field
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Case-insensitive equality on the display text (statuses, roles, ...)
    Exact(String),

    /// Case-insensitive substring match
    Contains(String),

    /// Inclusive numeric range; a missing bound is unbounded on that side
    ///
    /// Currency and percent fields are parsed before comparison.
    Range {
        min: Option<Decimal>,
        max: Option<Decimal>,
    },

    /// Inclusive calendar-day range
    ///
    /// `to` covers the whole day, up to 23:59:59.999.
    DateRange {
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    },

    /// Boolean equality
    Bool(bool),
}

impl Predicate {
    /// True when the predicate places no constraint at all
    ///
    /// Empty entries mean "no constraint", never "match empty".
    pub fn is_unconstrained(&self) -> bool {
        match self {
            Predicate::Exact(text) | Predicate::Contains(text) => text.trim().is_empty(),
            Predicate::Range { min, max } => min.is_none() && max.is_none(),
            Predicate::DateRange { from, to } => from.is_none() && to.is_none(),
            Predicate::Bool(_) => false,
        }
    }

    /// Combine two predicates on the same field
    ///
    /// Range bounds merge (so `amount>=10` and `amount<=20` become one range);
    /// any other combination keeps the newer predicate.
    pub fn merge(self, newer: Predicate) -> Predicate {
        match (self, newer) {
            (Predicate::Range { min, max }, Predicate::Range { min: new_min, max: new_max }) => {
                Predicate::Range {
                    min: new_min.or(min),
                    max: new_max.or(max),
                }
            }
            (
                Predicate::DateRange { from, to },
                Predicate::DateRange {
                    from: new_from,
                    to: new_to,
                },
            ) => Predicate::DateRange {
                from: new_from.or(from),
                to: new_to.or(to),
            },
            (_, newer) => newer,
        }
    }
}

/// Declarative set of per-field constraints, combined with logical AND
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
    /// Free-text search over the entity's searchable fields
    pub search: Option<String>,
    /// Field name → predicate
    pub predicates: BTreeMap<String, Predicate>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, search: &str) -> Self {
        self.search = Some(search.to_string());
        self
    }

    /// Add a predicate, merging with any existing one on the same field
    pub fn with(mut self, field: &str, predicate: Predicate) -> Self {
        self.add(field, predicate);
        self
    }

    pub fn add(&mut self, field: &str, predicate: Predicate) {
        let merged = match self.predicates.remove(field) {
            Some(existing) => existing.merge(predicate),
            None => predicate,
        };
        self.predicates.insert(field.to_string(), merged);
    }

    /// The search term, if it is non-blank
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
    }

    /// Predicates that actually constrain something
    pub fn active_predicates(&self) -> impl Iterator<Item = (&str, &Predicate)> {
        self.predicates
            .iter()
            .filter(|(_, predicate)| !predicate.is_unconstrained())
            .map(|(field, predicate)| (field.as_str(), predicate))
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// A single field plus direction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn asc(field: &str) -> Self {
        SortSpec {
            field: field.to_string(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: &str) -> Self {
        SortSpec {
            field: field.to_string(),
            direction: SortDirection::Desc,
        }
    }
}

/// Parses `field`, `field:asc` or `field:desc`
impl FromStr for SortSpec {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (field, direction) = match s.split_once(':') {
            Some((field, direction)) => (field, direction),
            None => (s, "asc"),
        };

        let field = field.trim();
        if field.is_empty() {
            return Err(DashboardError::invalid_sort(s));
        }

        let direction = match direction.trim().to_lowercase().as_str() {
            "asc" => SortDirection::Asc,
            "desc" => SortDirection::Desc,
            _ => return Err(DashboardError::invalid_sort(s)),
        };

        Ok(SortSpec {
            field: field.to_string(),
            direction,
        })
    }
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let direction = match self.direction {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        };
        write!(f, "{}:{}", self.field, direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::blank_exact(Predicate::Exact("  ".to_string()), true)]
    #[case::exact(Predicate::Exact("approved".to_string()), false)]
    #[case::open_range(Predicate::Range { min: None, max: None }, true)]
    #[case::half_range(Predicate::Range { min: Some(Decimal::ONE), max: None }, false)]
    #[case::open_dates(Predicate::DateRange { from: None, to: None }, true)]
    #[case::flag(Predicate::Bool(false), false)]
    fn test_is_unconstrained(#[case] predicate: Predicate, #[case] expected: bool) {
        assert_eq!(predicate.is_unconstrained(), expected);
    }

    #[test]
    fn test_range_bounds_merge() {
        let spec = FilterSpec::new()
            .with("amount", Predicate::Range { min: Some(Decimal::new(10, 0)), max: None })
            .with("amount", Predicate::Range { min: None, max: Some(Decimal::new(20, 0)) });

        assert_eq!(
            spec.predicates.get("amount"),
            Some(&Predicate::Range {
                min: Some(Decimal::new(10, 0)),
                max: Some(Decimal::new(20, 0)),
            })
        );
    }

    #[rstest]
    #[case::none(None, None)]
    #[case::blank(Some("   "), None)]
    #[case::padded(Some("  ana "), Some("ana"))]
    fn test_search_term(#[case] search: Option<&str>, #[case] expected: Option<&str>) {
        let spec = FilterSpec {
            search: search.map(str::to_string),
            ..FilterSpec::default()
        };
        assert_eq!(spec.search_term(), expected);
    }

    #[rstest]
    #[case::bare("amount", SortSpec::asc("amount"))]
    #[case::asc("amount:asc", SortSpec::asc("amount"))]
    #[case::desc("created_at:DESC", SortSpec::desc("created_at"))]
    fn test_sort_parsing(#[case] input: &str, #[case] expected: SortSpec) {
        assert_eq!(input.parse::<SortSpec>().unwrap(), expected);
    }

    #[rstest]
    #[case::empty_field(":desc")]
    #[case::bad_direction("amount:sideways")]
    fn test_sort_parsing_errors(#[case] input: &str) {
        assert!(input.parse::<SortSpec>().is_err());
    }
}
