//! Per-entity query configuration
//!
//! The dashboard shows five entity kinds. Instead of five hand-written
//! filter/sort pipelines, each kind is described by a small table (field name →
//! [`FieldKind`], searchable fields, derived fields) and fed to the single
//! generic [`crate::core::QueryEngine`].

use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

use crate::core::derive::{GenderDeriver, GENDER_GROUP};
use crate::core::parsers::{parse_bool, parse_currency, parse_day, parse_number, parse_percent};
use crate::core::traits::FieldDeriver;
use crate::types::{DashboardError, FieldKind, FilterSpec, Predicate, SortSpec};

/// The entity kinds the dashboard lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Users,
    Kyc,
    Products,
    Contracts,
    PartnerClients,
}

impl EntityKind {
    pub const ALL: [EntityKind; 5] = [
        EntityKind::Users,
        EntityKind::Kyc,
        EntityKind::Products,
        EntityKind::Contracts,
        EntityKind::PartnerClients,
    ];

    /// Key of the list envelope, `{ "<key>": [...] }`, and the file stem
    pub fn envelope_key(self) -> &'static str {
        match self {
            EntityKind::Users => "users",
            EntityKind::Kyc => "kyc",
            EntityKind::Products => "products",
            EntityKind::Contracts => "contracts",
            EntityKind::PartnerClients => "clients",
        }
    }

    /// Key of the single-entity envelope, `{ "<key>": {...} }`
    pub fn singular_key(self) -> &'static str {
        match self {
            EntityKind::Users => "user",
            EntityKind::Kyc => "kyc",
            EntityKind::Products => "product",
            EntityKind::Contracts => "contract",
            EntityKind::PartnerClients => "client",
        }
    }

    pub fn schema(self) -> EntitySchema {
        match self {
            EntityKind::Users => EntitySchema {
                kind: self,
                fields: &[
                    ("id", FieldKind::Number),
                    ("name", FieldKind::Text),
                    ("email", FieldKind::Text),
                    ("phone", FieldKind::Text),
                    ("role", FieldKind::Enum),
                    ("gender", FieldKind::Enum),
                    ("status", FieldKind::Enum),
                    ("kyc_status", FieldKind::Enum),
                    ("capital", FieldKind::Currency),
                    ("created_at", FieldKind::Date),
                    (GENDER_GROUP, FieldKind::Enum),
                ],
                searchable: &["id", "name", "email"],
                derivers: vec![Box::new(GenderDeriver)],
            },
            EntityKind::Kyc => EntitySchema {
                kind: self,
                fields: &[
                    ("id", FieldKind::Number),
                    ("user_id", FieldKind::Number),
                    ("user_name", FieldKind::Text),
                    ("email", FieldKind::Text),
                    ("document_type", FieldKind::Enum),
                    ("status", FieldKind::Enum),
                    ("submitted_at", FieldKind::Date),
                    ("reviewed_at", FieldKind::Date),
                ],
                searchable: &["id", "user_name", "email"],
                derivers: Vec::new(),
            },
            EntityKind::Products => EntitySchema {
                kind: self,
                fields: &[
                    ("id", FieldKind::Number),
                    ("name", FieldKind::Text),
                    ("category", FieldKind::Enum),
                    ("rate", FieldKind::Percent),
                    ("min_amount", FieldKind::Currency),
                    ("term_months", FieldKind::Number),
                    ("active", FieldKind::Bool),
                    ("created_at", FieldKind::Date),
                ],
                searchable: &["id", "name", "category"],
                derivers: Vec::new(),
            },
            EntityKind::Contracts => EntitySchema {
                kind: self,
                fields: &[
                    ("id", FieldKind::Number),
                    ("client_name", FieldKind::Text),
                    ("product_name", FieldKind::Text),
                    ("amount", FieldKind::Currency),
                    ("rate", FieldKind::Percent),
                    ("status", FieldKind::Enum),
                    ("signed", FieldKind::Bool),
                    ("start_date", FieldKind::Date),
                    ("end_date", FieldKind::Date),
                ],
                searchable: &["id", "client_name", "product_name"],
                derivers: Vec::new(),
            },
            EntityKind::PartnerClients => EntitySchema {
                kind: self,
                fields: &[
                    ("id", FieldKind::Number),
                    ("name", FieldKind::Text),
                    ("email", FieldKind::Text),
                    ("amount", FieldKind::Currency),
                    ("contract_status", FieldKind::Enum),
                    ("date", FieldKind::Date),
                ],
                searchable: &["id", "name", "email"],
                derivers: Vec::new(),
            },
        }
    }
}

impl FromStr for EntityKind {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['_', ' '], "-").as_str() {
            "users" | "user" => Ok(EntityKind::Users),
            "kyc" | "kycs" => Ok(EntityKind::Kyc),
            "products" | "product" => Ok(EntityKind::Products),
            "contracts" | "contract" => Ok(EntityKind::Contracts),
            "clients" | "client" | "partner-clients" => Ok(EntityKind::PartnerClients),
            _ => Err(DashboardError::UnknownEntity {
                name: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.envelope_key())
    }
}

/// Query configuration of one entity kind
pub struct EntitySchema {
    pub kind: EntityKind,
    /// Known fields and how to interpret them
    pub fields: &'static [(&'static str, FieldKind)],
    /// Fields matched by free-text search
    pub searchable: &'static [&'static str],
    /// Fields computed per record before filtering
    pub derivers: Vec<Box<dyn FieldDeriver>>,
}

impl fmt::Debug for EntitySchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntitySchema")
            .field("kind", &self.kind)
            .field("fields", &self.fields)
            .field("searchable", &self.searchable)
            .field(
                "derivers",
                &self.derivers.iter().map(|d| d.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl EntitySchema {
    /// A schema with no known fields; every field reads as text
    pub fn untyped(kind: EntityKind, searchable: &'static [&'static str]) -> Self {
        EntitySchema {
            kind,
            fields: &[],
            searchable,
            derivers: Vec::new(),
        }
    }

    pub fn field_kind(&self, field: &str) -> Option<FieldKind> {
        self.fields
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, kind)| *kind)
    }

    /// Field kind, defaulting to text for fields the schema does not list
    pub fn kind_of(&self, field: &str) -> FieldKind {
        self.field_kind(field).unwrap_or(FieldKind::Text)
    }

    fn require_field(&self, field: &str) -> Result<FieldKind, DashboardError> {
        self.field_kind(field)
            .ok_or_else(|| DashboardError::unknown_field(self.kind.envelope_key(), field))
    }

    /// Reject predicates or a sort on fields this entity does not define
    pub fn validate(
        &self,
        filters: &FilterSpec,
        sort: Option<&SortSpec>,
    ) -> Result<(), DashboardError> {
        for field in filters.predicates.keys() {
            self.require_field(field)?;
        }
        if let Some(sort) = sort {
            self.require_field(&sort.field)?;
        }
        Ok(())
    }

    /// Parse one filter expression into a field and predicate
    ///
    /// Supported forms:
    /// - `field=value`: equality (range of one value for numbers and dates)
    /// - `field~value`: case-insensitive substring
    /// - `field>=value`, `field<=value`: one range bound
    /// - `field=min..max`: inclusive range, either side may be empty
    pub fn parse_filter(&self, expression: &str) -> Result<(String, Predicate), DashboardError> {
        let (field, operator, raw) = split_expression(expression)
            .ok_or_else(|| DashboardError::invalid_filter(expression, "expected field=value"))?;
        let kind = self.require_field(field)?;

        let predicate = match operator {
            "~" => Predicate::Contains(raw.to_string()),
            ">=" => bound(expression, kind, Some(raw), None)?,
            "<=" => bound(expression, kind, None, Some(raw))?,
            _ => match raw.split_once("..") {
                Some((low, high)) => bound(expression, kind, Some(low), Some(high))?,
                None => match kind {
                    FieldKind::Bool => Predicate::Bool(
                        parse_bool(raw)
                            .ok_or_else(|| DashboardError::invalid_filter(expression, "expected a boolean"))?,
                    ),
                    FieldKind::Number | FieldKind::Currency | FieldKind::Percent | FieldKind::Date => {
                        bound(expression, kind, Some(raw), Some(raw))?
                    }
                    FieldKind::Text | FieldKind::Enum => Predicate::Exact(raw.to_string()),
                },
            },
        };

        Ok((field.to_string(), predicate))
    }

    /// Build a [`FilterSpec`] from a search term and filter expressions
    pub fn build_filters(
        &self,
        search: Option<&str>,
        expressions: &[String],
    ) -> Result<FilterSpec, DashboardError> {
        let mut spec = FilterSpec {
            search: search.map(str::to_string),
            ..FilterSpec::default()
        };
        for expression in expressions {
            let (field, predicate) = self.parse_filter(expression)?;
            spec.add(&field, predicate);
        }
        Ok(spec)
    }
}

fn split_expression(expression: &str) -> Option<(&str, &str, &str)> {
    for operator in [">=", "<=", "~", "="] {
        if let Some((field, raw)) = expression.split_once(operator) {
            let field = field.trim();
            if field.is_empty() {
                return None;
            }
            return Some((field, operator, raw.trim()));
        }
    }
    None
}

/// Build a range predicate; empty bound text means unbounded
fn bound(
    expression: &str,
    kind: FieldKind,
    low: Option<&str>,
    high: Option<&str>,
) -> Result<Predicate, DashboardError> {
    let low = low.map(str::trim).filter(|text| !text.is_empty());
    let high = high.map(str::trim).filter(|text| !text.is_empty());

    match kind {
        FieldKind::Date => {
            let day = |text: &str| {
                parse_day(text).ok_or_else(|| DashboardError::invalid_filter(expression, "expected a date"))
            };
            Ok(Predicate::DateRange {
                from: low.map(day).transpose()?,
                to: high.map(day).transpose()?,
            })
        }
        FieldKind::Number | FieldKind::Currency | FieldKind::Percent => {
            // Bounds are read the same way as the values they are compared to
            let parse = match kind {
                FieldKind::Currency => parse_currency,
                FieldKind::Percent => parse_percent,
                _ => parse_number,
            };
            let number = |text: &str| -> Result<Decimal, DashboardError> {
                parse(text).ok_or_else(|| DashboardError::invalid_filter(expression, "expected a number"))
            };
            Ok(Predicate::Range {
                min: low.map(number).transpose()?,
                max: high.map(number).transpose()?,
            })
        }
        FieldKind::Text | FieldKind::Enum | FieldKind::Bool => Err(DashboardError::invalid_filter(
            expression,
            "ranges need a numeric or date field",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rstest::rstest;

    #[rstest]
    #[case::plural("users", EntityKind::Users)]
    #[case::singular("Contract", EntityKind::Contracts)]
    #[case::partner("partner_clients", EntityKind::PartnerClients)]
    #[case::envelope_key("clients", EntityKind::PartnerClients)]
    fn test_entity_parsing(#[case] input: &str, #[case] expected: EntityKind) {
        assert_eq!(input.parse::<EntityKind>().unwrap(), expected);
    }

    #[test]
    fn test_every_searchable_field_is_declared() {
        for kind in EntityKind::ALL {
            let schema = kind.schema();
            for field in schema.searchable {
                assert!(schema.field_kind(field).is_some(), "{kind}: {field}");
            }
        }
    }

    #[rstest]
    #[case::exact("status=approved", "status", Predicate::Exact("approved".to_string()))]
    #[case::contains("client_name~silva", "client_name", Predicate::Contains("silva".to_string()))]
    #[case::min("amount>=60000", "amount", Predicate::Range { min: Some(Decimal::new(60000, 0)), max: None })]
    #[case::dotted_thousands("amount>=60.000", "amount", Predicate::Range { min: Some(Decimal::new(60000, 0)), max: None })]
    #[case::currency_symbol("amount>=€60.000", "amount", Predicate::Range { min: Some(Decimal::new(60000, 0)), max: None })]
    #[case::percent_sign("rate>=9,00%", "rate", Predicate::Range { min: Some(Decimal::new(900, 2)), max: None })]
    #[case::max("amount<=90000", "amount", Predicate::Range { min: None, max: Some(Decimal::new(90000, 0)) })]
    #[case::open_low("amount=..500", "amount", Predicate::Range { min: None, max: Some(Decimal::new(500, 0)) })]
    #[case::decimal_comma("rate=4,5..9", "rate", Predicate::Range { min: Some(Decimal::new(45, 1)), max: Some(Decimal::new(9, 0)) })]
    #[case::flag("signed=sim", "signed", Predicate::Bool(true))]
    #[case::single_day(
        "start_date=2024-06-01",
        "start_date",
        Predicate::DateRange {
            from: NaiveDate::from_ymd_opt(2024, 6, 1),
            to: NaiveDate::from_ymd_opt(2024, 6, 1),
        }
    )]
    fn test_parse_filter(#[case] expression: &str, #[case] field: &str, #[case] expected: Predicate) {
        let schema = EntityKind::Contracts.schema();
        let (parsed_field, predicate) = schema.parse_filter(expression).unwrap();
        assert_eq!(parsed_field, field);
        assert_eq!(predicate, expected);
    }

    #[rstest]
    #[case::no_operator("amount")]
    #[case::unknown_field("salary=10")]
    #[case::bad_number("amount>=lots")]
    #[case::text_range("client_name=a..b")]
    #[case::bad_bool("signed=perhaps")]
    #[case::empty_field("=10")]
    fn test_parse_filter_errors(#[case] expression: &str) {
        let schema = EntityKind::Contracts.schema();
        assert!(schema.parse_filter(expression).is_err());
    }

    #[test]
    fn test_build_filters_merges_bounds() {
        let schema = EntityKind::Contracts.schema();
        let spec = schema
            .build_filters(
                Some("ana"),
                &["amount>=100".to_string(), "amount<=200".to_string()],
            )
            .unwrap();

        assert_eq!(spec.search.as_deref(), Some("ana"));
        assert_eq!(
            spec.predicates.get("amount"),
            Some(&Predicate::Range {
                min: Some(Decimal::new(100, 0)),
                max: Some(Decimal::new(200, 0)),
            })
        );
    }

    #[test]
    fn test_validate_rejects_unknown_sort_field() {
        let schema = EntityKind::Users.schema();
        let sort = SortSpec::asc("salary");
        assert!(matches!(
            schema.validate(&FilterSpec::new(), Some(&sort)),
            Err(DashboardError::UnknownField { .. })
        ));
        assert!(schema
            .validate(&FilterSpec::new(), Some(&SortSpec::asc(GENDER_GROUP)))
            .is_ok());
    }
}
