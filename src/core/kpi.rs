//! KPI reductions
//!
//! Every KPI on the admin and partner dashboards is a reduction (count, sum,
//! average) over a filtered subset of one collection, or a ratio of two such
//! reductions. They are described as data ([`KpiExpr`]) and evaluated through
//! the [`QueryEngine`], so no KPI needs bespoke filtering code.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use crate::core::engine::QueryEngine;
use crate::core::entities::EntityKind;
use crate::core::parsers::number_of;
use crate::types::{FilterSpec, Predicate, Record};

/// How a filtered subset is reduced to a number
#[derive(Debug, Clone, PartialEq)]
pub enum Reducer {
    Count,
    /// Sum of a numeric field; unparseable values count as zero
    Sum(String),
    /// Mean of the parseable values of a numeric field
    Average(String),
}

/// A KPI formula
#[derive(Debug, Clone, PartialEq)]
pub enum KpiExpr {
    /// Reduce the records matching `filter`
    Reduce { filter: FilterSpec, reducer: Reducer },
    /// Sum of several expressions
    Total(Vec<KpiExpr>),
    /// `numerator / denominator`
    Ratio {
        numerator: Box<KpiExpr>,
        denominator: Box<KpiExpr>,
    },
    /// `numerator / denominator * 100`
    Percentage {
        numerator: Box<KpiExpr>,
        denominator: Box<KpiExpr>,
    },
    /// `(current - previous) / previous * 100`
    Growth {
        current: Box<KpiExpr>,
        previous: Box<KpiExpr>,
    },
}

impl KpiExpr {
    pub fn reduce(filter: FilterSpec, reducer: Reducer) -> Self {
        KpiExpr::Reduce { filter, reducer }
    }

    pub fn count(filter: FilterSpec) -> Self {
        KpiExpr::reduce(filter, Reducer::Count)
    }

    pub fn sum(filter: FilterSpec, field: &str) -> Self {
        KpiExpr::reduce(filter, Reducer::Sum(field.to_string()))
    }

    pub fn percentage(numerator: KpiExpr, denominator: KpiExpr) -> Self {
        KpiExpr::Percentage {
            numerator: Box::new(numerator),
            denominator: Box::new(denominator),
        }
    }

    /// Evaluate against one collection
    ///
    /// Returns `None` when the value is undefined: a division by zero, or an
    /// average over no parseable values.
    pub fn evaluate(&self, engine: &QueryEngine, records: &[Record]) -> Option<Decimal> {
        match self {
            KpiExpr::Reduce { filter, reducer } => {
                let subset = engine.query(records, filter, None);
                reduce(engine, &subset, reducer)
            }
            KpiExpr::Total(parts) => parts
                .iter()
                .map(|part| part.evaluate(engine, records))
                .sum(),
            KpiExpr::Ratio {
                numerator,
                denominator,
            } => divide(
                numerator.evaluate(engine, records)?,
                denominator.evaluate(engine, records)?,
            ),
            KpiExpr::Percentage {
                numerator,
                denominator,
            } => divide(
                numerator.evaluate(engine, records)?,
                denominator.evaluate(engine, records)?,
            )
            .map(|ratio| ratio * Decimal::ONE_HUNDRED),
            KpiExpr::Growth { current, previous } => {
                let current = current.evaluate(engine, records)?;
                let previous = previous.evaluate(engine, records)?;
                divide(current - previous, previous).map(|ratio| ratio * Decimal::ONE_HUNDRED)
            }
        }
    }
}

fn divide(numerator: Decimal, denominator: Decimal) -> Option<Decimal> {
    if denominator.is_zero() {
        None
    } else {
        numerator.checked_div(denominator)
    }
}

fn reduce(engine: &QueryEngine, subset: &[Record], reducer: &Reducer) -> Option<Decimal> {
    match reducer {
        Reducer::Count => Some(Decimal::from(subset.len())),
        Reducer::Sum(field) => {
            let kind = engine.schema().kind_of(field);
            Some(
                subset
                    .iter()
                    .filter_map(|record| record.get(field).and_then(|value| number_of(value, kind)))
                    .sum(),
            )
        }
        Reducer::Average(field) => {
            let kind = engine.schema().kind_of(field);
            let values: Vec<Decimal> = subset
                .iter()
                .filter_map(|record| record.get(field).and_then(|value| number_of(value, kind)))
                .collect();
            divide(values.iter().copied().sum(), Decimal::from(values.len()))
        }
    }
}

/// A named KPI bound to the collection it is computed from
#[derive(Debug, Clone, PartialEq)]
pub struct Kpi {
    pub name: &'static str,
    pub entity: EntityKind,
    pub expr: KpiExpr,
}

impl Kpi {
    /// Evaluate and round to two decimal places
    pub fn evaluate(&self, records: &[Record]) -> Option<Decimal> {
        let engine = QueryEngine::for_entity(self.entity);
        self.expr
            .evaluate(&engine, records)
            .map(|value| value.round_dp(2))
    }
}

/// First and last day of the month containing `day`
pub fn month_window(day: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first = day.with_day(1).unwrap_or(day);
    let next_first = if first.month() == 12 {
        NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
    };
    let last = next_first.and_then(|next| next.pred_opt()).unwrap_or(first);
    (first, last)
}

fn in_window(field: &str, window: (NaiveDate, NaiveDate)) -> FilterSpec {
    FilterSpec::new().with(
        field,
        Predicate::DateRange {
            from: Some(window.0),
            to: Some(window.1),
        },
    )
}

fn status(field: &str, value: &str) -> FilterSpec {
    FilterSpec::new().with(field, Predicate::Exact(value.to_string()))
}

/// The KPIs shown on the admin dashboard, relative to `as_of`
pub fn standard_catalog(as_of: NaiveDate) -> Vec<Kpi> {
    let this_month = month_window(as_of);
    let previous_month = month_window(this_month.0.pred_opt().unwrap_or(this_month.0));

    let active_contracts = status("status", "active");

    vec![
        Kpi {
            name: "total_users",
            entity: EntityKind::Users,
            expr: KpiExpr::count(FilterSpec::new()),
        },
        Kpi {
            name: "total_capital",
            entity: EntityKind::Contracts,
            expr: KpiExpr::sum(active_contracts.clone(), "amount"),
        },
        Kpi {
            name: "active_contracts",
            entity: EntityKind::Contracts,
            expr: KpiExpr::count(active_contracts.clone()),
        },
        Kpi {
            name: "new_contracts_this_month",
            entity: EntityKind::Contracts,
            expr: KpiExpr::count(in_window("start_date", this_month)),
        },
        Kpi {
            name: "capital_growth_pct",
            entity: EntityKind::Contracts,
            expr: KpiExpr::Growth {
                current: Box::new(KpiExpr::sum(in_window("start_date", this_month), "amount")),
                previous: Box::new(KpiExpr::sum(in_window("start_date", previous_month), "amount")),
            },
        },
        Kpi {
            name: "retention_rate_pct",
            entity: EntityKind::Contracts,
            expr: KpiExpr::percentage(
                KpiExpr::count(active_contracts),
                KpiExpr::count(FilterSpec::new()),
            ),
        },
        Kpi {
            name: "pending_kyc",
            entity: EntityKind::Kyc,
            expr: KpiExpr::count(status("status", "pending")),
        },
        // Denominator excludes approved submissions, matching the figure the
        // dashboard has always shown.
        Kpi {
            name: "kyc_rejected_pct",
            entity: EntityKind::Kyc,
            expr: KpiExpr::percentage(
                KpiExpr::count(status("status", "rejected")),
                KpiExpr::Total(vec![
                    KpiExpr::count(status("status", "pending")),
                    KpiExpr::count(status("status", "rejected")),
                ]),
            ),
        },
        Kpi {
            name: "average_product_rate",
            entity: EntityKind::Products,
            expr: KpiExpr::reduce(
                FilterSpec::new().with("active", Predicate::Bool(true)),
                Reducer::Average("rate".to_string()),
            ),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn contract(id: i64, amount: &str, status: &str, start: &str) -> Record {
        Record::new()
            .with("id", id)
            .with("amount", amount)
            .with("status", status)
            .with("start_date", start)
    }

    fn contracts() -> Vec<Record> {
        vec![
            contract(1, "€50.000", "active", "2024-06-03"),
            contract(2, "€25.000", "active", "2024-05-20"),
            contract(3, "€10.000", "cancelled", "2024-06-10"),
            contract(4, "€15.000", "active", "2024-04-01"),
        ]
    }

    fn kpi(name: &str) -> Kpi {
        let as_of = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        standard_catalog(as_of)
            .into_iter()
            .find(|kpi| kpi.name == name)
            .unwrap()
    }

    #[rstest]
    #[case::total_capital("total_capital", Some(Decimal::new(90000, 0)))]
    #[case::active_contracts("active_contracts", Some(Decimal::new(3, 0)))]
    #[case::new_this_month("new_contracts_this_month", Some(Decimal::new(2, 0)))]
    #[case::growth("capital_growth_pct", Some(Decimal::new(140, 0)))]
    #[case::retention("retention_rate_pct", Some(Decimal::new(75, 0)))]
    fn test_contract_kpis(#[case] name: &str, #[case] expected: Option<Decimal>) {
        assert_eq!(kpi(name).evaluate(&contracts()), expected);
    }

    #[test]
    fn test_kyc_rejected_percentage_excludes_approved() {
        let records: Vec<Record> = ["pending", "rejected", "approved", "approved", "pending"]
            .into_iter()
            .map(|status| Record::new().with("status", status))
            .collect();

        // 1 rejected / (2 pending + 1 rejected)
        assert_eq!(
            kpi("kyc_rejected_pct").evaluate(&records),
            Some(Decimal::new(3333, 2))
        );
    }

    #[test]
    fn test_ratio_with_zero_denominator_is_undefined() {
        assert_eq!(kpi("retention_rate_pct").evaluate(&[]), None);
        assert_eq!(kpi("kyc_rejected_pct").evaluate(&[]), None);
    }

    #[test]
    fn test_average_skips_unparseable_values() {
        let records = vec![
            Record::new().with("rate", "4,00%").with("active", true),
            Record::new().with("rate", "9,00%").with("active", true),
            Record::new().with("rate", "soon").with("active", true),
            Record::new().with("rate", "20%").with("active", false),
        ];
        assert_eq!(
            kpi("average_product_rate").evaluate(&records),
            Some(Decimal::new(650, 2))
        );
    }

    #[rstest]
    #[case::mid_year(2024, 6, 15, (2024, 6, 1), (2024, 6, 30))]
    #[case::leap_february(2024, 2, 10, (2024, 2, 1), (2024, 2, 29))]
    #[case::december(2023, 12, 31, (2023, 12, 1), (2023, 12, 31))]
    fn test_month_window(
        #[case] y: i32,
        #[case] m: u32,
        #[case] d: u32,
        #[case] first: (i32, u32, u32),
        #[case] last: (i32, u32, u32),
    ) {
        let day = NaiveDate::from_ymd_opt(y, m, d).unwrap();
        let (start, end) = month_window(day);
        assert_eq!(start, NaiveDate::from_ymd_opt(first.0, first.1, first.2).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(last.0, last.1, last.2).unwrap());
    }
}
