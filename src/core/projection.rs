//! Compound-interest projection for the deposit simulator
//!
//! Monthly compounding of an annual nominal rate. Balances are rounded to
//! cents (half away from zero) at every step, the way the statement shows them.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

/// Balance at the end of one month
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectionPoint {
    pub month: u32,
    pub balance: Decimal,
    /// Interest accumulated since month 0
    pub interest_earned: Decimal,
}

const MONTHS_PER_YEAR: Decimal = Decimal::from_parts(12, 0, 0, false, 0);

fn cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Project `principal` over `months` at `annual_rate_percent`
///
/// The first point is month 0 (the principal itself), so the result always
/// has `months + 1` points.
pub fn project(principal: Decimal, annual_rate_percent: Decimal, months: u32) -> Vec<ProjectionPoint> {
    let principal = cents(principal);
    let monthly_rate = annual_rate_percent / Decimal::ONE_HUNDRED / MONTHS_PER_YEAR;

    let mut balance = principal;
    let mut points = Vec::with_capacity(months as usize + 1);
    points.push(ProjectionPoint {
        month: 0,
        balance,
        interest_earned: Decimal::ZERO,
    });

    for month in 1..=months {
        balance = cents(balance + balance * monthly_rate);
        points.push(ProjectionPoint {
            month,
            balance,
            interest_earned: balance - principal,
        });
    }

    points
}
