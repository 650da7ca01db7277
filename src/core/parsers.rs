//! Primitive value parsers
//!
//! Records arrive with amounts, percentages and dates as localized strings
//! (`"€50.000"`, `"9,00%"`, `"01/06/2024"`). These helpers turn them into
//! comparable values.
//!
//! None of them fail loudly: malformed input yields `None`, which the query
//! engine treats as failing any non-trivial range predicate and sorts as zero
//! (numbers) or earliest (dates). One dirty record must never break a view.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::types::{FieldKind, Value};

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y"];

const DATE_TIME_FORMATS: [&str; 5] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%d/%m/%Y, %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
];

/// Parse a plain decimal number (`"60000"`, `"12.5"`)
pub fn parse_number(input: &str) -> Option<Decimal> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    Decimal::from_str(trimmed).ok()
}

/// Parse a localized money amount
///
/// Currency symbols, codes and whitespace are stripped. Separator rules:
/// - both `.` and `,` present: the last one is the decimal separator
/// - only `.`: thousands separator if repeated or followed by exactly three
///   digits (`"€50.000"`), decimal point otherwise (`"12.5"`)
/// - only `,`: thousands separator if repeated or followed by exactly three
///   digits (`"$1,234"`), decimal comma otherwise (`"12,5"`)
pub fn parse_currency(input: &str) -> Option<Decimal> {
    let cleaned: String = input
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-'))
        .collect();

    let (negative, digits) = match cleaned.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, cleaned.as_str()),
    };

    if digits.contains('-') || !digits.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let normalized = normalize_separators(digits)?;
    let amount = Decimal::from_str(&normalized).ok()?;

    Some(if negative { -amount } else { amount })
}

fn normalize_separators(digits: &str) -> Option<String> {
    match (digits.rfind('.'), digits.rfind(',')) {
        (Some(dot), Some(comma)) => {
            let (decimal, thousands) = if dot > comma { ('.', ',') } else { (',', '.') };
            if digits.matches(decimal).count() > 1 {
                return None;
            }
            Some(digits.replace(thousands, "").replace(decimal, "."))
        }
        (Some(dot), None) => {
            let repeated = digits.matches('.').count() > 1;
            let grouped = digits.len() - dot - 1 == 3;
            if repeated || grouped {
                Some(digits.replace('.', ""))
            } else {
                Some(digits.to_string())
            }
        }
        (None, Some(comma)) => {
            let repeated = digits.matches(',').count() > 1;
            let grouped = digits.len() - comma - 1 == 3;
            if repeated || grouped {
                Some(digits.replace(',', ""))
            } else {
                Some(digits.replace(',', "."))
            }
        }
        (None, None) => Some(digits.to_string()),
    }
}

/// Parse a localized percentage (`"9,00%"` → 9.00)
pub fn parse_percent(input: &str) -> Option<Decimal> {
    let cleaned: String = input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '%')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    parse_number(&cleaned)
}

/// Parse an ISO or day-first localized date / date-time
///
/// Date-only inputs resolve to midnight. Inputs with an offset are converted
/// to UTC.
pub fn parse_date(input: &str) -> Option<NaiveDateTime> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(with_offset) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(with_offset.naive_utc());
    }

    DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
                .map(|date| date.and_time(NaiveTime::MIN))
        })
}

/// Parse a calendar day (used for filter bounds)
pub fn parse_day(input: &str) -> Option<NaiveDate> {
    parse_date(input).map(|moment| moment.date())
}

/// Parse a boolean flag in English or Portuguese
pub fn parse_bool(input: &str) -> Option<bool> {
    match input.trim().to_lowercase().as_str() {
        "true" | "yes" | "y" | "sim" | "s" | "1" => Some(true),
        "false" | "no" | "n" | "não" | "nao" | "0" => Some(false),
        _ => None,
    }
}

/// Read a record value as a number, according to its field kind
pub fn number_of(value: &Value, kind: FieldKind) -> Option<Decimal> {
    match value {
        Value::Number(number) => Some(*number),
        Value::Text(text) => match kind {
            FieldKind::Currency => parse_currency(text),
            FieldKind::Percent => parse_percent(text),
            _ => parse_number(text).or_else(|| parse_currency(text)),
        },
        Value::Bool(_) | Value::Null => None,
    }
}

/// Read a record value as a point in time
pub fn date_of(value: &Value) -> Option<NaiveDateTime> {
    value.as_text().and_then(parse_date)
}

/// Read a record value as a boolean
pub fn bool_of(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(flag) => Some(*flag),
        Value::Text(text) => parse_bool(text),
        Value::Number(number) => Some(!number.is_zero()),
        Value::Null => None,
    }
}
