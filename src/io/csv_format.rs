//! CSV format handling for records and dashboard outputs
//!
//! This module centralizes all CSV format concerns, providing:
//! - Conversion from CSV rows to [`Record`]s
//! - Record output in the input column order
//! - Summary, KPI, projection and simulation output
//!
//! All functions are pure apart from writing to the supplied writer.

use rust_decimal::Decimal;
use std::io::Write;

use crate::core::projection::ProjectionPoint;
use crate::core::summary::Summary;
use crate::types::{DashboardError, Record, Value};

/// Convert one CSV row into a record
///
/// Works for both `csv` and `csv-async` string records. Empty cells become
/// [`Value::Null`]; every other cell stays text and is interpreted later by
/// field kind. Missing trailing cells are simply absent.
pub fn convert_csv_row<'a>(
    headers: impl IntoIterator<Item = &'a str>,
    cells: impl IntoIterator<Item = &'a str>,
) -> Record {
    headers
        .into_iter()
        .zip(cells)
        .map(|(header, cell)| {
            let value = if cell.trim().is_empty() {
                Value::Null
            } else {
                Value::Text(cell.to_string())
            };
            (header.to_string(), value)
        })
        .collect()
}

/// Write rows under a header line
pub fn write_rows_csv<I>(
    header: &[&str],
    rows: I,
    output: &mut dyn Write,
) -> Result<(), DashboardError>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut writer = csv::Writer::from_writer(output);
    writer.write_record(header)?;
    for row in rows {
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write records with the given columns, in record order
///
/// Fields missing from a record are written as empty cells.
pub fn write_records_csv(
    columns: &[String],
    records: &[Record],
    output: &mut dyn Write,
) -> Result<(), DashboardError> {
    let header: Vec<&str> = columns.iter().map(String::as_str).collect();
    let rows = records.iter().map(|record| {
        columns
            .iter()
            .map(|column| record.get(column).map(Value::to_string).unwrap_or_default())
            .collect()
    });
    write_rows_csv(&header, rows, output)
}

/// Write a distribution summary as `label,count,color`
///
/// Records without a group value get an explicit `(unassigned)` row so the
/// counts always add up to the input size.
pub fn write_summary_csv(summary: &Summary, output: &mut dyn Write) -> Result<(), DashboardError> {
    let mut rows: Vec<Vec<String>> = summary
        .groups
        .iter()
        .map(|group| vec![group.label.clone(), group.count.to_string(), group.color.clone()])
        .collect();
    if summary.unassigned > 0 {
        rows.push(vec![
            "(unassigned)".to_string(),
            summary.unassigned.to_string(),
            String::new(),
        ]);
    }
    write_rows_csv(&["label", "count", "color"], rows, output)
}

/// Write KPI values as `kpi,value`; undefined values are empty
pub fn write_kpis_csv(
    values: &[(&str, Option<Decimal>)],
    output: &mut dyn Write,
) -> Result<(), DashboardError> {
    let rows = values.iter().map(|(name, value)| {
        vec![
            name.to_string(),
            value.map(|v| v.normalize().to_string()).unwrap_or_default(),
        ]
    });
    write_rows_csv(&["kpi", "value"], rows, output)
}

/// Write a projection as `month,balance,interest_earned` with cents
pub fn write_projection_csv(
    points: &[ProjectionPoint],
    output: &mut dyn Write,
) -> Result<(), DashboardError> {
    let rows = points.iter().map(|point| {
        vec![
            point.month.to_string(),
            format!("{:.2}", point.balance),
            format!("{:.2}", point.interest_earned),
        ]
    });
    write_rows_csv(&["month", "balance", "interest_earned"], rows, output)
}
