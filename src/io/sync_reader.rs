//! Synchronous record reader with iterator interface
//!
//! Provides a streaming iterator over records in a CSV export, plus a
//! [`read_collection`] entry point that also understands JSON envelopes.
//!
//! # Error Handling
//!
//! - Fatal errors (file not found, unreadable header) are returned from `new()`
//! - Structural row errors are yielded as `Err` items, with their line number
//! - Malformed values inside a row are not errors; they stay text

use crate::core::entities::EntityKind;
use crate::io::csv_format::convert_csv_row;
use crate::io::json_format::parse_list_envelope;
use crate::types::{Collection, DashboardError, Record};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs::File;
use std::path::Path;
use tracing::warn;

/// Synchronous CSV reader
///
/// Yields one [`Record`] per data row, keyed by the header row.
#[derive(Debug)]
pub struct SyncReader {
    reader: csv::Reader<File>,
    headers: StringRecord,
    row: StringRecord,
}

impl SyncReader {
    /// Open a CSV file and read its header row
    ///
    /// The reader trims whitespace from every field and accepts rows with a
    /// varying number of fields.
    ///
    /// # Errors
    ///
    /// * `FileNotFound` if the path does not exist
    /// * `IoError` / `ParseError` if the header row cannot be read
    pub fn new(path: &Path) -> Result<Self, DashboardError> {
        let file = File::open(path).map_err(|_| DashboardError::FileNotFound {
            path: path.display().to_string(),
        })?;

        let mut reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .buffer_capacity(8 * 1024)
            .from_reader(file);
        let headers = reader.headers()?.clone();

        Ok(Self {
            reader,
            headers,
            row: StringRecord::new(),
        })
    }

    /// Column names in file order
    pub fn columns(&self) -> Vec<String> {
        self.headers.iter().map(str::to_string).collect()
    }
}

impl Iterator for SyncReader {
    type Item = Result<Record, DashboardError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.read_record(&mut self.row) {
            Ok(true) => Some(Ok(convert_csv_row(&self.headers, &self.row))),
            Ok(false) => None,
            Err(e) => Some(Err(e.into())),
        }
    }
}

/// Load every record of `kind` from a `.json` envelope or a CSV export
///
/// The format is picked by file extension; anything other than `.json` is
/// read as CSV. Unreadable CSV rows are logged and skipped.
pub fn read_collection(path: &Path, kind: EntityKind) -> Result<Collection, DashboardError> {
    if is_json(path) {
        let body = std::fs::read_to_string(path).map_err(|_| DashboardError::FileNotFound {
            path: path.display().to_string(),
        })?;
        return parse_list_envelope(kind, &body);
    }

    let reader = SyncReader::new(path)?;
    let header = reader.columns();
    let mut records = Vec::new();
    for result in reader {
        match result {
            Ok(record) => records.push(record),
            Err(e) => warn!(entity = %kind, error = %e, "skipping unreadable row"),
        }
    }

    Ok(Collection::with_header(header, records))
}

pub(crate) fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Value;
    use std::io::Write;
    use tempfile::{Builder, NamedTempFile};

    fn create_temp_file(content: &str, suffix: &str) -> NamedTempFile {
        let mut file = Builder::new()
            .suffix(suffix)
            .tempfile()
            .expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    #[test]
    fn test_sync_reader_iterates_rows() {
        let file = create_temp_file("id,name,capital\n1,Ana,€50.000\n2,Bob,\n", ".csv");

        let records: Vec<_> = SyncReader::new(file.path()).unwrap().collect();
        assert_eq!(records.len(), 2);

        let bob = records[1].as_ref().unwrap();
        assert_eq!(bob.get("name"), Some(&Value::from("Bob")));
        assert_eq!(bob.get("capital"), Some(&Value::Null));
    }

    #[test]
    fn test_sync_reader_trims_whitespace() {
        let file = create_temp_file("id , name\n  1 ,  Ana  \n", ".csv");

        let records: Vec<_> = SyncReader::new(file.path()).unwrap().collect();
        let ana = records[0].as_ref().unwrap();
        assert_eq!(ana.get("name"), Some(&Value::from("Ana")));
    }

    #[test]
    fn test_sync_reader_fails_on_missing_file() {
        let result = SyncReader::new(Path::new("nonexistent.csv"));
        assert!(matches!(result, Err(DashboardError::FileNotFound { .. })));
    }

    #[test]
    fn test_read_collection_csv_keeps_header_columns_when_empty() {
        let file = create_temp_file("id,name,email\n", ".csv");

        let collection = read_collection(file.path(), EntityKind::Users).unwrap();
        assert!(collection.is_empty());
        assert_eq!(collection.columns, vec!["id", "name", "email"]);
    }

    #[test]
    fn test_read_collection_json_envelope() {
        let file = create_temp_file(
            r#"{"clients": [{"id": 1, "name": "Ana", "amount": "€10.000"}]}"#,
            ".json",
        );

        let collection = read_collection(file.path(), EntityKind::PartnerClients).unwrap();
        assert_eq!(collection.len(), 1);
        assert_eq!(
            collection.records[0].get("amount"),
            Some(&Value::from("€10.000"))
        );
    }

    #[test]
    fn test_read_collection_json_wrong_envelope() {
        let file = create_temp_file(r#"{"users": []}"#, ".json");

        let result = read_collection(file.path(), EntityKind::Kyc);
        assert!(matches!(result, Err(DashboardError::InvalidEnvelope { .. })));
    }
}
