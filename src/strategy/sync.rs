//! Synchronous loading strategy
//!
//! Streams a CSV export row by row through [`SyncReader`], or parses a JSON
//! envelope, on the calling thread.

use crate::core::entities::EntityKind;
use crate::io::sync_reader::read_collection;
use crate::strategy::LoadStrategy;
use crate::types::{Collection, DashboardError};
use std::path::Path;

/// Synchronous loading strategy
///
/// # Examples
///
/// ```no_run
/// use deposit_dashboard::core::EntityKind;
/// use deposit_dashboard::strategy::{LoadStrategy, SyncLoadStrategy};
/// use std::path::Path;
///
/// let users = SyncLoadStrategy
///     .load(Path::new("users.csv"), EntityKind::Users)
///     .expect("Loading failed");
/// println!("{} users", users.len());
/// ```
///
/// [`SyncReader`]: crate::io::SyncReader
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncLoadStrategy;

impl LoadStrategy for SyncLoadStrategy {
    fn load(&self, input_path: &Path, kind: EntityKind) -> Result<Collection, DashboardError> {
        read_collection(input_path, kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Value;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_sync_strategy_loads_csv() {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(b"id,name,capital\n1,Ana,\"R$ 1.500,00\"\n")
            .expect("Failed to write to temp file");

        let collection = SyncLoadStrategy.load(file.path(), EntityKind::Users).unwrap();
        assert_eq!(collection.len(), 1);
        assert_eq!(
            collection.records[0].get("capital"),
            Some(&Value::from("R$ 1.500,00"))
        );
    }

    #[test]
    fn test_sync_strategy_missing_file() {
        let result = SyncLoadStrategy.load(Path::new("nonexistent.csv"), EntityKind::Users);
        assert!(matches!(result, Err(DashboardError::FileNotFound { .. })));
    }
}
