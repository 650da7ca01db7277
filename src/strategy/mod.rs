//! Loading strategy module
//!
//! This module defines the Strategy pattern for reading an entity export from
//! disk. Different loading implementations (synchronous streaming,
//! asynchronous batches) can be selected at runtime; both produce the same
//! [`Collection`].

use crate::cli::StrategyType;
use crate::core::entities::EntityKind;
use crate::types::{Collection, DashboardError};
use std::path::Path;

pub mod r#async;
pub mod sync;

pub use self::r#async::{AsyncLoadStrategy, BatchConfig};
pub use sync::SyncLoadStrategy;

/// Loading strategy trait
///
/// Implementations read a `.json` list envelope or a CSV export and return
/// every record of `kind` it contains.
pub trait LoadStrategy: Send + Sync {
    /// Load the collection stored at `input_path`
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The input file cannot be opened
    /// - A JSON envelope is malformed or keyed for another entity
    /// - A CSV header row cannot be read
    ///
    /// Individual unreadable CSV rows are logged and skipped.
    fn load(&self, input_path: &Path, kind: EntityKind) -> Result<Collection, DashboardError>;
}

/// Create a loading strategy based on the specified strategy type
///
/// # Arguments
///
/// * `strategy_type` - The type of loading strategy to create (Sync or Async)
/// * `config` - Optional batch configuration (ignored for sync)
pub fn create_strategy(
    strategy_type: StrategyType,
    config: Option<BatchConfig>,
) -> Box<dyn LoadStrategy> {
    match strategy_type {
        StrategyType::Sync => Box::new(SyncLoadStrategy),
        StrategyType::Async => Box::new(AsyncLoadStrategy::new(config.unwrap_or_default())),
    }
}
