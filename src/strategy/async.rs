//! Asynchronous batch loading strategy
//!
//! Reads an export on a tokio multi-threaded runtime. CSV files are streamed
//! through [`AsyncReader`] in batches of `batch_size` rows; JSON envelopes are
//! read in one go and parsed.
//!
//! # Architecture
//!
//! ```text
//! AsyncLoadStrategy
//!     ├── BatchConfig (batch_size, worker_threads)
//!     ├── tokio runtime (worker_threads)
//!     └── AsyncReader (batch CSV reading over tokio-util compat)
//! ```

use crate::core::entities::EntityKind;
use crate::io::async_reader::AsyncReader;
use crate::io::json_format::parse_list_envelope;
use crate::io::sync_reader::is_json;
use crate::strategy::LoadStrategy;
use crate::types::{Collection, DashboardError};
use std::path::Path;
use tokio::runtime::Runtime;
use tokio_util::compat::TokioAsyncReadCompatExt;
use tracing::{debug, warn};

/// Configuration for batch loading
///
/// Controls how many CSV rows are read per batch and the number of runtime
/// worker threads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatchConfig {
    /// Number of rows per batch
    pub batch_size: usize,
    /// Number of tokio worker threads
    pub worker_threads: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            worker_threads: num_cpus::get(),
        }
    }
}

impl BatchConfig {
    /// Create a new BatchConfig; zero values fall back to the defaults
    pub fn new(batch_size: usize, worker_threads: usize) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            warn!(
                batch_size,
                fallback = default.batch_size,
                "invalid batch_size, using default"
            );
            default.batch_size
        } else {
            batch_size
        };

        let worker_threads = if worker_threads == 0 {
            warn!(
                worker_threads,
                fallback = default.worker_threads,
                "invalid worker_threads, using default"
            );
            default.worker_threads
        } else {
            worker_threads
        };

        Self {
            batch_size,
            worker_threads,
        }
    }

    /// Build a multi-threaded runtime with the configured worker count
    pub fn runtime(&self) -> Result<Runtime, DashboardError> {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.worker_threads.max(1))
            .enable_all()
            .build()
            .map_err(|e| DashboardError::IoError {
                message: format!("Failed to create tokio runtime: {}", e),
            })
    }
}

/// Asynchronous batch loading strategy
#[derive(Debug, Clone)]
pub struct AsyncLoadStrategy {
    config: BatchConfig,
}

impl AsyncLoadStrategy {
    pub fn new(config: BatchConfig) -> Self {
        Self { config }
    }

    /// Load a collection on the current runtime
    pub async fn load_async(
        &self,
        input_path: &Path,
        kind: EntityKind,
    ) -> Result<Collection, DashboardError> {
        let not_found = || DashboardError::FileNotFound {
            path: input_path.display().to_string(),
        };

        if is_json(input_path) {
            let body = tokio::fs::read_to_string(input_path)
                .await
                .map_err(|_| not_found())?;
            return parse_list_envelope(kind, &body);
        }

        let file = tokio::fs::File::open(input_path)
            .await
            .map_err(|_| not_found())?;
        let collection = AsyncReader::new(file.compat())
            .read_all(self.config.batch_size)
            .await?;
        debug!(entity = %kind, records = collection.len(), "loaded export");
        Ok(collection)
    }
}

impl LoadStrategy for AsyncLoadStrategy {
    fn load(&self, input_path: &Path, kind: EntityKind) -> Result<Collection, DashboardError> {
        let runtime = self.config.runtime()?;
        runtime.block_on(self.load_async(input_path, kind))
    }
}
