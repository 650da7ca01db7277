//! Asynchronous loading of dashboard data
//!
//! This module provides the concurrent side of the dashboard: a thread-safe
//! in-memory record source and the loader that fetches, caches and mutates
//! entity collections through any [`RecordSource`](crate::core::traits::RecordSource).
//!
//! # Architecture
//!
//! ```text
//! DashboardLoader<S: RecordSource>
//!     ├── Arc<S>                          (MemorySource, or any API client)
//!     ├── DashMap<EntityKind, cached>     (latest applied collection)
//!     └── DashMap<EntityKind, token>      (latest issued request)
//! ```
//!
//! # Thread Safety
//!
//! All state lives in `DashMap`s, so work on different entities proceeds in
//! parallel and no lock is held across an await point.

pub mod loader;
pub mod memory_source;

pub use loader::{DashboardLoader, LoaderConfig, RefreshOutcome};
pub use memory_source::{MemorySource, DEFAULT_SEED_BATCH_SIZE};
