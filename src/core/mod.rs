//! Core business logic module
//!
//! This module contains the dashboard's domain components:
//! - `traits` - Seams for derived fields and record sources
//! - `parsers` - Lenient number, currency, percent, date and flag parsing
//! - `entities` - Per-entity field tables and filter expression parsing
//! - `derive` - Derived fields (gender group)
//! - `engine` - Generic filter/sort query engine
//! - `summary` - Distribution summaries for charts
//! - `kpi` - KPI expressions and the standard catalog
//! - `projection` - Compound-interest projection
//! - `gate` - Precondition AND-gate for deposits and withdrawals
//! - `progress` - Linear deposit/withdrawal progress tracking
//! - `async` - Concurrent loading, caching and mutation

pub mod r#async;
pub mod derive;
pub mod engine;
pub mod entities;
pub mod gate;
pub mod kpi;
pub mod parsers;
pub mod progress;
pub mod projection;
pub mod summary;
pub mod traits;

pub use engine::QueryEngine;
pub use entities::{EntityKind, EntitySchema};
pub use gate::{Precondition, PreconditionGate};
pub use kpi::{standard_catalog, Kpi, KpiExpr, Reducer};
pub use progress::{ProgressTracker, SimulationSession, Transition};
pub use projection::{project, ProjectionPoint};
pub use r#async::{DashboardLoader, LoaderConfig, MemorySource, RefreshOutcome};
pub use summary::{summarize, GroupCount, Summary};
pub use traits::{FieldDeriver, Mutation, RecordSource};
