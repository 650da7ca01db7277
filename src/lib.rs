//! Deposit Dashboard Library
//! # Overview
//!
//! The data core of a fixed-income deposit dashboard: querying entity
//! collections, summarizing them into KPIs and chart distributions, and
//! simulating the deposit and withdrawal lifecycle.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (Record, Value, FilterSpec, flows, errors)
//! - [`cli`] - CLI arguments parsing
//! - [`app`] - Command dispatch
//! - [`core`] - Business logic components:
//!   - [`core::engine`] - Generic filter/sort query engine
//!   - [`core::entities`] - Per-entity field tables
//!   - [`core::summary`] and [`core::kpi`] - Aggregations
//!   - [`core::progress`] and [`core::gate`] - Deposit/withdrawal simulation
//!   - [`core::r#async`] - Concurrent loading with stale-response protection
//! - [`io`] - CSV and JSON input and output
//! - [`strategy`] - Pluggable sync/async loading strategies
//!
//! # Entities
//!
//! - **Users**: clients of the platform, with a derived gender group
//! - **KYC**: identity verification submissions
//! - **Products**: deposit products and their rates
//! - **Contracts**: signed deposits
//! - **Partner clients**: clients referred by a partner
//!
//! Records are schemaless field → value maps; localized amounts such as
//! `"€50.000"` or `"R$ 1.500,00"` are interpreted only when a query needs a
//! number.

// Module declarations
pub mod app;
pub mod cli;
pub mod core;
pub mod io;
pub mod strategy;
pub mod types;

pub use core::{EntityKind, QueryEngine, SimulationSession};
pub use io::{write_list_envelope, write_records_csv};
pub use types::{Collection, DashboardError, FilterSpec, Predicate, Record, SortSpec, Value};
