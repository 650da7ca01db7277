//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `value`: Field values, records and collections
//! - `query`: Filter and sort descriptions
//! - `progress`: Deposit/withdrawal flows, stages and triggers
//! - `error`: Error types for the dashboard

pub mod error;
pub mod progress;
pub mod query;
pub mod value;

pub use error::DashboardError;
pub use progress::{FlowKind, PaymentMethod, Stage, Trigger};
pub use query::{FieldKind, FilterSpec, Predicate, SortDirection, SortSpec};
pub use value::{Collection, Record, Value};
