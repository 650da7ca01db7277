//! Error types for the deposit dashboard
//!
//! This module defines all error types that can surface from loading records,
//! building queries, driving simulated flows and talking to the dashboard API.
//!
//! # Error Categories
//!
//! - **File I/O Errors**: File not found, permission denied, etc.
//! - **Parsing Errors**: Malformed CSV, malformed JSON envelopes
//! - **Query Configuration Errors**: Unknown entity, field, filter or sort syntax
//! - **Simulation Errors**: Unknown flows, triggers, preconditions, unavailable actions
//! - **API Errors**: Non-2xx responses, missing records, duplicate mutations
//!
//! Malformed values *inside* a record are never errors: the query engine
//! coerces them to a sentinel and keeps going.

use thiserror::Error;

/// Main error type for the deposit dashboard
///
/// Each variant carries enough context to be shown verbatim to the end user.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DashboardError {
    /// File not found at the specified path
    #[error("File not found: {path}")]
    FileNotFound {
        /// The path that was not found
        path: String,
    },

    /// I/O error occurred while reading or writing files
    #[error("I/O error: {message}")]
    IoError {
        /// Description of the I/O error
        message: String,
    },

    /// CSV or JSON parsing error
    ///
    /// Raised for structural problems only. A row with a broken amount is
    /// still a valid row.
    #[error("Parse error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    ParseError {
        /// Line number where the error occurred (if available)
        line: Option<u64>,
        /// Description of the parsing error
        message: String,
    },

    /// A JSON document did not have the expected `{ <key>: ... }` shape
    #[error("Invalid envelope: expected key '{expected}'")]
    InvalidEnvelope {
        /// The envelope key that was expected
        expected: String,
    },

    /// Entity name not recognised
    #[error("Unknown entity '{name}'")]
    UnknownEntity {
        /// The unrecognised entity name
        name: String,
    },

    /// A filter or sort referenced a field the entity does not define
    #[error("Unknown field '{field}' for entity {entity}")]
    UnknownField {
        /// Entity the field was looked up on
        entity: String,
        /// The unknown field name
        field: String,
    },

    /// Filter expression could not be parsed
    #[error("Invalid filter '{expression}': {reason}")]
    InvalidFilter {
        /// The raw filter expression
        expression: String,
        /// Why it was rejected
        reason: String,
    },

    /// Sort expression could not be parsed
    #[error("Invalid sort '{expression}'")]
    InvalidSort {
        /// The raw sort expression
        expression: String,
    },

    /// Progress trigger name not recognised
    #[error("Unknown trigger '{name}'")]
    UnknownTrigger {
        /// The unrecognised trigger name
        name: String,
    },

    /// Progress flow name not recognised
    #[error("Unknown flow '{name}'")]
    UnknownFlow {
        /// The unrecognised flow name
        name: String,
    },

    /// Precondition name not recognised
    #[error("Unknown precondition '{name}'")]
    UnknownPrecondition {
        /// The unrecognised precondition name
        name: String,
    },

    /// The API answered with a non-2xx status
    ///
    /// `message` is the `error` field of the body when present, the raw body
    /// text otherwise.
    #[error("Request failed with status {status}: {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Message to show to the user
        message: String,
    },

    /// A related record could not be found
    #[error("{entity} '{key}' not found")]
    NotFound {
        /// Entity kind that was searched
        entity: String,
        /// Lookup key (id or name)
        key: String,
    },

    /// A mutation for the same collection is still in flight
    #[error("A {entity} update is already in progress")]
    MutationInFlight {
        /// Entity kind being mutated
        entity: String,
    },

    /// An action was requested while its gate is closed
    #[error("Cannot {action}: {reason}")]
    ActionUnavailable {
        /// The requested action
        action: String,
        /// Why it is not available
        reason: String,
    },
}

// Conversion from io::Error to DashboardError
impl From<std::io::Error> for DashboardError {
    fn from(error: std::io::Error) -> Self {
        DashboardError::IoError {
            message: error.to_string(),
        }
    }
}

// Conversion from csv::Error to DashboardError
impl From<csv::Error> for DashboardError {
    fn from(error: csv::Error) -> Self {
        let line = error.position().map(|pos| pos.line());

        DashboardError::ParseError {
            line,
            message: error.to_string(),
        }
    }
}

impl From<csv_async::Error> for DashboardError {
    fn from(error: csv_async::Error) -> Self {
        DashboardError::ParseError {
            line: None,
            message: error.to_string(),
        }
    }
}

impl From<serde_json::Error> for DashboardError {
    fn from(error: serde_json::Error) -> Self {
        DashboardError::ParseError {
            line: Some(error.line() as u64),
            message: error.to_string(),
        }
    }
}

// Helper functions for creating common errors

impl DashboardError {
    /// Create an UnknownField error
    pub fn unknown_field(entity: &str, field: &str) -> Self {
        DashboardError::UnknownField {
            entity: entity.to_string(),
            field: field.to_string(),
        }
    }

    /// Create an InvalidFilter error
    pub fn invalid_filter(expression: &str, reason: &str) -> Self {
        DashboardError::InvalidFilter {
            expression: expression.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create an InvalidSort error
    pub fn invalid_sort(expression: &str) -> Self {
        DashboardError::InvalidSort {
            expression: expression.to_string(),
        }
    }

    /// Create a NotFound error
    pub fn not_found(entity: &str, key: &str) -> Self {
        DashboardError::NotFound {
            entity: entity.to_string(),
            key: key.to_string(),
        }
    }

    /// Create an ActionUnavailable error
    pub fn action_unavailable(action: &str, reason: &str) -> Self {
        DashboardError::ActionUnavailable {
            action: action.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a MutationInFlight error
    pub fn mutation_in_flight(entity: &str) -> Self {
        DashboardError::MutationInFlight {
            entity: entity.to_string(),
        }
    }
}
