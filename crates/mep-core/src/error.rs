//! Unified error types for the MEP survey toolkit
//!
//! This module provides a common error type [`MepError`] shared by the code
//! calculators, the survey workflow and the project stores. Calculator input
//! problems come back as [`MepError::InvalidInput`] so callers can show them
//! inline; hierarchy-integrity problems are never errors and live in
//! [`crate::diagnostics::HierarchyReport`] instead.
//!
//! # Example
//!
//! ```
//! use mep_core::{validate_wire_size, MepError, MepResult};
//!
//! fn check_feeder() -> MepResult<bool> {
//!     let check = validate_wire_size("3/0 AWG", 200.0, false)?;
//!     Ok(check.valid)
//! }
//!
//! assert!(check_feeder().unwrap());
//! assert!(matches!(
//!     validate_wire_size("13 AWG", 20.0, false),
//!     Err(MepError::InvalidInput(_))
//! ));
//! ```

use std::collections::BTreeMap;
use thiserror::Error;

/// Unified error type for all survey operations.
#[derive(Error, Debug)]
pub enum MepError {
    /// I/O errors (file access, project store directory, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing/deserialization errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// Missing, zero or unknown calculator input (gauge label, conduit size, amperage)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A stage was asked to run with nothing to work on (no uploaded images)
    #[error("Empty input: {0}")]
    EmptyInput(String),

    /// Every classified image was skipped, so there is nothing to survey
    #[error("No valid equipment: {0}")]
    NoValidEquipment(String),

    /// Workflow asked to move between stages that are not connected
    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    /// Required user-supplied fields are missing or malformed, keyed by field name
    #[error("Field validation failed: {}", format_fields(.0))]
    FieldValidation(BTreeMap<String, String>),

    /// Save attempted while error-severity issues remain
    #[error("Save blocked by {0} hierarchy error(s)")]
    SaveBlocked(usize),

    /// Classification/extraction collaborator failures
    #[error("Service error: {0}")]
    Service(String),

    /// Project repository failures
    #[error("Store error: {0}")]
    Store(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic errors (for wrapping external errors)
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Results using MepError.
pub type MepResult<T> = Result<T, MepError>;

fn format_fields(fields: &BTreeMap<String, String>) -> String {
    fields
        .iter()
        .map(|(field, message)| format!("{field}: {message}"))
        .collect::<Vec<_>>()
        .join("; ")
}

impl MepError {
    /// Per-field messages when this is a [`MepError::FieldValidation`].
    pub fn field_errors(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            MepError::FieldValidation(fields) => Some(fields),
            _ => None,
        }
    }
}

// Conversion from anyhow::Error
impl From<anyhow::Error> for MepError {
    fn from(err: anyhow::Error) -> Self {
        MepError::Other(err.to_string())
    }
}

// Conversion from string-like types for convenience
impl From<String> for MepError {
    fn from(s: String) -> Self {
        MepError::Other(s)
    }
}

impl From<&str> for MepError {
    fn from(s: &str) -> Self {
        MepError::Other(s.to_string())
    }
}

// JSON parsing errors
impl From<serde_json::Error> for MepError {
    fn from(err: serde_json::Error) -> Self {
        MepError::Parse(err.to_string())
    }
}
