//! Error types for index computation
//!
//! Every variant names the field that caused it so a failed record can be
//! traced back to the offending input column.

use std::fmt;
use thiserror::Error;

/// Validation and computation failures for a single record
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IndexError {
    #[error("{field}: value {value} outside [{min}, {max}]")]
    OutOfBounds {
        field: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("{field}: reference value must be > 0 (got {value})")]
    NonPositiveReference { field: String, value: f64 },

    #[error("{field}: area must be >= 0 (got {value})")]
    NegativeArea { field: String, value: f64 },

    #[error("{field}: value is not finite")]
    NonFinite { field: String },

    #[error("{field}: missing value")]
    MissingField { field: String },

    #[error("unknown metric field '{field}'")]
    UnknownMetric { field: String },

    #[error("composite index has no module '{module}'")]
    MissingModule { module: String },

    #[error("module '{module}': {reason}")]
    InvalidModule { module: String, reason: String },
}

impl IndexError {
    /// Name of the input field (or module) the error refers to
    pub fn field(&self) -> &str {
        match self {
            IndexError::OutOfBounds { field, .. }
            | IndexError::NonPositiveReference { field, .. }
            | IndexError::NegativeArea { field, .. }
            | IndexError::NonFinite { field }
            | IndexError::MissingField { field }
            | IndexError::UnknownMetric { field } => field,
            IndexError::MissingModule { module } | IndexError::InvalidModule { module, .. } => module,
        }
    }
}

/// Identity of one input row: reach, restoration alternative, forecast year
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct RecordKey {
    pub reach_id: String,
    pub alternative: String,
    pub year: i32,
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.reach_id, self.alternative, self.year)
    }
}

/// A failure isolated to one row of a batch
#[derive(Debug, Clone, PartialEq, Error)]
#[error("row {row}{}: {source}", .key.as_ref().map(|k| format!(" [{}]", k)).unwrap_or_default())]
pub struct RecordError {
    /// Zero-based position in the input sequence
    pub row: usize,
    /// Record identity, when the key columns themselves were readable
    pub key: Option<RecordKey>,
    #[source]
    pub source: IndexError,
}
