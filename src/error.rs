//! Error types.
//!
//! The library reports failures as [`IndexError`]. The `pidx` binary maps them
//! onto [`AppError`], which carries the process exit code:
//!
//! - `2`: usage, configuration or I/O problems
//! - `3`: bad or insufficient input data
//! - `4`: model/prediction failures

use chrono::NaiveDate;
use thiserror::Error;

/// Errors produced by the index engine and its I/O layers.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Malformed or empty input to `fit`.
    #[error("Data error: {0}")]
    DataError(String),

    /// `predict` called before a successful `fit`.
    #[error("Model is not fitted; call fit() first.")]
    UnfitModel,

    /// The requested item never appeared in the training data.
    #[error("No training data for item '{0}'.")]
    UnknownItem(String),

    /// The requested date lies outside the integration horizon.
    #[error("Date {date} is outside the index horizon [{min}, {max}].")]
    DateOutOfRange {
        date: NaiveDate,
        min: NaiveDate,
        max: NaiveDate,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl IndexError {
    /// Whether the error means "no prediction available" rather than a failure.
    ///
    /// Benchmarks use this to count uncovered rows instead of aborting.
    pub fn is_no_prediction(&self) -> bool {
        matches!(
            self,
            IndexError::UnknownItem(_) | IndexError::DateOutOfRange { .. }
        )
    }

    /// Exit code used when this error reaches the binary.
    pub fn exit_code(&self) -> u8 {
        match self {
            IndexError::DataError(_) => 3,
            IndexError::UnfitModel
            | IndexError::UnknownItem(_)
            | IndexError::DateOutOfRange { .. } => 4,
            IndexError::InvalidConfig(_)
            | IndexError::Io(_)
            | IndexError::Csv(_)
            | IndexError::Json(_) => 2,
        }
    }
}

/// Result type with the engine error.
pub type Result<T> = std::result::Result<T, IndexError>;

/// Top-level error of the `pidx` binary.
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<IndexError> for AppError {
    fn from(err: IndexError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
