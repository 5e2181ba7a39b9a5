//! Error types for the market-microstructure toolkit.

use std::collections::BTreeSet;
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the market-microstructure toolkit.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data error (invalid or malformed data).
    #[error("Data error: {0}")]
    Data(String),

    /// An estimator's required columns are not all present in its input.
    #[error("{estimator}: missing columns {missing:?}")]
    MissingColumns {
        /// Estimator name.
        estimator: String,
        /// Required columns absent from the input.
        missing: BTreeSet<String>,
    },

    /// A unit of work failed inside the task runner.
    #[error("Worker error on item {index}: {message}")]
    Worker {
        /// Position of the failing input.
        index: usize,
        /// Failure description.
        message: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV read/write error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create a data error.
    pub fn data(msg: impl Into<String>) -> Self {
        Error::Data(msg.into())
    }

    /// Create a missing-columns error.
    pub fn missing_columns<I, S>(estimator: impl Into<String>, missing: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Error::MissingColumns {
            estimator: estimator.into(),
            missing: missing.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a worker error.
    pub fn worker(index: usize, msg: impl Into<String>) -> Self {
        Error::Worker {
            index,
            message: msg.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_columns_message() {
        let err = Error::missing_columns("BidSlope", ["L5-AskSize"]);
        match &err {
            Error::MissingColumns { estimator, missing } => {
                assert_eq!(estimator, "BidSlope");
                assert_eq!(missing.len(), 1);
                assert!(missing.contains("L5-AskSize"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("L5-AskSize"));
    }

    #[test]
    fn test_worker_message() {
        let err = Error::worker(3, "boom");
        assert_eq!(err.to_string(), "Worker error on item 3: boom");
    }
}
