//! Error types for the data layer

use thiserror::Error;

/// Errors raised while loading, cleaning or saving a dataset.
#[derive(Error, Debug)]
pub enum CleanError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("type error in column '{column}', row {row}: cannot convert {value} to integer")]
    Type {
        column: String,
        row: usize,
        value: String,
    },

    #[error("empty input: {0}")]
    EmptyInput(String),

    #[error("missing column '{0}'")]
    MissingColumn(String),
}

impl From<csv::Error> for CleanError {
    fn from(err: csv::Error) -> Self {
        let row = err.position().map(|p| p.record());
        match err.into_kind() {
            csv::ErrorKind::Io(io) => CleanError::Io(io),
            other => match row {
                Some(r) => CleanError::Parse(format!("CSV record {r}: {other:?}")),
                None => CleanError::Parse(format!("{other:?}")),
            },
        }
    }
}

/// Result type alias for data operations
pub type Result<T> = std::result::Result<T, CleanError>;
