//! Errors local to one instrument-day.
//!
//! None of these abort a multi-day run: the session runner logs them and
//! omits the affected row.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DayError {
    #[error("required price column '{column}' is missing")]
    MissingColumn { column: String },

    #[error("only {count} bars available, at least {min} required")]
    InsufficientBars { count: usize, min: usize },

    #[error("column '{column}' has {actual} values, expected {expected}")]
    ColumnLength {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("instrument-day has no rows")]
    EmptyFrame,
}
