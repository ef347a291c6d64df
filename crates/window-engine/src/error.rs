//! Error types for window-engine operations.
//!
//! Every error is raised while *building* a window (parsing a rule program,
//! constructing an atom, reading string inputs). Querying a built
//! [`Predicate`](crate::Predicate) never fails.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WindowError {
    #[error("Syntax error at {line}:{column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("Unbound name '{name}' at {line}:{column}")]
    UnboundName {
        name: String,
        line: usize,
        column: usize,
    },

    #[error("Invalid interval: {0}")]
    InvalidInterval(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid datetime: {0}")]
    InvalidDatetime(String),
}

pub type Result<T> = std::result::Result<T, WindowError>;
