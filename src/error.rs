//! Error types for the calculator core.

use thiserror::Error;

/// Errors surfaced by expression evaluation and graph sampling.
///
/// Keypad arithmetic never produces one of these; it latches the
/// `"Error"` display sentinel instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalcError {
    #[error("{0}")]
    Parse(String),

    #[error("{0}")]
    Eval(String),

    #[error("Invalid function: {0}")]
    InvalidFunction(String),

    #[error("Could not generate enough points to plot this function.")]
    NotEnoughPoints,

    #[error("Please provide a full expression to calculate.")]
    Incomplete,

    #[error("Please enter a calculation or question.")]
    EmptyInput,
}

impl CalcError {
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn eval(msg: impl Into<String>) -> Self {
        Self::Eval(msg.into())
    }
}

/// Errors from the key-value persistence layer.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage contents are not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CalcError>;
