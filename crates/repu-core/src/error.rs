//! Core domain errors.

use thiserror::Error;

/// Core domain errors for the requestor.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Invalid input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A configuration knob is outside its allowed range.
    #[error("Invalid configuration: {field} = {value} (expected {expected})")]
    InvalidConfig {
        field: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// Reasons a provider's output fails verification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    /// No output was captured for the task command.
    #[error("no output captured")]
    MissingOutput,

    /// A line could not be parsed.
    #[error("malformed line {line}: {content:?}")]
    MalformedLine { line: usize, content: String },

    /// Parsed output differs from the expected result.
    #[error("result mismatch: {0}")]
    Mismatch(String),

    /// Correct output failed on purpose by the stress-test draw.
    #[error("randomly failed (stress test)")]
    RandomFailure,
}
