//! Worker errors.

use thiserror::Error;

/// Errors raised while running a command batch.
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// The batch did not finish within its budget.
    #[error("batch timed out")]
    Timeout,

    /// A command could not be started.
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// A command exited unsuccessfully.
    #[error("'{program}' exited with {status}: {stderr}")]
    CommandFailed {
        program: String,
        status: String,
        stderr: String,
    },

    /// The runtime failed in some other way.
    #[error("runtime error: {0}")]
    Runtime(String),
}

/// Errors from driving a task protocol.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// `start` was called twice.
    #[error("protocol already started")]
    AlreadyStarted,

    /// `resume` was called before `start`.
    #[error("protocol not started")]
    NotStarted,

    /// The protocol reached a terminal state.
    #[error("protocol already finished")]
    Finished,
}
