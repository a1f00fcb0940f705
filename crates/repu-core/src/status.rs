//! Status enums for tasks and task protocol phases.

use serde::{Deserialize, Serialize};

/// Status of a Task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Task queued, not yet handed to an agreement.
    #[default]
    Pending,
    /// Task command submitted to a provider.
    Running,
    /// Result verified and accepted.
    Accepted,
    /// Task failed (timeout or bad result).
    Failed,
}

impl TaskStatus {
    /// Returns true if the task is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Accepted | Self::Failed)
    }
}

/// Phase of the per-agreement task protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPhase {
    /// Runtime image download / initialization.
    WarmingUp,
    /// The task command itself.
    Running,
}

impl std::fmt::Display for TaskPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::WarmingUp => "warming_up",
            Self::Running => "running",
        };
        f.write_str(name)
    }
}

/// Why a task protocol failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    /// A command exceeded its budget in the given phase.
    Timeout { phase: TaskPhase },
    /// The output was missing, malformed or wrong.
    BadResult { detail: String },
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout { phase } => write!(f, "timeout while {}", phase),
            Self::BadResult { detail } => write!(f, "bad result: {}", detail),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_status() {
        assert!(!TaskStatus::Pending.is_terminal());
        assert!(!TaskStatus::Running.is_terminal());
        assert!(TaskStatus::Accepted.is_terminal());
        assert!(TaskStatus::Failed.is_terminal());
    }

    #[test]
    fn test_failure_display() {
        let reason = FailureReason::Timeout {
            phase: TaskPhase::WarmingUp,
        };
        assert_eq!(reason.to_string(), "timeout while warming_up");
    }
}
