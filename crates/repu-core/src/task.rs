//! Tasks and the command batches they are executed with.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::VerificationError;
use crate::ids::TaskId;
use crate::status::{FailureReason, TaskStatus};

/// A single command to run on a provider's runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCommand {
    /// Executable path inside the runtime.
    pub program: String,
    /// Arguments passed to the executable.
    pub args: Vec<String>,
}

impl RemoteCommand {
    /// Create a new command.
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// A `/bin/bash -c <script>` command.
    pub fn shell(script: impl Into<String>) -> Self {
        Self::new("/bin/bash", ["-c".to_string(), script.into()])
    }
}

impl fmt::Display for RemoteCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Commands submitted together under one timeout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandBatch {
    pub commands: Vec<RemoteCommand>,
    pub timeout: Duration,
}

impl CommandBatch {
    /// A batch holding a single command.
    pub fn single(command: RemoteCommand, timeout: Duration) -> Self {
        Self {
            commands: vec![command],
            timeout,
        }
    }
}

/// Captured output of a completed batch, one entry per command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutput {
    pub stdout: Vec<String>,
}

impl BatchOutput {
    /// Output of the last command in the batch.
    pub fn last_stdout(&self) -> Option<&str> {
        self.stdout.last().map(String::as_str)
    }
}

/// Checks a provider's raw output against the expected result.
pub trait ResultVerifier: Send + Sync + fmt::Debug {
    /// Returns `Ok(())` when the output is correct.
    fn verify(&self, stdout: &str) -> Result<(), VerificationError>;
}

/// What a task runs and how its result is judged.
#[derive(Debug, Clone)]
pub struct TaskPayload {
    /// Command producing the result.
    pub command: RemoteCommand,
    /// Budget for the command.
    pub timeout: Duration,
    /// Judge of the captured output.
    pub verifier: Arc<dyn ResultVerifier>,
}

impl TaskPayload {
    /// The batch to submit for this payload.
    pub fn batch(&self) -> CommandBatch {
        CommandBatch::single(self.command.clone(), self.timeout)
    }
}

/// One unit of work bound to an agreement once it is picked up.
#[derive(Debug, Clone)]
pub struct Task {
    /// Unique task identifier.
    pub id: TaskId,

    /// Work to perform.
    pub payload: TaskPayload,

    /// Current task status.
    pub status: TaskStatus,

    /// When the task was created.
    pub created_at: DateTime<Utc>,

    /// When the task reached a terminal state.
    pub finished_at: Option<DateTime<Utc>>,

    /// Why the task failed, if it did.
    pub failure: Option<FailureReason>,
}

impl Task {
    /// Create a new pending task.
    pub fn new(payload: TaskPayload) -> Self {
        Self {
            id: TaskId::generate(),
            payload,
            status: TaskStatus::Pending,
            created_at: Utc::now(),
            finished_at: None,
            failure: None,
        }
    }

    /// Mark the task as submitted.
    pub fn start(&mut self) {
        self.status = TaskStatus::Running;
    }

    /// Mark the task as accepted.
    pub fn accept(&mut self) {
        self.status = TaskStatus::Accepted;
        self.finished_at = Some(Utc::now());
    }

    /// Mark the task as failed.
    pub fn fail(&mut self, reason: FailureReason) {
        self.status = TaskStatus::Failed;
        self.finished_at = Some(Utc::now());
        self.failure = Some(reason);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::TaskPhase;

    #[derive(Debug)]
    struct AcceptAll;

    impl ResultVerifier for AcceptAll {
        fn verify(&self, _stdout: &str) -> Result<(), VerificationError> {
            Ok(())
        }
    }

    fn payload() -> TaskPayload {
        TaskPayload {
            command: RemoteCommand::shell("echo hi"),
            timeout: Duration::from_secs(5),
            verifier: Arc::new(AcceptAll),
        }
    }

    #[test]
    fn test_shell_command_display() {
        let cmd = RemoteCommand::shell("factor 6");
        assert_eq!(cmd.to_string(), "/bin/bash -c factor 6");
    }

    #[test]
    fn test_task_lifecycle() {
        let mut task = Task::new(payload());
        assert_eq!(task.status, TaskStatus::Pending);

        task.start();
        assert_eq!(task.status, TaskStatus::Running);

        task.fail(FailureReason::Timeout {
            phase: TaskPhase::Running,
        });
        assert_eq!(task.status, TaskStatus::Failed);
        assert!(task.finished_at.is_some());
        assert!(task.failure.is_some());
    }

    #[test]
    fn test_payload_batch() {
        let batch = payload().batch();
        assert_eq!(batch.commands.len(), 1);
        assert_eq!(batch.timeout, Duration::from_secs(5));
    }
}
