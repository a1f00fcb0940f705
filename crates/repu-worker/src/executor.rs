//! Executors running command batches on behalf of a task protocol.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use repu_core::{ActivityId, BatchOutput, CommandBatch};

use crate::error::ExecutorError;

/// Runs batches inside a provider's activity.
///
/// Implementations do not enforce `batch.timeout`; the driver wraps every
/// call in a timer and drops the future when it fires.
#[async_trait]
pub trait RemoteExecutor: Send + Sync {
    /// Run every command of the batch in order and capture their stdout.
    async fn execute(
        &self,
        activity_id: &ActivityId,
        batch: &CommandBatch,
    ) -> Result<BatchOutput, ExecutorError>;
}

/// Executor running commands as local subprocesses.
///
/// Stands in for a provider when testing the requestor against real
/// `factor` output.
#[derive(Debug, Clone, Default)]
pub struct ProcessExecutor {
    env_vars: Vec<(String, String)>,
}

impl ProcessExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an environment variable.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.push((key.into(), value.into()));
        self
    }
}

#[async_trait]
impl RemoteExecutor for ProcessExecutor {
    async fn execute(
        &self,
        activity_id: &ActivityId,
        batch: &CommandBatch,
    ) -> Result<BatchOutput, ExecutorError> {
        let mut output = BatchOutput::default();

        for command in &batch.commands {
            debug!(activity_id = %activity_id, command = %command, "Running command");

            let mut cmd = Command::new(&command.program);
            cmd.args(&command.args)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                // A timed-out batch is dropped, which must not leave the child behind.
                .kill_on_drop(true);
            for (key, value) in &self.env_vars {
                cmd.env(key, value);
            }

            let result = cmd.output().await.map_err(|source| ExecutorError::Spawn {
                program: command.program.clone(),
                source,
            })?;

            if !result.status.success() {
                let stderr = String::from_utf8_lossy(&result.stderr).trim().to_string();
                warn!(
                    activity_id = %activity_id,
                    program = %command.program,
                    status = %result.status,
                    "Command failed"
                );
                return Err(ExecutorError::CommandFailed {
                    program: command.program.clone(),
                    status: result.status.to_string(),
                    stderr,
                });
            }

            output
                .stdout
                .push(String::from_utf8_lossy(&result.stdout).into_owned());
        }

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use repu_core::RemoteCommand;

    fn batch(commands: Vec<RemoteCommand>) -> CommandBatch {
        CommandBatch {
            commands,
            timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn test_captures_stdout_per_command() {
        let executor = ProcessExecutor::new().with_env("GREETING", "hello");
        let output = executor
            .execute(
                &ActivityId::new("act"),
                &batch(vec![
                    RemoteCommand::new("sh", ["-c", "echo foo"]),
                    RemoteCommand::new("sh", ["-c", "echo $GREETING"]),
                ]),
            )
            .await
            .unwrap();

        assert_eq!(
            output.stdout,
            vec!["foo\n".to_string(), "hello\n".to_string()]
        );
        assert_eq!(output.last_stdout(), Some("hello\n"));
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_a_failure() {
        let executor = ProcessExecutor::new();
        let failing = RemoteCommand::new("sh", ["-c", "echo oops >&2; exit 3"]);
        let err = executor
            .execute(&ActivityId::new("act"), &batch(vec![failing]))
            .await
            .unwrap_err();

        match err {
            ExecutorError::CommandFailed { program, stderr, .. } => {
                assert_eq!(program, "sh");
                assert_eq!(stderr, "oops");
            }
            other => panic!("expected command failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_program_fails_to_spawn() {
        let executor = ProcessExecutor::new();
        let missing = RemoteCommand::new("/nonexistent/program", Vec::<String>::new());
        let err = executor
            .execute(&ActivityId::new("act"), &batch(vec![missing]))
            .await
            .unwrap_err();

        assert!(matches!(err, ExecutorError::Spawn { .. }));
    }
}
