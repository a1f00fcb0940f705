//! Drives a [`TaskProtocol`] through a [`RemoteExecutor`].

use tokio::time::timeout;
use tracing::debug;

use repu_core::EventConsumer;

use crate::error::{ExecutorError, ProtocolError};
use crate::executor::RemoteExecutor;
use crate::protocol::{BatchResult, Step, TaskOutcome, TaskProtocol};
use crate::queue::TaskSource;

/// Run one agreement's protocol to completion.
///
/// Every batch is bounded by its own timeout. Events are delivered to
/// `consumer` as soon as the protocol emits them.
pub async fn run_agreement<S, E>(
    mut protocol: TaskProtocol<S>,
    executor: &E,
    consumer: &dyn EventConsumer,
) -> Result<TaskOutcome, ProtocolError>
where
    S: TaskSource,
    E: RemoteExecutor + ?Sized,
{
    let mut step = protocol.start()?;

    loop {
        for event in protocol.take_events() {
            debug!(kind = event.kind(), "Delivering event");
            consumer.consume(&event);
        }

        let batch = match step {
            Step::Finished(outcome) => return Ok(outcome),
            Step::Submit(batch) => batch,
        };

        let run = executor.execute(protocol.activity_id(), &batch);
        let result = match timeout(batch.timeout, run).await {
            Ok(Ok(output)) => BatchResult::Completed(output),
            Ok(Err(ExecutorError::Timeout)) | Err(_) => BatchResult::TimedOut,
            Ok(Err(e)) => BatchResult::Failed(e.to_string()),
        };
        step = protocol.resume(result)?;
    }
}
