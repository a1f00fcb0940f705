//! Per-agreement task protocol.
//!
//! The protocol never runs commands itself. [`TaskProtocol::start`] and
//! [`TaskProtocol::resume`] hand back a [`Step`]: either a batch the caller
//! must submit to the provider, or the final outcome. Outcome events are
//! queued and collected with [`TaskProtocol::take_events`].
//!
//! ```text
//! Created -> WarmingUp -> Running --(verify)--> Accepted
//!                |           |          |
//!                +-----------+----------+-----> Failed(reason)
//!                |
//!                +-> Drained (no task left)
//! ```
//!
//! Verification runs synchronously inside `resume`, so it is not a phase a
//! caller can observe.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use repu_core::{
    ActivityId, AgreementId, BatchOutput, CommandBatch, FailureReason, MarketEvent, RemoteCommand,
    Task, TaskPhase, VerificationError,
};

use crate::config::ProtocolConfig;
use crate::error::ProtocolError;
use crate::queue::TaskSource;

/// Script run first to make the provider download and boot its runtime.
const WARM_UP_SCRIPT: &str = "echo foo";

/// Per-activity RNG seed: the run seed XOR the FNV-1a hash of the activity id.
fn activity_seed(seed: u64, activity_id: &ActivityId) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

    let hash = activity_id
        .as_str()
        .bytes()
        .fold(FNV_OFFSET, |hash, byte| {
            (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
        });
    seed ^ hash
}

/// Where the protocol currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Created,
    WarmingUp,
    Running,
    Accepted,
    Failed(FailureReason),
    /// The task source had nothing left; not a failure.
    Drained,
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Accepted | Self::Failed(_) | Self::Drained)
    }
}

/// Result of submitting a batch, as reported by the executor.
#[derive(Debug, Clone)]
pub enum BatchResult {
    Completed(BatchOutput),
    TimedOut,
    /// Any failure other than a timeout.
    Failed(String),
}

/// Final result of one agreement's protocol.
#[derive(Debug, Clone)]
pub enum TaskOutcome {
    Accepted(Task),
    Failed {
        /// The task, unless the protocol failed before picking one up.
        task: Option<Task>,
        reason: FailureReason,
    },
    Drained,
}

/// What the caller has to do next.
#[derive(Debug, Clone)]
pub enum Step {
    /// Run this batch and call `resume` with its result.
    Submit(CommandBatch),
    /// The protocol is over.
    Finished(TaskOutcome),
}

/// State machine executing and verifying one task for one agreement.
pub struct TaskProtocol<S> {
    agreement_id: AgreementId,
    activity_id: ActivityId,
    source: S,
    phase: Phase,
    current: Option<Task>,
    download_timeout: Duration,
    random_fail_factor: u8,
    rng: StdRng,
    events: Vec<MarketEvent>,
}

impl<S: TaskSource> TaskProtocol<S> {
    /// Create a protocol for one activity of an agreement.
    pub fn new(
        agreement_id: AgreementId,
        activity_id: ActivityId,
        source: S,
        config: &ProtocolConfig,
    ) -> Self {
        // Seeded runs still draw independently per activity.
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(activity_seed(seed, &activity_id)),
            None => StdRng::from_entropy(),
        };

        Self {
            agreement_id,
            activity_id,
            source,
            phase: Phase::Created,
            current: None,
            download_timeout: config.download_timeout,
            random_fail_factor: config.random_fail_factor.min(100),
            rng,
            events: Vec::new(),
        }
    }

    pub fn agreement_id(&self) -> &AgreementId {
        &self.agreement_id
    }

    pub fn activity_id(&self) -> &ActivityId {
        &self.activity_id
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Events emitted since the last call.
    pub fn take_events(&mut self) -> Vec<MarketEvent> {
        std::mem::take(&mut self.events)
    }

    /// Begin with the warm-up batch.
    pub fn start(&mut self) -> Result<Step, ProtocolError> {
        if self.phase != Phase::Created {
            return Err(ProtocolError::AlreadyStarted);
        }

        debug!(agreement_id = %self.agreement_id, activity_id = %self.activity_id, "Warming up");
        self.phase = Phase::WarmingUp;
        Ok(Step::Submit(CommandBatch::single(
            RemoteCommand::shell(WARM_UP_SCRIPT),
            self.download_timeout,
        )))
    }

    /// Feed the result of the last submitted batch.
    pub fn resume(&mut self, result: BatchResult) -> Result<Step, ProtocolError> {
        match self.phase {
            Phase::Created => Err(ProtocolError::NotStarted),
            Phase::WarmingUp => Ok(self.after_warm_up(result)),
            Phase::Running => match self.current.take() {
                Some(task) => Ok(self.after_task(task, result)),
                None => Err(ProtocolError::Finished),
            },
            Phase::Accepted | Phase::Failed(_) | Phase::Drained => Err(ProtocolError::Finished),
        }
    }

    fn after_warm_up(&mut self, result: BatchResult) -> Step {
        match result {
            BatchResult::Completed(_) => self.next_task(),
            BatchResult::TimedOut => self.fail(
                None,
                FailureReason::Timeout {
                    phase: TaskPhase::WarmingUp,
                },
            ),
            BatchResult::Failed(error) => self.fail(
                None,
                FailureReason::BadResult {
                    detail: format!("warm-up failed: {}", error),
                },
            ),
        }
    }

    fn next_task(&mut self) -> Step {
        match self.source.next_task() {
            Some(mut task) => {
                task.start();
                info!(
                    agreement_id = %self.agreement_id,
                    activity_id = %self.activity_id,
                    task_id = %task.id,
                    timeout_secs = task.payload.timeout.as_secs(),
                    "Submitting task"
                );
                let batch = task.payload.batch();
                self.current = Some(task);
                self.phase = Phase::Running;
                Step::Submit(batch)
            }
            None => {
                info!(agreement_id = %self.agreement_id, "No task left for agreement");
                self.source.close();
                self.phase = Phase::Drained;
                Step::Finished(TaskOutcome::Drained)
            }
        }
    }

    fn after_task(&mut self, task: Task, result: BatchResult) -> Step {
        match result {
            BatchResult::TimedOut => self.fail(
                Some(task),
                FailureReason::Timeout {
                    phase: TaskPhase::Running,
                },
            ),
            BatchResult::Failed(error) => {
                self.fail(Some(task), FailureReason::BadResult { detail: error })
            }
            BatchResult::Completed(output) => match self.verify(&task, &output) {
                Ok(()) => self.accept(task),
                Err(e) => self.fail(
                    Some(task),
                    FailureReason::BadResult {
                        detail: e.to_string(),
                    },
                ),
            },
        }
    }

    fn verify(&mut self, task: &Task, output: &BatchOutput) -> Result<(), VerificationError> {
        let stdout = output.last_stdout().ok_or(VerificationError::MissingOutput)?;
        task.payload.verifier.verify(stdout)?;

        if self.random_fail_factor > 0 && self.rng.gen_range(0..100u8) < self.random_fail_factor {
            return Err(VerificationError::RandomFailure);
        }
        Ok(())
    }

    fn accept(&mut self, mut task: Task) -> Step {
        task.accept();
        info!(
            agreement_id = %self.agreement_id,
            activity_id = %self.activity_id,
            task_id = %task.id,
            "Task accepted"
        );

        self.events.push(MarketEvent::TaskAccepted {
            agreement_id: self.agreement_id.clone(),
            activity_id: self.activity_id.clone(),
            task_id: task.id.clone(),
        });
        // One task per agreement.
        self.source.close();
        self.phase = Phase::Accepted;
        Step::Finished(TaskOutcome::Accepted(task))
    }

    fn fail(&mut self, task: Option<Task>, reason: FailureReason) -> Step {
        warn!(
            agreement_id = %self.agreement_id,
            activity_id = %self.activity_id,
            reason = %reason,
            "Task failed"
        );

        let event = match &reason {
            FailureReason::Timeout { phase } => MarketEvent::TaskTimeout {
                agreement_id: self.agreement_id.clone(),
                activity_id: self.activity_id.clone(),
                phase: *phase,
            },
            FailureReason::BadResult { detail } => MarketEvent::IncorrectResult {
                agreement_id: self.agreement_id.clone(),
                activity_id: self.activity_id.clone(),
                reason: detail.clone(),
            },
        };
        self.events.push(event);

        let task = task.map(|mut task| {
            task.fail(reason.clone());
            task
        });
        self.source.close();
        self.phase = Phase::Failed(reason.clone());
        Step::Finished(TaskOutcome::Failed { task, reason })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use repu_core::{TaskPayload, TaskStatus};

    use crate::factor::{Factorization, FactorizationCheck};
    use crate::queue::{AgreementTasks, TaskQueue};

    const GOOD_OUTPUT: &str = "30: 2 3 5\n42: 2 3 7\n";

    fn factor_task() -> Task {
        let expected = Factorization::from([(30, vec![2, 3, 5]), (42, vec![2, 3, 7])]);
        Task::new(TaskPayload {
            command: RemoteCommand::shell("factor 30 42"),
            timeout: Duration::from_secs(12),
            verifier: Arc::new(FactorizationCheck::new(expected)),
        })
    }

    fn protocol(queue: &TaskQueue, random_fail_factor: u8) -> TaskProtocol<AgreementTasks> {
        let config = ProtocolConfig {
            random_fail_factor,
            seed: Some(11),
            ..ProtocolConfig::default()
        };
        TaskProtocol::new(
            AgreementId::new("agr-1"),
            ActivityId::new("act-1"),
            queue.for_agreement(AgreementId::new("agr-1")),
            &config,
        )
    }

    fn output(stdout: &str) -> BatchResult {
        BatchResult::Completed(BatchOutput {
            stdout: vec![stdout.to_string()],
        })
    }

    fn warm_up(protocol: &mut TaskProtocol<AgreementTasks>) -> Step {
        match protocol.start().unwrap() {
            Step::Submit(batch) => {
                assert_eq!(batch.timeout, Duration::from_secs(180));
                assert_eq!(batch.commands, vec![RemoteCommand::shell("echo foo")]);
            }
            other => panic!("expected warm-up batch, got {:?}", other),
        }
        protocol.resume(output("foo\n")).unwrap()
    }

    #[test]
    fn test_successful_task_is_accepted() {
        let queue: TaskQueue = std::iter::once(factor_task()).collect();
        let mut protocol = protocol(&queue, 0);

        match warm_up(&mut protocol) {
            Step::Submit(batch) => assert_eq!(batch.timeout, Duration::from_secs(12)),
            other => panic!("expected task batch, got {:?}", other),
        }
        assert_eq!(protocol.phase(), &Phase::Running);

        match protocol.resume(output(GOOD_OUTPUT)).unwrap() {
            Step::Finished(TaskOutcome::Accepted(task)) => {
                assert_eq!(task.status, TaskStatus::Accepted)
            }
            other => panic!("expected acceptance, got {:?}", other),
        }

        let events = protocol.take_events();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            MarketEvent::TaskAccepted { agreement_id, activity_id, .. }
                if agreement_id.as_str() == "agr-1" && activity_id.as_str() == "act-1"
        ));
        assert!(protocol.source().is_closed());
        assert_eq!(protocol.phase(), &Phase::Accepted);
    }

    #[test]
    fn test_warm_up_timeout_skips_task() {
        let queue: TaskQueue = std::iter::once(factor_task()).collect();
        let mut protocol = protocol(&queue, 0);

        protocol.start().unwrap();
        match protocol.resume(BatchResult::TimedOut).unwrap() {
            Step::Finished(TaskOutcome::Failed { task, reason }) => {
                assert!(task.is_none());
                assert_eq!(
                    reason,
                    FailureReason::Timeout {
                        phase: TaskPhase::WarmingUp
                    }
                );
            }
            other => panic!("expected failure, got {:?}", other),
        }

        assert_eq!(queue.len(), 1);
        assert!(matches!(
            protocol.take_events().as_slice(),
            [MarketEvent::TaskTimeout {
                phase: TaskPhase::WarmingUp,
                ..
            }]
        ));
    }

    #[test]
    fn test_task_timeout_emits_single_event() {
        let queue: TaskQueue = std::iter::once(factor_task()).collect();
        let mut protocol = protocol(&queue, 0);

        warm_up(&mut protocol);
        let step = protocol.resume(BatchResult::TimedOut).unwrap();
        assert!(matches!(
            step,
            Step::Finished(TaskOutcome::Failed {
                task: Some(_),
                reason: FailureReason::Timeout {
                    phase: TaskPhase::Running
                }
            })
        ));

        let events = protocol.take_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].activity_id(), Some(&ActivityId::new("act-1")));
        assert!(protocol.take_events().is_empty());
    }

    #[test]
    fn test_wrong_result_is_incorrect() {
        let queue: TaskQueue = std::iter::once(factor_task()).collect();
        let mut protocol = protocol(&queue, 0);

        warm_up(&mut protocol);
        protocol.resume(output("30: 2 3 5\n42: 6 7\n")).unwrap();

        assert!(matches!(
            protocol.phase(),
            Phase::Failed(FailureReason::BadResult { .. })
        ));
        assert!(matches!(
            protocol.take_events().as_slice(),
            [MarketEvent::IncorrectResult { .. }]
        ));
        assert!(protocol.source().is_closed());
    }

    #[test]
    fn test_malformed_and_missing_output_are_incorrect() {
        for result in [
            output("no colon here\n"),
            BatchResult::Completed(BatchOutput::default()),
            BatchResult::Failed("exit status 1".to_string()),
        ] {
            let queue: TaskQueue = std::iter::once(factor_task()).collect();
            let mut protocol = protocol(&queue, 0);

            warm_up(&mut protocol);
            protocol.resume(result).unwrap();
            assert!(matches!(
                protocol.take_events().as_slice(),
                [MarketEvent::IncorrectResult { .. }]
            ));
        }
    }

    #[test]
    fn test_stress_mode_fails_correct_results() {
        let queue: TaskQueue = std::iter::once(factor_task()).collect();
        let mut protocol = protocol(&queue, 100);

        warm_up(&mut protocol);
        protocol.resume(output(GOOD_OUTPUT)).unwrap();

        match protocol.take_events().as_slice() {
            [MarketEvent::IncorrectResult { reason, .. }] => {
                assert!(reason.contains("randomly failed"))
            }
            other => panic!("expected random failure, got {:?}", other),
        }
    }

    #[test]
    fn test_stress_draws_are_per_task() {
        let mut accepted = 0;
        for i in 0..200 {
            let queue: TaskQueue = std::iter::once(factor_task()).collect();
            let config = ProtocolConfig {
                random_fail_factor: 50,
                seed: Some(5),
                ..ProtocolConfig::default()
            };
            let mut protocol = TaskProtocol::new(
                AgreementId::new(format!("agr-{i}")),
                ActivityId::new(format!("act-{i}")),
                queue.for_agreement(AgreementId::new(format!("agr-{i}"))),
                &config,
            );
            warm_up(&mut protocol);
            let step = protocol.resume(output(GOOD_OUTPUT)).unwrap();
            if let Step::Finished(TaskOutcome::Accepted(_)) = step {
                accepted += 1;
            }
        }
        assert!(
            accepted > 50 && accepted < 150,
            "accepted {accepted} of 200"
        );
    }

    #[test]
    fn test_activity_seed_is_stable() {
        let empty = ActivityId::new("");
        assert_eq!(activity_seed(0, &empty), 0xcbf2_9ce4_8422_2325);

        // FNV-1a("a")
        let a = ActivityId::new("a");
        assert_eq!(activity_seed(0, &a), 0xaf63_dc4c_8601_ec8c);
        assert_eq!(activity_seed(7, &a), 0xaf63_dc4c_8601_ec8c ^ 7);
        assert_ne!(
            activity_seed(7, &ActivityId::new("act-1")),
            activity_seed(7, &ActivityId::new("act-2"))
        );
    }

    #[test]
    fn test_empty_source_drains_cleanly() {
        let queue = TaskQueue::new();
        let mut protocol = protocol(&queue, 0);

        assert!(matches!(
            warm_up(&mut protocol),
            Step::Finished(TaskOutcome::Drained)
        ));
        assert_eq!(protocol.phase(), &Phase::Drained);
        assert!(protocol.take_events().is_empty());
    }

    #[test]
    fn test_misuse_is_reported() {
        let queue: TaskQueue = std::iter::once(factor_task()).collect();
        let mut protocol = protocol(&queue, 0);

        assert!(matches!(
            protocol.resume(BatchResult::TimedOut),
            Err(ProtocolError::NotStarted)
        ));
        protocol.start().unwrap();
        assert!(matches!(
            protocol.start(),
            Err(ProtocolError::AlreadyStarted)
        ));

        protocol.resume(BatchResult::TimedOut).unwrap();
        assert!(protocol.phase().is_terminal());
        assert!(matches!(
            protocol.resume(output(GOOD_OUTPUT)),
            Err(ProtocolError::Finished)
        ));
    }
}
