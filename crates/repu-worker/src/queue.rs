//! Task sources handed to task protocols.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use repu_core::{AgreementId, Task};

/// Where a task protocol pulls its work from.
pub trait TaskSource: Send {
    /// Next task, or `None` when the source is exhausted or closed.
    fn next_task(&mut self) -> Option<Task>;

    /// Stop handing out tasks to this consumer.
    fn close(&mut self);
}

/// Pending tasks shared by all agreements of a run.
#[derive(Debug, Clone, Default)]
pub struct TaskQueue {
    pending: Arc<Mutex<VecDeque<Task>>>,
}

impl TaskQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    fn pending(&self) -> MutexGuard<'_, VecDeque<Task>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a task.
    pub fn push(&self, task: Task) {
        self.pending().push_back(task);
    }

    /// Number of tasks not yet picked up.
    pub fn len(&self) -> usize {
        self.pending().len()
    }

    /// Returns true if every task was picked up.
    pub fn is_empty(&self) -> bool {
        self.pending().is_empty()
    }

    /// A handle that serves tasks to one agreement.
    pub fn for_agreement(&self, agreement_id: AgreementId) -> AgreementTasks {
        AgreementTasks {
            agreement_id,
            queue: self.clone(),
            closed: false,
        }
    }
}

impl FromIterator<Task> for TaskQueue {
    fn from_iter<I: IntoIterator<Item = Task>>(iter: I) -> Self {
        Self {
            pending: Arc::new(Mutex::new(iter.into_iter().collect())),
        }
    }
}

/// One agreement's view of a [`TaskQueue`].
#[derive(Debug)]
pub struct AgreementTasks {
    agreement_id: AgreementId,
    queue: TaskQueue,
    closed: bool,
}

impl AgreementTasks {
    pub fn agreement_id(&self) -> &AgreementId {
        &self.agreement_id
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl TaskSource for AgreementTasks {
    fn next_task(&mut self) -> Option<Task> {
        if self.closed {
            return None;
        }
        self.queue.pending().pop_front()
    }

    fn close(&mut self) {
        self.closed = true;
    }
}
