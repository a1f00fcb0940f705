//! One-shot admission gate: wait for enough offers before scoring.

use std::sync::OnceLock;
use std::time::Duration;

use tokio::sync::{watch, OnceCell};
use tokio::time::Instant;
use tracing::info;

/// Stand-in deadline for timeouts too large to represent.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// How the gate opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOpening {
    /// The required number of offers arrived; carries the count seen.
    Quorum(usize),
    /// The deadline passed first; carries the count seen by then.
    TimedOut(usize),
}

/// Gate shared by every scoring call of a run.
///
/// The deadline is fixed by the first caller. Callers arriving while the wait
/// is in flight join it, callers arriving later pass straight through, and a
/// caller taking over from a cancelled one keeps the original deadline.
#[derive(Debug)]
pub struct AdmissionGate {
    min_offers: usize,
    timeout: Duration,
    offers_seen: watch::Sender<usize>,
    deadline: OnceLock<Instant>,
    opened: OnceCell<GateOpening>,
}

impl AdmissionGate {
    /// Create a closed gate.
    pub fn new(min_offers: usize, timeout: Duration) -> Self {
        let (offers_seen, _) = watch::channel(0);
        Self {
            min_offers,
            timeout,
            offers_seen,
            deadline: OnceLock::new(),
            opened: OnceCell::new(),
        }
    }

    /// Publish the number of distinct offers observed so far.
    pub fn record_offers(&self, count: usize) {
        self.offers_seen.send_replace(count);
    }

    /// Returns true once the wait has finished.
    pub fn is_open(&self) -> bool {
        self.opened.initialized()
    }

    /// Wait for the gate to open.
    pub async fn wait(&self) -> GateOpening {
        let deadline = *self.deadline.get_or_init(|| {
            let now = Instant::now();
            now.checked_add(self.timeout).unwrap_or(now + FAR_FUTURE)
        });
        *self
            .opened
            .get_or_init(|| self.wait_for_offers(deadline))
            .await
    }

    async fn wait_for_offers(&self, deadline: Instant) -> GateOpening {
        let min_offers = self.min_offers;
        let mut rx = self.offers_seen.subscribe();

        let quorum = rx.wait_for(|n| *n >= min_offers);
        let reached = match tokio::time::timeout_at(deadline, quorum).await {
            Ok(Ok(count)) => Some(*count),
            _ => None,
        };

        let opening = match reached {
            Some(count) => GateOpening::Quorum(count),
            None => GateOpening::TimedOut(*self.offers_seen.borrow()),
        };
        info!(min_offers, opening = ?opening, "Admission gate opened");
        opening
    }
}
