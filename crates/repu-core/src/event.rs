//! Marketplace lifecycle events.

use serde::{Deserialize, Serialize};

use crate::ids::{ActivityId, AgreementId, ProviderId, TaskId};
use crate::offer::Offer;
use crate::status::TaskPhase;

/// A lifecycle event raised by the negotiation engine or by a task protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MarketEvent {
    /// A provider sent an offer.
    ProposalReceived { offer: Offer },

    /// A task's result was verified and accepted.
    TaskAccepted {
        agreement_id: AgreementId,
        activity_id: ActivityId,
        task_id: TaskId,
    },

    /// A remote command exceeded its time budget.
    TaskTimeout {
        agreement_id: AgreementId,
        activity_id: ActivityId,
        phase: TaskPhase,
    },

    /// The provider returned missing, malformed or wrong output.
    IncorrectResult {
        agreement_id: AgreementId,
        activity_id: ActivityId,
        reason: String,
    },

    /// The provider rejected our agreement proposal.
    AgreementRejected {
        agreement_id: AgreementId,
        provider_id: ProviderId,
    },
}

impl MarketEvent {
    /// Short name of the event kind, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ProposalReceived { .. } => "ProposalReceived",
            Self::TaskAccepted { .. } => "TaskAccepted",
            Self::TaskTimeout { .. } => "TaskTimeout",
            Self::IncorrectResult { .. } => "IncorrectResult",
            Self::AgreementRejected { .. } => "AgreementRejected",
        }
    }

    /// Activity the event refers to, if any.
    pub fn activity_id(&self) -> Option<&ActivityId> {
        match self {
            Self::TaskAccepted { activity_id, .. }
            | Self::TaskTimeout { activity_id, .. }
            | Self::IncorrectResult { activity_id, .. } => Some(activity_id),
            Self::ProposalReceived { .. } | Self::AgreementRejected { .. } => None,
        }
    }
}

/// Receiver of marketplace events.
///
/// Consumption is synchronous: implementations update their bookkeeping
/// immediately and must not block.
pub trait EventConsumer: Send + Sync {
    /// Handle one event.
    fn consume(&self, event: &MarketEvent);
}
