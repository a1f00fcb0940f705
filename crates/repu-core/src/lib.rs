//! Alpha Requestor Core Domain Types
//!
//! This crate contains pure domain types with no dependencies on:
//! - Network/HTTP
//! - Remote runtimes
//! - Async executors
//!
//! Everything the strategy and the worker exchange is defined here.

pub mod billing;
pub mod error;
pub mod event;
pub mod ids;
pub mod offer;
pub mod reputation;
pub mod status;
pub mod task;

// Re-export commonly used types
pub use billing::{DebitNote, Invoice};
pub use error::{CoreError, VerificationError};
pub use event::{EventConsumer, MarketEvent};
pub use ids::{ActivityId, AgreementId, OfferId, ProviderId, TaskId};
pub use offer::{LinearPricing, Offer};
pub use reputation::Reputation;
pub use status::{FailureReason, TaskPhase, TaskStatus};
pub use task::{BatchOutput, CommandBatch, RemoteCommand, ResultVerifier, Task, TaskPayload};
