//! Alpha Requestor Strategy
//!
//! This crate decides which offers are worth negotiating and which billing
//! documents may be paid. All state for one run is owned by a single
//! [`AlphaStrategy`].

pub mod admission;
pub mod config;
pub mod ledger;
pub mod pricing;
pub mod ranking;
pub mod strategy;

pub use admission::{AdmissionGate, GateOpening};
pub use config::StrategyConfig;
pub use ledger::{PaymentLedger, StrategySummary};
pub use pricing::{PriceCeilings, PriceComponent};
pub use ranking::{acceptance_probability, ReputationBook};
pub use strategy::{AlphaStrategy, REJECT};
