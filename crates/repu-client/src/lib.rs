//! Reputation client library for the alpha requestor.
//!
//! Provides the HTTP client for the reputation aggregator's standard score
//! endpoint and the [`ReputationSource`] seam the strategy depends on.

pub mod error;
pub mod http;
pub mod source;

pub use error::ClientError;
pub use http::{ClientConfig, ReputationClient, StandardScore};
pub use source::{ReputationSource, StaticReputation};
