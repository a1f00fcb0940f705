//! Offers (proposals) received from providers.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{OfferId, ProviderId};

/// Linear pay-per-use price model.
///
/// The total cost of an activity is
/// `fixed + cpu_per_sec * cpu_seconds + duration_per_sec * wall_seconds`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LinearPricing {
    /// Price paid once per activity.
    pub fixed: Decimal,

    /// Price per second of consumed CPU time.
    #[serde(default)]
    pub cpu_per_sec: Decimal,

    /// Price per second of wall-clock duration.
    #[serde(default)]
    pub duration_per_sec: Decimal,
}

impl LinearPricing {
    /// Create a price model from its three coefficients.
    pub fn new(fixed: Decimal, cpu_per_sec: Decimal, duration_per_sec: Decimal) -> Self {
        Self {
            fixed,
            cpu_per_sec,
            duration_per_sec,
        }
    }

    /// Cost of an activity that used the given amount of resources.
    pub fn cost(&self, cpu_seconds: Decimal, wall_seconds: Decimal) -> Decimal {
        self.fixed + self.cpu_per_sec * cpu_seconds + self.duration_per_sec * wall_seconds
    }
}

/// A provider's advertised terms, not yet a binding contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    /// Unique offer identifier.
    #[serde(default = "OfferId::generate")]
    pub id: OfferId,

    /// Provider that issued this offer.
    pub issuer: ProviderId,

    /// Whether this is an intermediate negotiation state rather than a
    /// fresh offer.
    #[serde(default)]
    pub is_draft: bool,

    /// Price model of the offer.
    pub pricing: LinearPricing,
}

impl Offer {
    /// Create a new (non-draft) offer.
    pub fn new(issuer: impl Into<ProviderId>, pricing: LinearPricing) -> Self {
        Self {
            id: OfferId::generate(),
            issuer: issuer.into(),
            is_draft: false,
            pricing,
        }
    }

    /// Builder method to mark the offer as a draft.
    pub fn draft(mut self) -> Self {
        self.is_draft = true;
        self
    }

    /// Builder method to set a specific ID (useful for testing).
    pub fn with_id(mut self, id: OfferId) -> Self {
        self.id = id;
        self
    }
}
