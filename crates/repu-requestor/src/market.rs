//! File-backed offer feed standing in for the negotiation engine.

use std::path::Path;

use rand::Rng;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::info;

use repu_core::{
    ActivityId, AgreementId, EventConsumer, LinearPricing, MarketEvent, Offer, ProviderId,
};

/// Errors loading a market.
#[derive(Debug, Error)]
pub enum MarketError {
    #[error("failed to read offers from {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid offers file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// An offer turned into a contract, with the single activity run under it.
#[derive(Debug, Clone)]
pub struct Agreement {
    pub agreement_id: AgreementId,
    pub activity_id: ActivityId,
    pub offer: Offer,
}

impl Agreement {
    pub fn provider_id(&self) -> &ProviderId {
        &self.offer.issuer
    }
}

/// A fixed set of offers.
#[derive(Debug, Clone, Default)]
pub struct LocalMarket {
    offers: Vec<Offer>,
}

impl LocalMarket {
    pub fn new(offers: Vec<Offer>) -> Self {
        Self { offers }
    }

    /// Parse a JSON array of offers.
    pub fn from_json(json: &str) -> Result<Self, MarketError> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    /// Read a JSON array of offers from a file.
    pub fn load(path: &Path) -> Result<Self, MarketError> {
        let json = std::fs::read_to_string(path).map_err(|source| MarketError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// One offer per provider with prices scattered around the default ceilings.
    pub fn synthetic<R: Rng + ?Sized>(providers: usize, rng: &mut R) -> Self {
        let offers = (0..providers)
            .map(|i| {
                let pricing = LinearPricing::new(
                    Decimal::new(rng.gen_range(0..120), 2),
                    Decimal::new(rng.gen_range(0..=12), 5),
                    Decimal::new(rng.gen_range(0..=6), 5),
                );
                Offer::new(format!("0xprovider{:04}", i), pricing)
            })
            .collect();
        Self::new(offers)
    }

    pub fn offers(&self) -> &[Offer] {
        &self.offers
    }

    pub fn len(&self) -> usize {
        self.offers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offers.is_empty()
    }

    /// Announce every offer as a received proposal.
    pub fn publish(&self, consumer: &dyn EventConsumer) {
        for offer in &self.offers {
            consumer.consume(&MarketEvent::ProposalReceived { offer: offer.clone() });
        }
    }

    /// Sign an agreement for an offer and create its activity.
    pub fn sign_agreement(&self, offer: &Offer) -> Agreement {
        let agreement = Agreement {
            agreement_id: AgreementId::generate(),
            activity_id: ActivityId::generate(),
            offer: offer.clone(),
        };
        info!(
            agreement_id = %agreement.agreement_id,
            activity_id = %agreement.activity_id,
            provider_id = %offer.issuer,
            "Agreement signed"
        );
        agreement
    }
}
