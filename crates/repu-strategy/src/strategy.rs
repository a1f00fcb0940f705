//! Offer scoring strategy.
//!
//! Scores are plain floats: anything `>= 0` means "negotiate this offer",
//! [`REJECT`] means "do not". Rejection is never an error.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rand::distributions::Open01;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use repu_client::ReputationSource;
use repu_core::{
    CoreError, DebitNote, EventConsumer, Invoice, MarketEvent, Offer, OfferId, ProviderId,
    Reputation,
};

use crate::admission::AdmissionGate;
use crate::config::StrategyConfig;
use crate::ledger::{PaymentLedger, StrategySummary};
use crate::ranking::{acceptance_probability, ReputationBook};

/// Score of an offer that must not be negotiated.
pub const REJECT: f64 = -1.0;

/// Mutable per-run bookkeeping. Never held across an `.await`.
#[derive(Debug, Default)]
struct StrategyState {
    offers: HashMap<OfferId, Offer>,
    reputations: ReputationBook,
    scored_providers: HashSet<ProviderId>,
    ledger: PaymentLedger,
}

/// Reputation-aware market strategy.
pub struct AlphaStrategy {
    config: StrategyConfig,
    reputation: Arc<dyn ReputationSource>,
    gate: AdmissionGate,
    state: Mutex<StrategyState>,
    rng: Mutex<StdRng>,
}

impl AlphaStrategy {
    /// Create a new strategy.
    pub fn new(
        config: StrategyConfig,
        reputation: Arc<dyn ReputationSource>,
    ) -> Result<Self, CoreError> {
        config.validate()?;

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            gate: AdmissionGate::new(config.min_offers, config.wait_for_offers_timeout),
            config,
            reputation,
            state: Mutex::new(StrategyState::default()),
            rng: Mutex::new(rng),
        })
    }

    /// The configuration this strategy runs with.
    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    fn state(&self) -> MutexGuard<'_, StrategyState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn rng(&self) -> MutexGuard<'_, StdRng> {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Score an offer.
    ///
    /// Waits for the admission gate, rejects duplicates and overpriced offers,
    /// then applies reputation-weighted admission.
    pub async fn score_offer(&self, offer: &Offer) -> f64 {
        // The fetch overlaps with the admission wait.
        self.track_provider(&offer.issuer);
        self.gate.wait().await;

        // No suspension point between the check and the mark: a second call
        // for the same issuer has to see it as scored.
        {
            let mut state = self.state();
            if state.scored_providers.contains(&offer.issuer) {
                if !offer.is_draft {
                    debug!(
                        offer_id = %offer.id,
                        provider_id = %offer.issuer,
                        "Rejecting offer from already scored provider"
                    );
                    return REJECT;
                }
            } else {
                state.scored_providers.insert(offer.issuer.clone());
            }
        }

        if let Some(component) = self.config.price_ceilings.exceeded(&offer.pricing) {
            info!(
                offer_id = %offer.id,
                provider_id = %offer.issuer,
                component = %component,
                "Rejecting offer above price ceiling"
            );
            return REJECT;
        }

        let score = self.reputation_score(&offer.issuer).await;
        info!(
            offer_id = %offer.id,
            provider_id = %offer.issuer,
            score,
            "Offer scored"
        );
        score
    }

    /// Reputation-weighted admission for one provider.
    async fn reputation_score(&self, provider_id: &ProviderId) -> f64 {
        let score = match self.reputation_of(provider_id).await {
            Some(Reputation::Rated(score)) => score,
            // New providers always get a trial.
            Some(Reputation::Unknown) | None => return 1.0,
        };

        let (better, total) = self.state().reputations.rank(score);
        let probability = acceptance_probability(self.config.repu_factor, better, total);

        let mut rng = self.rng();
        if rng.gen::<f64>() < probability {
            // Random score keeps arrival order from deciding the ranking.
            rng.sample(Open01)
        } else {
            debug!(
                provider_id = %provider_id,
                better,
                total,
                probability,
                "Provider lost the reputation draw"
            );
            REJECT
        }
    }

    /// Reputation of a provider, waiting for its fetch to finish.
    ///
    /// Returns `None` for providers that were never seen.
    pub async fn reputation_of(&self, provider_id: &ProviderId) -> Option<Reputation> {
        let mut slot = self.state().reputations.subscribe(provider_id)?;

        let reputation = match slot.wait_for(Option::is_some).await {
            Ok(value) => value.unwrap_or_default(),
            // Writer gone without a value: the fetch task never finished.
            Err(_) => Reputation::Unknown,
        };
        Some(reputation)
    }

    /// Open the provider's reputation slot and start its fetch, once.
    fn track_provider(&self, provider_id: &ProviderId) {
        let new_slot = self.state().reputations.track(provider_id);
        if let Some(slot) = new_slot {
            self.fetch_reputation(provider_id.clone(), slot);
        }
    }

    /// Start a fire-and-forget fetch that fills the provider's slot.
    fn fetch_reputation(&self, provider_id: ProviderId, slot: watch::Sender<Option<Reputation>>) {
        let source = Arc::clone(&self.reputation);

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                debug!(provider_id = %provider_id, "Fetching reputation");
                handle.spawn(async move {
                    let reputation = source.reputation(&provider_id).await;
                    slot.send_replace(Some(reputation));
                });
            }
            Err(_) => {
                warn!(
                    provider_id = %provider_id,
                    "No runtime to fetch reputation, treating provider as unknown"
                );
                slot.send_replace(Some(Reputation::Unknown));
            }
        }
    }

    /// Update bookkeeping for one marketplace event.
    pub fn event_consumer(&self, event: &MarketEvent) {
        match event {
            MarketEvent::ProposalReceived { offer } => {
                let (new_slot, offers_seen) = {
                    let mut state = self.state();
                    if state.offers.contains_key(&offer.id) {
                        return;
                    }
                    state.offers.insert(offer.id.clone(), offer.clone());
                    (state.reputations.track(&offer.issuer), state.offers.len())
                };
                debug!(
                    offer_id = %offer.id,
                    provider_id = %offer.issuer,
                    offers_seen,
                    "Proposal received"
                );

                self.gate.record_offers(offers_seen);
                if let Some(slot) = new_slot {
                    self.fetch_reputation(offer.issuer.clone(), slot);
                }
            }
            MarketEvent::TaskAccepted {
                agreement_id,
                activity_id,
                task_id,
            } => {
                if self.state().ledger.mark_accepted(agreement_id, activity_id) {
                    info!(
                        agreement_id = %agreement_id,
                        activity_id = %activity_id,
                        task_id = %task_id,
                        "Agreement payable"
                    );
                }
            }
            MarketEvent::TaskTimeout {
                agreement_id,
                activity_id,
                phase,
            } => {
                if self.state().ledger.mark_failed(activity_id) {
                    warn!(
                        agreement_id = %agreement_id,
                        activity_id = %activity_id,
                        phase = %phase,
                        "Activity failed: timeout"
                    );
                }
            }
            MarketEvent::IncorrectResult {
                agreement_id,
                activity_id,
                reason,
            } => {
                if self.state().ledger.mark_failed(activity_id) {
                    warn!(
                        agreement_id = %agreement_id,
                        activity_id = %activity_id,
                        reason = %reason,
                        "Activity failed: incorrect result"
                    );
                }
            }
            MarketEvent::AgreementRejected {
                agreement_id,
                provider_id,
            } => {
                info!(
                    agreement_id = %agreement_id,
                    provider_id = %provider_id,
                    "Agreement rejected by provider"
                );
            }
        }
    }

    /// Amount to pay for a debit note.
    pub fn approved_debit_amount(&self, debit_note: &DebitNote) -> Decimal {
        let approved = self.state().ledger.approved_debit_amount(debit_note);
        debug!(
            debit_note_id = %debit_note.id,
            activity_id = %debit_note.activity_id,
            due = %debit_note.total_amount_due,
            approved = %approved,
            "Debit note decision"
        );
        approved
    }

    /// Amount to pay for an invoice.
    pub fn approved_invoice_amount(&self, invoice: &Invoice) -> Decimal {
        let approved = self.state().ledger.approved_invoice_amount(invoice);
        debug!(
            invoice_id = %invoice.id,
            agreement_id = %invoice.agreement_id,
            amount = %invoice.amount,
            approved = %approved,
            "Invoice decision"
        );
        approved
    }

    /// Counters for the run so far.
    pub fn summary(&self) -> StrategySummary {
        let state = self.state();
        StrategySummary {
            offers_seen: state.offers.len(),
            providers_seen: state.reputations.providers_seen(),
            providers_scored: state.scored_providers.len(),
            payable_agreements: state.ledger.payable_agreements(),
            payable_activities: state.ledger.payable_activities(),
            failed_activities: state.ledger.failed_activities(),
        }
    }
}

impl EventConsumer for AlphaStrategy {
    fn consume(&self, event: &MarketEvent) {
        self.event_consumer(event);
    }
}
