//! Provider reputations and reputation-weighted admission.

use std::collections::HashMap;

use tokio::sync::watch;

use repu_core::{ProviderId, Reputation};

/// Probability of admitting a rated provider.
///
/// `better` is the number of fetched rated providers with a strictly higher
/// score and `total` the number of fetched rated providers. The penalty grows
/// quadratically with the share of providers ranked above, scaled by
/// `repu_factor` (0..=100).
pub fn acceptance_probability(repu_factor: u8, better: usize, total: usize) -> f64 {
    if total == 0 {
        return 1.0;
    }
    let outranked = better as f64 / total as f64;
    1.0 - (f64::from(repu_factor.min(100)) / 100.0) * outranked * outranked
}

/// Write-once reputation slots, one per provider ever seen.
///
/// A slot holds `None` until its fetch completes; waiting callers are woken
/// through the slot's watch channel.
#[derive(Debug, Default)]
pub struct ReputationBook {
    slots: HashMap<ProviderId, watch::Receiver<Option<Reputation>>>,
}

impl ReputationBook {
    /// Create an empty book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a slot for an unseen provider.
    ///
    /// Returns the slot's writer when the provider is new; the caller is then
    /// responsible for fetching the reputation. Returns `None` for known
    /// providers.
    pub fn track(
        &mut self,
        provider_id: &ProviderId,
    ) -> Option<watch::Sender<Option<Reputation>>> {
        if self.slots.contains_key(provider_id) {
            return None;
        }
        let (tx, rx) = watch::channel(None);
        self.slots.insert(provider_id.clone(), rx);
        Some(tx)
    }

    /// Subscribe to a provider's slot.
    pub fn subscribe(
        &self,
        provider_id: &ProviderId,
    ) -> Option<watch::Receiver<Option<Reputation>>> {
        self.slots.get(provider_id).cloned()
    }

    /// Number of providers seen.
    pub fn providers_seen(&self) -> usize {
        self.slots.len()
    }

    /// `(better, total)` for a score: fetched rated providers scoring strictly
    /// higher, and all fetched rated providers.
    pub fn rank(&self, score: f64) -> (usize, usize) {
        let rated: Vec<f64> = self
            .slots
            .values()
            .filter_map(|rx| rx.borrow().and_then(|r| r.score()))
            .collect();
        let better = rated.iter().filter(|other| **other > score).count();
        (better, rated.len())
    }
}
