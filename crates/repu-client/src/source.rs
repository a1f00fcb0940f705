//! Reputation source abstraction.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use repu_core::{ProviderId, Reputation};

/// Anything that can tell the reputation of a provider.
///
/// Implementations never fail: every error degrades to
/// [`Reputation::Unknown`].
#[async_trait]
pub trait ReputationSource: Send + Sync {
    /// Look up one provider.
    async fn reputation(&self, provider_id: &ProviderId) -> Reputation;
}

/// Fixed, in-memory reputation table.
///
/// Used when running without a reputation service (every provider is then
/// unknown) and as a test double.
#[derive(Debug, Clone, Default)]
pub struct StaticReputation {
    scores: HashMap<ProviderId, f64>,
    delay: Option<Duration>,
}

impl StaticReputation {
    /// A source that knows no provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to add a rated provider.
    pub fn with_score(mut self, provider_id: impl Into<ProviderId>, score: f64) -> Self {
        self.scores.insert(provider_id.into(), score);
        self
    }

    /// Builder method to delay every lookup, simulating service latency.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl ReputationSource for StaticReputation {
    async fn reputation(&self, provider_id: &ProviderId) -> Reputation {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Reputation::from(self.scores.get(provider_id).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_lookup() {
        let source = StaticReputation::new().with_score("0xa", 0.9);

        assert_eq!(
            source.reputation(&ProviderId::new("0xa")).await,
            Reputation::Rated(0.9)
        );
        assert_eq!(
            source.reputation(&ProviderId::new("0xb")).await,
            Reputation::Unknown
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_delayed_lookup() {
        let source = StaticReputation::new().with_delay(Duration::from_secs(3));
        let started = tokio::time::Instant::now();

        source.reputation(&ProviderId::new("0xa")).await;
        assert!(started.elapsed() >= Duration::from_secs(3));
    }
}
