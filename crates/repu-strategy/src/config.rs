//! Strategy configuration.

use std::time::Duration;

use repu_core::CoreError;

use crate::pricing::PriceCeilings;

/// Strategy configuration.
#[derive(Debug, Clone)]
pub struct StrategyConfig {
    /// Distinct offers to collect before the first offer is scored.
    pub min_offers: usize,

    /// Weight of reputation in admission, 0 (ignored) to 100 (strict).
    pub repu_factor: u8,

    /// Longest wait for `min_offers` before scoring anyway.
    pub wait_for_offers_timeout: Duration,

    /// Price limits applied to every offer.
    pub price_ceilings: PriceCeilings,

    /// Seed for admission draws; entropy when unset.
    pub seed: Option<u64>,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            min_offers: 6,
            repu_factor: 0,
            wait_for_offers_timeout: Duration::from_secs(60),
            price_ceilings: PriceCeilings::default(),
            seed: None,
        }
    }
}

impl StrategyConfig {
    /// Check knob ranges.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.repu_factor > 100 {
            return Err(CoreError::InvalidConfig {
                field: "repu_factor",
                value: self.repu_factor.to_string(),
                expected: "0..=100",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(StrategyConfig::default().validate().is_ok());
    }

    #[test]
    fn test_repu_factor_range() {
        let config = StrategyConfig {
            repu_factor: 101,
            ..StrategyConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(CoreError::InvalidConfig {
                field: "repu_factor",
                ..
            })
        ));
    }
}
