//! Task protocol configuration.

use std::time::Duration;

use repu_core::CoreError;

/// Task protocol configuration.
#[derive(Debug, Clone)]
pub struct ProtocolConfig {
    /// Budget for the warm-up batch (runtime image download).
    pub download_timeout: Duration,

    /// Percentage of correct results failed on purpose (0..=100).
    pub random_fail_factor: u8,

    /// Seed for the stress-test draws; entropy when unset.
    pub seed: Option<u64>,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            download_timeout: Duration::from_secs(3 * 60),
            random_fail_factor: 0,
            seed: None,
        }
    }
}

impl ProtocolConfig {
    /// Check knob ranges.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.random_fail_factor > 100 {
            return Err(CoreError::InvalidConfig {
                field: "random_fail_factor",
                value: self.random_fail_factor.to_string(),
                expected: "0..=100",
            });
        }
        Ok(())
    }
}
