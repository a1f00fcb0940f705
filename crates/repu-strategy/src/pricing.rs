//! Price ceilings for the linear pay-per-use model.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use repu_core::LinearPricing;

/// Coefficient of a price model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceComponent {
    Fixed,
    CpuPerSec,
    DurationPerSec,
}

impl std::fmt::Display for PriceComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Fixed => "fixed",
            Self::CpuPerSec => "cpu_per_sec",
            Self::DurationPerSec => "duration_per_sec",
        };
        f.write_str(name)
    }
}

/// Highest acceptable value of each price coefficient.
///
/// A coefficient equal to its ceiling is acceptable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceCeilings {
    pub max_fixed: Decimal,
    pub max_cpu_per_sec: Decimal,
    pub max_duration_per_sec: Decimal,
}

impl Default for PriceCeilings {
    fn default() -> Self {
        Self {
            // 1.0 per activity, 0.36 per CPU hour, 0.18 per wall hour
            max_fixed: Decimal::ONE,
            max_cpu_per_sec: Decimal::new(1, 4),
            max_duration_per_sec: Decimal::new(5, 5),
        }
    }
}

impl PriceCeilings {
    /// First coefficient of `pricing` above its ceiling, if any.
    pub fn exceeded(&self, pricing: &LinearPricing) -> Option<PriceComponent> {
        if pricing.fixed > self.max_fixed {
            Some(PriceComponent::Fixed)
        } else if pricing.cpu_per_sec > self.max_cpu_per_sec {
            Some(PriceComponent::CpuPerSec)
        } else if pricing.duration_per_sec > self.max_duration_per_sec {
            Some(PriceComponent::DurationPerSec)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_boundary_is_inclusive() {
        let ceilings = PriceCeilings::default();
        let at_limit = LinearPricing::new(
            ceilings.max_fixed,
            ceilings.max_cpu_per_sec,
            ceilings.max_duration_per_sec,
        );
        assert_eq!(ceilings.exceeded(&at_limit), None);
    }

    #[test]
    fn test_each_component_is_checked() {
        let ceilings = PriceCeilings {
            max_fixed: dec!(1),
            max_cpu_per_sec: dec!(1),
            max_duration_per_sec: dec!(1),
        };

        let fixed = LinearPricing::new(dec!(2), dec!(0), dec!(0));
        assert_eq!(ceilings.exceeded(&fixed), Some(PriceComponent::Fixed));

        let cpu = LinearPricing::new(dec!(0), dec!(1.0001), dec!(0));
        assert_eq!(ceilings.exceeded(&cpu), Some(PriceComponent::CpuPerSec));

        let duration = LinearPricing::new(dec!(0), dec!(0), dec!(3));
        assert_eq!(
            ceilings.exceeded(&duration),
            Some(PriceComponent::DurationPerSec)
        );
    }
}
