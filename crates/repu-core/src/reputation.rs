//! Provider reputation values.

use serde::{Deserialize, Serialize};

/// Trust score of a provider as reported by the reputation service.
///
/// `Unknown` covers both never-rated providers and every failure to obtain a
/// score; the scoring layer never distinguishes the two.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reputation {
    /// No score available.
    #[default]
    Unknown,
    /// Standard score of a rated provider.
    Rated(f64),
}

impl Reputation {
    /// The numeric score, if the provider is rated.
    pub fn score(&self) -> Option<f64> {
        match self {
            Self::Rated(score) => Some(*score),
            Self::Unknown => None,
        }
    }

    /// Returns true for providers without a usable score.
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }
}

impl From<Option<f64>> for Reputation {
    fn from(score: Option<f64>) -> Self {
        match score {
            Some(s) if s.is_finite() => Self::Rated(s),
            _ => Self::Unknown,
        }
    }
}
