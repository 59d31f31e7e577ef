//! Scoring model types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use uuid::Uuid;

/// Lowest scaled score.
pub const MIN_SCORE: u16 = 300;

/// Highest scaled score.
pub const MAX_SCORE: u16 = 850;

/// Tolerance for the weights-sum-to-one check.
pub const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Errors raised by the scoring model.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ScoringError {
    /// A feature outside [0, 1] reached the engine. Upstream normalization
    /// should make this impossible.
    #[error("Feature '{factor}' out of range: {value}")]
    InputInvalid { factor: &'static str, value: f64 },

    /// Weights that are negative, non-finite, or do not sum to 1.
    #[error("Invalid weights: {0}")]
    InvalidWeights(String),
}

/// The five scoring factors, in summation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Factor {
    Volume,
    Timeliness,
    Frequency,
    Diversity,
    AvgBalance,
}

impl Factor {
    pub const ALL: [Factor; 5] = [
        Factor::Volume,
        Factor::Timeliness,
        Factor::Frequency,
        Factor::Diversity,
        Factor::AvgBalance,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Factor::Volume => "volume",
            Factor::Timeliness => "timeliness",
            Factor::Frequency => "frequency",
            Factor::Diversity => "diversity",
            Factor::AvgBalance => "avgBalance",
        }
    }
}

/// Normalized behavioral inputs, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureVector {
    pub volume: f64,
    pub timeliness: f64,
    pub frequency: f64,
    pub diversity: f64,
    #[serde(alias = "avg_balance")]
    pub avg_balance: f64,
}

impl FeatureVector {
    /// Every factor set to `value`.
    pub fn uniform(value: f64) -> Self {
        Self {
            volume: value,
            timeliness: value,
            frequency: value,
            diversity: value,
            avg_balance: value,
        }
    }

    pub fn get(&self, factor: Factor) -> f64 {
        match factor {
            Factor::Volume => self.volume,
            Factor::Timeliness => self.timeliness,
            Factor::Frequency => self.frequency,
            Factor::Diversity => self.diversity,
            Factor::AvgBalance => self.avg_balance,
        }
    }

    /// Check every factor is finite and inside [0, 1].
    pub fn validate(&self) -> Result<(), ScoringError> {
        for factor in Factor::ALL {
            let value = self.get(factor);
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ScoringError::InputInvalid {
                    factor: factor.name(),
                    value,
                });
            }
        }
        Ok(())
    }
}

/// Per-factor weights. Must sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightMap {
    pub volume: f64,
    pub timeliness: f64,
    pub frequency: f64,
    pub diversity: f64,
    #[serde(alias = "avg_balance")]
    pub avg_balance: f64,
}

impl Default for WeightMap {
    fn default() -> Self {
        Self {
            volume: 0.20,
            timeliness: 0.30,
            frequency: 0.15,
            diversity: 0.20,
            avg_balance: 0.15,
        }
    }
}

impl WeightMap {
    pub fn get(&self, factor: Factor) -> f64 {
        match factor {
            Factor::Volume => self.volume,
            Factor::Timeliness => self.timeliness,
            Factor::Frequency => self.frequency,
            Factor::Diversity => self.diversity,
            Factor::AvgBalance => self.avg_balance,
        }
    }

    /// Weights must be finite, non-negative and sum to 1 within tolerance.
    pub fn validate(&self) -> Result<(), ScoringError> {
        let mut sum = 0.0;
        for factor in Factor::ALL {
            let w = self.get(factor);
            if !w.is_finite() || w < 0.0 {
                return Err(ScoringError::InvalidWeights(format!(
                    "weight '{}' must be a non-negative number, got {}",
                    factor.name(),
                    w
                )));
            }
            sum += w;
        }
        if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(ScoringError::InvalidWeights(format!(
                "weights must sum to 1.0, got {}",
                sum
            )));
        }
        Ok(())
    }

    pub fn to_map(&self) -> BTreeMap<String, f64> {
        Factor::ALL
            .iter()
            .map(|f| (f.name().to_string(), self.get(*f)))
            .collect()
    }
}

/// Loan-eligibility bucket derived from the scaled score. Ordered from
/// lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Entry,
    Medium,
    High,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Entry => "entry",
            Tier::Medium => "medium",
            Tier::High => "high",
        }
    }
}

/// Immutable outcome of one scoring computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResult {
    /// Unique per computation; re-scoring never reuses a result.
    pub id: Uuid,
    pub raw_score: f64,
    pub scaled_score: u16,
    /// Factor name to `weight × feature`.
    pub breakdown: BTreeMap<String, f64>,
    pub weights: BTreeMap<String, f64>,
    pub tier: Tier,
    /// Unix seconds.
    pub computed_at: u64,
}
