//! Weighted scoring model and tier decision.

use arc_swap::ArcSwap;
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::ScoringConfig;
use crate::scoring::offers::TierPolicy;
use crate::scoring::types::{
    Factor, FeatureVector, ScoreResult, ScoringError, WeightMap, MAX_SCORE, MIN_SCORE,
};

/// Width of the scaled score range.
const SCORE_SPAN: f64 = (MAX_SCORE - MIN_SCORE) as f64;

/// Compute a score result. Pure apart from the fresh id and timestamp.
///
/// `rawScore` is the left-to-right sum of the breakdown values, so the two
/// always agree exactly.
pub fn compute(
    features: &FeatureVector,
    weights: &WeightMap,
    tiers: &TierPolicy,
) -> Result<ScoreResult, ScoringError> {
    features.validate()?;

    let mut breakdown = BTreeMap::new();
    let mut raw_score = 0.0;
    for factor in Factor::ALL {
        let contribution = weights.get(factor) * features.get(factor);
        raw_score += contribution;
        breakdown.insert(factor.name().to_string(), contribution);
    }

    let scaled_score = scale(raw_score);

    Ok(ScoreResult {
        id: Uuid::new_v4(),
        raw_score,
        scaled_score,
        breakdown,
        weights: weights.to_map(),
        tier: tiers.tier(scaled_score),
        computed_at: crate::auth::unix_now(),
    })
}

/// Map a raw score onto [300, 850], rounding half away from zero.
pub fn scale(raw_score: f64) -> u16 {
    let scaled = (MIN_SCORE as f64 + raw_score * SCORE_SPAN).round();
    scaled.clamp(MIN_SCORE as f64, MAX_SCORE as f64) as u16
}

/// Scoring engine holding the live policy.
///
/// The policy is swapped atomically on configuration reload; a computation
/// in flight keeps the snapshot it started with.
#[derive(Debug)]
pub struct ScoringEngine {
    policy: ArcSwap<ScoringConfig>,
}

impl ScoringEngine {
    pub fn new(policy: ScoringConfig) -> Self {
        Self {
            policy: ArcSwap::from_pointee(policy),
        }
    }

    /// Score with the configured weights, or `weights` when given.
    pub fn score(
        &self,
        features: &FeatureVector,
        weights: Option<&WeightMap>,
    ) -> Result<ScoreResult, ScoringError> {
        let policy = self.policy.load();
        match weights {
            Some(custom) => {
                custom.validate()?;
                compute(features, custom, &policy.tiers)
            }
            None => compute(features, &policy.weights, &policy.tiers),
        }
    }

    /// Current policy snapshot.
    pub fn policy(&self) -> Arc<ScoringConfig> {
        self.policy.load_full()
    }

    /// Replace the policy. Callers validate before reloading.
    pub fn reload(&self, policy: ScoringConfig) {
        self.policy.store(Arc::new(policy));
        tracing::info!("Scoring policy reloaded");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::features::NEUTRAL_BASELINE;
    use crate::scoring::types::Tier;

    fn engine() -> ScoringEngine {
        ScoringEngine::new(ScoringConfig::default())
    }

    #[test]
    fn test_reference_vector() {
        let features = FeatureVector {
            volume: 0.5,
            timeliness: 0.9,
            frequency: 0.3,
            diversity: 0.6,
            avg_balance: 0.4,
        };
        let result = engine().score(&features, None).unwrap();

        // 0.10 + 0.27 + 0.045 + 0.12 + 0.06
        assert!((result.raw_score - 0.595).abs() < 1e-9);
        assert_eq!(result.scaled_score, 627);
        assert_eq!(result.tier, Tier::Medium);
    }

    #[test]
    fn test_new_user_baseline() {
        let result = engine()
            .score(&FeatureVector::uniform(NEUTRAL_BASELINE), None)
            .unwrap();

        assert!((result.raw_score - 0.35).abs() < 1e-9);
        assert_eq!(result.scaled_score, 493);
        assert_eq!(result.tier, Tier::Entry);
    }

    #[test]
    fn test_bounds() {
        let engine = engine();
        let low = engine.score(&FeatureVector::uniform(0.0), None).unwrap();
        let high = engine.score(&FeatureVector::uniform(1.0), None).unwrap();

        assert_eq!(low.scaled_score, MIN_SCORE);
        assert_eq!(high.scaled_score, MAX_SCORE);
        assert_eq!(high.tier, Tier::High);
    }

    #[test]
    fn test_score_range_over_grid() {
        let engine = engine();
        let steps = [0.0, 0.13, 0.5, 0.77, 1.0];
        for v in steps {
            for t in steps {
                for b in steps {
                    let features = FeatureVector {
                        volume: v,
                        timeliness: t,
                        frequency: b,
                        diversity: t,
                        avg_balance: v,
                    };
                    let result = engine.score(&features, None).unwrap();
                    assert!((MIN_SCORE..=MAX_SCORE).contains(&result.scaled_score));
                    let sum: f64 = result.breakdown.values().sum();
                    assert!((sum - result.raw_score).abs() < 1e-12);
                }
            }
        }
    }

    #[test]
    fn test_breakdown_matches_weights() {
        let features = FeatureVector::uniform(0.5);
        let result = engine().score(&features, None).unwrap();

        assert_eq!(result.breakdown.len(), 5);
        assert_eq!(result.breakdown["timeliness"], 0.30 * 0.5);
        assert_eq!(result.weights["avgBalance"], 0.15);
    }

    #[test]
    fn test_deterministic_except_identity() {
        let engine = engine();
        let features = FeatureVector::uniform(0.42);
        let a = engine.score(&features, None).unwrap();
        let b = engine.score(&features, None).unwrap();

        assert_ne!(a.id, b.id);
        assert_eq!(a.raw_score, b.raw_score);
        assert_eq!(a.scaled_score, b.scaled_score);
        assert_eq!(a.breakdown, b.breakdown);
        assert_eq!(a.weights, b.weights);
        assert_eq!(a.tier, b.tier);
    }

    #[test]
    fn test_custom_weights() {
        let weights = WeightMap {
            volume: 0.0,
            timeliness: 1.0,
            frequency: 0.0,
            diversity: 0.0,
            avg_balance: 0.0,
        };
        let features = FeatureVector {
            timeliness: 1.0,
            ..FeatureVector::uniform(0.0)
        };
        let result = engine().score(&features, Some(&weights)).unwrap();
        assert_eq!(result.scaled_score, MAX_SCORE);
    }

    #[test]
    fn test_out_of_range_rejected() {
        let features = FeatureVector {
            volume: 1.5,
            ..FeatureVector::uniform(0.5)
        };
        assert!(matches!(
            engine().score(&features, None),
            Err(ScoringError::InputInvalid { factor: "volume", .. })
        ));
    }

    #[test]
    fn test_reload_swaps_policy() {
        let engine = engine();
        let mut policy = ScoringConfig::default();
        policy.weights = WeightMap {
            volume: 1.0,
            timeliness: 0.0,
            frequency: 0.0,
            diversity: 0.0,
            avg_balance: 0.0,
        };
        engine.reload(policy);

        let features = FeatureVector {
            volume: 0.0,
            ..FeatureVector::uniform(1.0)
        };
        assert_eq!(engine.score(&features, None).unwrap().scaled_score, MIN_SCORE);
    }

    #[test]
    fn test_scale_rounding() {
        assert_eq!(scale(0.35), 493);
        assert_eq!(scale(-1.0), MIN_SCORE);
        assert_eq!(scale(2.0), MAX_SCORE);
    }
}
