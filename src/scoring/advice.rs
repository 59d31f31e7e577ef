//! Improvement hints shown next to a score.

use crate::scoring::types::{FeatureVector, Tier};

const LOW_FREQUENCY: f64 = 0.15;
const LOW_DIVERSITY: f64 = 0.5;
const LOW_TIMELINESS: f64 = 0.9;
const LOW_BALANCE: f64 = 0.01;

/// Deterministic hints derived from the features and tier.
pub fn recommendations(features: &FeatureVector, tier: Tier) -> Vec<String> {
    let mut hints = Vec::new();

    if features.frequency < LOW_FREQUENCY {
        hints.push("Transact more regularly to improve your score".to_string());
    }
    if features.diversity < LOW_DIVERSITY {
        hints.push("Diversify your counterparties and operation types".to_string());
    }
    if features.timeliness < LOW_TIMELINESS {
        hints.push("Settle obligations on time to raise your timeliness".to_string());
    }
    if features.avg_balance < LOW_BALANCE {
        hints.push("Keep a higher average balance to show stability".to_string());
    }
    if tier == Tier::Entry {
        hints.push("Keep using the network to build your credit history".to_string());
    }

    if hints.is_empty() {
        hints.push("Excellent profile, keep up your current habits".to_string());
    }
    hints
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strong_profile() {
        let hints = recommendations(&FeatureVector::uniform(0.95), Tier::High);
        assert_eq!(hints.len(), 1);
        assert!(hints[0].starts_with("Excellent"));
    }

    #[test]
    fn test_weak_profile() {
        let hints = recommendations(&FeatureVector::uniform(0.0), Tier::Entry);
        assert_eq!(hints.len(), 5);
    }
}
