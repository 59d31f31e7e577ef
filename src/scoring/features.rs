//! Raw wallet activity to normalized feature vector.
//!
//! Every output lies in [0, 1]: extreme raw values are clamped, never
//! rejected. Factors that cannot be derived (zero denominator) and fully
//! empty histories take the neutral baseline so new wallets are not scored
//! as if they had failed.

use serde::{Deserialize, Serialize};

use crate::scoring::types::FeatureVector;

/// Substitute for factors with no observable history.
pub const NEUTRAL_BASELINE: f64 = 0.35;

/// Share of diversity carried by operation-type variety; the rest comes
/// from counterparty variety.
const OPERATION_TYPE_SHARE: f64 = 0.6;

/// Raw on-chain metrics for one wallet over the observation window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletActivity {
    /// Number of transactions observed. Zero means empty history.
    pub transaction_count: u32,
    /// USD-equivalent volume.
    pub volume: f64,
    /// Obligations settled on time.
    pub on_time: u32,
    /// Obligations settled late or failed.
    pub delayed: u32,
    /// Days with at least one transaction.
    pub active_days: u32,
    /// Length of the observation window in days.
    pub observation_days: u32,
    /// Distinct counterparties.
    pub counterparties: u32,
    /// Distinct operation types.
    pub operation_types: u32,
    /// Smoothed rolling balance, USD-equivalent.
    pub avg_balance: f64,
}

impl WalletActivity {
    pub fn is_empty(&self) -> bool {
        self.transaction_count == 0
    }
}

/// Scale limits for normalization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizationLimits {
    /// Volume that maps to 1.0.
    pub max_volume: f64,
    /// Average balance that maps to 1.0.
    pub max_balance: f64,
    /// Counterparty count that maps to full counterparty diversity.
    pub max_counterparties: u32,
    /// Operation-type count that maps to full type diversity.
    pub max_operation_types: u32,
}

impl Default for NormalizationLimits {
    fn default() -> Self {
        Self {
            max_volume: 50_000.0,
            max_balance: 10_000.0,
            max_counterparties: 50,
            max_operation_types: 3,
        }
    }
}

impl NormalizationLimits {
    pub fn validate(&self) -> Result<(), String> {
        if !(self.max_volume.is_finite() && self.max_volume > 0.0) {
            return Err("max_volume must be positive".into());
        }
        if !(self.max_balance.is_finite() && self.max_balance > 0.0) {
            return Err("max_balance must be positive".into());
        }
        if self.max_counterparties == 0 || self.max_operation_types == 0 {
            return Err("max_counterparties and max_operation_types must be positive".into());
        }
        Ok(())
    }
}

/// Normalize raw activity into a fully populated feature vector.
pub fn normalize(activity: &WalletActivity, limits: &NormalizationLimits) -> FeatureVector {
    if activity.is_empty() {
        return FeatureVector::uniform(NEUTRAL_BASELINE);
    }

    let obligations = u64::from(activity.on_time) + u64::from(activity.delayed);
    let timeliness = if obligations == 0 {
        NEUTRAL_BASELINE
    } else {
        ratio(activity.on_time as f64, obligations as f64)
    };

    let frequency = if activity.observation_days == 0 {
        NEUTRAL_BASELINE
    } else {
        ratio(activity.active_days as f64, activity.observation_days as f64)
    };

    let type_variety = ratio(
        activity.operation_types as f64,
        limits.max_operation_types as f64,
    );
    let counterparty_variety = ratio(
        activity.counterparties as f64,
        limits.max_counterparties as f64,
    );
    let diversity = unit(
        OPERATION_TYPE_SHARE * type_variety + (1.0 - OPERATION_TYPE_SHARE) * counterparty_variety,
    );

    FeatureVector {
        volume: ratio(activity.volume, limits.max_volume),
        timeliness,
        frequency,
        diversity,
        avg_balance: ratio(activity.avg_balance, limits.max_balance),
    }
}

/// `num / den` clamped into [0, 1]; zero or invalid denominators give 0.
fn ratio(num: f64, den: f64) -> f64 {
    if den <= 0.0 || !den.is_finite() {
        return 0.0;
    }
    unit(num / den)
}

/// Clamp into [0, 1], mapping NaN to 0.
fn unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active_wallet() -> WalletActivity {
        WalletActivity {
            transaction_count: 40,
            volume: 25_000.0,
            on_time: 9,
            delayed: 1,
            active_days: 27,
            observation_days: 90,
            counterparties: 10,
            operation_types: 3,
            avg_balance: 4_000.0,
        }
    }

    #[test]
    fn test_extreme_obligation_counts_clamp() {
        let activity = WalletActivity {
            transaction_count: 10,
            on_time: u32::MAX,
            delayed: 1,
            ..WalletActivity::default()
        };
        let features = normalize(&activity, &NormalizationLimits::default());

        assert!(features.timeliness > 0.999_999);
        assert!(features.validate().is_ok());
    }

    #[test]
    fn test_empty_history_gets_baseline() {
        let features = normalize(&WalletActivity::default(), &NormalizationLimits::default());
        assert_eq!(features, FeatureVector::uniform(NEUTRAL_BASELINE));
    }

    #[test]
    fn test_normalize_active_wallet() {
        let features = normalize(&active_wallet(), &NormalizationLimits::default());

        assert!((features.volume - 0.5).abs() < 1e-12);
        assert!((features.timeliness - 0.9).abs() < 1e-12);
        assert!((features.frequency - 0.3).abs() < 1e-12);
        // 0.6 * 1.0 + 0.4 * 0.2
        assert!((features.diversity - 0.68).abs() < 1e-12);
        assert!((features.avg_balance - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_extreme_values_are_clamped() {
        let activity = WalletActivity {
            transaction_count: 1,
            volume: 1e12,
            on_time: 5,
            delayed: 0,
            active_days: 400,
            observation_days: 90,
            counterparties: 10_000,
            operation_types: 99,
            avg_balance: -50.0,
        };
        let features = normalize(&activity, &NormalizationLimits::default());

        assert_eq!(features.volume, 1.0);
        assert_eq!(features.frequency, 1.0);
        assert_eq!(features.diversity, 1.0);
        assert_eq!(features.avg_balance, 0.0);
        assert!(features.validate().is_ok());
    }

    #[test]
    fn test_nan_inputs_do_not_escape() {
        let activity = WalletActivity {
            transaction_count: 3,
            volume: f64::NAN,
            avg_balance: f64::INFINITY,
            ..WalletActivity::default()
        };
        let features = normalize(&activity, &NormalizationLimits::default());

        assert_eq!(features.volume, 0.0);
        assert_eq!(features.avg_balance, 1.0);
        assert!(features.validate().is_ok());
    }

    #[test]
    fn test_undefined_factors_use_baseline() {
        let activity = WalletActivity {
            transaction_count: 2,
            volume: 100.0,
            ..WalletActivity::default()
        };
        let features = normalize(&activity, &NormalizationLimits::default());

        assert_eq!(features.timeliness, NEUTRAL_BASELINE);
        assert_eq!(features.frequency, NEUTRAL_BASELINE);
        assert_eq!(features.diversity, 0.0);
    }
}
