//! Latest score per wallet.
//!
//! Every successful scoring overwrites the wallet's entry, so a client that
//! missed the push can still read its most recent result.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::auth::WalletAddress;
use crate::scoring::ScoreResult;

/// A stored scoring result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub wallet: WalletAddress,
    pub score: ScoreResult,
}

/// Storage for the most recent score of each wallet.
pub trait ScoreHistory: Send + Sync {
    fn store(&self, record: ScoreRecord);

    /// `None` when the wallet has never been scored.
    fn latest(&self, wallet: &WalletAddress) -> Option<ScoreRecord>;
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryScoreHistory {
    inner: Arc<DashMap<WalletAddress, ScoreRecord>>,
}

impl InMemoryScoreHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl ScoreHistory for InMemoryScoreHistory {
    fn store(&self, record: ScoreRecord) {
        self.inner.insert(record.wallet.clone(), record);
    }

    fn latest(&self, wallet: &WalletAddress) -> Option<ScoreRecord> {
        self.inner.get(wallet).map(|r| r.value().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScoringConfig;
    use crate::scoring::{FeatureVector, ScoringEngine};

    const WALLET: &str = "GBRPYHIL2CI3FNQ4BXLFMNDLFJUNPU2HY3ZMFSHONUCEOASW7QC7OX2H";

    fn record(value: f64) -> ScoreRecord {
        let engine = ScoringEngine::new(ScoringConfig::default());
        ScoreRecord {
            wallet: WALLET.parse().unwrap(),
            score: engine.score(&FeatureVector::uniform(value), None).unwrap(),
        }
    }

    #[test]
    fn test_unknown_wallet() {
        let history = InMemoryScoreHistory::new();
        assert!(history.latest(&WALLET.parse().unwrap()).is_none());
        assert!(history.is_empty());
    }

    #[test]
    fn test_latest_overwrites() {
        let history = InMemoryScoreHistory::new();
        history.store(record(0.35));
        let newer = record(1.0);
        history.store(newer.clone());

        assert_eq!(history.len(), 1);
        let latest = history.latest(&WALLET.parse().unwrap()).unwrap();
        assert_eq!(latest, newer);
        assert_eq!(latest.score.scaled_score, 850);
    }
}
