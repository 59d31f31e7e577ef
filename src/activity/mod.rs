//! Wallet activity lookup.
//!
//! The scoring pipeline asks an [`ActivitySource`] for a wallet's aggregated
//! on-chain metrics. The in-memory source is seeded from configuration and can
//! be updated at runtime; a wallet it has never seen is treated as having no
//! history, which scores at the neutral baseline.

use dashmap::DashMap;
use std::sync::Arc;

use crate::auth::WalletAddress;
use crate::config::ActivityConfig;
use crate::scoring::WalletActivity;

/// Source of aggregated wallet metrics.
pub trait ActivitySource: Send + Sync {
    /// `None` when the wallet is unknown.
    fn fetch(&self, wallet: &WalletAddress) -> Option<WalletActivity>;
}

/// A thread-safe activity store keyed by wallet.
#[derive(Debug, Clone, Default)]
pub struct InMemoryActivitySource {
    inner: Arc<DashMap<WalletAddress, WalletActivity>>,
}

impl InMemoryActivitySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from configuration. Entries with malformed addresses are skipped
    /// (validation rejects them before this runs).
    pub fn from_config(config: &ActivityConfig) -> Self {
        let source = Self::new();
        for entry in &config.wallets {
            match entry.address.parse::<WalletAddress>() {
                Ok(wallet) => source.record(wallet, entry.activity.clone()),
                Err(e) => {
                    tracing::warn!(address = %entry.address, error = %e, "Skipping seeded wallet")
                }
            }
        }
        tracing::info!("Loaded activity for {} wallets", source.len());
        source
    }

    /// Insert or replace a wallet's activity.
    pub fn record(&self, wallet: WalletAddress, activity: WalletActivity) {
        self.inner.insert(wallet, activity);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl ActivitySource for InMemoryActivitySource {
    fn fetch(&self, wallet: &WalletAddress) -> Option<WalletActivity> {
        self.inner.get(wallet).map(|r| r.value().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ActivityEntry;

    const WALLET: &str = "GBRPYHIL2CI3FNQ4BXLFMNDLFJUNPU2HY3ZMFSHONUCEOASW7QC7OX2H";

    #[test]
    fn test_unknown_wallet() {
        let source = InMemoryActivitySource::new();
        assert!(source.fetch(&WALLET.parse().unwrap()).is_none());
    }

    #[test]
    fn test_seeded_from_config() {
        let config = ActivityConfig {
            wallets: vec![
                ActivityEntry {
                    address: WALLET.to_string(),
                    activity: WalletActivity {
                        transaction_count: 7,
                        ..WalletActivity::default()
                    },
                },
                ActivityEntry {
                    address: "bogus".to_string(),
                    activity: WalletActivity::default(),
                },
            ],
        };
        let source = InMemoryActivitySource::from_config(&config);

        assert_eq!(source.len(), 1);
        let activity = source.fetch(&WALLET.parse().unwrap()).unwrap();
        assert_eq!(activity.transaction_count, 7);
    }

    #[test]
    fn test_record_replaces() {
        let source = InMemoryActivitySource::new();
        let wallet: WalletAddress = WALLET.parse().unwrap();
        source.record(wallet.clone(), WalletActivity::default());
        source.record(
            wallet.clone(),
            WalletActivity {
                volume: 10.0,
                ..WalletActivity::default()
            },
        );
        assert_eq!(source.fetch(&wallet).unwrap().volume, 10.0);
    }
}
