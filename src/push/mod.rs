//! Score push channel.
//!
//! Successful scoring results are published to subscribers of the scored
//! wallet. Delivery is best-effort: no acknowledgement, no retry, and a
//! publish with nobody listening is a no-op.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tokio::sync::broadcast;

use crate::auth::WalletAddress;
use crate::observability::metrics;
use crate::scoring::{ScoreResult, Tier};

/// Event emitted for every successful wallet scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreEvent {
    pub wallet: WalletAddress,
    pub score: u16,
    pub breakdown: BTreeMap<String, f64>,
    pub tier: Tier,
    pub computed_at: u64,
}

impl ScoreEvent {
    pub fn new(wallet: WalletAddress, result: &ScoreResult) -> Self {
        Self {
            wallet,
            score: result.scaled_score,
            breakdown: result.breakdown.clone(),
            tier: result.tier,
            computed_at: result.computed_at,
        }
    }
}

/// Publish/subscribe abstraction keyed by wallet.
pub trait ScoreChannel: Send + Sync {
    /// Returns the number of subscribers the event reached.
    fn publish(&self, event: ScoreEvent) -> usize;
}

/// In-process hub with one broadcast channel per watched wallet.
#[derive(Debug)]
pub struct BroadcastHub {
    channels: DashMap<WalletAddress, broadcast::Sender<ScoreEvent>>,
    capacity: usize,
}

impl BroadcastHub {
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Subscribe to events for `wallet`.
    pub fn subscribe(&self, wallet: &WalletAddress) -> broadcast::Receiver<ScoreEvent> {
        self.channels
            .entry(wallet.clone())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Wallets with a registered channel.
    pub fn watched_wallets(&self) -> usize {
        self.channels.len()
    }
}

impl ScoreChannel for BroadcastHub {
    fn publish(&self, event: ScoreEvent) -> usize {
        let wallet = event.wallet.clone();
        let delivered = match self.channels.get(&wallet) {
            Some(tx) => tx.send(event).unwrap_or(0),
            None => 0,
        };

        if delivered == 0 {
            // Checked under the shard lock, so a concurrent subscribe wins.
            self.channels
                .remove_if(&wallet, |_, tx| tx.receiver_count() == 0);
            tracing::debug!(wallet = %wallet, "No live subscriber for score event");
        }

        metrics::record_push(delivered);
        delivered
    }
}
