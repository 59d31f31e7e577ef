//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::auth::password::{DEFAULT_HASH_COST, DEFAULT_HASH_MEMORY_KIB};
use crate::scoring::{NormalizationLimits, TierPolicy, WalletActivity, WeightMap};

/// Root configuration for the credit service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CreditConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Token, hashing and operator settings.
    pub auth: AuthConfig,

    /// Per-identity rate limiting.
    pub rate_limit: RateLimitConfig,

    /// Weights, tiers and normalization limits. Hot-reloadable.
    pub scoring: ScoringConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Score push channel settings.
    pub push: PushConfig,

    /// Seed data for the in-memory activity source.
    pub activity: ActivityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Secret value that never appears in logs or serialized config.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// An operator account allowed to log in with a password.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OperatorConfig {
    pub username: String,
    /// Argon2 PHC digest, e.g. produced by `credit-cli hash-password`.
    pub password_hash: String,
}

/// Authentication configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Token signing secret. Only ever read from the environment.
    #[serde(skip)]
    pub jwt_secret: Option<Secret>,

    /// Token lifetime in seconds.
    pub token_lifetime_secs: u64,

    /// Argon2 iteration cost.
    pub hash_cost: u32,

    /// Argon2 memory cost in KiB.
    pub hash_memory_kib: u32,

    /// Wallet that receives the elevated role on session creation.
    pub admin_address: Option<String>,

    /// Password-authenticated operators (always elevated).
    pub operators: Vec<OperatorConfig>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            token_lifetime_secs: 24 * 3600,
            hash_cost: DEFAULT_HASH_COST,
            hash_memory_kib: DEFAULT_HASH_MEMORY_KIB,
            admin_address: None,
            operators: Vec::new(),
        }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Maximum requests per identity inside the window.
    pub max_requests: usize,

    /// Window length in minutes.
    pub window_minutes: u64,

    /// How often idle identities are evicted from the ledger.
    pub sweep_interval_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 60,
            window_minutes: 15,
            sweep_interval_secs: 60,
        }
    }
}

/// Scoring policy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: WeightMap,
    pub tiers: TierPolicy,
    pub normalization: NormalizationLimits,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// "pretty" or "json".
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Push channel configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PushConfig {
    /// Buffered events per wallet before slow subscribers start lagging.
    pub channel_capacity: usize,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 16,
        }
    }
}

/// One seeded wallet.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ActivityEntry {
    pub address: String,
    #[serde(flatten)]
    pub activity: WalletActivity,
}

/// In-memory activity seed data.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ActivityConfig {
    pub wallets: Vec<ActivityEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::Tier;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: CreditConfig = toml::from_str("").unwrap();
        assert_eq!(config.rate_limit.max_requests, 60);
        assert_eq!(config.rate_limit.window_minutes, 15);
        assert_eq!(config.scoring.weights, WeightMap::default());
        assert!(config.auth.jwt_secret.is_none());
    }

    #[test]
    fn test_secret_is_never_read_from_file() {
        let config: CreditConfig = toml::from_str("[auth]\njwt_secret = \"from-file\"\n").unwrap();
        assert!(config.auth.jwt_secret.is_none());
    }

    #[test]
    fn test_secret_debug_is_redacted() {
        let secret = Secret::new("super-secret");
        assert_eq!(format!("{:?}", secret), "[REDACTED]");
    }

    #[test]
    fn test_full_file() {
        let raw = r#"
            [listener]
            bind_address = "127.0.0.1:3000"

            [auth]
            token_lifetime_secs = 600
            admin_address = "GCKFBEIYTKP33XJZJ5XPT2YDMX3QZYLZSYX6ON6BPUZN5XGMB36HPQLM"

            [[auth.operators]]
            username = "ops"
            password_hash = "$argon2id$v=19$m=1024,t=2,p=1$c2FsdHNhbHQ$aGFzaA"

            [rate_limit]
            max_requests = 3
            window_minutes = 1

            [scoring.weights]
            volume = 0.2
            timeliness = 0.3
            frequency = 0.15
            diversity = 0.2
            avgBalance = 0.15

            [[scoring.tiers]]
            tier = "entry"
            min_score = 300
            max_loan = 100.0
            monthly_rate = 0.05

            [[scoring.tiers]]
            tier = "high"
            min_score = 650
            max_loan = 2000.0
            monthly_rate = 0.015

            [[activity.wallets]]
            address = "GBRPYHIL2CI3FNQ4BXLFMNDLFJUNPU2HY3ZMFSHONUCEOASW7QC7OX2H"
            transaction_count = 12
            volume = 1500.0
        "#;
        let config: CreditConfig = toml::from_str(raw).unwrap();

        assert_eq!(config.listener.bind_address, "127.0.0.1:3000");
        assert_eq!(config.auth.operators[0].username, "ops");
        assert_eq!(config.rate_limit.max_requests, 3);
        // Tiers are ordered highest first regardless of file order.
        assert_eq!(config.scoring.tiers.rules()[0].tier, Tier::High);
        assert_eq!(config.scoring.tiers.tier(700), Tier::High);
        assert_eq!(config.activity.wallets[0].activity.transaction_count, 12);
    }
}
