//! Configuration validation.
//!
//! Serde handles syntax; this module checks meaning. Every violation is
//! reported, not just the first, and nothing is accepted into the running
//! system before it passes.

use thiserror::Error;

use crate::auth::password::MIN_HASH_COST;
use crate::auth::WalletAddress;
use crate::config::schema::{CreditConfig, ScoringConfig};

/// Shortest accepted signing secret, in bytes.
pub const MIN_SECRET_LEN: usize = 32;

/// Longest accepted token lifetime: one year.
pub const MAX_TOKEN_LIFETIME_SECS: u64 = 365 * 24 * 60 * 60;

/// Longest accepted rate-limit window: one day.
pub const MAX_WINDOW_MINUTES: u64 = 24 * 60;

/// A single semantic violation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate a complete configuration, including the environment-provided secret.
pub fn validate_config(config: &CreditConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match &config.auth.jwt_secret {
        None => errors.push(ValidationError::new(
            "auth.jwt_secret",
            "signing secret is required (set STELLAR_CREDIT_JWT_SECRET)",
        )),
        Some(secret) if secret.expose().len() < MIN_SECRET_LEN => errors.push(
            ValidationError::new(
                "auth.jwt_secret",
                format!("must be at least {} bytes", MIN_SECRET_LEN),
            ),
        ),
        Some(_) => {}
    }

    if config.auth.token_lifetime_secs == 0 {
        errors.push(ValidationError::new("auth.token_lifetime_secs", "must be positive"));
    } else if config.auth.token_lifetime_secs > MAX_TOKEN_LIFETIME_SECS {
        errors.push(ValidationError::new(
            "auth.token_lifetime_secs",
            format!("must be at most {}", MAX_TOKEN_LIFETIME_SECS),
        ));
    }
    if config.auth.hash_cost < MIN_HASH_COST {
        errors.push(ValidationError::new(
            "auth.hash_cost",
            format!("must be at least {}", MIN_HASH_COST),
        ));
    }
    if config.auth.hash_memory_kib < 8 {
        errors.push(ValidationError::new("auth.hash_memory_kib", "must be at least 8"));
    }
    if let Some(admin) = &config.auth.admin_address {
        if admin.parse::<WalletAddress>().is_err() {
            errors.push(ValidationError::new(
                "auth.admin_address",
                "not a valid wallet address",
            ));
        }
    }
    for operator in &config.auth.operators {
        if operator.username.trim().is_empty() {
            errors.push(ValidationError::new("auth.operators", "username must not be empty"));
        }
    }

    if config.rate_limit.max_requests == 0 {
        errors.push(ValidationError::new("rate_limit.max_requests", "must be positive"));
    }
    if config.rate_limit.window_minutes == 0 {
        errors.push(ValidationError::new("rate_limit.window_minutes", "must be positive"));
    } else if config.rate_limit.window_minutes > MAX_WINDOW_MINUTES {
        errors.push(ValidationError::new(
            "rate_limit.window_minutes",
            format!("must be at most {}", MAX_WINDOW_MINUTES),
        ));
    }
    if config.rate_limit.sweep_interval_secs == 0 {
        errors.push(ValidationError::new(
            "rate_limit.sweep_interval_secs",
            "must be positive",
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be positive"));
    }
    if config.push.channel_capacity == 0 {
        errors.push(ValidationError::new("push.channel_capacity", "must be positive"));
    }

    for entry in &config.activity.wallets {
        if entry.address.parse::<WalletAddress>().is_err() {
            errors.push(ValidationError::new(
                "activity.wallets",
                format!("invalid wallet address '{}'", entry.address),
            ));
        }
    }

    if let Err(mut scoring) = validate_scoring(&config.scoring) {
        errors.append(&mut scoring);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate the hot-reloadable scoring policy on its own.
pub fn validate_scoring(scoring: &ScoringConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = scoring.weights.validate() {
        errors.push(ValidationError::new("scoring.weights", e.to_string()));
    }
    if let Err(message) = scoring.tiers.validate() {
        errors.push(ValidationError::new("scoring.tiers", message));
    }
    if let Err(message) = scoring.normalization.validate() {
        errors.push(ValidationError::new("scoring.normalization", message));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
