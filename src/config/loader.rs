//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::{CreditConfig, Secret};
use crate::config::validation::{validate_config, ValidationError};

pub const ENV_JWT_SECRET: &str = "STELLAR_CREDIT_JWT_SECRET";
pub const ENV_TOKEN_LIFETIME: &str = "STELLAR_CREDIT_TOKEN_LIFETIME_SECS";
pub const ENV_HASH_COST: &str = "STELLAR_CREDIT_HASH_COST";
pub const ENV_ADMIN_ADDRESS: &str = "STELLAR_CREDIT_ADMIN_ADDRESS";
pub const ENV_RATE_LIMIT_MAX: &str = "STELLAR_CREDIT_RATE_LIMIT_MAX_REQUESTS";
pub const ENV_RATE_LIMIT_WINDOW: &str = "STELLAR_CREDIT_RATE_LIMIT_WINDOW_MINUTES";
pub const ENV_BIND_ADDRESS: &str = "STELLAR_CREDIT_BIND_ADDRESS";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {var}: {message}")]
    Env { var: &'static str, message: String },

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file plus environment overrides.
pub fn load_config(path: &Path) -> Result<CreditConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let mut config: CreditConfig = toml::from_str(&content)?;

    apply_env_overrides(&mut config)?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Defaults plus environment overrides, for running without a file.
pub fn load_from_env() -> Result<CreditConfig, ConfigError> {
    let mut config = CreditConfig::default();

    apply_env_overrides(&mut config)?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply overrides from the process environment.
pub fn apply_env_overrides(config: &mut CreditConfig) -> Result<(), ConfigError> {
    apply_overrides_from(config, |key| std::env::var(key).ok())
}

/// Apply overrides from an arbitrary lookup. Empty values are ignored.
pub fn apply_overrides_from<F>(config: &mut CreditConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    if let Some(secret) = get(ENV_JWT_SECRET) {
        config.auth.jwt_secret = Some(Secret::new(secret));
    }
    if let Some(value) = get(ENV_TOKEN_LIFETIME) {
        config.auth.token_lifetime_secs = parse(ENV_TOKEN_LIFETIME, &value)?;
    }
    if let Some(value) = get(ENV_HASH_COST) {
        config.auth.hash_cost = parse(ENV_HASH_COST, &value)?;
    }
    if let Some(value) = get(ENV_ADMIN_ADDRESS) {
        config.auth.admin_address = Some(value.trim().to_string());
    }
    if let Some(value) = get(ENV_RATE_LIMIT_MAX) {
        config.rate_limit.max_requests = parse(ENV_RATE_LIMIT_MAX, &value)?;
    }
    if let Some(value) = get(ENV_RATE_LIMIT_WINDOW) {
        config.rate_limit.window_minutes = parse(ENV_RATE_LIMIT_WINDOW, &value)?;
    }
    if let Some(value) = get(ENV_BIND_ADDRESS) {
        config.listener.bind_address = value.trim().to_string();
    }

    Ok(())
}

fn parse<T>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Env {
        var,
        message: e.to_string(),
    })
}
