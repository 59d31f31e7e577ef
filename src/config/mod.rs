//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) + STELLAR_CREDIT_* environment
//!     → loader.rs (parse, deserialize, apply overrides)
//!     → validation.rs (semantic checks, all errors collected)
//!     → CreditConfig (validated, immutable)
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads and validates
//!     → server swaps the scoring policy atomically
//! ```
//!
//! # Design Decisions
//! - The signing secret only comes from the environment and is never serialized
//! - All fields have defaults to allow minimal configs
//! - Only the scoring policy is hot-reloaded; listener, auth and limiter
//!   settings apply on restart

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, load_from_env, ConfigError};
pub use schema::{
    ActivityConfig, ActivityEntry, AuthConfig, CreditConfig, ListenerConfig,
    ObservabilityConfig, OperatorConfig, PushConfig, RateLimitConfig, ScoringConfig, Secret,
    TimeoutConfig,
};
pub use validation::{validate_config, validate_scoring, ValidationError};
pub use watcher::ConfigWatcher;
