//! Credit scoring subsystem.
//!
//! # Data Flow
//! ```text
//! WalletActivity (raw on-chain metrics)
//!     → features.rs (clamp into [0,1], neutral baseline for missing history)
//!     → engine.rs (weighted sum, scale to [300,850], tier)
//!     → offers.rs (loan ceiling, offers)
//!     → advice.rs (improvement hints)
//! ```
//!
//! # Design Decisions
//! - The model is a fixed, auditable weighted formula
//! - Breakdown values are exactly the terms summed into the raw score
//! - Weights and tiers are validated at configuration load, not per call
//! - Results are immutable; every computation gets a fresh id

pub mod advice;
pub mod engine;
pub mod features;
pub mod offers;
pub mod types;

pub use engine::ScoringEngine;
pub use features::{normalize, NormalizationLimits, WalletActivity, NEUTRAL_BASELINE};
pub use offers::{LoanDecision, LoanOffer, LoanRequest, TierPolicy, TierRule};
pub use types::{Factor, FeatureVector, ScoreResult, ScoringError, Tier, WeightMap};
