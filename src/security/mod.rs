//! Abuse protection subsystem.
//!
//! # Data Flow
//! ```text
//! Admitted request (identity resolved):
//!     → rate_limit.rs (per-identity sliding window)
//!     → Pass to scoring
//! ```
//!
//! # Design Decisions
//! - Single-process, in-memory ledger; a shared store would sit behind the
//!   same `RateLimiter` surface
//! - Fail closed: a rejected request never reaches the scoring engine
//! - Idle identities are evicted by a periodic sweep, never deleted eagerly

pub mod rate_limit;

pub use rate_limit::{identity_key, LedgerStats, RateLimited, RateLimiter};
