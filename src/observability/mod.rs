//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events, JSON or pretty)
//!     → metrics.rs (counters, histograms)
//!     → tracing.rs (per-request spans with the request id)
//!
//! Consumers:
//!     → stdout log aggregation
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through all log lines of a request
//! - Metrics are cheap (atomic increments) and never fail a request
//! - Secrets and credentials are never logged

pub mod logging;
pub mod metrics;
pub mod tracing;
