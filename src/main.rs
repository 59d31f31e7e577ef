//! Stellar wallet credit scoring service.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────────┐
//!                         │                 STELLAR CREDIT                    │
//!                         │                                                   │
//!     Client Request      │  ┌────────┐   ┌──────────────────────────────┐   │
//!     ────────────────────┼─▶│  http  │──▶│           pipeline            │   │
//!                         │  │ server │   │ auth → gate → rate limiter    │   │
//!                         │  └────────┘   └──────────────┬───────────────┘   │
//!                         │                              │                    │
//!                         │                              ▼                    │
//!                         │  ┌──────────┐   ┌───────────────────────────┐    │
//!                         │  │ activity │──▶│ scoring (normalize, score, │    │
//!                         │  │  source  │   │ tier, loan, offers, hints) │    │
//!                         │  └──────────┘   └─────────────┬─────────────┘    │
//!                         │                               │                   │
//!     Client Response     │                               ▼                   │
//!     ◀───────────────────┼──────────────────────── push (per-wallet) ──────┼──▶ WebSocket
//!                         │                                                   │     subscribers
//!                         │  Cross-cutting: config (+watcher), observability, │
//!                         │  lifecycle (startup/shutdown/signals)             │
//!                         └──────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;

use stellar_credit::lifecycle::startup;

#[derive(Parser)]
#[command(name = "stellar-credit")]
#[command(version, about = "Stellar wallet credit scoring service", long_about = None)]
struct Args {
    /// TOML configuration file. Without it, defaults plus STELLAR_CREDIT_* variables apply.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    startup::run(args.config).await?;
    Ok(())
}
