use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::{Extension, Json};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::auth::SessionContext;
use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::pipeline::{FeatureScoreRequest, ScoreOutcome};
use crate::scoring::TierRule;
use crate::security::LedgerStats;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub uptime_secs: u64,
    pub watched_wallets: usize,
    pub weights: BTreeMap<String, f64>,
    pub tiers: Vec<TierRule>,
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    let policy = state.pipeline.engine().policy();

    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        uptime_secs: state.started_at.elapsed().as_secs(),
        watched_wallets: state.hub.watched_wallets(),
        weights: policy.weights.to_map(),
        tiers: policy.tiers.rules().to_vec(),
    })
}

pub async fn get_limiter(State(state): State<AppState>) -> Json<LedgerStats> {
    Json(state.pipeline.limiter().stats())
}

/// Score an explicit feature vector, optionally with custom weights.
pub async fn score_features(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    payload: Result<Json<FeatureScoreRequest>, JsonRejection>,
) -> Result<Json<ScoreOutcome>, ApiError> {
    let Json(body) = payload?;
    tracing::info!(
        operator = ctx.subject().unwrap_or("unknown"),
        wallet = %body.wallet,
        "Admin scoring request"
    );

    let outcome = state.pipeline.score_features(body)?;
    Ok(Json(outcome))
}
