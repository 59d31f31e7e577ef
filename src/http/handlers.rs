//! Public and user-facing route handlers.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{ConnectInfo, Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::net::SocketAddr;

use crate::auth::{AuthError, Role, WalletAddress};
use crate::http::error::ApiError;
use crate::history::ScoreRecord;
use crate::http::server::AppState;
use crate::pipeline::{RoutePolicy, ScoreOutcome, WalletScoreRequest};
use crate::scoring::types::{MAX_SCORE, MIN_SCORE};
use crate::scoring::{LoanOffer, Tier};

#[derive(Debug, Deserialize)]
pub struct SessionRequest {
    pub address: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub signature: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub token: String,
    pub expires_at: u64,
    pub role: Role,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OffersResponse {
    pub score: u16,
    pub tier: Tier,
    pub offers: Vec<LoanOffer>,
}

pub async fn root() -> Json<Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            "POST /api/v1/auth/session",
            "POST /api/v1/auth/login",
            "POST /api/v1/score",
            "GET /api/v1/score/{wallet}",
            "GET /api/v1/offers/{score}",
            "POST /api/v1/admin/score",
            "GET /api/v1/admin/limiter",
            "GET /api/v1/admin/status",
            "GET /ws/scores/{wallet}",
            "GET /health",
        ],
    }))
}

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": state.started_at.elapsed().as_secs(),
    }))
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound("Route not found".to_string())
}

/// Issue a wallet session after the signature check.
pub async fn create_session(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    payload: Result<Json<SessionRequest>, JsonRejection>,
) -> Result<Json<SessionResponse>, ApiError> {
    state.pipeline.admit(&headers, peer.ip(), RoutePolicy::PUBLIC)?;
    let Json(body) = payload?;

    let wallet: WalletAddress = body.address.parse()?;

    let message = body.message.unwrap_or_default();
    let signature = body.signature.unwrap_or_default();
    if !state.verifier.validate_signature(&wallet, &message, &signature) {
        tracing::warn!(wallet = %wallet, "Wallet signature rejected");
        return Err(AuthError::Unauthenticated.into());
    }

    let issued = state.tokens.create_wallet_session(&wallet, None)?;
    tracing::info!(wallet = %wallet, role = issued.claims.role.as_str(), "Wallet session issued");

    Ok(Json(SessionResponse {
        token: issued.token,
        expires_at: issued.claims.expires_at,
        role: issued.claims.role,
    }))
}

/// Operator password login. Always yields an elevated token.
pub async fn login(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<SessionResponse>, ApiError> {
    state.pipeline.admit(&headers, peer.ip(), RoutePolicy::PUBLIC)?;
    let Json(body) = payload?;

    let operator = state
        .operators
        .iter()
        .find(|op| op.username == body.username);
    // Unknown users are checked against a throwaway digest so both failure
    // paths cost the same.
    let digest = operator
        .map(|op| op.password_hash.as_str())
        .unwrap_or(state.decoy_digest.as_str());
    let verified = state.hasher.verify(&body.password, digest);

    if operator.is_none() || !verified {
        tracing::warn!(username = %body.username, "Operator login failed");
        return Err(AuthError::Unauthenticated.into());
    }

    let issued = state.tokens.issue(&body.username, Role::Elevated, None)?;
    tracing::info!(username = %body.username, "Operator session issued");

    Ok(Json(SessionResponse {
        token: issued.token,
        expires_at: issued.claims.expires_at,
        role: issued.claims.role,
    }))
}

/// Score a wallet from its on-chain activity.
pub async fn score_wallet(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    payload: Result<Json<WalletScoreRequest>, JsonRejection>,
) -> Result<Json<ScoreOutcome>, ApiError> {
    let ctx = state.pipeline.admit(&headers, peer.ip(), RoutePolicy::USER)?;
    let Json(body) = payload?;

    let outcome = state.pipeline.score_wallet(&ctx, body)?;
    Ok(Json(outcome))
}

/// Most recent score of a wallet.
pub async fn latest_score(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    wallet: Result<Path<String>, PathRejection>,
) -> Result<Json<ScoreRecord>, ApiError> {
    let ctx = state.pipeline.admit(&headers, peer.ip(), RoutePolicy::PUBLIC)?;
    let Path(wallet) = wallet?;
    let wallet: WalletAddress = wallet.parse()?;

    state
        .pipeline
        .latest_score(&ctx, &wallet)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("No score recorded for {}", wallet)))
}

/// Offers available at a given score.
pub async fn offers(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    score: Result<Path<u16>, PathRejection>,
) -> Result<Json<OffersResponse>, ApiError> {
    state.pipeline.admit(&headers, peer.ip(), RoutePolicy::PUBLIC)?;
    let Path(score) = score?;

    if !(MIN_SCORE..=MAX_SCORE).contains(&score) {
        return Err(ApiError::InvalidInput(format!(
            "score must be between {} and {}",
            MIN_SCORE, MAX_SCORE
        )));
    }

    let policy = state.pipeline.engine().policy();
    Ok(Json(OffersResponse {
        score,
        tier: policy.tiers.tier(score),
        offers: policy.tiers.offers_for(score),
    }))
}
