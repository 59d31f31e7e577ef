//! Request pipeline.
//!
//! # Data Flow
//! ```text
//! headers + peer address
//!     → Authenticator (required or optional per route)
//!     → Authorization gate (elevated routes only)
//!     → Rate limiter (keyed on subject, else peer IP)
//!     → SessionContext handed to the handler
//!
//! Scoring request (admitted):
//!     → ownership check → ActivitySource → normalize
//!     → scoring engine → loan decision, offers, hints
//!     → latest-score history, ScoreChannel publish (best-effort)
//! ```
//!
//! Any stage failure short-circuits the rest; a rejected request never
//! reaches the scoring engine.

use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::sync::Arc;
use thiserror::Error;

use crate::activity::ActivitySource;
use crate::auth::{
    require_elevated, AuthError, Authenticator, Identity, SessionContext, WalletAddress,
};
use crate::history::{ScoreHistory, ScoreRecord};
use crate::observability::metrics;
use crate::push::{ScoreChannel, ScoreEvent};
use crate::scoring::advice::recommendations;
use crate::scoring::engine::compute;
use crate::scoring::{
    normalize, FeatureVector, LoanDecision, LoanOffer, LoanRequest, ScoreResult, ScoringEngine,
    ScoringError, WeightMap,
};
use crate::security::{identity_key, RateLimited, RateLimiter};

/// Failures raised by pipeline stages.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    RateLimited(#[from] RateLimited),

    #[error(transparent)]
    Scoring(#[from] ScoringError),

    #[error("{0}")]
    InvalidInput(String),
}

/// How a route treats the bearer credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Required,
    Optional,
}

/// Per-route admission policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutePolicy {
    pub auth: AuthMode,
    pub elevated: bool,
}

impl RoutePolicy {
    /// Anyone; identity attached when a valid token is present.
    pub const PUBLIC: Self = Self {
        auth: AuthMode::Optional,
        elevated: false,
    };

    /// Any authenticated caller.
    pub const USER: Self = Self {
        auth: AuthMode::Required,
        elevated: false,
    };

    /// Authenticated callers with the elevated role.
    pub const ADMIN: Self = Self {
        auth: AuthMode::Required,
        elevated: true,
    };
}

/// Body of a wallet scoring request.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WalletScoreRequest {
    pub wallet: WalletAddress,
    pub amount: f64,
    pub duration_months: u32,
}

impl WalletScoreRequest {
    pub fn loan(&self) -> LoanRequest {
        LoanRequest {
            amount: self.amount,
            duration_months: self.duration_months,
        }
    }
}

/// Body of an explicit-feature scoring request.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeatureScoreRequest {
    pub wallet: WalletAddress,
    pub features: FeatureVector,
    #[serde(default)]
    pub weights: Option<WeightMap>,
}

/// Everything a scoring call returns to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreOutcome {
    pub wallet: WalletAddress,
    pub score: ScoreResult,
    pub features: FeatureVector,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loan: Option<LoanDecision>,
    pub offers: Vec<LoanOffer>,
    pub recommendations: Vec<String>,
    /// Subscribers the result was pushed to.
    pub delivered: usize,
}

/// Composition of the request stages over shared state.
pub struct Pipeline {
    authenticator: Authenticator,
    limiter: Arc<RateLimiter>,
    engine: Arc<ScoringEngine>,
    activity: Arc<dyn ActivitySource>,
    history: Arc<dyn ScoreHistory>,
    channel: Arc<dyn ScoreChannel>,
}

impl Pipeline {
    pub fn new(
        authenticator: Authenticator,
        limiter: Arc<RateLimiter>,
        engine: Arc<ScoringEngine>,
        activity: Arc<dyn ActivitySource>,
        history: Arc<dyn ScoreHistory>,
        channel: Arc<dyn ScoreChannel>,
    ) -> Self {
        Self {
            authenticator,
            limiter,
            engine,
            activity,
            history,
            channel,
        }
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn engine(&self) -> &ScoringEngine {
        &self.engine
    }

    /// Authenticate, authorize and rate-limit a request.
    pub fn admit(
        &self,
        headers: &HeaderMap,
        peer: IpAddr,
        policy: RoutePolicy,
    ) -> Result<SessionContext, PipelineError> {
        let ctx = match policy.auth {
            AuthMode::Required => self
                .authenticator
                .authenticate_required(headers)
                .inspect_err(|e| metrics::record_auth_failure(e.label()))?,
            AuthMode::Optional => self.authenticator.authenticate_optional(headers),
        };

        if policy.elevated {
            require_elevated(&ctx)?;
        }

        let key = identity_key(&ctx, peer);
        if let Err(limited) = self.limiter.check(&key) {
            tracing::warn!(identity = %key, "Rate limit exceeded");
            return Err(limited.into());
        }

        Ok(ctx)
    }

    /// Score a wallet from its recorded activity and check the loan request.
    pub fn score_wallet(
        &self,
        ctx: &SessionContext,
        request: WalletScoreRequest,
    ) -> Result<ScoreOutcome, PipelineError> {
        let loan_request = request.loan();
        loan_request.validate().map_err(PipelineError::InvalidInput)?;
        authorize_wallet(ctx, &request.wallet)?;

        let activity = self.activity.fetch(&request.wallet).unwrap_or_default();
        let policy = self.engine.policy();
        let features = normalize(&activity, &policy.normalization);
        let score = compute(&features, &policy.weights, &policy.tiers)?;
        let loan = policy.tiers.decide_loan(score.tier, &loan_request);
        let offers = policy.tiers.offers_for(score.scaled_score);

        tracing::info!(
            wallet = %request.wallet,
            score = score.scaled_score,
            tier = score.tier.as_str(),
            approved = loan.approved,
            "Wallet scored"
        );

        Ok(self.finish(request.wallet, score, features, Some(loan), offers))
    }

    /// Most recent score of `wallet`, under the same ownership rule as scoring.
    pub fn latest_score(
        &self,
        ctx: &SessionContext,
        wallet: &WalletAddress,
    ) -> Result<Option<ScoreRecord>, PipelineError> {
        authorize_wallet(ctx, wallet)?;
        Ok(self.history.latest(wallet))
    }

    /// Score an explicit feature vector, optionally with custom weights.
    pub fn score_features(
        &self,
        request: FeatureScoreRequest,
    ) -> Result<ScoreOutcome, PipelineError> {
        let score = self
            .engine
            .score(&request.features, request.weights.as_ref())?;
        let offers = self.engine.policy().tiers.offers_for(score.scaled_score);

        tracing::info!(
            wallet = %request.wallet,
            score = score.scaled_score,
            tier = score.tier.as_str(),
            custom_weights = request.weights.is_some(),
            "Feature vector scored"
        );

        Ok(self.finish(request.wallet, score, request.features, None, offers))
    }

    fn finish(
        &self,
        wallet: WalletAddress,
        score: ScoreResult,
        features: FeatureVector,
        loan: Option<LoanDecision>,
        offers: Vec<LoanOffer>,
    ) -> ScoreOutcome {
        metrics::record_score(score.tier.as_str(), score.scaled_score);
        self.history.store(ScoreRecord {
            wallet: wallet.clone(),
            score: score.clone(),
        });
        let delivered = self.channel.publish(ScoreEvent::new(wallet.clone(), &score));

        ScoreOutcome {
            recommendations: recommendations(&features, score.tier),
            wallet,
            score,
            features,
            loan,
            offers,
            delivered,
        }
    }
}

/// A standard caller may only act on its own wallet; elevated callers on any.
fn authorize_wallet<'a>(
    ctx: &'a SessionContext,
    wallet: &WalletAddress,
) -> Result<&'a Identity, AuthError> {
    let identity = ctx.identity.as_ref().ok_or(AuthError::Unauthenticated)?;
    if !identity.is_elevated() && identity.subject != wallet.as_str() {
        tracing::warn!(
            subject = %identity.subject,
            wallet = %wallet,
            "Standard caller tried to access another wallet"
        );
        return Err(AuthError::InsufficientPrivilege);
    }
    Ok(identity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::InMemoryActivitySource;
    use crate::history::InMemoryScoreHistory;
    use crate::auth::{Role, TokenService};
    use crate::config::ScoringConfig;
    use crate::push::BroadcastHub;
    use crate::scoring::{Tier, WalletActivity, NEUTRAL_BASELINE};
    use axum::http::header::AUTHORIZATION;
    use axum::http::HeaderValue;
    use std::net::Ipv4Addr;
    use std::time::Duration;

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";
    const WALLET: &str = "GCKFBEIYTKP33XJZJ5XPT2YDMX3QZYLZSYX6ON6BPUZN5XGMB36HPQLM";
    const OTHER: &str = "GBRPYHIL2CI3FNQ4BXLFMNDLFJUNPU2HY3ZMFSHONUCEOASW7QC7OX2H";
    const PEER: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

    struct Harness {
        tokens: Arc<TokenService>,
        activity: InMemoryActivitySource,
        hub: Arc<BroadcastHub>,
        pipeline: Pipeline,
    }

    fn harness(max_requests: usize) -> Harness {
        let tokens = Arc::new(TokenService::new(SECRET, Duration::from_secs(3600), None));
        let activity = InMemoryActivitySource::new();
        let hub = Arc::new(BroadcastHub::new(8));
        let pipeline = Pipeline::new(
            Authenticator::new(tokens.clone()),
            Arc::new(RateLimiter::new(max_requests, Duration::from_secs(60))),
            Arc::new(ScoringEngine::new(ScoringConfig::default())),
            Arc::new(activity.clone()),
            Arc::new(InMemoryScoreHistory::new()),
            hub.clone(),
        );
        Harness {
            tokens,
            activity,
            hub,
            pipeline,
        }
    }

    fn bearer(tokens: &TokenService, subject: &str, role: Role) -> HeaderMap {
        let issued = tokens.issue(subject, role, None).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", issued.token)).unwrap(),
        );
        headers
    }

    fn request(wallet: &str, amount: f64) -> WalletScoreRequest {
        WalletScoreRequest {
            wallet: wallet.parse().unwrap(),
            amount,
            duration_months: 6,
        }
    }

    #[test]
    fn test_admit_public_without_token() {
        let h = harness(5);
        let ctx = h
            .pipeline
            .admit(&HeaderMap::new(), PEER, RoutePolicy::PUBLIC)
            .unwrap();
        assert!(ctx.identity.is_none());
    }

    #[test]
    fn test_admit_required_without_token() {
        let h = harness(5);
        let err = h
            .pipeline
            .admit(&HeaderMap::new(), PEER, RoutePolicy::USER)
            .unwrap_err();
        assert!(matches!(err, PipelineError::Auth(AuthError::NoToken)));
    }

    #[test]
    fn test_admin_route_rejects_standard_role() {
        let h = harness(5);
        let headers = bearer(&h.tokens, WALLET, Role::Standard);
        let err = h
            .pipeline
            .admit(&headers, PEER, RoutePolicy::ADMIN)
            .unwrap_err();
        assert!(matches!(err, PipelineError::Auth(AuthError::InsufficientPrivilege)));
        // Rejected before reaching the limiter.
        assert_eq!(h.pipeline.limiter().stats().in_window_requests, 0);
    }

    #[test]
    fn test_admit_rate_limits_per_subject() {
        let h = harness(2);
        let headers = bearer(&h.tokens, WALLET, Role::Standard);

        assert!(h.pipeline.admit(&headers, PEER, RoutePolicy::USER).is_ok());
        assert!(h.pipeline.admit(&headers, PEER, RoutePolicy::USER).is_ok());
        assert!(matches!(
            h.pipeline.admit(&headers, PEER, RoutePolicy::USER),
            Err(PipelineError::RateLimited(_))
        ));

        // Anonymous traffic from the same peer has its own budget.
        assert!(h
            .pipeline
            .admit(&HeaderMap::new(), PEER, RoutePolicy::PUBLIC)
            .is_ok());
    }

    #[tokio::test]
    async fn test_new_wallet_scores_at_baseline_and_pushes() {
        let h = harness(5);
        let headers = bearer(&h.tokens, WALLET, Role::Standard);
        let ctx = h.pipeline.admit(&headers, PEER, RoutePolicy::USER).unwrap();
        let mut rx = h.hub.subscribe(&WALLET.parse().unwrap());

        let outcome = h.pipeline.score_wallet(&ctx, request(WALLET, 150.0)).unwrap();

        assert_eq!(outcome.features, FeatureVector::uniform(NEUTRAL_BASELINE));
        assert_eq!(outcome.score.scaled_score, 493);
        assert_eq!(outcome.score.tier, Tier::Entry);
        assert!(outcome.loan.as_ref().unwrap().approved);
        assert_eq!(outcome.delivered, 1);

        let event = rx.recv().await.unwrap();
        assert_eq!(event.score, 493);
        assert_eq!(event.breakdown, outcome.score.breakdown);
    }

    #[test]
    fn test_latest_score_follows_scoring() {
        let h = harness(5);
        let headers = bearer(&h.tokens, WALLET, Role::Standard);
        let ctx = h.pipeline.admit(&headers, PEER, RoutePolicy::USER).unwrap();
        let wallet: WalletAddress = WALLET.parse().unwrap();

        assert_eq!(h.pipeline.latest_score(&ctx, &wallet).unwrap(), None);

        let outcome = h.pipeline.score_wallet(&ctx, request(WALLET, 100.0)).unwrap();
        let record = h.pipeline.latest_score(&ctx, &wallet).unwrap().unwrap();
        assert_eq!(record.score, outcome.score);

        let err = h
            .pipeline
            .latest_score(&ctx, &OTHER.parse().unwrap())
            .unwrap_err();
        assert!(matches!(err, PipelineError::Auth(AuthError::InsufficientPrivilege)));

        let err = h
            .pipeline
            .latest_score(&SessionContext::anonymous(), &wallet)
            .unwrap_err();
        assert!(matches!(err, PipelineError::Auth(AuthError::Unauthenticated)));
    }

    #[test]
    fn test_loan_above_ceiling_is_declined_not_failed() {
        let h = harness(5);
        let headers = bearer(&h.tokens, WALLET, Role::Standard);
        let ctx = h.pipeline.admit(&headers, PEER, RoutePolicy::USER).unwrap();

        let outcome = h.pipeline.score_wallet(&ctx, request(WALLET, 5000.0)).unwrap();
        let loan = outcome.loan.unwrap();
        assert!(!loan.approved);
        assert!(loan.reason.is_some());
        assert_eq!(outcome.delivered, 0);
    }

    #[test]
    fn test_standard_caller_cannot_score_other_wallet() {
        let h = harness(5);
        let headers = bearer(&h.tokens, WALLET, Role::Standard);
        let ctx = h.pipeline.admit(&headers, PEER, RoutePolicy::USER).unwrap();

        let err = h.pipeline.score_wallet(&ctx, request(OTHER, 100.0)).unwrap_err();
        assert!(matches!(err, PipelineError::Auth(AuthError::InsufficientPrivilege)));
    }

    #[test]
    fn test_elevated_caller_scores_recorded_activity() {
        let h = harness(5);
        h.activity.record(
            OTHER.parse().unwrap(),
            WalletActivity {
                transaction_count: 400,
                volume: 50_000.0,
                on_time: 20,
                delayed: 0,
                active_days: 90,
                observation_days: 90,
                counterparties: 50,
                operation_types: 3,
                avg_balance: 10_000.0,
            },
        );
        let headers = bearer(&h.tokens, WALLET, Role::Elevated);
        let ctx = h.pipeline.admit(&headers, PEER, RoutePolicy::USER).unwrap();

        let outcome = h.pipeline.score_wallet(&ctx, request(OTHER, 1000.0)).unwrap();
        assert_eq!(outcome.score.scaled_score, 850);
        assert_eq!(outcome.score.tier, Tier::High);
        assert!(outcome.loan.unwrap().approved);
    }

    #[test]
    fn test_invalid_loan_terms() {
        let h = harness(5);
        let headers = bearer(&h.tokens, WALLET, Role::Standard);
        let ctx = h.pipeline.admit(&headers, PEER, RoutePolicy::USER).unwrap();

        let err = h.pipeline.score_wallet(&ctx, request(WALLET, 20_000.0)).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput(_)));
    }

    #[test]
    fn test_score_features_rejects_out_of_range() {
        let h = harness(5);
        let err = h
            .pipeline
            .score_features(FeatureScoreRequest {
                wallet: WALLET.parse().unwrap(),
                features: FeatureVector {
                    diversity: -0.1,
                    ..FeatureVector::uniform(0.5)
                },
                weights: None,
            })
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Scoring(ScoringError::InputInvalid { factor: "diversity", .. })
        ));
    }
}
