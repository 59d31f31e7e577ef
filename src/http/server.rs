//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build shared state (token service, limiter, scoring engine, push hub)
//! - Create the Axum router with all handlers
//! - Wire up middleware (request id, tracing, timeout, metrics)
//! - Run background tasks (policy reload, ledger sweep)
//! - Serve until the shutdown signal

use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Request},
    middleware,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{set_header::SetResponseHeaderLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::activity::InMemoryActivitySource;
use crate::admin::setup_admin_router;
use crate::auth::{
    Authenticator, CredentialHasher, FormatOnlyVerifier, HashError, SignatureVerifier,
    TokenService,
};
use crate::config::{validate_scoring, CreditConfig, OperatorConfig};
use crate::history::InMemoryScoreHistory;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer, track_metrics};
use crate::http::{handlers, websocket};
use crate::observability::tracing::make_request_span;
use crate::pipeline::Pipeline;
use crate::push::BroadcastHub;
use crate::scoring::ScoringEngine;
use crate::security::RateLimiter;

/// Largest accepted request body.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Failures while assembling the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Signing secret is not configured")]
    MissingSecret,

    #[error(transparent)]
    Hasher(#[from] HashError),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub tokens: Arc<TokenService>,
    pub hasher: Arc<CredentialHasher>,
    pub verifier: Arc<dyn SignatureVerifier>,
    pub operators: Arc<Vec<OperatorConfig>>,
    /// Digest checked for unknown operators so login failures cost the same.
    pub decoy_digest: Arc<String>,
    pub hub: Arc<BroadcastHub>,
    pub started_at: Instant,
}

/// HTTP server for the credit service.
pub struct HttpServer {
    router: Router,
    config: CreditConfig,
    engine: Arc<ScoringEngine>,
    limiter: Arc<RateLimiter>,
}

impl HttpServer {
    /// Create a new HTTP server from a validated configuration.
    pub fn new(config: CreditConfig) -> Result<Self, ServerError> {
        let secret = config
            .auth
            .jwt_secret
            .as_ref()
            .ok_or(ServerError::MissingSecret)?;

        let tokens = Arc::new(TokenService::new(
            secret.expose().as_bytes(),
            Duration::from_secs(config.auth.token_lifetime_secs),
            config.auth.admin_address.clone(),
        ));
        let hasher = CredentialHasher::new(config.auth.hash_cost, config.auth.hash_memory_kib)?;
        let decoy_digest = hasher.hash(&uuid::Uuid::new_v4().to_string())?;

        let limiter = Arc::new(RateLimiter::from_config(&config.rate_limit));
        let engine = Arc::new(ScoringEngine::new(config.scoring.clone()));
        let hub = Arc::new(BroadcastHub::new(config.push.channel_capacity));
        let activity = Arc::new(InMemoryActivitySource::from_config(&config.activity));

        let pipeline = Arc::new(Pipeline::new(
            Authenticator::new(tokens.clone()),
            limiter.clone(),
            engine.clone(),
            activity,
            Arc::new(InMemoryScoreHistory::new()),
            hub.clone(),
        ));

        let state = AppState {
            pipeline,
            tokens,
            hasher: Arc::new(hasher),
            verifier: Arc::new(FormatOnlyVerifier),
            operators: Arc::new(config.auth.operators.clone()),
            decoy_digest: Arc::new(decoy_digest),
            hub,
            started_at: Instant::now(),
        };

        let router = Self::build_router(&config, state);
        Ok(Self {
            router,
            config,
            engine,
            limiter,
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &CreditConfig, state: AppState) -> Router {
        Router::new()
            .route("/", get(handlers::root))
            .route("/health", get(handlers::health))
            .route("/api/v1/auth/session", post(handlers::create_session))
            .route("/api/v1/auth/login", post(handlers::login))
            .route("/api/v1/score", post(handlers::score_wallet))
            .route("/api/v1/score/{wallet}", get(handlers::latest_score))
            .route("/api/v1/offers/{score}", get(handlers::offers))
            .route("/ws/scores/{wallet}", get(websocket::subscribe_scores))
            .merge(setup_admin_router(state.clone()))
            .fallback(handlers::not_found)
            .with_state(state)
            .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
            .layer(SetResponseHeaderLayer::overriding(
                header::CACHE_CONTROL,
                HeaderValue::from_static("no-store"),
            ))
            .layer(middleware::from_fn(track_metrics))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(propagate_request_id_layer())
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(|request: &Request<Body>| make_request_span(request)),
            )
            .layer(set_request_id_layer())
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// `config_updates` carries validated configurations from the file
    /// watcher; only their scoring policy is applied.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<CreditConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let engine = self.engine.clone();
        tokio::spawn(async move {
            while let Some(update) = config_updates.recv().await {
                match validate_scoring(&update.scoring) {
                    Ok(()) => engine.reload(update.scoring),
                    Err(errors) => {
                        for e in errors {
                            tracing::error!(error = %e, "Rejected scoring policy update");
                        }
                    }
                }
            }
        });

        let limiter = self.limiter.clone();
        let sweep_every = Duration::from_secs(self.config.rate_limit.sweep_interval_secs);
        let mut sweep_shutdown = shutdown.resubscribe();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(sweep_every);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let evicted = limiter.sweep();
                        if evicted > 0 {
                            tracing::debug!(evicted, "Swept idle rate limit entries");
                        }
                    }
                    _ = sweep_shutdown.recv() => break,
                }
            }
        });

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &CreditConfig {
        &self.config
    }
}
