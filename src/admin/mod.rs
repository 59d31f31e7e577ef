//! Admin API: elevated-only scoring and runtime inspection.

pub mod auth;
pub mod handlers;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::http::server::AppState;

pub fn setup_admin_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/v1/admin/status", get(get_status))
        .route("/api/v1/admin/limiter", get(get_limiter))
        .route("/api/v1/admin/score", post(score_features))
        .route_layer(middleware::from_fn_with_state(state, admin_auth_middleware))
}
