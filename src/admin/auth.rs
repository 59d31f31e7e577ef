//! Admission for the admin API.
//!
//! Admin routes need a valid token with the elevated role and are rate
//! limited like every other route. The admitted [`SessionContext`] is stored
//! in the request extensions for the handlers.

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use std::net::SocketAddr;

use crate::auth::SessionContext;
use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::pipeline::RoutePolicy;

pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx: SessionContext = state
        .pipeline
        .admit(request.headers(), peer.ip(), RoutePolicy::ADMIN)?;

    request.extensions_mut().insert(ctx);
    Ok(next.run(request).await)
}
