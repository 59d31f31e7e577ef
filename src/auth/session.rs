//! Request-scoped session resolution.

use axum::http::{header, HeaderMap};
use std::sync::Arc;
use std::time::Instant;

use crate::auth::token::TokenService;
use crate::auth::{AuthError, Role};
use crate::observability::metrics;

/// Verified identity attached to a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub subject: String,
    pub role: Role,
    pub issued_at: u64,
}

impl Identity {
    pub fn is_elevated(&self) -> bool {
        self.role == Role::Elevated
    }
}

/// Per-request session state. Never persisted.
#[derive(Debug, Clone)]
pub struct SessionContext {
    /// `None` for anonymous requests.
    pub identity: Option<Identity>,
    pub request_start: Instant,
}

impl SessionContext {
    pub fn anonymous() -> Self {
        Self {
            identity: None,
            request_start: Instant::now(),
        }
    }

    pub fn authenticated(identity: Identity) -> Self {
        Self {
            identity: Some(identity),
            request_start: Instant::now(),
        }
    }

    pub fn subject(&self) -> Option<&str> {
        self.identity.as_ref().map(|i| i.subject.as_str())
    }
}

/// Resolves the bearer token of a request into a [`SessionContext`].
#[derive(Debug, Clone)]
pub struct Authenticator {
    tokens: Arc<TokenService>,
}

impl Authenticator {
    pub fn new(tokens: Arc<TokenService>) -> Self {
        Self { tokens }
    }

    /// Mandatory mode: fails with `NoToken`, `ExpiredToken` or `InvalidToken`.
    pub fn authenticate_required(&self, headers: &HeaderMap) -> Result<SessionContext, AuthError> {
        let token = bearer_token(headers).ok_or(AuthError::NoToken)?;
        let claims = self.tokens.verify(token)?;

        Ok(SessionContext::authenticated(Identity {
            subject: claims.subject,
            role: claims.role,
            issued_at: claims.issued_at,
        }))
    }

    /// Optional mode: any failure yields an anonymous context.
    pub fn authenticate_optional(&self, headers: &HeaderMap) -> SessionContext {
        match self.authenticate_required(headers) {
            Ok(ctx) => ctx,
            Err(AuthError::NoToken) => SessionContext::anonymous(),
            Err(e) => {
                tracing::debug!(
                    reason = %e,
                    "Optional authentication failed, continuing anonymously"
                );
                metrics::record_auth_failure(e.label());
                SessionContext::anonymous()
            }
        }
    }
}

/// Extract the credential from `Authorization: Bearer <token>`.
///
/// A header with another scheme or an empty credential counts as absent.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
