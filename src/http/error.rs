//! API error surface.
//!
//! Every failure leaves the service as `{"error": "...", "code": "..."}`.
//! Internal faults are logged with their cause and rendered with a fixed
//! message.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::wallet::InvalidWalletAddress;
use crate::auth::{AuthError, HashError};
use crate::pipeline::PipelineError;
use crate::scoring::ScoringError;
use crate::security::RateLimited;

const INTERNAL_MESSAGE: &str = "Internal server error";

/// Machine-readable error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NoToken,
    ExpiredToken,
    InvalidToken,
    Unauthenticated,
    InsufficientPrivilege,
    RateLimited,
    InvalidInput,
    ScoringInputInvalid,
    NotFound,
    Internal,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::NoToken
            | ErrorCode::ExpiredToken
            | ErrorCode::InvalidToken
            | ErrorCode::Unauthenticated => StatusCode::UNAUTHORIZED,
            ErrorCode::InsufficientPrivilege => StatusCode::FORBIDDEN,
            ErrorCode::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ErrorCode::InvalidInput | ErrorCode::ScoringInputInvalid => StatusCode::BAD_REQUEST,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Wire body of an error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: ErrorCode,
}

/// The single error type returned by handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    RateLimited(#[from] RateLimited),

    #[error(transparent)]
    Scoring(#[from] ScoringError),

    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ApiError::Auth(e) => match e {
                AuthError::NoToken => ErrorCode::NoToken,
                AuthError::ExpiredToken => ErrorCode::ExpiredToken,
                AuthError::InvalidToken => ErrorCode::InvalidToken,
                AuthError::Unauthenticated => ErrorCode::Unauthenticated,
                AuthError::InsufficientPrivilege => ErrorCode::InsufficientPrivilege,
                AuthError::Signing(_) => ErrorCode::Internal,
            },
            ApiError::RateLimited(_) => ErrorCode::RateLimited,
            ApiError::Scoring(ScoringError::InputInvalid { .. }) => ErrorCode::ScoringInputInvalid,
            ApiError::Scoring(ScoringError::InvalidWeights(_)) => ErrorCode::InvalidInput,
            ApiError::InvalidInput(_) => ErrorCode::InvalidInput,
            ApiError::NotFound(_) => ErrorCode::NotFound,
            ApiError::Internal(_) => ErrorCode::Internal,
        }
    }

    /// Message safe to show the caller.
    fn public_message(&self) -> String {
        match self.code() {
            ErrorCode::Internal => INTERNAL_MESSAGE.to_string(),
            _ => self.to_string(),
        }
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Auth(e) => ApiError::Auth(e),
            PipelineError::RateLimited(e) => ApiError::RateLimited(e),
            PipelineError::Scoring(e) => ApiError::Scoring(e),
            PipelineError::InvalidInput(message) => ApiError::InvalidInput(message),
        }
    }
}

impl From<HashError> for ApiError {
    fn from(err: HashError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<InvalidWalletAddress> for ApiError {
    fn from(err: InvalidWalletAddress) -> Self {
        ApiError::InvalidInput(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidInput(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::InvalidInput(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.code();
        match code {
            ErrorCode::Internal => tracing::error!(error = %self, "Internal error"),
            ErrorCode::ScoringInputInvalid => {
                tracing::error!(error = %self, "Scoring input outside the normalized range")
            }
            _ => tracing::warn!(code = ?code, error = %self, "Request rejected"),
        }

        let body = ErrorBody {
            error: self.public_message(),
            code,
        };
        let mut response = (code.status(), Json(body)).into_response();

        if let ApiError::RateLimited(limited) = &self {
            if let Ok(value) = HeaderValue::from_str(&limited.retry_after_secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}
