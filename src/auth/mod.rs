//! Authentication and authorization subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request (Authorization: Bearer <token>)
//!     → session.rs (extract bearer credential)
//!     → token.rs (verify signature, issuer, audience, expiry)
//!     → SessionContext (identity or unauthenticated)
//!     → gate.rs (elevated role check, admin routes only)
//!
//! Session issuance:
//!     wallet.rs (address format + signature extension point)
//!     → token.rs (createWalletSession / issue)
//!
//! Operator login:
//!     password.rs (argon2 verify against configured digest)
//!     → token.rs (issue elevated token)
//! ```
//!
//! # Design Decisions
//! - Tokens are stateless; the signing secret is read-only after startup
//! - Expired and invalid tokens are distinct failures
//! - Optional authentication never fails; it degrades to anonymous

pub mod gate;
pub mod password;
pub mod session;
pub mod token;
pub mod wallet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use gate::require_elevated;
pub use password::{CredentialHasher, HashError};
pub use session::{Authenticator, Identity, SessionContext};
pub use token::{IssuedToken, TokenClaims, TokenService};
pub use wallet::{FormatOnlyVerifier, SignatureVerifier, WalletAddress};

/// Fixed issuer stamped into every token.
pub const TOKEN_ISSUER: &str = "stellar-credit";

/// Fixed audience stamped into every token.
pub const TOKEN_AUDIENCE: &str = "stellar-credit-api";

/// Privilege level carried by an identity token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Standard,
    Elevated,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Standard => "standard",
            Role::Elevated => "elevated",
        }
    }
}

/// Authentication and authorization failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// No bearer credential on the request.
    #[error("No token provided")]
    NoToken,

    /// Token signature checked out but its lifetime has passed.
    #[error("Token expired")]
    ExpiredToken,

    /// Token is malformed, forged, or issued for another service.
    #[error("Invalid token")]
    InvalidToken,

    /// Route needs an identity and the request carries none.
    #[error("Authentication required")]
    Unauthenticated,

    /// Identity present but lacks the elevated role.
    #[error("Insufficient privilege")]
    InsufficientPrivilege,

    /// Token could not be signed.
    #[error("Token signing failed: {0}")]
    Signing(String),
}

impl AuthError {
    /// Stable label used for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            AuthError::NoToken => "no_token",
            AuthError::ExpiredToken => "expired_token",
            AuthError::InvalidToken => "invalid_token",
            AuthError::Unauthenticated => "unauthenticated",
            AuthError::InsufficientPrivilege => "insufficient_privilege",
            AuthError::Signing(_) => "signing",
        }
    }
}

/// Current unix time in whole seconds.
pub(crate) fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
