//! Signed, expiring identity tokens.
//!
//! Tokens are HS256 JWTs. Registered claim names are used on the wire
//! (`sub`, `iat`, `exp`, `iss`, `aud`) next to the custom `role` claim.
//!
//! Verification order is fixed: signature, issuer, audience, expiry. The
//! first failing check decides the error, so a forged token that is also
//! stale is still reported as invalid.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

use crate::auth::wallet::WalletAddress;
use crate::auth::{unix_now, AuthError, Role, TOKEN_AUDIENCE, TOKEN_ISSUER};

/// Claim names that extra claims may not override.
const RESERVED_CLAIMS: [&str; 6] = ["sub", "role", "iat", "exp", "iss", "aud"];

/// Logical token payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Wallet address or operator name.
    #[serde(rename = "sub")]
    pub subject: String,
    pub role: Role,
    #[serde(rename = "iat")]
    pub issued_at: u64,
    #[serde(rename = "exp")]
    pub expires_at: u64,
    #[serde(rename = "iss")]
    pub issuer: String,
    #[serde(rename = "aud")]
    pub audience: String,
    /// Caller-supplied claims carried through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A freshly issued token together with its payload.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: TokenClaims,
}

/// Issues and verifies identity tokens with a server-held secret.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    lifetime: Duration,
    admin_address: Option<String>,
}

impl TokenService {
    /// Create a token service.
    ///
    /// `admin_address` is the wallet that receives the elevated role in
    /// [`TokenService::create_wallet_session`].
    pub fn new(secret: &[u8], lifetime: Duration, admin_address: Option<String>) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            lifetime,
            admin_address,
        }
    }

    /// Configured token lifetime.
    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Issue a token for `subject` valid from now for the configured lifetime.
    pub fn issue(
        &self,
        subject: &str,
        role: Role,
        extra: Option<Map<String, Value>>,
    ) -> Result<IssuedToken, AuthError> {
        self.issue_at(subject, role, extra, unix_now())
    }

    /// Issue a token as if the current time were `now` (unix seconds).
    pub fn issue_at(
        &self,
        subject: &str,
        role: Role,
        extra: Option<Map<String, Value>>,
        now: u64,
    ) -> Result<IssuedToken, AuthError> {
        let mut extra = extra.unwrap_or_default();
        extra.retain(|key, _| !RESERVED_CLAIMS.contains(&key.as_str()));

        let claims = TokenClaims {
            subject: subject.to_string(),
            role,
            issued_at: now,
            expires_at: now.saturating_add(self.lifetime.as_secs().max(1)),
            issuer: TOKEN_ISSUER.to_string(),
            audience: TOKEN_AUDIENCE.to_string(),
            extra,
        };

        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Signing(e.to_string()))?;

        Ok(IssuedToken { token, claims })
    }

    /// Verify a token against the current time.
    pub fn verify(&self, token: &str) -> Result<TokenClaims, AuthError> {
        self.verify_at(token, unix_now())
    }

    /// Verify a token as if the current time were `now` (unix seconds).
    pub fn verify_at(&self, token: &str, now: u64) -> Result<TokenClaims, AuthError> {
        // Only the signature and algorithm are left to the library; claim
        // checks run below in a fixed order.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let claims = jsonwebtoken::decode::<TokenClaims>(token, &self.decoding, &validation)
            .map_err(|_| AuthError::InvalidToken)?
            .claims;

        if claims.issuer != TOKEN_ISSUER {
            return Err(AuthError::InvalidToken);
        }
        if claims.audience != TOKEN_AUDIENCE {
            return Err(AuthError::InvalidToken);
        }
        if claims.expires_at <= claims.issued_at {
            return Err(AuthError::InvalidToken);
        }
        if now >= claims.expires_at {
            return Err(AuthError::ExpiredToken);
        }

        Ok(claims)
    }

    /// Issue a session for a wallet. The configured administrator wallet
    /// gets the elevated role; every other wallet is standard.
    pub fn create_wallet_session(
        &self,
        address: &WalletAddress,
        extra: Option<Map<String, Value>>,
    ) -> Result<IssuedToken, AuthError> {
        let role = match &self.admin_address {
            Some(admin) if admin == address.as_str() => Role::Elevated,
            _ => Role::Standard,
        };
        self.issue(address.as_str(), role, extra)
    }
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("lifetime", &self.lifetime)
            .field("admin_address", &self.admin_address)
            .finish_non_exhaustive()
    }
}
