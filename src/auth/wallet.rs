//! Stellar wallet addresses and request-signature checks.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Length of an encoded Stellar account id.
pub const WALLET_ADDRESS_LEN: usize = 56;

/// Error for addresses that do not match the account id format.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid wallet address: expected 56 characters starting with 'G' from [A-Z2-7]")]
pub struct InvalidWalletAddress;

/// A format-checked Stellar public account id (`G...`, 56 characters).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WalletAddress(String);

impl WalletAddress {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for WalletAddress {
    type Err = InvalidWalletAddress;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != WALLET_ADDRESS_LEN || bytes[0] != b'G' {
            return Err(InvalidWalletAddress);
        }
        let base32 = |b: &u8| b.is_ascii_uppercase() || (b'2'..=b'7').contains(b);
        if !bytes[1..].iter().all(base32) {
            return Err(InvalidWalletAddress);
        }
        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for WalletAddress {
    type Error = InvalidWalletAddress;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<WalletAddress> for String {
    fn from(address: WalletAddress) -> Self {
        address.0
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Checks that a wallet-originated request was signed by the wallet owner.
///
/// Session issuance goes through this seam so a real scheme can replace the
/// format-only check without touching callers.
pub trait SignatureVerifier: Send + Sync {
    fn validate_signature(&self, address: &WalletAddress, message: &str, signature: &str) -> bool;
}

/// Accepts any well-formed address that presents a non-empty signature.
///
/// No cryptographic verification is performed.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatOnlyVerifier;

impl SignatureVerifier for FormatOnlyVerifier {
    fn validate_signature(&self, address: &WalletAddress, _message: &str, signature: &str) -> bool {
        // Parsing already enforced the address format.
        !address.as_str().is_empty() && !signature.trim().is_empty()
    }
}
