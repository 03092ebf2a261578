//! Claim and payload error types

use thiserror::Error;

/// Claims operation result type
pub type ClaimsResult<T> = Result<T, ClaimsError>;

/// Errors raised while building, validating, reading or encoding a claim set.
///
/// None of these are retried internally: each one is either a programming
/// error or a data-integrity failure that the caller must see.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClaimsError {
    /// A single claim's raw value violates its type or format contract
    #[error("Invalid value provided for claim [{claim}]: {reason}")]
    ClaimValidation {
        /// Name of the offending claim
        claim: String,
        /// Violated constraint
        reason: String,
    },

    /// The assembled claim set violates cross-claim policy
    #[error("Payload validation failed: {0}")]
    PayloadValidation(String),

    /// The token is expired (or past its refresh window in refresh flow)
    #[error("Token has expired: {0}")]
    TokenExpired(String),

    /// The requested claim is not present in the payload
    #[error("Claim not found: {0}")]
    ClaimNotFound(String),

    /// The named operation or claim accessor does not exist
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// Encoded token is malformed
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Encoded token signature does not match
    #[error("Invalid token signature")]
    InvalidSignature,

    /// Signing key is unusable
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// JSON encoding or decoding failed
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ClaimsError {
    /// Create a claim validation error
    #[inline]
    #[must_use]
    pub fn invalid_claim(claim: &str, reason: &str) -> Self {
        ClaimsError::ClaimValidation {
            claim: claim.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a payload validation error
    #[inline]
    #[must_use]
    pub fn invalid_payload(msg: &str) -> Self {
        ClaimsError::PayloadValidation(msg.to_string())
    }

    /// Create a token expired error
    #[inline]
    #[must_use]
    pub fn token_expired(msg: &str) -> Self {
        ClaimsError::TokenExpired(msg.to_string())
    }

    /// Create a claim not found error
    #[inline]
    #[must_use]
    pub fn not_found(claim: &str) -> Self {
        ClaimsError::ClaimNotFound(claim.to_string())
    }

    /// Create an unsupported operation error
    #[inline]
    #[must_use]
    pub fn unsupported(op: &str) -> Self {
        ClaimsError::UnsupportedOperation(op.to_string())
    }

    /// Create an invalid token error
    #[inline]
    #[must_use]
    pub fn invalid_token(msg: &str) -> Self {
        ClaimsError::InvalidToken(msg.to_string())
    }

    /// Create an invalid key error
    #[inline]
    #[must_use]
    pub fn invalid_key(msg: &str) -> Self {
        ClaimsError::InvalidKey(msg.to_string())
    }

    /// Create a serialization error
    #[inline]
    #[must_use]
    pub fn serialization(msg: &str) -> Self {
        ClaimsError::Serialization(msg.to_string())
    }

    /// Name of the claim this error is about, when there is one
    #[must_use]
    pub fn claim(&self) -> Option<&str> {
        match self {
            ClaimsError::ClaimValidation { claim, .. } | ClaimsError::ClaimNotFound(claim) => {
                Some(claim)
            }
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ClaimsError {
    fn from(err: serde_json::Error) -> Self {
        ClaimsError::Serialization(err.to_string())
    }
}
