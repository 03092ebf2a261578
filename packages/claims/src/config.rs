//! Claim-set configuration options.

use crate::claim::StandardClaim;
use crate::error::{ClaimsError, ClaimsResult};
use crate::validator::{DEFAULT_REFRESH_TTL, DEFAULT_REQUIRED_CLAIMS};
use serde::{Deserialize, Serialize};

/// Default token lifetime: one hour, in seconds
pub const DEFAULT_TTL: i64 = 3_600;

/// Claims the factory fills in when the caller does not supply them
pub const DEFAULT_CLAIMS: [StandardClaim; 5] = [
    StandardClaim::Issuer,
    StandardClaim::IssuedAt,
    StandardClaim::Expiration,
    StandardClaim::NotBefore,
    StandardClaim::JwtId,
];

/// Factory and validator configuration.
///
/// All durations are whole seconds. Deserializes from JSON with every field
/// optional, so a host only needs to spell out what it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClaimsConfig {
    /// Token lifetime; `None` issues tokens without `exp`
    pub ttl: Option<i64>,
    /// How long after `exp` a token may still be refreshed; `None` means forever
    pub refresh_ttl: Option<i64>,
    /// Claims resolved automatically by the factory
    pub default_claims: Vec<StandardClaim>,
    /// Claims every payload must contain
    pub required_claims: Vec<StandardClaim>,
    /// Tolerated clock skew for time-based checks
    pub leeway: i64,
}

impl Default for ClaimsConfig {
    fn default() -> Self {
        Self {
            ttl: Some(DEFAULT_TTL),
            refresh_ttl: Some(DEFAULT_REFRESH_TTL),
            default_claims: DEFAULT_CLAIMS.to_vec(),
            required_claims: DEFAULT_REQUIRED_CLAIMS.to_vec(),
            leeway: 0,
        }
    }
}

impl ClaimsConfig {
    /// Parse configuration from a JSON document.
    ///
    /// # Errors
    /// Returns `ClaimsError::Serialization` for malformed JSON and
    /// `ClaimsError::UnsupportedOperation` for out-of-range durations.
    pub fn from_json(json: &str) -> ClaimsResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject negative durations.
    ///
    /// # Errors
    /// Returns `ClaimsError::UnsupportedOperation` naming the offending option.
    pub fn validate(&self) -> ClaimsResult<()> {
        if self.ttl.is_some_and(|ttl| ttl < 0) {
            return Err(ClaimsError::unsupported("ttl must not be negative"));
        }
        if self.refresh_ttl.is_some_and(|ttl| ttl < 0) {
            return Err(ClaimsError::unsupported("refresh_ttl must not be negative"));
        }
        if self.leeway < 0 {
            return Err(ClaimsError::unsupported("leeway must not be negative"));
        }
        Ok(())
    }

    /// Set the token lifetime
    #[must_use]
    pub fn with_ttl(mut self, ttl: Option<i64>) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the refresh window
    #[must_use]
    pub fn with_refresh_ttl(mut self, refresh_ttl: Option<i64>) -> Self {
        self.refresh_ttl = refresh_ttl;
        self
    }

    /// Set the default claims
    #[must_use]
    pub fn with_default_claims(mut self, claims: Vec<StandardClaim>) -> Self {
        self.default_claims = claims;
        self
    }

    /// Set the required claims
    #[must_use]
    pub fn with_required_claims(mut self, claims: Vec<StandardClaim>) -> Self {
        self.required_claims = claims;
        self
    }

    /// Set the leeway
    #[must_use]
    pub fn with_leeway(mut self, leeway: i64) -> Self {
        self.leeway = leeway;
        self
    }
}
