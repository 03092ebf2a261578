//! Payload validator - cross-claim policy checks.
//!
//! Runs once per payload construction, in one of two modes:
//!
//! - normal flow: `exp` must be strictly in the future
//! - refresh flow: an expired `exp` is tolerated as long as the token is
//!   still inside its refresh window (`exp + refresh_ttl >= now`)
//!
//! Both modes require the configured claims to be present, reject `iat`/`nbf`
//! values in the future and require `exp` to come after `iat` and `nbf`.

use crate::claim::{Claim, StandardClaim};
use crate::clock::{system_clock, SharedClock};
use crate::error::{ClaimsError, ClaimsResult};
use indexmap::IndexMap;

/// Claims every payload must carry unless configured otherwise
pub const DEFAULT_REQUIRED_CLAIMS: [StandardClaim; 6] = [
    StandardClaim::Issuer,
    StandardClaim::Subject,
    StandardClaim::Expiration,
    StandardClaim::NotBefore,
    StandardClaim::IssuedAt,
    StandardClaim::JwtId,
];

/// Default refresh window: two weeks, in seconds
pub const DEFAULT_REFRESH_TTL: i64 = 20_160 * 60;

/// Cross-claim policy validator.
#[derive(Debug, Clone)]
pub struct PayloadValidator {
    clock: SharedClock,
    required_claims: Vec<StandardClaim>,
    refresh_ttl: Option<i64>,
    leeway: i64,
    refresh_flow: bool,
    expiration_required: bool,
}

impl Default for PayloadValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl PayloadValidator {
    /// Validator with the default required claims and refresh window, using the system clock
    #[must_use]
    pub fn new() -> Self {
        Self {
            clock: system_clock(),
            required_claims: DEFAULT_REQUIRED_CLAIMS.to_vec(),
            refresh_ttl: Some(DEFAULT_REFRESH_TTL),
            leeway: 0,
            refresh_flow: false,
            expiration_required: true,
        }
    }

    /// Use a different time source
    #[must_use]
    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the required claim list
    #[must_use]
    pub fn with_required_claims(mut self, claims: impl IntoIterator<Item = StandardClaim>) -> Self {
        self.set_required_claims(claims);
        self
    }

    /// Set the refresh window in seconds past `exp`; `None` allows refresh forever
    #[must_use]
    pub fn with_refresh_ttl(mut self, refresh_ttl: Option<i64>) -> Self {
        self.refresh_ttl = refresh_ttl;
        self
    }

    /// Set the tolerated clock skew in seconds
    #[must_use]
    pub fn with_leeway(mut self, leeway: i64) -> Self {
        self.leeway = leeway.max(0);
        self
    }

    /// Switch between normal flow (`false`) and refresh flow (`true`)
    pub fn set_refresh_flow(&mut self, refresh_flow: bool) -> &mut Self {
        self.refresh_flow = refresh_flow;
        self
    }

    /// Replace the required claim list
    pub fn set_required_claims(&mut self, claims: impl IntoIterator<Item = StandardClaim>) -> &mut Self {
        let mut required: Vec<StandardClaim> = claims.into_iter().collect();
        required.sort();
        required.dedup();
        self.required_claims = required;
        self
    }

    /// Whether `exp` is enforced as a required claim. The factory clears this
    /// when it builds tokens without a TTL.
    pub fn set_expiration_required(&mut self, required: bool) -> &mut Self {
        self.expiration_required = required;
        self
    }

    /// Current mode
    #[must_use]
    pub fn is_refresh_flow(&self) -> bool {
        self.refresh_flow
    }

    /// Configured required claims
    #[must_use]
    pub fn required_claims(&self) -> &[StandardClaim] {
        &self.required_claims
    }

    /// Configured refresh window
    #[must_use]
    pub fn refresh_ttl(&self) -> Option<i64> {
        self.refresh_ttl
    }

    /// Configured leeway
    #[must_use]
    pub fn leeway(&self) -> i64 {
        self.leeway
    }

    /// Time source
    #[must_use]
    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }

    /// Check a claim mapping against the policy for the current mode.
    ///
    /// # Errors
    /// - `ClaimsError::PayloadValidation` if a required claim is missing, `iat`
    ///   or `nbf` lies in the future, or `exp` does not come after `iat`/`nbf`
    /// - `ClaimsError::TokenExpired` if `exp` has passed (normal flow) or the
    ///   refresh window has closed (refresh flow)
    pub fn check(&self, claims: &IndexMap<String, Claim>) -> ClaimsResult<()> {
        self.check_inner(claims).inspect_err(|err| {
            tracing::warn!(refresh_flow = self.refresh_flow, error = %err, "claim set rejected");
        })
    }

    fn check_inner(&self, claims: &IndexMap<String, Claim>) -> ClaimsResult<()> {
        self.check_required(claims)?;

        let now = self.clock.now();
        let timestamp = |kind: StandardClaim| {
            claims
                .get(kind.as_str())
                .and_then(Claim::as_timestamp)
        };
        let iat = timestamp(StandardClaim::IssuedAt);
        let nbf = timestamp(StandardClaim::NotBefore);
        let exp = timestamp(StandardClaim::Expiration);

        // Decoded timestamps may sit at the edge of the i64 range; all sums saturate.
        let horizon = now.saturating_add(self.leeway);
        if iat.is_some_and(|iat| iat > horizon) {
            return Err(ClaimsError::invalid_payload(
                "Issued At (iat) timestamp cannot be in the future",
            ));
        }
        if nbf.is_some_and(|nbf| nbf > horizon) {
            return Err(ClaimsError::invalid_payload(
                "Not Before (nbf) timestamp cannot be in the future",
            ));
        }

        if let Some(exp) = exp {
            if self.refresh_flow {
                self.check_refresh_window(exp, now)?;
            } else if exp.saturating_add(self.leeway) <= now {
                return Err(ClaimsError::token_expired("Token has expired"));
            }

            if iat.is_some_and(|iat| exp <= iat) {
                return Err(ClaimsError::invalid_payload(
                    "Expiration (exp) must be after Issued At (iat)",
                ));
            }
            if nbf.is_some_and(|nbf| exp <= nbf) {
                return Err(ClaimsError::invalid_payload(
                    "Expiration (exp) must be after Not Before (nbf)",
                ));
            }
        }

        Ok(())
    }

    fn check_required(&self, claims: &IndexMap<String, Claim>) -> ClaimsResult<()> {
        let missing: Vec<&str> = self
            .required_claims
            .iter()
            .filter(|kind| self.expiration_required || **kind != StandardClaim::Expiration)
            .map(|kind| kind.as_str())
            .filter(|name| !claims.contains_key(*name))
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ClaimsError::PayloadValidation(format!(
                "JWT payload does not contain the required claims: {}",
                missing.join(", ")
            )))
        }
    }

    fn check_refresh_window(&self, exp: i64, now: i64) -> ClaimsResult<()> {
        match self.refresh_ttl {
            Some(refresh_ttl)
                if exp.saturating_add(refresh_ttl).saturating_add(self.leeway) < now =>
            {
                Err(ClaimsError::token_expired(
                    "Token has expired and can no longer be refreshed",
                ))
            }
            _ => Ok(()),
        }
    }
}
