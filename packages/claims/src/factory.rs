//! Payload factory - accumulates claim values, resolves defaults and builds
//! validated [`Payload`]s.
//!
//! Factory-level configuration (TTL, default claims, refresh flow) persists
//! across builds. Claim values supplied through the fluent setters are
//! cleared after each successful [`Factory::make`].

use crate::claim::StandardClaim;
use crate::clock::SharedClock;
use crate::config::{ClaimsConfig, DEFAULT_CLAIMS, DEFAULT_TTL};
use crate::error::{ClaimsError, ClaimsResult};
use crate::payload::Payload;
use crate::registry::ClaimRegistry;
use crate::validator::PayloadValidator;
use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Inbound context provider for the default `iss` value, typically the URL
/// of the resource handling the current request.
///
/// Only consulted when the issuer has to be defaulted.
pub trait IssuerProvider: Send + Sync {
    /// Default issuer for the payload being built
    fn issuer(&self) -> String;
}

impl<F> IssuerProvider for F
where
    F: Fn() -> String + Send + Sync,
{
    fn issuer(&self) -> String {
        self()
    }
}

/// Issuer provider that always returns the same value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticIssuer(pub String);

impl StaticIssuer {
    /// Provider for a fixed issuer
    pub fn new(issuer: impl Into<String>) -> Self {
        Self(issuer.into())
    }
}

impl IssuerProvider for StaticIssuer {
    fn issuer(&self) -> String {
        self.0.clone()
    }
}

/// Stateful payload builder.
pub struct Factory {
    registry: ClaimRegistry,
    validator: PayloadValidator,
    issuer: Arc<dyn IssuerProvider>,
    clock: SharedClock,
    ttl: Option<i64>,
    default_claims: Vec<StandardClaim>,
    custom_claims: IndexMap<String, Value>,
    refresh_flow: bool,
}

impl Factory {
    /// Factory with the default TTL and default claim list
    pub fn new(
        registry: ClaimRegistry,
        issuer: impl IssuerProvider + 'static,
        validator: PayloadValidator,
    ) -> Self {
        let clock = validator.clock().clone();
        Self {
            registry,
            validator,
            issuer: Arc::new(issuer),
            clock,
            ttl: Some(DEFAULT_TTL),
            default_claims: DEFAULT_CLAIMS.to_vec(),
            custom_claims: IndexMap::new(),
            refresh_flow: false,
        }
    }

    /// Factory and validator wired from configuration.
    ///
    /// # Errors
    /// Returns `ClaimsError::UnsupportedOperation` if the configuration is invalid.
    pub fn from_config(
        config: &ClaimsConfig,
        registry: ClaimRegistry,
        issuer: impl IssuerProvider + 'static,
    ) -> ClaimsResult<Self> {
        config.validate()?;
        let validator = PayloadValidator::new()
            .with_required_claims(config.required_claims.iter().copied())
            .with_refresh_ttl(config.refresh_ttl)
            .with_leeway(config.leeway);
        let mut factory = Self::new(registry, issuer, validator);
        factory
            .set_ttl(config.ttl)?
            .set_default_claims(config.default_claims.iter().copied());
        Ok(factory)
    }

    /// Use a different time source for default values and validation
    #[must_use]
    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.validator = self.validator.with_clock(clock.clone());
        self.clock = clock;
        self
    }

    /// Set the `sub` claim
    pub fn with_subject(&mut self, subject: impl Into<Value>) -> &mut Self {
        self.claim(StandardClaim::Subject.as_str(), subject)
    }

    /// Set the `iss` claim
    pub fn with_issuer(&mut self, issuer: impl Into<Value>) -> &mut Self {
        self.claim(StandardClaim::Issuer.as_str(), issuer)
    }

    /// Set the `aud` claim
    pub fn with_audience(&mut self, audience: impl Into<Value>) -> &mut Self {
        self.claim(StandardClaim::Audience.as_str(), audience)
    }

    /// Set the `iat` claim
    pub fn with_issued_at(&mut self, iat: impl Into<Value>) -> &mut Self {
        self.claim(StandardClaim::IssuedAt.as_str(), iat)
    }

    /// Set the `exp` claim
    pub fn with_expiration(&mut self, exp: impl Into<Value>) -> &mut Self {
        self.claim(StandardClaim::Expiration.as_str(), exp)
    }

    /// Set the `nbf` claim
    pub fn with_not_before(&mut self, nbf: impl Into<Value>) -> &mut Self {
        self.claim(StandardClaim::NotBefore.as_str(), nbf)
    }

    /// Set the `jti` claim
    pub fn with_jwt_id(&mut self, jti: impl Into<Value>) -> &mut Self {
        self.claim(StandardClaim::JwtId.as_str(), jti)
    }

    /// Set any claim by name; the last value written for a name wins
    pub fn claim(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.custom_claims.insert(name.into(), value.into());
        self
    }

    /// Set several claims at once
    pub fn claims<I, K, V>(&mut self, claims: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        for (name, value) in claims {
            self.claim(name, value);
        }
        self
    }

    /// Claim values supplied so far
    #[must_use]
    pub fn custom_claims(&self) -> &IndexMap<String, Value> {
        &self.custom_claims
    }

    /// Drop every supplied claim value
    pub fn reset_claims(&mut self) -> &mut Self {
        self.custom_claims.clear();
        self
    }

    /// Set the token lifetime in seconds; `None` builds tokens without `exp`.
    ///
    /// # Errors
    /// Returns `ClaimsError::UnsupportedOperation` for a negative lifetime.
    pub fn set_ttl(&mut self, ttl: Option<i64>) -> ClaimsResult<&mut Self> {
        if ttl.is_some_and(|ttl| ttl < 0) {
            return Err(ClaimsError::unsupported("ttl must not be negative"));
        }
        self.ttl = ttl;
        Ok(self)
    }

    /// Token lifetime in seconds
    #[must_use]
    pub fn ttl(&self) -> Option<i64> {
        self.ttl
    }

    /// Replace the list of claims resolved automatically
    pub fn set_default_claims(&mut self, claims: impl IntoIterator<Item = StandardClaim>) -> &mut Self {
        let mut defaults: Vec<StandardClaim> = Vec::new();
        for claim in claims {
            if !defaults.contains(&claim) {
                defaults.push(claim);
            }
        }
        self.default_claims = defaults;
        self
    }

    /// Replace the default claim list by claim names.
    ///
    /// # Errors
    /// Returns `ClaimsError::UnsupportedOperation` if a name is not a standard
    /// claim, since only standard claims have defaults.
    pub fn set_default_claim_names(&mut self, names: &[&str]) -> ClaimsResult<&mut Self> {
        let claims = names
            .iter()
            .map(|name| name.parse::<StandardClaim>())
            .collect::<ClaimsResult<Vec<_>>>()?;
        Ok(self.set_default_claims(claims))
    }

    /// Claims resolved automatically
    #[must_use]
    pub fn default_claims(&self) -> &[StandardClaim] {
        &self.default_claims
    }

    /// Validate the next builds in refresh flow (`true`) or normal flow (`false`)
    pub fn set_refresh_flow(&mut self, refresh_flow: bool) -> &mut Self {
        self.refresh_flow = refresh_flow;
        self
    }

    /// Whether builds run in refresh flow
    #[must_use]
    pub fn is_refresh_flow(&self) -> bool {
        self.refresh_flow
    }

    /// Bound validator
    #[must_use]
    pub fn validator(&self) -> &PayloadValidator {
        &self.validator
    }

    /// Bound validator, for reconfiguration
    pub fn validator_mut(&mut self) -> &mut PayloadValidator {
        &mut self.validator
    }

    /// Bound claim registry
    #[must_use]
    pub fn registry(&self) -> &ClaimRegistry {
        &self.registry
    }

    /// Bound claim registry, for registering custom claim checks
    pub fn registry_mut(&mut self) -> &mut ClaimRegistry {
        &mut self.registry
    }

    /// Resolved `iat`: the supplied integer value, otherwise now
    #[must_use]
    pub fn iat(&self) -> i64 {
        self.explicit_timestamp(StandardClaim::IssuedAt)
            .unwrap_or_else(|| self.clock.now())
    }

    /// Resolved `nbf`: the supplied integer value, otherwise now
    #[must_use]
    pub fn nbf(&self) -> i64 {
        self.explicit_timestamp(StandardClaim::NotBefore)
            .unwrap_or_else(|| self.clock.now())
    }

    /// Resolved `exp`: the supplied integer value, otherwise now + TTL.
    /// `None` when no TTL is configured and no value was supplied.
    ///
    /// # Errors
    /// Returns `ClaimsError::ClaimValidation` for `exp` if now + TTL does not
    /// fit in a timestamp.
    pub fn exp(&self) -> ClaimsResult<Option<i64>> {
        match self.explicit_timestamp(StandardClaim::Expiration) {
            Some(exp) => Ok(Some(exp)),
            None => self.ttl_expiration(self.clock.now()),
        }
    }

    /// Build a payload and clear the supplied claim values.
    ///
    /// # Errors
    /// - `ClaimsError::ClaimValidation` if any claim value is malformed
    /// - `ClaimsError::PayloadValidation` / `ClaimsError::TokenExpired` if the
    ///   assembled set violates policy
    ///
    /// On error the supplied claim values are kept.
    pub fn make(&mut self) -> ClaimsResult<Payload> {
        self.build(true)
    }

    /// Build a payload and keep the supplied claim values for the next build.
    ///
    /// # Errors
    /// Same as [`make`](Self::make).
    pub fn make_retaining_claims(&mut self) -> ClaimsResult<Payload> {
        self.build(false)
    }

    /// Build a normal-flow payload from `claims` alone. Claim values staged
    /// through the setters and the refresh-flow setting survive the call.
    pub(crate) fn make_detached(
        &mut self,
        claims: impl IntoIterator<Item = (String, Value)>,
    ) -> ClaimsResult<Payload> {
        let staged = std::mem::replace(&mut self.custom_claims, claims.into_iter().collect());
        let refresh_flow = std::mem::replace(&mut self.refresh_flow, false);
        let built = self.build(false);
        self.custom_claims = staged;
        self.refresh_flow = refresh_flow;
        built
    }

    fn build(&mut self, reset_claims: bool) -> ClaimsResult<Payload> {
        let now = self.clock.now();

        let mut raw: IndexMap<String, Value> = IndexMap::new();
        for kind in &self.default_claims {
            if self.custom_claims.contains_key(kind.as_str()) {
                continue;
            }
            if let Some(value) = self.resolve_default(*kind, now)? {
                raw.insert(kind.as_str().to_string(), value);
            }
        }
        for (name, value) in &self.custom_claims {
            raw.insert(name.clone(), value.clone());
        }

        let claims = raw
            .into_iter()
            .map(|(name, value)| self.registry.get(&name, value))
            .collect::<ClaimsResult<Vec<_>>>()?;

        let expiration_required = self.ttl.is_some()
            || self
                .custom_claims
                .contains_key(StandardClaim::Expiration.as_str());
        self.validator
            .set_refresh_flow(self.refresh_flow)
            .set_expiration_required(expiration_required);

        let payload = Payload::new(claims, &self.validator)?;
        tracing::debug!(
            claims = payload.count(),
            refresh_flow = self.refresh_flow,
            "factory built payload"
        );

        if reset_claims {
            self.custom_claims.clear();
        }
        Ok(payload)
    }

    fn resolve_default(&self, kind: StandardClaim, now: i64) -> ClaimsResult<Option<Value>> {
        let value = match kind {
            StandardClaim::Issuer => Some(Value::String(self.issuer.issuer())),
            StandardClaim::IssuedAt | StandardClaim::NotBefore => Some(Value::from(now)),
            StandardClaim::Expiration => self.ttl_expiration(now)?.map(Value::from),
            StandardClaim::JwtId => Some(Value::String(uuid::Uuid::new_v4().simple().to_string())),
            StandardClaim::Subject | StandardClaim::Audience => None,
        };
        if value.is_none() {
            tracing::trace!(claim = %kind, "no default value resolved");
        }
        Ok(value)
    }

    fn ttl_expiration(&self, now: i64) -> ClaimsResult<Option<i64>> {
        self.ttl
            .map(|ttl| {
                now.checked_add(ttl).ok_or_else(|| {
                    ClaimsError::invalid_claim(
                        StandardClaim::Expiration.as_str(),
                        "lifetime overflows the timestamp range",
                    )
                })
            })
            .transpose()
    }

    fn explicit_timestamp(&self, kind: StandardClaim) -> Option<i64> {
        self.custom_claims
            .get(kind.as_str())
            .and_then(Value::as_i64)
    }
}

impl fmt::Debug for Factory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Factory")
            .field("ttl", &self.ttl)
            .field("default_claims", &self.default_claims)
            .field("custom_claims", &self.custom_claims)
            .field("refresh_flow", &self.refresh_flow)
            .field("registry", &self.registry)
            .field("validator", &self.validator)
            .finish_non_exhaustive()
    }
}
