//! Claim registry - turns a (name, raw value) pair into a validated [`Claim`].
//!
//! Standard claims are dispatched through the [`StandardClaim`] table. Any
//! other name becomes a custom claim, optionally guarded by a check
//! registered for that name.

use crate::claim::{Claim, StandardClaim};
use crate::error::{ClaimsError, ClaimsResult};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Check for a registered custom claim; `Err` carries the violated constraint.
pub type CustomClaimCheck = Arc<dyn Fn(&Value) -> Result<(), String> + Send + Sync>;

/// Maps claim names to validating constructors.
#[derive(Clone, Default)]
pub struct ClaimRegistry {
    custom: HashMap<String, CustomClaimCheck>,
}

impl ClaimRegistry {
    /// Registry that knows only the standard claims
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a check for a custom claim name.
    ///
    /// Registering the same name again replaces the previous check.
    ///
    /// # Errors
    /// Returns `ClaimsError::UnsupportedOperation` if `name` is a standard
    /// claim; their checks are fixed.
    pub fn register<F>(&mut self, name: &str, check: F) -> ClaimsResult<&mut Self>
    where
        F: Fn(&Value) -> Result<(), String> + Send + Sync + 'static,
    {
        if StandardClaim::from_name(name).is_some() {
            return Err(ClaimsError::unsupported(&format!(
                "cannot register a check for standard claim '{name}'"
            )));
        }
        tracing::debug!(claim = name, "registered custom claim check");
        self.custom.insert(name.to_string(), Arc::new(check));
        Ok(self)
    }

    /// Builder-style [`register`](Self::register).
    ///
    /// # Errors
    /// Same as [`register`](Self::register).
    pub fn with_claim<F>(mut self, name: &str, check: F) -> ClaimsResult<Self>
    where
        F: Fn(&Value) -> Result<(), String> + Send + Sync + 'static,
    {
        self.register(name, check)?;
        Ok(self)
    }

    /// Whether a custom check is registered under `name`
    #[must_use]
    pub fn is_registered(&self, name: &str) -> bool {
        self.custom.contains_key(name)
    }

    /// Build the claim called `name` from `value`.
    ///
    /// Unregistered non-standard names produce a custom claim carrying the
    /// value verbatim.
    ///
    /// # Errors
    /// Returns `ClaimsError::ClaimValidation` naming the claim when the value
    /// violates its contract.
    pub fn get(&self, name: &str, value: Value) -> ClaimsResult<Claim> {
        if name.is_empty() {
            return Err(ClaimsError::invalid_claim(name, "claim name must not be empty"));
        }
        if let Some(kind) = StandardClaim::from_name(name) {
            return Claim::standard(kind, value);
        }
        if let Some(check) = self.custom.get(name) {
            check(&value).map_err(|reason| ClaimsError::invalid_claim(name, &reason))?;
        }
        Ok(Claim::custom(name, value))
    }
}

impl fmt::Debug for ClaimRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.custom.keys().collect();
        names.sort();
        f.debug_struct("ClaimRegistry")
            .field("custom", &names)
            .finish()
    }
}
