//! Individual claims: named, validated, immutable values.

pub mod standard;

pub use standard::{ClaimCheckFn, StandardClaim};

use crate::error::ClaimsResult;
use serde_json::Value;
use std::fmt;

/// What a claim is: one of the standard kinds, or an arbitrary custom name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ClaimKind {
    /// Registered claim with its own shape check
    Standard(StandardClaim),
    /// Any other name; the value is carried verbatim
    Custom(String),
}

impl ClaimKind {
    /// Resolve a claim name to its kind
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        StandardClaim::from_name(name)
            .map_or_else(|| ClaimKind::Custom(name.to_string()), ClaimKind::Standard)
    }

    /// Claim name
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            ClaimKind::Standard(kind) => kind.as_str(),
            ClaimKind::Custom(name) => name,
        }
    }
}

/// A single named claim value.
///
/// Claims are value objects: two claims with the same name and value are
/// equal. A `Claim` can only be obtained through a validating constructor and
/// exposes no way to change its value afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Claim {
    kind: ClaimKind,
    value: Value,
}

impl Claim {
    /// Build a claim by name, validating standard claims against their shape check.
    ///
    /// # Errors
    /// Returns `ClaimsError::ClaimValidation` if `name` is a standard claim and
    /// `value` does not satisfy its contract.
    pub fn new(name: &str, value: impl Into<Value>) -> ClaimsResult<Self> {
        match StandardClaim::from_name(name) {
            Some(kind) => Self::standard(kind, value),
            None => Ok(Self::custom(name, value)),
        }
    }

    /// Build a standard claim.
    ///
    /// # Errors
    /// Returns `ClaimsError::ClaimValidation` if `value` fails the claim's shape check.
    pub fn standard(kind: StandardClaim, value: impl Into<Value>) -> ClaimsResult<Self> {
        let value = value.into();
        kind.check(&value)?;
        Ok(Self {
            kind: ClaimKind::Standard(kind),
            value,
        })
    }

    // Callers guarantee `name` is not a standard claim name.
    pub(crate) fn custom(name: &str, value: impl Into<Value>) -> Self {
        Self {
            kind: ClaimKind::Custom(name.to_string()),
            value: value.into(),
        }
    }

    /// Claim name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        self.kind.name()
    }

    /// Claim kind
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &ClaimKind {
        &self.kind
    }

    /// Standard kind, if this is a standard claim
    #[must_use]
    pub fn standard_kind(&self) -> Option<StandardClaim> {
        match self.kind {
            ClaimKind::Standard(kind) => Some(kind),
            ClaimKind::Custom(_) => None,
        }
    }

    /// Raw value
    #[inline]
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Unwrap into the raw value
    #[must_use]
    pub fn into_value(self) -> Value {
        self.value
    }

    /// Value as an integer timestamp, when it is one
    #[must_use]
    pub fn as_timestamp(&self) -> Option<i64> {
        self.value.as_i64()
    }
}

impl fmt::Display for Claim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name(), self.value)
    }
}
