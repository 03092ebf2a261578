//! Immutable, validated claim set.
//!
//! A [`Payload`] is only ever produced by a validating constructor and has no
//! mutating API: there is no `IndexMut`, no `insert`/`remove`, and its fields
//! are private. Once built it can be shared freely between readers.

use crate::claim::{Claim, StandardClaim};
use crate::error::{ClaimsError, ClaimsResult};
use crate::registry::ClaimRegistry;
use crate::validator::PayloadValidator;
use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::ops::Index;

static NULL: Value = Value::Null;

/// Ordered, immutable mapping of claim name to [`Claim`].
///
/// Key order is fixed: standard claims first in protocol order
/// (`iss, sub, aud, exp, nbf, iat, jti`), then custom claims in the order
/// they were supplied.
///
/// Claims can be read by key but never assigned:
///
/// ```compile_fail
/// use cryypt_claims::{ClaimRegistry, Factory, PayloadValidator, StaticIssuer};
/// use serde_json::json;
///
/// let mut factory = Factory::new(ClaimRegistry::new(), StaticIssuer::new("/foo"), PayloadValidator::new());
/// let mut payload = factory.with_subject(1).make().unwrap();
/// payload["foo"] = json!("bar");
/// ```
///
/// and the claim map handed out is shared, so it cannot be used to remove one:
///
/// ```compile_fail
/// use cryypt_claims::{ClaimRegistry, Factory, PayloadValidator, StaticIssuer};
///
/// let mut factory = Factory::new(ClaimRegistry::new(), StaticIssuer::new("/foo"), PayloadValidator::new());
/// let mut payload = factory.with_subject(1).make().unwrap();
/// payload.claims().shift_remove("sub");
/// ```
///
/// ```compile_fail
/// use cryypt_claims::{ClaimRegistry, Factory, PayloadValidator, StaticIssuer};
///
/// let mut factory = Factory::new(ClaimRegistry::new(), StaticIssuer::new("/foo"), PayloadValidator::new());
/// let mut payload = factory.with_subject(1).make().unwrap();
/// payload.remove("sub");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Payload {
    claims: IndexMap<String, Claim>,
}

impl Payload {
    /// Assemble a payload from claims and run the validator over it.
    ///
    /// # Errors
    /// - `ClaimsError::PayloadValidation` if two claims share a name, or the
    ///   set violates the validator's policy
    /// - `ClaimsError::TokenExpired` if the validator rejects `exp`
    pub fn new(
        claims: impl IntoIterator<Item = Claim>,
        validator: &PayloadValidator,
    ) -> ClaimsResult<Self> {
        let mut standard: Vec<Claim> = Vec::new();
        let mut custom: Vec<Claim> = Vec::new();
        for claim in claims {
            if claim.standard_kind().is_some() {
                standard.push(claim);
            } else {
                custom.push(claim);
            }
        }
        standard.sort_by_key(|claim| claim.standard_kind().map(StandardClaim::position));

        let mut ordered = IndexMap::with_capacity(standard.len() + custom.len());
        for claim in standard.into_iter().chain(custom) {
            let name = claim.name().to_string();
            if ordered.contains_key(&name) {
                return Err(ClaimsError::PayloadValidation(format!(
                    "duplicate claim '{name}'"
                )));
            }
            ordered.insert(name, claim);
        }

        validator.check(&ordered)?;
        tracing::debug!(claims = ordered.len(), "payload built");
        Ok(Self { claims: ordered })
    }

    /// Rebuild a payload from a decoded value mapping, re-validating every
    /// claim through `registry` and the whole set through `validator`.
    ///
    /// # Errors
    /// Any claim or payload validation error.
    pub fn from_values(
        values: Map<String, Value>,
        registry: &ClaimRegistry,
        validator: &PayloadValidator,
    ) -> ClaimsResult<Self> {
        let claims = values
            .into_iter()
            .map(|(name, value)| registry.get(&name, value))
            .collect::<ClaimsResult<Vec<_>>>()?;
        Self::new(claims, validator)
    }

    /// Full mapping of claim name to raw value, in payload order
    #[must_use]
    pub fn to_map(&self) -> Map<String, Value> {
        self.claims
            .iter()
            .map(|(name, claim)| (name.clone(), claim.value().clone()))
            .collect()
    }

    /// Value of a single claim.
    ///
    /// An exact claim name wins; otherwise `name` is read as a dotted path
    /// into a nested value (`"foo.bar"`, `"roles.0"`).
    ///
    /// # Errors
    /// Returns `ClaimsError::ClaimNotFound` when neither lookup succeeds.
    pub fn get(&self, name: &str) -> ClaimsResult<&Value> {
        if let Some(claim) = self.claims.get(name) {
            return Ok(claim.value());
        }
        self.get_path(name).ok_or_else(|| ClaimsError::not_found(name))
    }

    /// Values of several claims, in the order requested.
    ///
    /// # Errors
    /// Returns `ClaimsError::ClaimNotFound` for the first absent claim.
    pub fn get_many(&self, names: &[&str]) -> ClaimsResult<Vec<&Value>> {
        names.iter().map(|name| self.get(name)).collect()
    }

    /// Value of the first claim matching `predicate`, in payload order
    pub fn find<F>(&self, predicate: F) -> Option<&Value>
    where
        F: Fn(&Claim) -> bool,
    {
        self.claims
            .values()
            .find(|claim| predicate(claim))
            .map(Claim::value)
    }

    /// Whether a claim with the same name *and* value is present
    #[must_use]
    pub fn has(&self, claim: &Claim) -> bool {
        self.claims
            .get(claim.name())
            .is_some_and(|held| held == claim)
    }

    /// Whether a claim with this name is present
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.claims.contains_key(name)
    }

    /// Typed claim by name
    #[must_use]
    pub fn claim(&self, name: &str) -> Option<&Claim> {
        self.claims.get(name)
    }

    /// Underlying name to claim mapping
    #[must_use]
    pub fn claims(&self) -> &IndexMap<String, Claim> {
        &self.claims
    }

    /// Number of claims held
    #[must_use]
    pub fn count(&self) -> usize {
        self.claims.len()
    }

    /// Whether the payload holds no claims
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    /// Claim names and raw values, in payload order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.claims
            .iter()
            .map(|(name, claim)| (name.as_str(), claim.value()))
    }

    /// True if every (name, value) pair in `values` is present in the payload
    #[must_use]
    pub fn matches(&self, values: &Map<String, Value>) -> bool {
        values
            .iter()
            .all(|(name, value)| self.claims.get(name).is_some_and(|claim| claim.value() == value))
    }

    /// Like [`matches`](Self::matches), but the claim-name sets must also be identical
    #[must_use]
    pub fn matches_strict(&self, values: &Map<String, Value>) -> bool {
        values.len() == self.claims.len() && self.matches(values)
    }

    /// JSON encoding of [`to_map`](Self::to_map); forward slashes are not escaped.
    ///
    /// # Errors
    /// Returns `ClaimsError::Serialization` if encoding fails.
    pub fn to_json(&self) -> ClaimsResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// `sub` claim.
    ///
    /// # Errors
    /// `ClaimsError::ClaimNotFound` if absent.
    pub fn subject(&self) -> ClaimsResult<&Value> {
        self.get(StandardClaim::Subject.as_str())
    }

    /// `iss` claim.
    ///
    /// # Errors
    /// `ClaimsError::ClaimNotFound` if absent.
    pub fn issuer(&self) -> ClaimsResult<&str> {
        self.str_claim(StandardClaim::Issuer)
    }

    /// `aud` claim.
    ///
    /// # Errors
    /// `ClaimsError::ClaimNotFound` if absent.
    pub fn audience(&self) -> ClaimsResult<&Value> {
        self.get(StandardClaim::Audience.as_str())
    }

    /// `jti` claim.
    ///
    /// # Errors
    /// `ClaimsError::ClaimNotFound` if absent.
    pub fn jwt_id(&self) -> ClaimsResult<&str> {
        self.str_claim(StandardClaim::JwtId)
    }

    /// `exp` claim.
    ///
    /// # Errors
    /// `ClaimsError::ClaimNotFound` if absent.
    pub fn expiration(&self) -> ClaimsResult<i64> {
        self.timestamp_claim(StandardClaim::Expiration)
    }

    /// `nbf` claim.
    ///
    /// # Errors
    /// `ClaimsError::ClaimNotFound` if absent.
    pub fn not_before(&self) -> ClaimsResult<i64> {
        self.timestamp_claim(StandardClaim::NotBefore)
    }

    /// `iat` claim.
    ///
    /// # Errors
    /// `ClaimsError::ClaimNotFound` if absent.
    pub fn issued_at(&self) -> ClaimsResult<i64> {
        self.timestamp_claim(StandardClaim::IssuedAt)
    }

    // Standard claims were shape-checked on construction, so the conversions
    // below only fail if the claim is missing.
    fn str_claim(&self, kind: StandardClaim) -> ClaimsResult<&str> {
        self.claims
            .get(kind.as_str())
            .and_then(|claim| claim.value().as_str())
            .ok_or_else(|| ClaimsError::not_found(kind.as_str()))
    }

    fn timestamp_claim(&self, kind: StandardClaim) -> ClaimsResult<i64> {
        self.claims
            .get(kind.as_str())
            .and_then(Claim::as_timestamp)
            .ok_or_else(|| ClaimsError::not_found(kind.as_str()))
    }

    fn get_path(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let head = segments.next()?;
        let mut current = self.claims.get(head)?.value();
        for segment in segments {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }
}

impl Index<&str> for Payload {
    type Output = Value;

    /// Keyed read access; absent claims read as `Value::Null`.
    fn index(&self, name: &str) -> &Value {
        self.get(name).unwrap_or(&NULL)
    }
}

impl Serialize for Payload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.claims.len()))?;
        for (name, claim) in &self.claims {
            map.serialize_entry(name, claim.value())?;
        }
        map.end()
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = self.to_json().map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

impl<'a> IntoIterator for &'a Payload {
    type Item = (&'a String, &'a Claim);
    type IntoIter = indexmap::map::Iter<'a, String, Claim>;

    fn into_iter(self) -> Self::IntoIter {
        self.claims.iter()
    }
}
