//! Registered (RFC 7519 section 4.1) claim names and their shape checks.

use crate::error::ClaimsError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Shape check applied to a raw claim value; `Err` carries the violated constraint.
pub type ClaimCheckFn = fn(&Value) -> Result<(), &'static str>;

/// Standard claim kinds, declared in protocol order.
///
/// The declaration order is also the order in which standard claims appear in
/// a [`Payload`](crate::Payload) and in its JSON form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StandardClaim {
    /// `iss`
    #[serde(rename = "iss")]
    Issuer,
    /// `sub`
    #[serde(rename = "sub")]
    Subject,
    /// `aud`
    #[serde(rename = "aud")]
    Audience,
    /// `exp`
    #[serde(rename = "exp")]
    Expiration,
    /// `nbf`
    #[serde(rename = "nbf")]
    NotBefore,
    /// `iat`
    #[serde(rename = "iat")]
    IssuedAt,
    /// `jti`
    #[serde(rename = "jti")]
    JwtId,
}

struct ClaimSpec {
    kind: StandardClaim,
    name: &'static str,
    check: ClaimCheckFn,
}

// Indexed by `StandardClaim as usize`; a new kind is one variant plus one row here.
static STANDARD_CLAIMS: [ClaimSpec; 7] = [
    ClaimSpec {
        kind: StandardClaim::Issuer,
        name: "iss",
        check: check_non_empty_string,
    },
    ClaimSpec {
        kind: StandardClaim::Subject,
        name: "sub",
        check: check_identifier,
    },
    ClaimSpec {
        kind: StandardClaim::Audience,
        name: "aud",
        check: check_audience,
    },
    ClaimSpec {
        kind: StandardClaim::Expiration,
        name: "exp",
        check: check_timestamp,
    },
    ClaimSpec {
        kind: StandardClaim::NotBefore,
        name: "nbf",
        check: check_timestamp,
    },
    ClaimSpec {
        kind: StandardClaim::IssuedAt,
        name: "iat",
        check: check_timestamp,
    },
    ClaimSpec {
        kind: StandardClaim::JwtId,
        name: "jti",
        check: check_non_empty_string,
    },
];

impl StandardClaim {
    /// Every standard claim, in protocol order
    pub const ALL: [StandardClaim; 7] = [
        StandardClaim::Issuer,
        StandardClaim::Subject,
        StandardClaim::Audience,
        StandardClaim::Expiration,
        StandardClaim::NotBefore,
        StandardClaim::IssuedAt,
        StandardClaim::JwtId,
    ];

    #[inline]
    fn spec(self) -> &'static ClaimSpec {
        &STANDARD_CLAIMS[self as usize]
    }

    /// Short claim name as it appears on the wire (`"sub"`, `"exp"`, ...)
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        self.spec().name
    }

    /// Look up a standard claim by its short name
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        STANDARD_CLAIMS
            .iter()
            .find(|spec| spec.name == name)
            .map(|spec| spec.kind)
    }

    /// Position of this claim in the payload's fixed key order
    #[inline]
    #[must_use]
    pub fn position(self) -> usize {
        self as usize
    }

    /// Run this claim's shape check against a raw value
    ///
    /// # Errors
    /// Returns `ClaimsError::ClaimValidation` naming the claim and the violated constraint.
    pub fn check(self, value: &Value) -> Result<(), ClaimsError> {
        (self.spec().check)(value).map_err(|reason| ClaimsError::invalid_claim(self.as_str(), reason))
    }
}

impl fmt::Display for StandardClaim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StandardClaim {
    type Err = ClaimsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
            .ok_or_else(|| ClaimsError::unsupported(&format!("'{s}' is not a standard claim")))
    }
}

fn check_non_empty_string(value: &Value) -> Result<(), &'static str> {
    match value {
        Value::String(s) if s.is_empty() => Err("must not be an empty string"),
        Value::String(_) => Ok(()),
        _ => Err("must be a string"),
    }
}

fn check_identifier(value: &Value) -> Result<(), &'static str> {
    match value {
        Value::Number(_) => Ok(()),
        Value::String(s) if !s.is_empty() => Ok(()),
        Value::String(_) => Err("must not be an empty string"),
        Value::Null => Err("must not be null"),
        _ => Err("must be a string or number"),
    }
}

fn check_timestamp(value: &Value) -> Result<(), &'static str> {
    match value.as_i64() {
        Some(ts) if ts >= 0 => Ok(()),
        Some(_) => Err("must not be negative"),
        None => Err("must be an integer timestamp"),
    }
}

fn check_audience(value: &Value) -> Result<(), &'static str> {
    match value {
        Value::String(aud) if aud.is_empty() => Err("must not be an empty string"),
        Value::String(_) => Ok(()),
        Value::Array(items) if items.is_empty() => Err("array must not be empty"),
        Value::Array(items) => {
            for item in items {
                match item.as_str() {
                    Some(aud) if !aud.is_empty() => {}
                    Some(_) => return Err("array items must not be empty"),
                    None => return Err("array items must be strings"),
                }
            }
            Ok(())
        }
        _ => Err("must be a string or array of strings"),
    }
}
