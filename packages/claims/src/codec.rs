//! Signing adapter seam and the HS256 reference adapter.
//!
//! The claim pipeline only hands a codec the flattened value mapping of a
//! [`Payload`](crate::Payload) and takes a value mapping back; the wire format
//! belongs to the codec.

use crate::error::{ClaimsError, ClaimsResult};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::Sha256;
use std::fmt;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

type HmacSha256 = Hmac<Sha256>;

/// JOSE header written by [`Hs256Codec`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Algorithm used for signing
    pub alg: String,
    /// Token type
    pub typ: String,
    /// Key ID hint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
}

impl Header {
    /// Header for `alg`, typed `JWT`
    #[must_use]
    pub fn new(alg: &str, kid: Option<String>) -> Self {
        Self {
            alg: alg.to_string(),
            typ: "JWT".to_string(),
            kid,
        }
    }
}

/// Turns a claim value mapping into an encoded token and back.
///
/// Implementations must be thread-safe (Send + Sync).
pub trait PayloadCodec: Send + Sync {
    /// Encode and sign a claim mapping
    ///
    /// # Errors
    /// Implementation specific; typically `ClaimsError::InvalidKey` or
    /// `ClaimsError::Serialization`.
    fn encode(&self, claims: &Map<String, Value>) -> ClaimsResult<String>;

    /// Verify a token and return its claim mapping
    ///
    /// # Errors
    /// Implementation specific; typically `ClaimsError::InvalidToken` or
    /// `ClaimsError::InvalidSignature`.
    fn decode(&self, token: &str) -> ClaimsResult<Map<String, Value>>;

    /// Header `alg` value
    fn alg(&self) -> &'static str;
}

impl<T: PayloadCodec + ?Sized> PayloadCodec for std::sync::Arc<T> {
    fn encode(&self, claims: &Map<String, Value>) -> ClaimsResult<String> {
        (**self).encode(claims)
    }

    fn decode(&self, token: &str) -> ClaimsResult<Map<String, Value>> {
        (**self).decode(token)
    }

    fn alg(&self) -> &'static str {
        (**self).alg()
    }
}

/// Compact JWS with HMAC-SHA256.
pub struct Hs256Codec {
    secret: Zeroizing<Vec<u8>>,
    kid: Option<String>,
}

impl Hs256Codec {
    /// Codec for a shared secret.
    ///
    /// # Errors
    /// Returns `ClaimsError::InvalidKey` if the secret is empty.
    pub fn new(secret: impl Into<Vec<u8>>) -> ClaimsResult<Self> {
        let secret = Zeroizing::new(secret.into());
        if secret.is_empty() {
            return Err(ClaimsError::invalid_key("HS256 secret must not be empty"));
        }
        Ok(Self { secret, kid: None })
    }

    /// Attach a key ID hint to every header
    #[must_use]
    pub fn with_key_id(mut self, kid: impl Into<String>) -> Self {
        self.kid = Some(kid.into());
        self
    }

    fn sign(&self, signing_input: &str) -> ClaimsResult<Vec<u8>> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|_| ClaimsError::invalid_key("Invalid HMAC key"))?;
        mac.update(signing_input.as_bytes());
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

impl PayloadCodec for Hs256Codec {
    fn encode(&self, claims: &Map<String, Value>) -> ClaimsResult<String> {
        let header = Header::new(self.alg(), self.kid.clone());
        let header_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header)?);
        let claims_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims)?);

        let signing_input = format!("{header_b64}.{claims_b64}");
        let signature = self.sign(&signing_input)?;
        Ok(format!("{signing_input}.{}", URL_SAFE_NO_PAD.encode(signature)))
    }

    fn decode(&self, token: &str) -> ClaimsResult<Map<String, Value>> {
        let parts: Vec<&str> = token.split('.').collect();
        let [header_b64, claims_b64, signature_b64] = parts[..] else {
            return Err(ClaimsError::invalid_token("expected three dot-separated segments"));
        };

        let header_json = URL_SAFE_NO_PAD
            .decode(header_b64)
            .map_err(|_| ClaimsError::invalid_token("header is not base64url"))?;
        let header: Header = serde_json::from_slice(&header_json)
            .map_err(|_| ClaimsError::invalid_token("header is not valid JSON"))?;
        if header.alg != self.alg() {
            return Err(ClaimsError::invalid_token(&format!(
                "unexpected algorithm '{}'",
                header.alg
            )));
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| ClaimsError::invalid_token("signature is not base64url"))?;
        let expected = self.sign(&format!("{header_b64}.{claims_b64}"))?;
        if !bool::from(signature.as_slice().ct_eq(expected.as_slice())) {
            return Err(ClaimsError::InvalidSignature);
        }

        let claims_json = URL_SAFE_NO_PAD
            .decode(claims_b64)
            .map_err(|_| ClaimsError::invalid_token("payload is not base64url"))?;
        match serde_json::from_slice::<Value>(&claims_json)? {
            Value::Object(claims) => Ok(claims),
            _ => Err(ClaimsError::invalid_token("payload is not a JSON object")),
        }
    }

    fn alg(&self) -> &'static str {
        "HS256"
    }
}

impl fmt::Debug for Hs256Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hs256Codec")
            .field("secret", &"<redacted>")
            .field("kid", &self.kid)
            .finish()
    }
}
