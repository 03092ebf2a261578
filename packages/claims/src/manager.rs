//! Token manager - moves payloads through a [`PayloadCodec`].

use crate::claim::StandardClaim;
use crate::codec::PayloadCodec;
use crate::error::ClaimsResult;
use crate::factory::Factory;
use crate::payload::Payload;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Claims regenerated on refresh rather than carried over
const REISSUED_CLAIMS: [StandardClaim; 5] = [
    StandardClaim::Issuer,
    StandardClaim::Expiration,
    StandardClaim::NotBefore,
    StandardClaim::IssuedAt,
    StandardClaim::JwtId,
];

/// Encodes, decodes and refreshes tokens.
///
/// Owns the [`Factory`] used to issue refreshed payloads and shares the codec.
pub struct TokenManager {
    codec: Arc<dyn PayloadCodec>,
    factory: Factory,
}

impl TokenManager {
    /// Manager over a codec and factory
    pub fn new(codec: impl PayloadCodec + 'static, factory: Factory) -> Self {
        Self {
            codec: Arc::new(codec),
            factory,
        }
    }

    /// Factory used for refreshed payloads
    #[must_use]
    pub fn factory(&self) -> &Factory {
        &self.factory
    }

    /// Factory used for refreshed payloads, for reconfiguration
    pub fn factory_mut(&mut self) -> &mut Factory {
        &mut self.factory
    }

    /// Encode a payload into a token.
    ///
    /// # Errors
    /// Whatever the codec reports.
    pub fn encode(&self, payload: &Payload) -> ClaimsResult<String> {
        let token = self.codec.encode(&payload.to_map())?;
        tracing::debug!(alg = self.codec.alg(), claims = payload.count(), "token encoded");
        Ok(token)
    }

    /// Decode a token and rebuild its payload in normal flow.
    ///
    /// # Errors
    /// Codec errors, or any claim or payload validation error (including
    /// `ClaimsError::TokenExpired`).
    pub fn decode(&self, token: &str) -> ClaimsResult<Payload> {
        self.decode_with_flow(token, false)
    }

    /// Exchange a token, possibly expired but still within its refresh window,
    /// for a freshly issued one carrying the same subject, audience and
    /// custom claims.
    ///
    /// Claims staged on [`factory_mut`](Self::factory_mut) and its refresh-flow
    /// setting are left as they were.
    ///
    /// # Errors
    /// `ClaimsError::TokenExpired` once the refresh window has closed, plus
    /// everything [`decode`](Self::decode) and [`Factory::make`] can return.
    pub fn refresh(&mut self, token: &str) -> ClaimsResult<String> {
        let previous = self.decode_with_flow(token, true)?;

        let carried: Map<String, Value> = previous
            .iter()
            .filter(|(name, _)| {
                !REISSUED_CLAIMS
                    .iter()
                    .any(|reissued| reissued.as_str() == *name)
            })
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect();

        let payload = self.factory.make_detached(carried)?;
        tracing::debug!(
            previous_jti = previous.jwt_id().unwrap_or_default(),
            "token refreshed"
        );
        self.encode(&payload)
    }

    fn decode_with_flow(&self, token: &str, refresh_flow: bool) -> ClaimsResult<Payload> {
        let values = self.codec.decode(token)?;

        let mut validator = self.factory.validator().clone();
        validator
            .set_refresh_flow(refresh_flow)
            .set_expiration_required(
                self.factory.ttl().is_some()
                    || values.contains_key(StandardClaim::Expiration.as_str()),
            );

        let payload = Payload::from_values(values, self.factory.registry(), &validator)?;
        tracing::debug!(refresh_flow, claims = payload.count(), "token decoded");
        Ok(payload)
    }
}
