//! Tests for encoding, decoding and refreshing tokens through a codec

use cryypt_claims::*;
use serde_json::{json, Map};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

const NOW: i64 = 1_700_000_000;
const SECRET: &[u8] = b"a-very-secret-signing-key-for-tests";

#[derive(Debug)]
struct TestClock(AtomicI64);

impl TestClock {
    fn advance(&self, seconds: i64) {
        self.0.fetch_add(seconds, Ordering::SeqCst);
    }
}

impl Clock for TestClock {
    fn now(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

fn manager(clock: Arc<TestClock>) -> TokenManager {
    let validator = PayloadValidator::new().with_refresh_ttl(Some(3600));
    let factory = Factory::new(
        ClaimRegistry::new(),
        StaticIssuer::new("https://auth.example.com/login"),
        validator,
    )
    .with_clock(clock);
    TokenManager::new(Hs256Codec::new(SECRET).unwrap(), factory)
}

#[test]
fn test_encode_then_decode_restores_payload() {
    let clock = Arc::new(TestClock(AtomicI64::new(NOW)));
    let mut manager = manager(clock);

    let payload = manager
        .factory_mut()
        .with_subject(1)
        .claim("foo", json!({"bar": [0, 0, 0]}))
        .make()
        .unwrap();
    let token = manager.encode(&payload).unwrap();

    assert_eq!(token.split('.').count(), 3);
    let decoded = manager.decode(&token).unwrap();
    assert_eq!(decoded.to_map(), payload.to_map());
    assert_eq!(decoded.get("foo.bar").unwrap(), &json!([0, 0, 0]));
}

#[test]
fn test_decode_rejects_tampered_token() {
    let clock = Arc::new(TestClock(AtomicI64::new(NOW)));
    let mut manager = manager(clock);

    let payload = manager.factory_mut().with_subject(1).make().unwrap();
    let token = manager.encode(&payload).unwrap();

    let other = Hs256Codec::new(b"another-secret".to_vec()).unwrap();
    let mut forged = payload.to_map();
    forged.insert("sub".to_string(), json!(2));
    let forged_token = other.encode(&forged).unwrap();
    let signature = token.rsplit('.').next().unwrap();
    let body: Vec<&str> = forged_token.split('.').take(2).collect();
    let spliced = format!("{}.{}.{}", body[0], body[1], signature);

    assert_eq!(manager.decode(&spliced).unwrap_err(), ClaimsError::InvalidSignature);
    assert!(matches!(
        manager.decode("not-a-token"),
        Err(ClaimsError::InvalidToken(_))
    ));
}

#[test]
fn test_decode_rejects_expired_token() {
    let clock = Arc::new(TestClock(AtomicI64::new(NOW)));
    let mut manager = manager(clock.clone());

    let payload = manager.factory_mut().with_subject(1).make().unwrap();
    let token = manager.encode(&payload).unwrap();

    clock.advance(3601);
    assert!(matches!(
        manager.decode(&token),
        Err(ClaimsError::TokenExpired(_))
    ));
}

#[test]
fn test_refresh_within_window_issues_new_token() {
    let clock = Arc::new(TestClock(AtomicI64::new(NOW)));
    let mut manager = manager(clock.clone());

    let payload = manager
        .factory_mut()
        .with_subject(42)
        .claim("role", "admin")
        .make()
        .unwrap();
    let token = manager.encode(&payload).unwrap();

    clock.advance(3600 + 1800);
    let refreshed = manager.refresh(&token).unwrap();
    let fresh = manager.decode(&refreshed).unwrap();

    assert_eq!(fresh["sub"], json!(42));
    assert_eq!(fresh["role"], json!("admin"));
    assert_eq!(fresh.issued_at().unwrap(), NOW + 5400);
    assert_eq!(fresh.expiration().unwrap(), NOW + 5400 + 3600);
    assert_ne!(fresh.jwt_id().unwrap(), payload.jwt_id().unwrap());
}

#[test]
fn test_refresh_past_window_fails() {
    let clock = Arc::new(TestClock(AtomicI64::new(NOW)));
    let mut manager = manager(clock.clone());

    let payload = manager.factory_mut().with_subject(42).make().unwrap();
    let token = manager.encode(&payload).unwrap();

    clock.advance(3600 + 3601);
    match manager.refresh(&token) {
        Err(ClaimsError::TokenExpired(msg)) => assert!(msg.contains("refreshed")),
        other => panic!("expected refresh to be refused, got {other:?}"),
    }
}

#[test]
fn test_decoded_claims_are_revalidated() {
    let clock = Arc::new(TestClock(AtomicI64::new(NOW)));
    let manager = manager(clock);

    let codec = Hs256Codec::new(SECRET).unwrap();
    let mut claims = Map::new();
    claims.insert("iss".to_string(), json!("https://auth.example.com/login"));
    claims.insert("sub".to_string(), json!(1));
    claims.insert("exp".to_string(), json!("never"));
    let token = codec.encode(&claims).unwrap();

    assert!(matches!(
        manager.decode(&token),
        Err(ClaimsError::ClaimValidation { .. })
    ));
}

#[test]
fn test_codec_rejects_empty_secret_and_foreign_algorithm() {
    assert!(matches!(
        Hs256Codec::new(Vec::new()),
        Err(ClaimsError::InvalidKey(_))
    ));

    let codec = Hs256Codec::new(SECRET).unwrap().with_key_id("key-1");
    assert_eq!(codec.alg(), "HS256");
    assert!(!format!("{codec:?}").contains("secret-signing"));

    // {"alg":"none","typ":"JWT"}
    let unsigned = "eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0.e30.";
    assert!(matches!(
        codec.decode(unsigned),
        Err(ClaimsError::InvalidToken(_))
    ));
}

#[test]
fn test_far_future_expiration_decodes_and_refreshes() {
    let clock = Arc::new(TestClock(AtomicI64::new(NOW)));
    let mut manager = manager(clock);

    let codec = Hs256Codec::new(SECRET).unwrap();
    let mut claims = Map::new();
    claims.insert("iss".to_string(), json!("https://auth.example.com/login"));
    claims.insert("sub".to_string(), json!(7));
    claims.insert("exp".to_string(), json!(i64::MAX));
    claims.insert("nbf".to_string(), json!(NOW));
    claims.insert("iat".to_string(), json!(NOW));
    claims.insert("jti".to_string(), json!("long-lived"));
    let token = codec.encode(&claims).unwrap();

    let decoded = manager.decode(&token).unwrap();
    assert_eq!(decoded.expiration().unwrap(), i64::MAX);

    let refreshed = manager.refresh(&token).unwrap();
    let refreshed = manager.decode(&refreshed).unwrap();
    assert_eq!(refreshed["sub"], json!(7));
    assert_eq!(refreshed.expiration().unwrap(), NOW + 3600);
}

#[test]
fn test_refresh_leaves_staged_factory_state_alone() {
    let clock = Arc::new(TestClock(AtomicI64::new(NOW)));
    let mut manager = manager(clock.clone());

    let payload = manager
        .factory_mut()
        .with_subject(42)
        .claim("role", "admin")
        .make()
        .unwrap();
    let token = manager.encode(&payload).unwrap();

    manager
        .factory_mut()
        .set_refresh_flow(true)
        .with_subject(99)
        .claim("scope", "staged");
    clock.advance(3600 + 60);

    let refreshed = manager.refresh(&token).unwrap();
    let fresh = manager.decode(&refreshed).unwrap();
    assert_eq!(fresh["sub"], json!(42));
    assert!(!fresh.contains("scope"));

    let factory = manager.factory();
    assert!(factory.is_refresh_flow());
    assert_eq!(factory.custom_claims().get("sub"), Some(&json!(99)));
    assert_eq!(factory.custom_claims().get("scope"), Some(&json!("staged")));
}
