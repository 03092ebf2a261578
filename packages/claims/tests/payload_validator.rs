//! Tests for cross-claim policy in normal and refresh flow

use cryypt_claims::*;
use indexmap::IndexMap;
use serde_json::{json, Value};
use std::sync::Arc;

const NOW: i64 = 1_700_000_000;

fn validator() -> PayloadValidator {
    PayloadValidator::new().with_clock(Arc::new(FixedClock(NOW)))
}

fn claims(values: &[(&str, Value)]) -> IndexMap<String, Claim> {
    values
        .iter()
        .map(|(name, value)| ((*name).to_string(), Claim::new(name, value.clone()).unwrap()))
        .collect()
}

fn complete(exp: i64, iat: i64) -> IndexMap<String, Claim> {
    claims(&[
        ("iss", json!("http://example.com")),
        ("sub", json!(1)),
        ("exp", json!(exp)),
        ("nbf", json!(iat)),
        ("iat", json!(iat)),
        ("jti", json!("foo")),
    ])
}

#[test]
fn test_valid_claims_pass() {
    assert!(validator().check(&complete(NOW + 3600, NOW)).is_ok());
}

#[test]
fn test_missing_required_claims_are_reported() {
    let set = claims(&[("sub", json!(1)), ("iat", json!(NOW))]);

    match validator().check(&set) {
        Err(ClaimsError::PayloadValidation(msg)) => {
            assert!(msg.contains("iss"));
            assert!(msg.contains("exp"));
            assert!(msg.contains("jti"));
            assert!(!msg.contains("sub"));
        }
        other => panic!("expected missing claims, got {other:?}"),
    }
}

#[test]
fn test_required_claims_are_configurable() {
    let validator = validator().with_required_claims([StandardClaim::Subject]);
    let set = claims(&[("sub", json!(1))]);

    assert!(validator.check(&set).is_ok());
}

#[test]
fn test_expiration_requirement_can_be_lifted() {
    let mut set = complete(NOW + 3600, NOW);
    set.shift_remove("exp");

    let mut validator = validator();
    assert!(validator.check(&set).is_err());

    validator.set_expiration_required(false);
    assert!(validator.check(&set).is_ok());
}

#[test]
fn test_expired_token_fails_in_normal_flow() {
    let err = validator().check(&complete(NOW - 1, NOW - 3600)).unwrap_err();
    assert!(matches!(err, ClaimsError::TokenExpired(_)));
}

#[test]
fn test_zero_ttl_boundary_is_expired() {
    // exp == iat == now: not strictly in the future
    let err = validator().check(&complete(NOW, NOW)).unwrap_err();
    assert!(matches!(err, ClaimsError::TokenExpired(_)));

    assert!(validator().check(&complete(NOW + 1, NOW)).is_ok());
}

#[test]
fn test_leeway_tolerates_clock_skew() {
    let validator = validator().with_leeway(30);

    assert!(validator.check(&complete(NOW - 10, NOW - 3600)).is_ok());
    assert!(validator.check(&complete(NOW - 30, NOW - 3600)).is_err());
}

#[test]
fn test_timestamps_at_range_edge_do_not_overflow() {
    let validator = validator().with_leeway(30);
    assert!(validator.check(&complete(i64::MAX, NOW)).is_ok());

    let mut refresh = validator.clone().with_refresh_ttl(Some(i64::MAX));
    refresh.set_refresh_flow(true);
    assert!(refresh.check(&complete(i64::MAX, NOW)).is_ok());
    assert!(refresh.check(&complete(NOW - 1, NOW - 3600)).is_ok());

    let far_future = PayloadValidator::new()
        .with_clock(Arc::new(FixedClock(i64::MAX)))
        .with_leeway(30);
    assert!(far_future.check(&complete(i64::MAX, NOW)).is_err());
}

#[test]
fn test_issued_at_in_future_is_rejected() {
    let err = validator().check(&complete(NOW + 7200, NOW + 60)).unwrap_err();
    match err {
        ClaimsError::PayloadValidation(msg) => assert!(msg.contains("iat")),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_not_before_in_future_is_rejected() {
    let mut set = complete(NOW + 3600, NOW);
    set.insert("nbf".to_string(), Claim::new("nbf", NOW + 60).unwrap());

    let err = validator().check(&set).unwrap_err();
    match err {
        ClaimsError::PayloadValidation(msg) => assert!(msg.contains("nbf")),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_expiration_must_follow_issued_at() {
    let set = claims(&[
        ("iss", json!("http://example.com")),
        ("sub", json!(1)),
        ("exp", json!(NOW + 10)),
        ("nbf", json!(NOW)),
        ("iat", json!(NOW)),
        ("jti", json!("foo")),
    ]);
    assert!(validator().check(&set).is_ok());

    let mut refresh = validator();
    refresh.set_refresh_flow(true);
    let err = refresh.check(&complete(NOW - 100, NOW - 50)).unwrap_err();
    assert!(matches!(err, ClaimsError::PayloadValidation(_)));
}

#[test]
fn test_refresh_flow_accepts_expired_token_within_window() {
    let mut validator = validator().with_refresh_ttl(Some(600));
    validator.set_refresh_flow(true);
    assert!(validator.is_refresh_flow());

    // expired 10 minutes ago, window is exactly 10 minutes
    assert!(validator.check(&complete(NOW - 600, NOW - 4200)).is_ok());
    // still fresh tokens are fine too
    assert!(validator.check(&complete(NOW + 600, NOW)).is_ok());
}

#[test]
fn test_refresh_flow_rejects_token_past_window() {
    let mut validator = validator().with_refresh_ttl(Some(600));
    validator.set_refresh_flow(true);

    match validator.check(&complete(NOW - 601, NOW - 4201)) {
        Err(ClaimsError::TokenExpired(msg)) => assert!(msg.contains("refreshed")),
        other => panic!("expected refresh window to be closed, got {other:?}"),
    }
}

#[test]
fn test_unlimited_refresh_window() {
    let mut validator = validator().with_refresh_ttl(None);
    validator.set_refresh_flow(true);

    assert!(validator.check(&complete(1_000, 500)).is_ok());
}

#[test]
fn test_refresh_flow_toggle_is_stateful() {
    let mut validator = validator();
    let expired = complete(NOW - 60, NOW - 3660);

    validator.set_refresh_flow(true);
    assert!(validator.check(&expired).is_ok());

    validator.set_refresh_flow(false);
    assert!(validator.check(&expired).is_err());
}
