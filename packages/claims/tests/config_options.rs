//! Tests for claims configuration parsing

use cryypt_claims::*;

#[test]
fn test_defaults() {
    let config = ClaimsConfig::default();

    assert_eq!(config.ttl, Some(3600));
    assert_eq!(config.refresh_ttl, Some(1_209_600));
    assert_eq!(config.leeway, 0);
    assert_eq!(
        config.default_claims,
        vec![
            StandardClaim::Issuer,
            StandardClaim::IssuedAt,
            StandardClaim::Expiration,
            StandardClaim::NotBefore,
            StandardClaim::JwtId,
        ]
    );
    assert!(config.required_claims.contains(&StandardClaim::Subject));
}

#[test]
fn test_partial_json_overrides_defaults() {
    let config = ClaimsConfig::from_json(
        r#"{"ttl": null, "default_claims": ["iss", "iat"], "leeway": 10}"#,
    )
    .unwrap();

    assert_eq!(config.ttl, None);
    assert_eq!(
        config.default_claims,
        vec![StandardClaim::Issuer, StandardClaim::IssuedAt]
    );
    assert_eq!(config.leeway, 10);
    assert_eq!(config.refresh_ttl, ClaimsConfig::default().refresh_ttl);
}

#[test]
fn test_invalid_json_is_rejected() {
    assert!(matches!(
        ClaimsConfig::from_json(r#"{"default_claims": ["foo"]}"#),
        Err(ClaimsError::Serialization(_))
    ));
    assert!(matches!(
        ClaimsConfig::from_json(r#"{"ttl": -5}"#),
        Err(ClaimsError::UnsupportedOperation(_))
    ));
}

#[test]
fn test_config_serializes_claim_names() {
    let json = serde_json::to_string(&ClaimsConfig::default()).unwrap();

    assert!(json.contains(r#""default_claims":["iss","iat","exp","nbf","jti"]"#));
}
