use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode, errors::ErrorKind};
use quiz_gate::{
    ClaimShape, CredentialDecodeFailure, Role, TokenDecoder,
    config::{AppConfig, Env},
};
use serde_json::json;

// --- Helper Functions ---

const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";

fn mint_with(secret: &str, claims: serde_json::Value) -> String {
    let key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), &claims, &key).unwrap()
}

fn mint(claims: serde_json::Value) -> String {
    mint_with(TEST_JWT_SECRET, claims)
}

fn exp_in(offset_secs: i64) -> i64 {
    Utc::now().timestamp() + offset_secs
}

// --- Tests ---

#[test]
fn test_decode_nested_identity_claim() {
    // The backend issues create_access_token(identity={'id': ..., 'role': ...}).
    let token = mint(json!({ "sub": { "id": 7, "role": "admin" }, "exp": exp_in(3600) }));

    let claim = TokenDecoder::new(TEST_JWT_SECRET).decode(&token).unwrap();

    assert_eq!(claim.role, "admin");
    assert_eq!(claim.known_role(), Some(Role::Admin));
    assert_eq!(claim.user_id, Some(7));
    assert!(claim.expires_at.is_some());
}

#[test]
fn test_decode_top_level_role_claim() {
    let token = mint(json!({ "sub": "42", "role": "user", "exp": exp_in(3600) }));

    let claim = TokenDecoder::new(TEST_JWT_SECRET).decode(&token).unwrap();

    assert_eq!(claim.known_role(), Some(Role::User));
    assert_eq!(claim.user_id, Some(42));
}

#[test]
fn test_either_shape_prefers_nested_role() {
    let token = mint(json!({
        "sub": { "id": 1, "role": "admin" },
        "role": "user",
        "exp": exp_in(3600),
    }));

    let claim = TokenDecoder::new(TEST_JWT_SECRET)
        .with_claim_shape(ClaimShape::Either)
        .decode(&token)
        .unwrap();
    assert_eq!(claim.role, "admin");

    let claim = TokenDecoder::new(TEST_JWT_SECRET)
        .with_claim_shape(ClaimShape::TopLevel)
        .decode(&token)
        .unwrap();
    assert_eq!(claim.role, "user");
}

#[test]
fn test_restricted_shapes_reject_the_other_layout() {
    let top_level = mint(json!({ "sub": "1", "role": "user", "exp": exp_in(3600) }));
    let nested = mint(json!({ "sub": { "id": 1, "role": "user" }, "exp": exp_in(3600) }));

    let nested_only = TokenDecoder::new(TEST_JWT_SECRET).with_claim_shape(ClaimShape::Nested);
    assert!(matches!(
        nested_only.decode(&top_level),
        Err(CredentialDecodeFailure::MissingRole)
    ));
    assert!(nested_only.decode(&nested).is_ok());

    let top_only = TokenDecoder::new(TEST_JWT_SECRET).with_claim_shape(ClaimShape::TopLevel);
    assert!(matches!(
        top_only.decode(&nested),
        Err(CredentialDecodeFailure::MissingRole)
    ));
    assert!(top_only.decode(&top_level).is_ok());
}

#[test]
fn test_decode_failure_on_wrong_secret() {
    let token = mint_with(
        "some-other-secret",
        json!({ "sub": { "role": "admin" }, "exp": exp_in(3600) }),
    );

    match TokenDecoder::new(TEST_JWT_SECRET).decode(&token) {
        Err(CredentialDecodeFailure::Token(e)) => {
            assert!(matches!(e.kind(), ErrorKind::InvalidSignature))
        }
        other => panic!("expected signature failure, got {:?}", other),
    }
}

#[test]
fn test_decode_failure_on_expired_token() {
    let token = mint(json!({ "sub": { "role": "user" }, "exp": exp_in(-3600) }));

    match TokenDecoder::new(TEST_JWT_SECRET).decode(&token) {
        Err(CredentialDecodeFailure::Token(e)) => {
            assert!(matches!(e.kind(), ErrorKind::ExpiredSignature))
        }
        other => panic!("expected expiry failure, got {:?}", other),
    }
}

#[test]
fn test_expiry_check_can_be_disabled() {
    let expired = mint(json!({ "sub": { "role": "user" }, "exp": exp_in(-3600) }));
    let no_exp = mint(json!({ "sub": { "role": "user" } }));

    let decoder = TokenDecoder::new(TEST_JWT_SECRET).with_expiry_check(false);
    assert!(decoder.decode(&expired).is_ok());
    assert!(decoder.decode(&no_exp).is_ok());

    // With the check on, a token without exp is rejected.
    assert!(TokenDecoder::new(TEST_JWT_SECRET).decode(&no_exp).is_err());
}

#[test]
fn test_leeway_accepts_recently_expired_token() {
    let token = mint(json!({ "sub": { "role": "user" }, "exp": exp_in(-30) }));

    assert!(TokenDecoder::new(TEST_JWT_SECRET).with_leeway(0).decode(&token).is_err());
    assert!(TokenDecoder::new(TEST_JWT_SECRET).with_leeway(120).decode(&token).is_ok());
}

#[test]
fn test_unverified_decoder_ignores_signature() {
    let token = mint_with(
        "whatever-the-backend-used",
        json!({ "sub": { "id": 3, "role": "user" }, "exp": exp_in(3600) }),
    );

    let decoder = TokenDecoder::unverified();
    assert!(!decoder.verifies_signature());

    let claim = decoder.decode(&token).unwrap();
    assert_eq!(claim.known_role(), Some(Role::User));
}

#[test]
fn test_unverified_decoder_still_rejects_malformed_input() {
    let decoder = TokenDecoder::unverified();
    assert!(decoder.decode("definitely.not.jwt").is_err());
    assert!(decoder.decode("").is_err());
}

#[test]
fn test_decoder_from_config() {
    let mut config = AppConfig::default();
    config.env = Env::Production;
    config.jwt_secret = Some(TEST_JWT_SECRET.to_string());
    config.claim_shape = ClaimShape::Nested;

    let decoder = TokenDecoder::from_config(&config);
    assert!(decoder.verifies_signature());
    assert_eq!(decoder.claim_shape(), ClaimShape::Nested);

    let local = TokenDecoder::from_config(&AppConfig::default());
    assert!(!local.verifies_signature());
    assert_eq!(local.claim_shape(), ClaimShape::Either);
}

#[test]
fn test_unknown_role_still_decodes() {
    let token = mint(json!({ "sub": { "role": "moderator" }, "exp": exp_in(3600) }));

    let claim = TokenDecoder::new(TEST_JWT_SECRET).decode(&token).unwrap();
    assert_eq!(claim.role, "moderator");
    assert_eq!(claim.known_role(), None);
}

#[test]
fn test_decode_flask_jwt_extended_access_token() {
    // Full payload of create_access_token(identity={'id': 5, 'role': 'admin'}).
    let now = Utc::now().timestamp();
    let claims = json!({
        "fresh": false,
        "iat": now,
        "jti": "0b6a3c1e-6f3c-4c8e-9f7d-5a1e2b3c4d5e",
        "type": "access",
        "sub": { "id": 5, "role": "admin" },
        "nbf": now,
        "exp": now + 900,
    });
    let token = mint(claims);

    let verified = TokenDecoder::new(TEST_JWT_SECRET).decode(&token).unwrap();
    assert_eq!(verified.known_role(), Some(Role::Admin));
    assert_eq!(verified.user_id, Some(5));
    assert_eq!(verified.expires_at.map(|at| at.timestamp()), Some(now + 900));

    let unverified = TokenDecoder::unverified().decode(&token).unwrap();
    assert_eq!(unverified, verified);
}

#[test]
fn test_decode_failure_on_tampered_payload() {
    let token = mint(json!({ "sub": { "id": 2, "role": "user" }, "exp": exp_in(3600) }));
    let forged = mint_with(
        "attacker-secret",
        json!({ "sub": { "id": 2, "role": "admin" }, "exp": exp_in(3600) }),
    );

    // Original header and signature around the forged payload.
    let original: Vec<&str> = token.split('.').collect();
    let forged_payload = forged.split('.').nth(1).unwrap();
    let spliced = format!("{}.{}.{}", original[0], forged_payload, original[2]);

    match TokenDecoder::new(TEST_JWT_SECRET).decode(&spliced) {
        Err(CredentialDecodeFailure::Token(e)) => {
            assert!(matches!(e.kind(), ErrorKind::InvalidSignature))
        }
        other => panic!("expected signature failure, got {:?}", other),
    }
}

#[test]
fn test_decode_failure_on_extra_segments() {
    let token = mint(json!({ "sub": { "role": "user" }, "exp": exp_in(3600) }));
    let padded = format!("{token}.extra");

    assert!(TokenDecoder::new(TEST_JWT_SECRET).decode(&padded).is_err());
    assert!(TokenDecoder::unverified().decode(&padded).is_err());
}
