//! Token verification tests: heterogeneous uid claim encodings, signature and
//! format failures, and claim-shape rejection.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::json;

use curtail::identity::{AuthError, TokenVerifier};

const SECRET: &str = "test-secret";

fn token_for(claims: serde_json::Value) -> String {
    encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).expect("encode token")
}

fn verifier() -> TokenVerifier {
    TokenVerifier::new(SECRET)
}

#[test]
fn numeric_and_string_uid_resolve_to_same_principal() {
    let v = verifier();
    let as_number = token_for(json!({"uid": 42, "email": "a@b.com"}));
    let as_string = token_for(json!({"uid": "42", "email": "a@b.com"}));

    let p1 = v.verify(Some(&as_number)).expect("numeric uid");
    let p2 = v.verify(Some(&as_string)).expect("string uid");
    assert_eq!(p1, p2);
    assert_eq!(p1.id, 42);
    assert_eq!(p1.email, "a@b.com");
}

#[test]
fn missing_token_fails() {
    let v = verifier();
    assert_eq!(v.verify(None).unwrap_err(), AuthError::MissingToken);
    assert_eq!(v.verify(Some("")).unwrap_err(), AuthError::MissingToken);
}

#[test]
fn wrong_secret_rejected() {
    let token = encode(
        &Header::default(),
        &json!({"uid": 1, "email": "a@b.com"}),
        &EncodingKey::from_secret(b"other-secret"),
    )
    .expect("encode");
    assert_eq!(verifier().verify(Some(&token)).unwrap_err(), AuthError::InvalidToken);
}

#[test]
fn garbage_token_rejected() {
    assert_eq!(verifier().verify(Some("not-a-jwt")).unwrap_err(), AuthError::InvalidToken);
}

#[test]
fn tampered_payload_rejected() {
    let token = token_for(json!({"uid": 1, "email": "a@b.com"}));
    let parts: Vec<&str> = token.split('.').collect();
    let payload = URL_SAFE_NO_PAD.decode(parts[1]).expect("decode payload");
    let tampered_json = String::from_utf8(payload).expect("utf8").replace("\"uid\":1", "\"uid\":2");
    let tampered = format!("{}.{}.{}", parts[0], URL_SAFE_NO_PAD.encode(tampered_json), parts[2]);
    assert_eq!(verifier().verify(Some(&tampered)).unwrap_err(), AuthError::InvalidToken);
}

#[test]
fn uid_of_unexpected_shape_rejected() {
    let v = verifier();
    for claims in [
        json!({"uid": true, "email": "a@b.com"}),
        json!({"uid": [1], "email": "a@b.com"}),
        json!({"uid": {"n": 1}, "email": "a@b.com"}),
        json!({"uid": "forty-two", "email": "a@b.com"}),
        json!({"email": "a@b.com"}),
    ] {
        let token = token_for(claims);
        assert_eq!(v.verify(Some(&token)).unwrap_err(), AuthError::MalformedClaim("uid"));
    }
}

#[test]
fn email_claim_must_be_a_string() {
    let v = verifier();
    for claims in [
        json!({"uid": 1}),
        json!({"uid": 1, "email": 7}),
        json!({"uid": 1, "email": null}),
    ] {
        let token = token_for(claims);
        assert_eq!(v.verify(Some(&token)).unwrap_err(), AuthError::MalformedClaim("email"));
    }
}

#[test]
fn expired_token_rejected_but_exp_is_optional() {
    let v = verifier();
    let past = chrono::Utc::now().timestamp() - 3600;
    let expired = token_for(json!({"uid": 1, "email": "a@b.com", "exp": past}));
    assert_eq!(v.verify(Some(&expired)).unwrap_err(), AuthError::InvalidToken);

    // No exp claim at all is accepted.
    let eternal = token_for(json!({"uid": 1, "email": "a@b.com"}));
    assert!(v.verify(Some(&eternal)).is_ok());
}
