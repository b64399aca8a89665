//! Session token verification.
//!
//! Tokens are HS256-signed JWTs issued by the SSO provider. Verification is a
//! pure function of the token and the shared secret: no clock reads beyond
//! expiry validation, no I/O, no state.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::Deserialize;
use thiserror::Error;

use super::principal::Principal;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing auth token")]
    MissingToken,
    #[error("invalid token signature or format")]
    InvalidToken,
    #[error("malformed claim: {0}")]
    MalformedClaim(&'static str),
}

/// The `uid` claim arrives as a JSON number from some token issuers and as a
/// numeric string from others. Model the shapes explicitly and reject anything
/// else rather than coercing silently.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum UidClaim {
    Num(i64),
    Text(String),
    Other(serde_json::Value),
}

#[derive(Debug, Deserialize)]
struct Claims {
    #[serde(default)]
    uid: Option<UidClaim>,
    #[serde(default)]
    email: Option<serde_json::Value>,
}

pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Provider tokens do not always carry `exp`; expiry is enforced when present.
        validation.required_spec_claims.clear();
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Verify a session token and extract the caller principal.
    pub fn verify(&self, token: Option<&str>) -> Result<Principal, AuthError> {
        let token = match token {
            Some(t) if !t.is_empty() => t,
            _ => return Err(AuthError::MissingToken),
        };
        let data = decode::<Claims>(token, &self.key, &self.validation)
            .map_err(|_| AuthError::InvalidToken)?;

        let id = match data.claims.uid {
            Some(UidClaim::Num(n)) => n,
            Some(UidClaim::Text(s)) => s.parse::<i64>().map_err(|_| AuthError::MalformedClaim("uid"))?,
            Some(UidClaim::Other(_)) | None => return Err(AuthError::MalformedClaim("uid")),
        };
        let email = match data.claims.email {
            Some(serde_json::Value::String(s)) => s,
            _ => return Err(AuthError::MalformedClaim("email")),
        };

        Ok(Principal { id, email })
    }
}
