use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::HeaderMap;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

/// Cookie the identity provider sets after sign-in.
pub const SESSION_COOKIE: &str = "__session";

// clock skew tolerance when validating exp/iat
const VALIDATION_LEEWAY_SECS: u64 = 30;

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Verification-side keys for the external identity provider. The
/// publishable key is only ever echoed to the client; the secret key
/// verifies session tokens.
#[derive(Clone)]
pub struct AuthKeys {
    pub publishable_key: Option<String>,
    decoding: DecodingKey,
}

impl AuthKeys {
    pub fn new(secret_key: &str, publishable_key: Option<String>) -> Self {
        Self {
            publishable_key,
            decoding: DecodingKey::from_secret(secret_key.as_bytes()),
        }
    }

    /// Verify a session token; yields the user id (`sub`) or nothing.
    pub fn verify(&self, token: &str) -> Option<String> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = VALIDATION_LEEWAY_SECS;
        decode::<SessionClaims>(token, &self.decoding, &validation)
            .ok()
            .map(|data| data.claims.sub)
    }
}

/// Derive the per-request auth context: a nullable user id. Recomputed on
/// every request, never stored. The token is taken from the Authorization
/// header first, then the session cookie.
pub fn authenticate(keys: &AuthKeys, headers: &HeaderMap) -> Option<String> {
    bearer_token(headers)
        .or_else(|| cookie_token(headers))
        .and_then(|token| keys.verify(&token))
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    value
        .strip_prefix("Bearer ")
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

fn cookie_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(COOKIE)?.to_str().ok()?;
    value.split(';').find_map(|pair| {
        let (name, token) = pair.trim().split_once('=')?;
        if name == SESSION_COOKIE && !token.is_empty() {
            Some(token.to_string())
        } else {
            None
        }
    })
}
