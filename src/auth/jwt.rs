// src/auth/jwt.rs
use crate::auth::{Claims, Role};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

const TOKEN_EXPIRY_DAYS: i64 = 7;
const MAX_TOKEN_LEN: usize = 2048;

/// Mint a signed admin token. The signing secret is process-wide
/// configuration validated at startup; issuance fails if signing does.
pub fn issue(secret: &str, subject: &str) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: subject.to_string(),
        role: Role::Admin,
        iat: now.timestamp() as usize,
        exp: (now + Duration::days(TOKEN_EXPIRY_DAYS)).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Validate a token and return its claims. Malformed, tampered, and
/// expired tokens all come back as None; callers treat every failure
/// uniformly as "no identity".
pub fn verify(secret: &str, token: &str) -> Option<Claims> {
    if token.is_empty() || token.len() > MAX_TOKEN_LEN {
        return None;
    }

    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.validate_exp = true;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .ok()
    .map(|data| data.claims)
}
