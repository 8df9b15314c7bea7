use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use crate::{error::AppError, model::role::Role, models::Claims};

fn now() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as usize)
        .unwrap_or_default()
}

/// Issues a session token valid for `ttl_hours`.
pub fn generate_token(
    user_id: u64,
    username: String,
    role: Role,
    secret: &str,
    ttl_hours: u64,
) -> Result<String, AppError> {
    let issued_at = now();
    let claims = Claims {
        user_id,
        sub: username,
        role,
        exp: issued_at + (ttl_hours as usize) * 3600,
        iat: issued_at,
        jti: Uuid::new_v4().to_string(),
    };

    encode_claims(&claims, secret)
}

pub fn encode_claims(claims: &Claims, secret: &str) -> Result<String, AppError> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("token encoding failed: {e}")))
}

/// Checks signature and expiry.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}
