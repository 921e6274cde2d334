use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SecurityConfig;

pub const KIND_ACCESS: &str = "access";
pub const KIND_REFRESH: &str = "refresh";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id the token was issued to.
    pub sub: i64,
    /// Token kind: access tokens authorize catalog mutations, refresh
    /// tokens only mint new access tokens.
    pub kind: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("JWT secret not configured")]
    MissingSecret,

    #[error("token generation failed: {0}")]
    Generation(String),

    #[error("token expired")]
    Expired,

    #[error("token invalid")]
    Invalid,
}

pub fn issue_access_token(security: &SecurityConfig, user_id: i64) -> Result<String, TokenError> {
    issue(
        security,
        user_id,
        KIND_ACCESS,
        Duration::hours(security.access_token_expiry_hours),
    )
}

pub fn issue_refresh_token(security: &SecurityConfig, user_id: i64) -> Result<String, TokenError> {
    issue(
        security,
        user_id,
        KIND_REFRESH,
        Duration::days(security.refresh_token_expiry_days),
    )
}

fn issue(
    security: &SecurityConfig,
    user_id: i64,
    kind: &str,
    lifetime: Duration,
) -> Result<String, TokenError> {
    if security.jwt_secret.is_empty() {
        return Err(TokenError::MissingSecret);
    }

    let now = Utc::now();
    let claims = Claims {
        sub: user_id,
        kind: kind.to_string(),
        iat: now.timestamp(),
        exp: (now + lifetime).timestamp(),
    };

    let encoding_key = EncodingKey::from_secret(security.jwt_secret.as_bytes());
    encode(&Header::default(), &claims, &encoding_key)
        .map_err(|e| TokenError::Generation(e.to_string()))
}

/// Validate signature and expiry, then check the token is of the expected
/// kind. A structurally valid token of the wrong kind is invalid, not
/// expired.
pub fn verify_token(
    security: &SecurityConfig,
    token: &str,
    expected_kind: &str,
) -> Result<Claims, TokenError> {
    if security.jwt_secret.is_empty() {
        return Err(TokenError::MissingSecret);
    }

    let decoding_key = DecodingKey::from_secret(security.jwt_secret.as_bytes());
    let token_data =
        decode::<Claims>(token, &decoding_key, &Validation::default()).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            }
        })?;

    if token_data.claims.kind != expected_kind {
        return Err(TokenError::Invalid);
    }
    Ok(token_data.claims)
}

pub fn hash_password(password: &str) -> Result<String, TokenError> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|e| TokenError::Generation(e.to_string()))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

/// Canonical form for the email uniqueness column.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Basic structural email validation: one `@`, non-empty local part, and a
/// dotted domain.
pub fn validate_email_format(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email cannot be empty".to_string());
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err("Invalid email format".to_string());
    }
    if !parts[1].contains('.') {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}
