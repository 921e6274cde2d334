use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::auth::{self, Claims, TokenError};
use crate::context::AppContext;
use crate::error::ApiError;

/// Authenticated caller context extracted from a verified access token
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: i64,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
        }
    }
}

/// Guards catalog mutation routes: verifies the bearer access token and
/// injects the caller as an `AuthUser` extension.
pub async fn require_access_token(
    State(ctx): State<AppContext>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = authenticate(&ctx, request.headers(), auth::KIND_ACCESS)?;
    request.extensions_mut().insert(AuthUser::from(claims));
    Ok(next.run(request).await)
}

/// Guards the token-refresh route, which accepts only refresh tokens.
pub async fn require_refresh_token(
    State(ctx): State<AppContext>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = authenticate(&ctx, request.headers(), auth::KIND_REFRESH)?;
    request.extensions_mut().insert(AuthUser::from(claims));
    Ok(next.run(request).await)
}

fn authenticate(
    ctx: &AppContext,
    headers: &HeaderMap,
    expected_kind: &str,
) -> Result<Claims, ApiError> {
    let token = extract_bearer_token(headers)?;

    auth::verify_token(&ctx.config.security, &token, expected_kind).map_err(|err| match err {
        TokenError::Expired => {
            let message = if expected_kind == auth::KIND_REFRESH {
                "Refresh token expired. Please login again."
            } else {
                "Access token expired. Use your refresh token to get a new one."
            };
            ApiError::unauthorized("token_expired", message)
        }
        TokenError::Invalid => ApiError::unauthorized("invalid_token", "Invalid token provided."),
        TokenError::MissingSecret | TokenError::Generation(_) => {
            tracing::error!("token verification unavailable: {}", err);
            ApiError::internal_server_error("An error occurred while processing your request")
        }
    })
}

fn extract_bearer_token(headers: &HeaderMap) -> Result<String, ApiError> {
    let missing = || {
        ApiError::unauthorized(
            "authorization_required",
            "JWT needed for this operation. Login, if needed.",
        )
    };

    let auth_header = headers.get("authorization").ok_or_else(missing)?;
    let auth_str = auth_header
        .to_str()
        .map_err(|_| ApiError::unauthorized("invalid_token", "Invalid token provided."))?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.to_string()),
        Some(_) => Err(missing()),
        None => Err(ApiError::unauthorized(
            "invalid_token",
            "Invalid token provided.",
        )),
    }
}
