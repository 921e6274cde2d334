use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    Extension,
};
use serde::Deserialize;
use serde_json::json;

use crate::auth;
use crate::context::AppContext;
use crate::database::{conflict, constraints, repos::users};
use crate::error::ApiError;
use crate::middleware::AuthUser;

#[derive(Debug, Deserialize)]
pub struct AuthIn {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// POST /auth/register
pub async fn register(
    State(ctx): State<AppContext>,
    Json(body): Json<AuthIn>,
) -> Result<Response, ApiError> {
    let email = body.email.unwrap_or_default().trim().to_string();
    let password = body.password.unwrap_or_default();
    if password.is_empty() {
        return Err(ApiError::unprocessable_entity(
            "Missing data for required field.",
        ));
    }

    if let Err(reason) = auth::validate_email_format(&email) {
        return Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "code": "invalid_email_format", "error": reason })),
        )
            .into_response());
    }

    let email_normalized = auth::normalize_email(&email);
    let password_hash = auth::hash_password(&password).map_err(|err| {
        tracing::error!("password hashing failed: {}", err);
        ApiError::internal_server_error("An error occurred while processing your request")
    })?;

    match users::insert(&ctx.pool, &email, &email_normalized, &password_hash).await {
        Ok(_) => Ok((
            StatusCode::CREATED,
            Json(json!({ "message": "Registered!" })),
        )
            .into_response()),
        Err(err) if conflict::violates(&err, constraints::USERS_EMAIL_NORMALIZED_KEY) => Ok((
            StatusCode::CONFLICT,
            Json(json!({ "error": "Email already exists" })),
        )
            .into_response()),
        Err(err) => Err(ApiError::from(err)),
    }
}

/// POST /auth/login
pub async fn login(
    State(ctx): State<AppContext>,
    Json(body): Json<AuthIn>,
) -> Result<Response, ApiError> {
    let email = body.email.unwrap_or_default();
    let password = body.password.unwrap_or_default();

    let email_normalized = auth::normalize_email(&email);
    let user = users::find_by_normalized_email(&ctx.pool, &email_normalized).await?;

    let user = match user {
        Some(user) if auth::verify_password(&password, &user.password_hash) => user,
        _ => {
            return Ok((
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": "Invalid email or password. Check again or register."
                })),
            )
                .into_response())
        }
    };

    let access_token = issue(auth::issue_access_token(&ctx.config.security, user.id))?;
    let refresh_token = issue(auth::issue_refresh_token(&ctx.config.security, user.id))?;

    Ok(Json(json!({
        "access_token": access_token,
        "refresh_token": refresh_token,
    }))
    .into_response())
}

/// POST /auth/refresh - mint a fresh access token; the refresh-token
/// middleware has already identified the caller
pub async fn refresh(
    State(ctx): State<AppContext>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let access_token = issue(auth::issue_access_token(&ctx.config.security, user.user_id))?;
    Ok(Json(json!({ "access_token": access_token })))
}

fn issue(result: Result<String, auth::TokenError>) -> Result<String, ApiError> {
    result.map_err(|err| {
        tracing::error!("token issuance failed: {}", err);
        ApiError::internal_server_error("An error occurred while processing your request")
    })
}
