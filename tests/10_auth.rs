mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let Some(server) = common::server_or_skip().await? else {
        return Ok(());
    };
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/health", server.base_url))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["database"], "ok");
    Ok(())
}

#[tokio::test]
async fn register_login_refresh_flow() -> Result<()> {
    let Some(server) = common::server_or_skip().await? else {
        return Ok(());
    };
    let client = reqwest::Client::new();
    let email = format!("{}@example.com", common::unique("flow"));
    let credentials = json!({ "email": email, "password": "a sufficiently long pass" });

    let res = client
        .post(format!("{}/auth/register", server.base_url))
        .json(&credentials)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(res.json::<Value>().await?["message"], "Registered!");

    let res = client
        .post(format!("{}/auth/login", server.base_url))
        .json(&credentials)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let tokens = res.json::<Value>().await?;
    assert!(tokens["access_token"].is_string());
    assert!(tokens["refresh_token"].is_string());

    // Refresh accepts only the refresh token
    let res = client
        .post(format!("{}/auth/refresh", server.base_url))
        .header(
            "authorization",
            common::bearer(tokens["refresh_token"].as_str().unwrap()),
        )
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.json::<Value>().await?["access_token"].is_string());

    // An access token on the refresh route is invalid, not expired
    let res = client
        .post(format!("{}/auth/refresh", server.base_url))
        .header(
            "authorization",
            common::bearer(tokens["access_token"].as_str().unwrap()),
        )
        .send()
        .await?;
    let status = res.status();
    common::assert_token_error(status, &res.json::<Value>().await?, "invalid_token");
    Ok(())
}

#[tokio::test]
async fn duplicate_email_registration_conflicts() -> Result<()> {
    let Some(server) = common::server_or_skip().await? else {
        return Ok(());
    };
    let client = reqwest::Client::new();
    let email = format!("{}@example.com", common::unique("dup"));

    let register = |email: String| {
        let client = client.clone();
        let url = format!("{}/auth/register", server.base_url);
        async move {
            client
                .post(url)
                .json(&json!({ "email": email, "password": "pw-123456" }))
                .send()
                .await
        }
    };

    assert_eq!(register(email.clone()).await?.status(), StatusCode::CREATED);

    // Aliased case folds to the same normalized email
    let res = register(email.to_uppercase()).await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(res.json::<Value>().await?["error"], "Email already exists");
    Ok(())
}

#[tokio::test]
async fn invalid_email_format_rejected() -> Result<()> {
    let Some(server) = common::server_or_skip().await? else {
        return Ok(());
    };
    let res = reqwest::Client::new()
        .post(format!("{}/auth/register", server.base_url))
        .json(&json!({ "email": "not-an-email", "password": "pw-123456" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(res.json::<Value>().await?["code"], "invalid_email_format");
    Ok(())
}

#[tokio::test]
async fn wrong_password_is_unauthorized() -> Result<()> {
    let Some(server) = common::server_or_skip().await? else {
        return Ok(());
    };
    let client = reqwest::Client::new();
    let email = format!("{}@example.com", common::unique("wrongpw"));

    let res = client
        .post(format!("{}/auth/register", server.base_url))
        .json(&json!({ "email": email, "password": "right-password" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client
        .post(format!("{}/auth/login", server.base_url))
        .json(&json!({ "email": email, "password": "wrong-password" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        res.json::<Value>().await?["error"],
        "Invalid email or password. Check again or register."
    );
    Ok(())
}

#[tokio::test]
async fn mutations_require_a_token() -> Result<()> {
    let Some(server) = common::server_or_skip().await? else {
        return Ok(());
    };
    let res = reqwest::Client::new()
        .post(format!("{}/categories", server.base_url))
        .json(&json!({ "name": common::unique("NoToken") }))
        .send()
        .await?;
    let status = res.status();
    common::assert_token_error(status, &res.json::<Value>().await?, "authorization_required");
    Ok(())
}

#[tokio::test]
async fn garbage_token_is_invalid() -> Result<()> {
    let Some(server) = common::server_or_skip().await? else {
        return Ok(());
    };
    let res = reqwest::Client::new()
        .post(format!("{}/categories", server.base_url))
        .header("authorization", common::bearer("invalid.token.format"))
        .json(&json!({ "name": common::unique("BadToken") }))
        .send()
        .await?;
    let status = res.status();
    common::assert_token_error(status, &res.json::<Value>().await?, "invalid_token");
    Ok(())
}

#[tokio::test]
async fn expired_token_reports_token_expired() -> Result<()> {
    let Some(server) = common::server_or_skip().await? else {
        return Ok(());
    };
    let token = common::expired_access_token(server);
    let res = reqwest::Client::new()
        .post(format!("{}/categories", server.base_url))
        .header("authorization", common::bearer(&token))
        .json(&json!({ "name": common::unique("Expired") }))
        .send()
        .await?;
    let status = res.status();
    common::assert_token_error(status, &res.json::<Value>().await?, "token_expired");
    Ok(())
}
