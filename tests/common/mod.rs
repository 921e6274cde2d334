#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};
use tokio::sync::OnceCell;

pub const JWT_TEST_SECRET: &str = "catalog-integration-test-secret";

static SERVER: OnceLock<TestServer> = OnceLock::new();
static SCHEMA_READY: OnceCell<()> = OnceCell::const_new();

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub jwt_secret: String,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);
        let jwt_secret =
            std::env::var("JWT_SECRET_KEY").unwrap_or_else(|_| JWT_TEST_SECRET.to_string());

        // Spawn the already-built binary to keep start fast during tests
        let mut cmd = Command::new("target/debug/catalog-api-rust");
        cmd.env("CATALOG_API_PORT", port.to_string())
            .env("APP_ENV", "testing")
            .env("JWT_SECRET_KEY", &jwt_secret)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        // Inherit the rest of the environment so the server sees DATABASE_URL
        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self {
            port,
            base_url,
            jwt_secret,
            child,
        })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK
                    || resp.status() == StatusCode::SERVICE_UNAVAILABLE
                {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!(
            "server did not become ready on {} within {:?}",
            self.base_url,
            timeout
        )
    }
}

/// Shared server for the test binary, or `None` when no database is
/// configured (the suites are no-ops without one).
pub async fn server_or_skip() -> Result<Option<&'static TestServer>> {
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("skipping integration test: DATABASE_URL not set");
        return Ok(None);
    }

    SCHEMA_READY
        .get_or_try_init(|| async {
            let config = catalog_api_rust::config::AppConfig::from_env();
            let pool = catalog_api_rust::database::connect(&config).await?;
            catalog_api_rust::database::apply_schema(&pool).await?;
            Ok::<_, anyhow::Error>(())
        })
        .await?;

    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(Some(server))
}

/// Unique name so suites can run against a shared database repeatedly.
pub fn unique(prefix: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before epoch")
        .as_nanos();
    format!("{}-{}", prefix, nanos)
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

/// Register a fresh user and return a valid access token.
pub async fn access_token(server: &TestServer) -> Result<String> {
    let client = reqwest::Client::new();
    let email = format!("{}@example.com", unique("user"));
    let credentials = json!({ "email": email, "password": "correct horse battery" });

    let res = client
        .post(format!("{}/auth/register", server.base_url))
        .json(&credentials)
        .send()
        .await?;
    anyhow::ensure!(
        res.status() == StatusCode::CREATED,
        "register failed: {}",
        res.status()
    );

    let res = client
        .post(format!("{}/auth/login", server.base_url))
        .json(&credentials)
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::OK, "login failed: {}", res.status());

    let body: Value = res.json().await?;
    Ok(body["access_token"]
        .as_str()
        .context("login response missing access_token")?
        .to_string())
}

pub async fn create_category(
    server: &TestServer,
    token: &str,
    name: &str,
    subcategories: &[i64],
) -> Result<reqwest::Response> {
    let mut body = json!({ "name": name });
    if !subcategories.is_empty() {
        body["subcategories"] = json!(subcategories);
    }
    Ok(reqwest::Client::new()
        .post(format!("{}/categories", server.base_url))
        .header("authorization", bearer(token))
        .json(&body)
        .send()
        .await?)
}

pub async fn create_subcategory(
    server: &TestServer,
    token: &str,
    name: &str,
    categories: &[i64],
    products: &[i64],
) -> Result<reqwest::Response> {
    let mut body = json!({ "name": name });
    if !categories.is_empty() {
        body["categories"] = json!(categories);
    }
    if !products.is_empty() {
        body["products"] = json!(products);
    }
    Ok(reqwest::Client::new()
        .post(format!("{}/subcategories", server.base_url))
        .header("authorization", bearer(token))
        .json(&body)
        .send()
        .await?)
}

pub async fn create_product(
    server: &TestServer,
    token: &str,
    name: &str,
    description: Option<&str>,
    subcategories: &[i64],
) -> Result<reqwest::Response> {
    let mut body = json!({ "name": name });
    if let Some(description) = description {
        body["description"] = json!(description);
    }
    if !subcategories.is_empty() {
        body["subcategories"] = json!(subcategories);
    }
    Ok(reqwest::Client::new()
        .post(format!("{}/products", server.base_url))
        .header("authorization", bearer(token))
        .json(&body)
        .send()
        .await?)
}

/// Mint a token signed with the server's secret but already expired,
/// mirroring the expired-token fixtures of the original test suite.
pub fn expired_access_token(server: &TestServer) -> String {
    let now = unix_timestamp();
    let claims = catalog_api_rust::auth::Claims {
        sub: 1,
        kind: catalog_api_rust::auth::KIND_ACCESS.to_string(),
        iat: now - 7_200,
        exp: now - 3_600,
    };
    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(server.jwt_secret.as_bytes()),
    )
    .expect("token encoding")
}

fn unix_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before epoch")
        .as_secs() as i64
}

pub fn assert_token_error(status: StatusCode, body: &Value, expected_code: &str) {
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], expected_code, "body: {body}");
    assert!(body["error"].is_string());
}
