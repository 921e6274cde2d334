use axum::{middleware as axum_middleware, routing::get, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use catalog_api_rust::config::AppConfig;
use catalog_api_rust::context::AppContext;
use catalog_api_rust::database;
use catalog_api_rust::middleware::{require_access_token, require_refresh_token};

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET_KEY, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let config = AppConfig::from_env();
    tracing::info!("Starting Catalog API in {:?} mode", config.environment);

    let port = config.api.port;
    let ctx = AppContext::initialize(config)
        .await
        .unwrap_or_else(|e| panic!("failed to initialize application context: {}", e));

    let app = app(ctx);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    println!("🚀 Catalog API server listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}

fn app(ctx: AppContext) -> Router {
    let enable_cors = ctx.config.api.enable_cors;

    let mut router = Router::new()
        .merge(core_routes(ctx.clone()))
        .merge(category_routes(ctx.clone()))
        .merge(subcategory_routes(ctx.clone()))
        .merge(product_routes(ctx.clone()))
        .merge(auth_routes(ctx))
        .layer(TraceLayer::new_for_http());

    if enable_cors {
        router = router.layer(CorsLayer::permissive());
    }
    router
}

fn core_routes(ctx: AppContext) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .with_state(ctx)
}

fn category_routes(ctx: AppContext) -> Router {
    use axum::routing::{post, put};
    use catalog_api_rust::handlers::categories;

    let protected = Router::new()
        .route("/categories", post(categories::create))
        .route(
            "/categories/:id",
            put(categories::update).delete(categories::remove),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            ctx.clone(),
            require_access_token,
        ));

    let public = Router::new()
        .route("/categories", get(categories::list))
        .route("/categories/:id", get(categories::show))
        .route(
            "/categories/:id/subcategories",
            get(categories::subcategories_of),
        )
        .route("/categories/:id/products", get(categories::products_of));

    public.merge(protected).with_state(ctx)
}

fn subcategory_routes(ctx: AppContext) -> Router {
    use axum::routing::{post, put};
    use catalog_api_rust::handlers::subcategories;

    let protected = Router::new()
        .route("/subcategories", post(subcategories::create))
        .route(
            "/subcategories/:id",
            put(subcategories::update).delete(subcategories::remove),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            ctx.clone(),
            require_access_token,
        ));

    let public = Router::new()
        .route("/subcategories", get(subcategories::list))
        .route("/subcategories/:id", get(subcategories::show))
        .route(
            "/subcategories/:id/categories",
            get(subcategories::categories_of),
        )
        .route(
            "/subcategories/:id/products",
            get(subcategories::products_of),
        );

    public.merge(protected).with_state(ctx)
}

fn product_routes(ctx: AppContext) -> Router {
    use axum::routing::{post, put};
    use catalog_api_rust::handlers::products;

    let protected = Router::new()
        .route("/products", post(products::create))
        .route(
            "/products/:id",
            put(products::update).delete(products::remove),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            ctx.clone(),
            require_access_token,
        ));

    let public = Router::new()
        .route("/products", get(products::list))
        .route("/products/:id", get(products::show))
        .route(
            "/products/:id/subcategories",
            get(products::subcategories_of),
        );

    public.merge(protected).with_state(ctx)
}

fn auth_routes(ctx: AppContext) -> Router {
    use axum::routing::post;
    use catalog_api_rust::handlers::auth;

    let refresh = Router::new()
        .route("/auth/refresh", post(auth::refresh))
        .route_layer(axum_middleware::from_fn_with_state(
            ctx.clone(),
            require_refresh_token,
        ));

    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .merge(refresh)
        .with_state(ctx)
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "name": "Catalog API (Rust)",
        "version": version,
        "description": "E-commerce catalog REST API built with Rust (Axum)",
        "endpoints": {
            "categories": "/categories[/:id[/subcategories|/products]]",
            "subcategories": "/subcategories[/:id[/categories|/products]]",
            "products": "/products[/:id[/subcategories]]",
            "auth": "/auth/register, /auth/login, /auth/refresh",
            "health": "/health",
        }
    }))
}

async fn health(
    axum::extract::State(ctx): axum::extract::State<AppContext>,
) -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match database::health_check(&ctx.pool).await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "status": "degraded",
                "timestamp": now,
                "database_error": e.to_string()
            })),
        ),
    }
}
