//! Common test utilities

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tenant_admin::api::middleware::hash_api_key;
use tenant_admin::{build_router, db, AppState, Config, CqrsRegistry};
use tower::util::ServiceExt;

static DB_LOCK: tokio::sync::Mutex<()> = tokio::sync::Mutex::const_new(());

/// Serialize tests that truncate the shared database
pub async fn lock_db() -> tokio::sync::MutexGuard<'static, ()> {
    DB_LOCK.lock().await
}

pub const ADMIN_KEY: &str = "test_admin_key";
pub const READER_KEY: &str = "test_reader_key";

/// Connect to the test database, or `None` when it is not configured or unreachable
pub async fn maybe_pool() -> Option<PgPool> {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()?;

    PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .ok()
}

/// Migrate, truncate every table and seed the test API keys
pub async fn setup_test_db(pool: &PgPool) {
    db::run_migrations(pool).await.expect("migrations should run");

    sqlx::query("TRUNCATE TABLE api_keys, users, roles, tenants RESTART IDENTITY CASCADE")
        .execute(pool)
        .await
        .expect("Failed to clean up DB");

    seed_api_key(pool, ADMIN_KEY, &["admin"], None).await;
    seed_api_key(pool, READER_KEY, &["read:users", "read:roles"], None).await;
}

pub async fn seed_api_key(pool: &PgPool, key: &str, permissions: &[&str], tenant_id: Option<i64>) {
    let permissions: Vec<String> = permissions.iter().map(|p| p.to_string()).collect();
    sqlx::query(
        r#"
        INSERT INTO api_keys (id, name, key_hash, key_prefix, permissions, tenant_id)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(uuid::Uuid::new_v4())
    .bind(key)
    .bind(hash_api_key(key))
    .bind(&key[..8])
    .bind(permissions)
    .bind(tenant_id)
    .execute(pool)
    .await
    .expect("Failed to seed API key");
}

pub fn test_config() -> Config {
    Config {
        database_url: String::new(),
        database_max_connections: 5,
        host: "127.0.0.1".to_string(),
        port: 0,
        environment: "test".to_string(),
        cors_allowed_origin: None,
        default_page_size: 10,
        max_page_size: 100,
    }
}

pub fn app(pool: PgPool) -> Router {
    let config = test_config();
    let registry = CqrsRegistry::new(pool.clone(), config.page_limits());
    build_router(AppState::new(pool, registry), &config).expect("router should build")
}

/// Send one request and decode the JSON response (Null for empty bodies)
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    key: &str,
    tenant: Option<i64>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("X-API-Key", key);
    if let Some(tenant) = tenant {
        builder = builder.header("X-Tenant-Id", tenant.to_string());
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    send_request(app, request).await
}

pub async fn send_request(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}
