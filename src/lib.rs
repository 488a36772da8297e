//! tenant_admin Library
//!
//! Multi-tenant user management backend: tenants own roles, users hold one
//! role of their tenant. Writes and reads are dispatched through a CQRS
//! registry; list endpoints speak the admin table's filter, sort and paging
//! parameters.

pub mod api;
pub mod config;
pub mod cqrs;
pub mod db;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod listing;

use axum::{
    http::{HeaderName, HeaderValue, Method},
    middleware, Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use api::AppState;
pub use config::{Config, ConfigError};
pub use cqrs::CqrsRegistry;
pub use domain::{DomainError, OperationContext};
pub use error::{AppError, AppResult};

/// Initialize tracing/logging. JSON lines in production, human readable otherwise.
pub fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tenant_admin=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(filter);
    if config.is_production() {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn cors_layer(config: &Config) -> Result<CorsLayer, ConfigError> {
    let layer = match config.cors_allowed_origin.as_deref() {
        Some(origin) => {
            let origin = origin
                .parse::<HeaderValue>()
                .map_err(|_| ConfigError::InvalidValue("CORS_ALLOWED_ORIGIN"))?;
            CorsLayer::new()
                .allow_origin(origin)
                .allow_headers(Any)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
        }
        None if config.is_production() => CorsLayer::new(),
        None => CorsLayer::permissive(),
    };
    Ok(layer)
}

/// Build the application router
pub fn build_router(state: AppState, config: &Config) -> Result<Router, ConfigError> {
    let request_id_header = HeaderName::from_static(api::middleware::REQUEST_ID_HEADER);

    // Layers run outermost first: auth -> tenant (scoped routes) -> handler
    let protected_routes = api::create_router(state.clone())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::middleware::auth_middleware,
        ))
        .layer(middleware::from_fn(api::middleware::logging_middleware));

    let router = Router::new()
        .route("/health", axum::routing::get(health_check))
        .nest("/api/v1", protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(cors_layer(config)?)
        .with_state(state);

    Ok(router)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(environment: &str, origin: Option<&str>) -> Config {
        Config {
            database_url: "postgres://localhost/unused".to_string(),
            database_max_connections: 1,
            host: "127.0.0.1".to_string(),
            port: 3000,
            environment: environment.to_string(),
            cors_allowed_origin: origin.map(str::to_string),
            default_page_size: 10,
            max_page_size: 100,
        }
    }

    #[test]
    fn test_cors_layer_rejects_bad_origin() {
        assert!(cors_layer(&config("development", Some("https://admin.example.com"))).is_ok());
        assert!(cors_layer(&config("development", Some("bad\norigin"))).is_err());
        assert!(cors_layer(&config("production", None)).is_ok());
    }
}
