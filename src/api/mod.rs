//! API module
//!
//! HTTP API endpoints and middleware.

pub mod extract;
pub mod middleware;
pub mod routes;

use std::sync::Arc;

use sqlx::PgPool;

use crate::cqrs::CqrsRegistry;

pub use routes::create_router;

/// Shared router state
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub registry: Arc<CqrsRegistry>,
}

impl AppState {
    pub fn new(pool: PgPool, registry: CqrsRegistry) -> Self {
        Self {
            pool,
            registry: Arc::new(registry),
        }
    }
}
