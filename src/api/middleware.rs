//! API Middleware
//!
//! API key authentication, tenant resolution and request logging.

use std::net::IpAddr;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::domain::{OperationContext, TenantScope};
use crate::error::{AppError, AppResult};
use crate::handlers::TENANT_HEADER;

use super::AppState;

pub const API_KEY_HEADER: &str = "X-API-Key";
pub const CORRELATION_HEADER: &str = "X-Correlation-Id";
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Permission names stored on API keys
pub mod permissions {
    pub const ADMIN: &str = "admin";
    pub const READ_USERS: &str = "read:users";
    pub const WRITE_USERS: &str = "write:users";
    pub const READ_ROLES: &str = "read:roles";
    pub const WRITE_ROLES: &str = "write:roles";
    pub const MANAGE_TENANTS: &str = "manage:tenants";
}

/// API Key authentication result
#[derive(Debug, Clone)]
pub struct AuthenticatedApiKey {
    pub id: Uuid,
    pub name: String,
    pub permissions: Vec<String>,
    /// Tenant the key is restricted to, `None` for all tenants
    pub tenant_id: Option<i64>,
}

impl AuthenticatedApiKey {
    /// Check if this API key has a specific permission
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions
            .iter()
            .any(|p| p == permission || p == permissions::ADMIN)
    }

    pub fn require(&self, permission: &str) -> AppResult<()> {
        if self.has_permission(permission) {
            Ok(())
        } else {
            tracing::debug!(api_key = %self.name, permission, "Permission denied");
            Err(AppError::Forbidden(format!("missing permission {permission}")))
        }
    }

    /// Whether the key may act on `tenant_id`
    pub fn allows_tenant(&self, tenant_id: i64) -> bool {
        self.tenant_id.map_or(true, |bound| bound == tenant_id)
    }

    pub fn require_tenant(&self, tenant_id: i64) -> AppResult<()> {
        if self.allows_tenant(tenant_id) {
            Ok(())
        } else {
            tracing::debug!(api_key = %self.name, tenant_id, "API key bound to another tenant");
            Err(AppError::Forbidden(format!(
                "API key may not access tenant {tenant_id}"
            )))
        }
    }

    /// Operations spanning every tenant need an unbound key
    pub fn require_unbound(&self) -> AppResult<()> {
        match self.tenant_id {
            None => Ok(()),
            Some(bound) => {
                tracing::debug!(api_key = %self.name, bound, "Bound API key on a cross-tenant route");
                Err(AppError::Forbidden(
                    "API key is bound to a single tenant".to_string(),
                ))
            }
        }
    }
}

/// SHA-256 hex digest stored in `api_keys.key_hash`
pub fn hash_api_key(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// First address of `X-Forwarded-For`, if any
fn client_ip(headers: &HeaderMap) -> Option<IpAddr> {
    header_str(headers, "x-forwarded-for")?
        .split(',')
        .next()
        .and_then(|ip| ip.trim().parse().ok())
}

// =========================================================================
// API Key Authentication Middleware
// =========================================================================

/// Extract and validate API key from X-API-Key header
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> AppResult<Response> {
    let headers = request.headers();
    let api_key = header_str(headers, API_KEY_HEADER)
        .ok_or(AppError::MissingApiKey)?
        .to_string();
    let correlation_id = header_str(headers, CORRELATION_HEADER)
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(Uuid::new_v4);
    let ip = client_ip(headers);

    let record: Option<(Uuid, String, Vec<String>, Option<i64>, bool)> = sqlx::query_as(
        r#"
        SELECT id, name, permissions, tenant_id, is_active
        FROM api_keys
        WHERE key_hash = $1
        "#,
    )
    .bind(hash_api_key(&api_key))
    .fetch_optional(&state.pool)
    .await?;

    let (id, name, permissions, tenant_id, is_active) = record.ok_or(AppError::InvalidApiKey)?;
    if !is_active {
        tracing::debug!(api_key = %name, "Disabled API key used");
        return Err(AppError::ApiKeyDisabled);
    }

    if let Err(e) = sqlx::query("UPDATE api_keys SET last_used_at = NOW() WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await
    {
        tracing::warn!(error = %e, "Failed to record API key usage");
    }

    let mut context = OperationContext::new()
        .with_api_key(id)
        .with_correlation_id(correlation_id);
    if let Some(ip) = ip {
        context = context.with_client_ip(ip);
    }

    request.extensions_mut().insert(AuthenticatedApiKey {
        id,
        name,
        permissions,
        tenant_id,
    });
    request.extensions_mut().insert(context);

    Ok(next.run(request).await)
}

// =========================================================================
// Tenant Middleware
// =========================================================================

/// Parse the X-Tenant-Id header value
pub fn parse_tenant_id(value: Option<&str>) -> AppResult<i64> {
    let raw = value.ok_or_else(|| AppError::MissingHeader(TENANT_HEADER.to_string()))?;
    match raw.trim().parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(AppError::InvalidHeader(TENANT_HEADER.to_string())),
    }
}

/// Resolve the tenant of a tenant scoped request. Runs after `auth_middleware`.
pub async fn tenant_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> AppResult<Response> {
    let tenant_id = parse_tenant_id(header_str(request.headers(), TENANT_HEADER))?;

    let api_key = request
        .extensions()
        .get::<AuthenticatedApiKey>()
        .cloned()
        .ok_or_else(|| AppError::Internal("auth middleware must run first".to_string()))?;

    // Checked before existence: other tenants answer 403 whether or not they exist
    api_key.require_tenant(tenant_id)?;

    let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM tenants WHERE id = $1)")
        .bind(tenant_id)
        .fetch_one(&state.pool)
        .await?;
    if !exists {
        return Err(AppError::TenantNotFound(tenant_id));
    }

    let context = request
        .extensions()
        .get::<OperationContext>()
        .cloned()
        .unwrap_or_default()
        .with_tenant(TenantScope::new(tenant_id));
    request.extensions_mut().insert(context);

    Ok(next.run(request).await)
}

// =========================================================================
// mask_headers_for_logging
// =========================================================================

/// Headers that should be masked in logs
const SENSITIVE_HEADERS: &[&str] = &["x-api-key", "authorization", "cookie", "set-cookie"];

/// Mask sensitive headers for logging
pub fn mask_headers_for_logging(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let name_lower = name.as_str().to_lowercase();
            let masked_value = if SENSITIVE_HEADERS.contains(&name_lower.as_str()) {
                "[REDACTED]".to_string()
            } else {
                value.to_str().unwrap_or("[invalid utf8]").to_string()
            };
            (name.to_string(), masked_value)
        })
        .collect()
}

// =========================================================================
// Request Logging Middleware
// =========================================================================

/// Request logging middleware
pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let headers = mask_headers_for_logging(request.headers());

    // Set by the request id layer, which runs before this one
    let request_id = header_str(request.headers(), REQUEST_ID_HEADER).map(str::to_string);
    let correlation_id = header_str(request.headers(), CORRELATION_HEADER).map(str::to_string);

    let start = std::time::Instant::now();

    tracing::info!(
        method = %method,
        uri = %uri,
        request_id = ?request_id,
        correlation_id = ?correlation_id,
        headers = ?headers,
        "Incoming request"
    );

    let response = next.run(request).await;

    tracing::info!(
        method = %method,
        uri = %uri,
        status = %response.status(),
        duration_ms = %start.elapsed().as_millis(),
        request_id = ?request_id,
        "Request completed"
    );

    response
}
