//! Operation Context
//!
//! Metadata about the current request, handed to every command and query handler.

use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use uuid::Uuid;

/// Tenant resolved from the `X-Tenant-Id` header for the current request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantScope {
    pub tenant_id: i64,
}

impl TenantScope {
    pub fn new(tenant_id: i64) -> Self {
        Self { tenant_id }
    }
}

/// Context for an operation, used for scoping and tracing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationContext {
    /// API key ID used for this request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_id: Option<Uuid>,

    /// Tenant the request operates on (tenant scoped routes only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant: Option<TenantScope>,

    /// Correlation ID for request tracing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<Uuid>,

    /// Client IP address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_ip: Option<IpAddr>,
}

impl OperationContext {
    /// Create a new empty context
    pub fn new() -> Self {
        Self {
            api_key_id: None,
            tenant: None,
            correlation_id: None,
            client_ip: None,
        }
    }

    /// Create context with API key
    pub fn with_api_key(mut self, api_key_id: Uuid) -> Self {
        self.api_key_id = Some(api_key_id);
        self
    }

    /// Create context bound to a tenant
    pub fn with_tenant(mut self, tenant: TenantScope) -> Self {
        self.tenant = Some(tenant);
        self
    }

    /// Create context with correlation ID
    pub fn with_correlation_id(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }

    /// Create context with client IP
    pub fn with_client_ip(mut self, ip: IpAddr) -> Self {
        self.client_ip = Some(ip);
        self
    }

    /// Tenant id of the request, or `None` for global operations
    pub fn tenant_id(&self) -> Option<i64> {
        self.tenant.map(|scope| scope.tenant_id)
    }
}

impl Default for OperationContext {
    fn default() -> Self {
        Self::new()
    }
}
