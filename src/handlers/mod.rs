//! Handlers module
//!
//! Command and query messages plus the PostgreSQL handlers behind them.
//! Handlers are grouped per resource; each group implements the handler
//! trait once per message it serves.

mod columns;
mod commands;
mod queries;
mod role_handlers;
mod tenant_handlers;
mod user_handlers;

pub use columns::{role_columns, tenant_columns, user_columns};
pub use commands::*;
pub use queries::*;
pub use role_handlers::RoleHandlers;
pub use tenant_handlers::TenantHandlers;
pub use user_handlers::UserHandlers;

use crate::domain::OperationContext;
use crate::error::{AppError, AppResult};

/// Header carrying the tenant of tenant scoped requests
pub const TENANT_HEADER: &str = "X-Tenant-Id";

/// Tenant of a tenant scoped operation
pub(crate) fn require_tenant(ctx: &OperationContext) -> AppResult<i64> {
    ctx.tenant_id()
        .ok_or_else(|| AppError::MissingHeader(TENANT_HEADER.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TenantScope;

    #[test]
    fn test_require_tenant() {
        let ctx = OperationContext::new().with_tenant(TenantScope::new(4));
        assert_eq!(require_tenant(&ctx).unwrap(), 4);

        let err = require_tenant(&OperationContext::new()).unwrap_err();
        assert!(matches!(err, AppError::MissingHeader(h) if h == TENANT_HEADER));
    }
}
