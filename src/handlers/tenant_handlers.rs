//! Tenant handlers
//!
//! Tenants are global; these handlers ignore the tenant scope of the
//! operation context.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::cqrs::{CommandHandler, QueryHandler};
use crate::domain::{ensure_positive_id, NewTenant, OperationContext, Tenant, TenantChanges};
use crate::error::{AppError, AppResult};
use crate::listing::{ColumnSet, ListRequest, Page, PageLimits};

use super::columns::tenant_columns;
use super::{
    CreateTenantCommand, DeleteTenantCommand, EntityId, GetTenantQuery, ListTenantsQuery,
    TenantColumnsQuery, UpdateTenantCommand,
};

const TENANT_SELECT: &str = "SELECT t.id, t.name, t.created_at, t.updated_at FROM tenants t";

/// Handles every tenant command and query
#[derive(Clone)]
pub struct TenantHandlers {
    pool: PgPool,
    limits: PageLimits,
}

impl TenantHandlers {
    pub fn new(pool: PgPool, limits: PageLimits) -> Self {
        Self { pool, limits }
    }

    async fn name_taken(&self, name: &str, exclude_id: i64) -> AppResult<bool> {
        let taken: Option<(i64,)> = sqlx::query_as("SELECT id FROM tenants WHERE name = $1 AND id <> $2")
            .bind(name)
            .bind(exclude_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(taken.is_some())
    }
}

// =========================================================================
// Commands
// =========================================================================

#[async_trait]
impl CommandHandler<CreateTenantCommand> for TenantHandlers {
    async fn handle(&self, command: CreateTenantCommand, ctx: &OperationContext) -> AppResult<EntityId> {
        let tenant = NewTenant::new(&command.name)?;

        if self.name_taken(&tenant.name, 0).await? {
            tracing::debug!(name = %tenant.name, "Tenant name taken");
            return Err(AppError::TenantExists(tenant.name));
        }

        let (id,): (i64,) = sqlx::query_as("INSERT INTO tenants (name) VALUES ($1) RETURNING id")
            .bind(&tenant.name)
            .fetch_one(&self.pool)
            .await?;

        tracing::info!(tenant_id = id, correlation_id = ?ctx.correlation_id, "Tenant created");
        Ok(id.into())
    }
}

#[async_trait]
impl CommandHandler<UpdateTenantCommand> for TenantHandlers {
    async fn handle(&self, command: UpdateTenantCommand, _ctx: &OperationContext) -> AppResult<EntityId> {
        let id = ensure_positive_id("Tenant", command.id)?;
        let changes = TenantChanges::new(command.name.as_deref())?;

        let current: Tenant = sqlx::query_as(&format!("{TENANT_SELECT} WHERE t.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::TenantNotFound(id))?;

        let Some(name) = changes.diff(&current).name else {
            return Ok(id.into());
        };

        if self.name_taken(&name, id).await? {
            return Err(AppError::TenantExists(name));
        }

        let mut qb = QueryBuilder::<Postgres>::new("UPDATE tenants SET updated_at = NOW(), name = ");
        qb.push_bind(name).push(" WHERE id = ").push_bind(id);
        qb.build().execute(&self.pool).await?;

        tracing::info!(tenant_id = id, "Tenant updated");
        Ok(id.into())
    }
}

#[async_trait]
impl CommandHandler<DeleteTenantCommand> for TenantHandlers {
    async fn handle(&self, command: DeleteTenantCommand, _ctx: &OperationContext) -> AppResult<EntityId> {
        let id = ensure_positive_id("Tenant", command.id)?;

        let mut tx = self.pool.begin().await?;

        let exists: Option<(i64,)> = sqlx::query_as("SELECT id FROM tenants WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(AppError::TenantNotFound(id));
        }

        let (owned,): (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (SELECT 1 FROM roles WHERE tenant_id = $1)
                OR EXISTS (SELECT 1 FROM users WHERE tenant_id = $1)
            "#,
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        if owned {
            tracing::debug!(tenant_id = id, "Tenant still owns rows");
            return Err(AppError::TenantInUse(id));
        }

        sqlx::query("DELETE FROM tenants WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!(tenant_id = id, "Tenant deleted");
        Ok(id.into())
    }
}

// =========================================================================
// Queries
// =========================================================================

#[async_trait]
impl QueryHandler<GetTenantQuery> for TenantHandlers {
    async fn handle(&self, query: GetTenantQuery, _ctx: &OperationContext) -> AppResult<Tenant> {
        let id = ensure_positive_id("Tenant", query.id)?;

        sqlx::query_as(&format!("{TENANT_SELECT} WHERE t.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::TenantNotFound(id))
    }
}

#[async_trait]
impl QueryHandler<ListTenantsQuery> for TenantHandlers {
    async fn handle(&self, query: ListTenantsQuery, _ctx: &OperationContext) -> AppResult<Page<Tenant>> {
        let request = ListRequest::from_params(&query.params, tenant_columns(), self.limits)?;

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM tenants t");
        request.push_where(&mut count, false);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new(TENANT_SELECT);
        request.push_where(&mut select, false);
        request.push_order_and_page(&mut select, "t.id");
        let tenants: Vec<Tenant> = select.build_query_as().fetch_all(&self.pool).await?;

        Ok(request.into_page(tenants, total))
    }
}

#[async_trait]
impl QueryHandler<TenantColumnsQuery> for TenantHandlers {
    async fn handle(&self, _query: TenantColumnsQuery, _ctx: &OperationContext) -> AppResult<ColumnSet> {
        Ok(tenant_columns())
    }
}
