//! Role handlers

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::cqrs::{CommandHandler, QueryHandler};
use crate::domain::{ensure_positive_id, NewRole, OperationContext, Role, RoleChanges};
use crate::error::{AppError, AppResult};
use crate::listing::{ColumnSet, ListRequest, Page, PageLimits};

use super::columns::role_columns;
use super::{
    require_tenant, CreateRoleCommand, DeleteRoleCommand, EntityId, GetRoleQuery, ListRolesQuery,
    RoleColumnsQuery, UpdateRoleCommand,
};

const ROLE_SELECT: &str = "SELECT r.id, r.tenant_id, r.name, r.created_at, r.updated_at FROM roles r";

/// Handles every role command and query
#[derive(Clone)]
pub struct RoleHandlers {
    pool: PgPool,
    limits: PageLimits,
}

impl RoleHandlers {
    pub fn new(pool: PgPool, limits: PageLimits) -> Self {
        Self { pool, limits }
    }

    async fn name_taken(&self, tenant_id: i64, name: &str, exclude_id: i64) -> AppResult<bool> {
        let taken: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM roles WHERE tenant_id = $1 AND name = $2 AND id <> $3")
                .bind(tenant_id)
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
impl CommandHandler<CreateRoleCommand> for RoleHandlers {
    async fn handle(&self, command: CreateRoleCommand, ctx: &OperationContext) -> AppResult<EntityId> {
        let tenant_id = require_tenant(ctx)?;
        let role = NewRole::new(tenant_id, &command.name)?;

        if self.name_taken(tenant_id, &role.name, 0).await? {
            tracing::debug!(tenant_id, name = %role.name, "Role name taken");
            return Err(AppError::RoleExists(role.name));
        }

        let (id,): (i64,) =
            sqlx::query_as("INSERT INTO roles (tenant_id, name) VALUES ($1, $2) RETURNING id")
                .bind(role.tenant_id)
                .bind(&role.name)
                .fetch_one(&self.pool)
                .await?;

        tracing::info!(role_id = id, tenant_id, "Role created");
        Ok(id.into())
    }
}

#[async_trait]
impl CommandHandler<UpdateRoleCommand> for RoleHandlers {
    async fn handle(&self, command: UpdateRoleCommand, ctx: &OperationContext) -> AppResult<EntityId> {
        let tenant_id = require_tenant(ctx)?;
        let id = ensure_positive_id("Role", command.id)?;
        let changes = RoleChanges::new(command.name.as_deref())?;

        let current: Role = sqlx::query_as(&format!(
            "{ROLE_SELECT} WHERE r.id = $1 AND r.tenant_id = $2"
        ))
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::RoleNotFound(id))?;

        let changes = changes.diff(&current);
        let Some(name) = changes.name else {
            return Ok(id.into());
        };

        if self.name_taken(tenant_id, &name, id).await? {
            return Err(AppError::RoleExists(name));
        }

        let mut qb = QueryBuilder::<Postgres>::new("UPDATE roles SET updated_at = NOW(), name = ");
        qb.push_bind(name)
            .push(" WHERE id = ")
            .push_bind(id)
            .push(" AND tenant_id = ")
            .push_bind(tenant_id);
        qb.build().execute(&self.pool).await?;

        tracing::info!(role_id = id, tenant_id, "Role updated");
        Ok(id.into())
    }
}

#[async_trait]
impl CommandHandler<DeleteRoleCommand> for RoleHandlers {
    async fn handle(&self, command: DeleteRoleCommand, ctx: &OperationContext) -> AppResult<EntityId> {
        let tenant_id = require_tenant(ctx)?;
        let id = ensure_positive_id("Role", command.id)?;

        let mut tx = self.pool.begin().await?;

        let exists: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM roles WHERE id = $1 AND tenant_id = $2 FOR UPDATE")
                .bind(id)
                .bind(tenant_id)
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            return Err(AppError::RoleNotFound(id));
        }

        let (holders,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE role_id = $1")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        if holders > 0 {
            tracing::debug!(role_id = id, holders, "Role still assigned");
            return Err(AppError::RoleInUse(id));
        }

        sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!(role_id = id, tenant_id, "Role deleted");
        Ok(id.into())
    }
}

// =========================================================================
// Queries
// =========================================================================

#[async_trait]
impl QueryHandler<GetRoleQuery> for RoleHandlers {
    async fn handle(&self, query: GetRoleQuery, ctx: &OperationContext) -> AppResult<Role> {
        let tenant_id = require_tenant(ctx)?;
        let id = ensure_positive_id("Role", query.id)?;

        sqlx::query_as(&format!("{ROLE_SELECT} WHERE r.id = $1 AND r.tenant_id = $2"))
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::RoleNotFound(id))
    }
}

#[async_trait]
impl QueryHandler<ListRolesQuery> for RoleHandlers {
    async fn handle(&self, query: ListRolesQuery, ctx: &OperationContext) -> AppResult<Page<Role>> {
        let tenant_id = require_tenant(ctx)?;
        let request = ListRequest::from_params(&query.params, role_columns(), self.limits)?;

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM roles r WHERE r.tenant_id = ");
        count.push_bind(tenant_id);
        request.push_where(&mut count, true);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new(ROLE_SELECT);
        select.push(" WHERE r.tenant_id = ").push_bind(tenant_id);
        request.push_where(&mut select, true);
        request.push_order_and_page(&mut select, "r.id");
        let roles: Vec<Role> = select.build_query_as().fetch_all(&self.pool).await?;

        Ok(request.into_page(roles, total))
    }
}

#[async_trait]
impl QueryHandler<RoleColumnsQuery> for RoleHandlers {
    async fn handle(&self, _query: RoleColumnsQuery, _ctx: &OperationContext) -> AppResult<ColumnSet> {
        Ok(role_columns())
    }
}
