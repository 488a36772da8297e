//! User handlers
//!
//! Create, update, delete and read users of the tenant in the operation
//! context. Every statement is filtered by `tenant_id`; a user of another
//! tenant is reported as not found.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};

use crate::cqrs::{CommandHandler, QueryHandler};
use crate::domain::{ensure_positive_id, NewUser, OperationContext, User, UserChanges, UserView};
use crate::error::{AppError, AppResult};
use crate::listing::{ColumnSet, ListRequest, Page, PageLimits, SelectOption};

use super::columns::user_columns;
use super::{
    require_tenant, CreateUserCommand, DeleteUserCommand, EntityId, GetUserQuery, ListUsersQuery,
    UpdateUserCommand, UserColumnsQuery,
};

const USER_SELECT: &str = r#"
    SELECT u.id, u.tenant_id, u.role_id, r.name AS role_name,
           u.name, u.email, u.vsc_account, u.created_at, u.updated_at
    FROM users u
    JOIN roles r ON r.id = u.role_id
"#;

/// Handles every user command and query
#[derive(Clone)]
pub struct UserHandlers {
    pool: PgPool,
    limits: PageLimits,
}

impl UserHandlers {
    pub fn new(pool: PgPool, limits: PageLimits) -> Self {
        Self { pool, limits }
    }

    async fn fetch(&self, tenant_id: i64, id: i64) -> AppResult<User> {
        let sql = format!("{USER_SELECT} WHERE u.id = $1 AND u.tenant_id = $2");
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::UserNotFound(id))
    }

    /// User columns with the tenant's roles as options of the role filter
    async fn columns(&self, tenant_id: i64) -> AppResult<ColumnSet> {
        let roles: Vec<(i64, String)> =
            sqlx::query_as("SELECT id, name FROM roles WHERE tenant_id = $1 ORDER BY name")
                .bind(tenant_id)
                .fetch_all(&self.pool)
                .await?;

        let options = roles
            .into_iter()
            .map(|(id, name)| SelectOption {
                label: name,
                value: id.into(),
            })
            .collect();

        let mut columns = user_columns();
        columns.set_options("role_id", options)?;
        Ok(columns)
    }
}

async fn ensure_role_in_tenant(
    tx: &mut Transaction<'_, Postgres>,
    tenant_id: i64,
    role_id: i64,
) -> AppResult<()> {
    let found: Option<(i64,)> = sqlx::query_as("SELECT id FROM roles WHERE id = $1 AND tenant_id = $2")
        .bind(role_id)
        .bind(tenant_id)
        .fetch_optional(&mut **tx)
        .await?;

    found.map(|_| ()).ok_or(AppError::RoleNotFound(role_id))
}

/// Reject an email or VSC account already used by another user of the tenant
async fn ensure_unique(
    tx: &mut Transaction<'_, Postgres>,
    tenant_id: i64,
    email: Option<&str>,
    vsc_account: Option<&str>,
    exclude_id: Option<i64>,
) -> AppResult<()> {
    let exclude_id = exclude_id.unwrap_or(0);

    if let Some(email) = email {
        let taken: Option<(i64,)> = sqlx::query_as(
            "SELECT id FROM users WHERE tenant_id = $1 AND email = $2 AND id <> $3",
        )
        .bind(tenant_id)
        .bind(email)
        .bind(exclude_id)
        .fetch_optional(&mut **tx)
        .await?;

        if taken.is_some() {
            return Err(AppError::UserEmailExists(email.to_string()));
        }
    }

    if let Some(account) = vsc_account {
        let taken: Option<(i64,)> = sqlx::query_as(
            "SELECT id FROM users WHERE tenant_id = $1 AND vsc_account = $2 AND id <> $3",
        )
        .bind(tenant_id)
        .bind(account)
        .bind(exclude_id)
        .fetch_optional(&mut **tx)
        .await?;

        if taken.is_some() {
            return Err(AppError::UserVscAccountExists(account.to_string()));
        }
    }

    Ok(())
}

// =========================================================================
// Commands
// =========================================================================

#[async_trait]
impl CommandHandler<CreateUserCommand> for UserHandlers {
    async fn handle(&self, command: CreateUserCommand, ctx: &OperationContext) -> AppResult<EntityId> {
        let tenant_id = require_tenant(ctx)?;
        let user = NewUser::new(
            tenant_id,
            command.role_id,
            &command.name,
            &command.email,
            &command.vsc_account,
        )?;

        let mut tx = self.pool.begin().await?;

        ensure_role_in_tenant(&mut tx, tenant_id, user.role_id).await?;
        ensure_unique(
            &mut tx,
            tenant_id,
            Some(&user.email),
            Some(&user.vsc_account),
            None,
        )
        .await?;

        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO users (tenant_id, role_id, name, email, vsc_account)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(user.tenant_id)
        .bind(user.role_id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.vsc_account)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            user_id = id,
            tenant_id,
            correlation_id = ?ctx.correlation_id,
            "User created"
        );

        Ok(id.into())
    }
}

#[async_trait]
impl CommandHandler<UpdateUserCommand> for UserHandlers {
    async fn handle(&self, command: UpdateUserCommand, ctx: &OperationContext) -> AppResult<EntityId> {
        let tenant_id = require_tenant(ctx)?;
        let id = ensure_positive_id("User", command.id)?;
        let changes = UserChanges::new(
            command.name.as_deref(),
            command.email.as_deref(),
            command.vsc_account.as_deref(),
            command.role_id,
        )?;

        let mut tx = self.pool.begin().await?;

        let sql = format!("{USER_SELECT} WHERE u.id = $1 AND u.tenant_id = $2 FOR UPDATE OF u");
        let current = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(AppError::UserNotFound(id))?;

        let changes = changes.diff(&current);
        if changes.is_empty() {
            tracing::debug!(user_id = id, "User update changed nothing");
            return Ok(id.into());
        }

        if let Some(role_id) = changes.role_id {
            ensure_role_in_tenant(&mut tx, tenant_id, role_id).await?;
        }
        ensure_unique(
            &mut tx,
            tenant_id,
            changes.email.as_deref(),
            changes.vsc_account.as_deref(),
            Some(id),
        )
        .await?;

        let mut qb = QueryBuilder::<Postgres>::new("UPDATE users SET updated_at = NOW()");
        if let Some(name) = changes.name {
            qb.push(", name = ").push_bind(name);
        }
        if let Some(email) = changes.email {
            qb.push(", email = ").push_bind(email);
        }
        if let Some(account) = changes.vsc_account {
            qb.push(", vsc_account = ").push_bind(account);
        }
        if let Some(role_id) = changes.role_id {
            qb.push(", role_id = ").push_bind(role_id);
        }
        qb.push(" WHERE id = ")
            .push_bind(id)
            .push(" AND tenant_id = ")
            .push_bind(tenant_id);

        qb.build().execute(&mut *tx).await?;
        tx.commit().await?;

        tracing::info!(user_id = id, tenant_id, "User updated");
        Ok(id.into())
    }
}

#[async_trait]
impl CommandHandler<DeleteUserCommand> for UserHandlers {
    async fn handle(&self, command: DeleteUserCommand, ctx: &OperationContext) -> AppResult<EntityId> {
        let tenant_id = require_tenant(ctx)?;
        let id = ensure_positive_id("User", command.id)?;

        let result = sqlx::query("DELETE FROM users WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            tracing::debug!(user_id = id, tenant_id, "User to delete not found");
            return Err(AppError::UserNotFound(id));
        }

        tracing::info!(user_id = id, tenant_id, "User deleted");
        Ok(id.into())
    }
}

// =========================================================================
// Queries
// =========================================================================

#[async_trait]
impl QueryHandler<GetUserQuery> for UserHandlers {
    async fn handle(&self, query: GetUserQuery, ctx: &OperationContext) -> AppResult<UserView> {
        let tenant_id = require_tenant(ctx)?;
        let id = ensure_positive_id("User", query.id)?;
        let user = self.fetch(tenant_id, id).await?;
        Ok(user.into())
    }
}

#[async_trait]
impl QueryHandler<ListUsersQuery> for UserHandlers {
    async fn handle(&self, query: ListUsersQuery, ctx: &OperationContext) -> AppResult<Page<UserView>> {
        let tenant_id = require_tenant(ctx)?;
        let columns = self.columns(tenant_id).await?;
        let request = ListRequest::from_params(&query.params, columns, self.limits)?;

        let mut count = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM users u JOIN roles r ON r.id = u.role_id WHERE u.tenant_id = ",
        );
        count.push_bind(tenant_id);
        request.push_where(&mut count, true);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new(USER_SELECT);
        select.push(" WHERE u.tenant_id = ").push_bind(tenant_id);
        request.push_where(&mut select, true);
        request.push_order_and_page(&mut select, "u.id");
        let users: Vec<User> = select.build_query_as().fetch_all(&self.pool).await?;

        let items = users.into_iter().map(UserView::from).collect();
        Ok(request.into_page(items, total))
    }
}

#[async_trait]
impl QueryHandler<UserColumnsQuery> for UserHandlers {
    async fn handle(&self, _query: UserColumnsQuery, ctx: &OperationContext) -> AppResult<ColumnSet> {
        let tenant_id = require_tenant(ctx)?;
        self.columns(tenant_id).await
    }
}
