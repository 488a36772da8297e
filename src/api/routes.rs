//! API Routes
//!
//! HTTP endpoint definitions. Every handler checks the key's permission,
//! then hands a command or query to the registry.

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    middleware,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::domain::{OperationContext, Role, Tenant, UserView};
use crate::error::AppResult;
use crate::handlers::{
    CreateRoleCommand, CreateTenantCommand, CreateUserCommand, DeleteRoleCommand,
    DeleteTenantCommand, DeleteUserCommand, EntityId, GetRoleQuery, GetTenantQuery, GetUserQuery,
    ListRolesQuery, ListTenantsQuery, ListUsersQuery, RoleColumnsQuery, TenantColumnsQuery,
    UpdateRoleCommand, UpdateTenantCommand, UpdateUserCommand, UserColumnsQuery,
};
use crate::listing::{ColumnDescriptor, ListParams, Page};

use super::extract::{AppJson, AppPath, AppQuery};
use super::middleware::{permissions, tenant_middleware, AuthenticatedApiKey};
use super::AppState;

// =========================================================================
// Request types
// =========================================================================

#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub vsc_account: Option<String>,
    #[serde(default)]
    pub role_id: Option<i64>,
}

/// Body of role and tenant renames
#[derive(Debug, Default, Deserialize)]
pub struct RenameRequest {
    #[serde(default)]
    pub name: Option<String>,
}

// =========================================================================
// API Router
// =========================================================================

/// Create the API router. Tenant scoped routes get the tenant middleware;
/// the caller layers `auth_middleware` over the whole router. Tenant routes
/// check the key's tenant binding in each handler: a bound key may read and
/// rename its own tenant only.
pub fn create_router(state: AppState) -> Router<AppState> {
    let tenant_scoped = Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/columns", get(user_columns))
        .route(
            "/users/:id",
            get(get_user).patch(update_user).delete(delete_user),
        )
        .route("/roles", get(list_roles).post(create_role))
        .route("/roles/columns", get(role_columns))
        .route(
            "/roles/:id",
            get(get_role).patch(update_role).delete(delete_role),
        )
        .layer(middleware::from_fn_with_state(state, tenant_middleware));

    let global = Router::new()
        .route("/tenants", get(list_tenants).post(create_tenant))
        .route("/tenants/columns", get(tenant_columns))
        .route(
            "/tenants/:id",
            get(get_tenant).patch(update_tenant).delete(delete_tenant),
        );

    tenant_scoped.merge(global)
}

type Created = (StatusCode, Json<EntityId>);

// =========================================================================
// Users
// =========================================================================

async fn create_user(
    State(state): State<AppState>,
    Extension(key): Extension<AuthenticatedApiKey>,
    Extension(ctx): Extension<OperationContext>,
    AppJson(command): AppJson<CreateUserCommand>,
) -> AppResult<Created> {
    key.require(permissions::WRITE_USERS)?;
    let id = state.registry.execute(command, &ctx).await?;
    Ok((StatusCode::CREATED, Json(id)))
}

async fn get_user(
    State(state): State<AppState>,
    Extension(key): Extension<AuthenticatedApiKey>,
    Extension(ctx): Extension<OperationContext>,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<UserView>> {
    key.require(permissions::READ_USERS)?;
    let user = state.registry.query(GetUserQuery { id }, &ctx).await?;
    Ok(Json(user))
}

async fn list_users(
    State(state): State<AppState>,
    Extension(key): Extension<AuthenticatedApiKey>,
    Extension(ctx): Extension<OperationContext>,
    AppQuery(params): AppQuery<ListParams>,
) -> AppResult<Json<Page<UserView>>> {
    key.require(permissions::READ_USERS)?;
    let page = state.registry.query(ListUsersQuery { params }, &ctx).await?;
    Ok(Json(page))
}

async fn user_columns(
    State(state): State<AppState>,
    Extension(key): Extension<AuthenticatedApiKey>,
    Extension(ctx): Extension<OperationContext>,
) -> AppResult<Json<Vec<ColumnDescriptor>>> {
    key.require(permissions::READ_USERS)?;
    let columns = state.registry.query(UserColumnsQuery, &ctx).await?;
    Ok(Json(columns.descriptors().to_vec()))
}

async fn update_user(
    State(state): State<AppState>,
    Extension(key): Extension<AuthenticatedApiKey>,
    Extension(ctx): Extension<OperationContext>,
    AppPath(id): AppPath<i64>,
    AppJson(request): AppJson<UpdateUserRequest>,
) -> AppResult<Json<EntityId>> {
    key.require(permissions::WRITE_USERS)?;
    let command = UpdateUserCommand {
        id,
        name: request.name,
        email: request.email,
        vsc_account: request.vsc_account,
        role_id: request.role_id,
    };
    Ok(Json(state.registry.execute(command, &ctx).await?))
}

async fn delete_user(
    State(state): State<AppState>,
    Extension(key): Extension<AuthenticatedApiKey>,
    Extension(ctx): Extension<OperationContext>,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<EntityId>> {
    key.require(permissions::WRITE_USERS)?;
    Ok(Json(
        state.registry.execute(DeleteUserCommand { id }, &ctx).await?,
    ))
}

// =========================================================================
// Roles
// =========================================================================

async fn create_role(
    State(state): State<AppState>,
    Extension(key): Extension<AuthenticatedApiKey>,
    Extension(ctx): Extension<OperationContext>,
    AppJson(command): AppJson<CreateRoleCommand>,
) -> AppResult<Created> {
    key.require(permissions::WRITE_ROLES)?;
    let id = state.registry.execute(command, &ctx).await?;
    Ok((StatusCode::CREATED, Json(id)))
}

async fn get_role(
    State(state): State<AppState>,
    Extension(key): Extension<AuthenticatedApiKey>,
    Extension(ctx): Extension<OperationContext>,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<Role>> {
    key.require(permissions::READ_ROLES)?;
    Ok(Json(state.registry.query(GetRoleQuery { id }, &ctx).await?))
}

async fn list_roles(
    State(state): State<AppState>,
    Extension(key): Extension<AuthenticatedApiKey>,
    Extension(ctx): Extension<OperationContext>,
    AppQuery(params): AppQuery<ListParams>,
) -> AppResult<Json<Page<Role>>> {
    key.require(permissions::READ_ROLES)?;
    Ok(Json(
        state.registry.query(ListRolesQuery { params }, &ctx).await?,
    ))
}

async fn role_columns(
    State(state): State<AppState>,
    Extension(key): Extension<AuthenticatedApiKey>,
    Extension(ctx): Extension<OperationContext>,
) -> AppResult<Json<Vec<ColumnDescriptor>>> {
    key.require(permissions::READ_ROLES)?;
    let columns = state.registry.query(RoleColumnsQuery, &ctx).await?;
    Ok(Json(columns.descriptors().to_vec()))
}

async fn update_role(
    State(state): State<AppState>,
    Extension(key): Extension<AuthenticatedApiKey>,
    Extension(ctx): Extension<OperationContext>,
    AppPath(id): AppPath<i64>,
    AppJson(request): AppJson<RenameRequest>,
) -> AppResult<Json<EntityId>> {
    key.require(permissions::WRITE_ROLES)?;
    let command = UpdateRoleCommand {
        id,
        name: request.name,
    };
    Ok(Json(state.registry.execute(command, &ctx).await?))
}

async fn delete_role(
    State(state): State<AppState>,
    Extension(key): Extension<AuthenticatedApiKey>,
    Extension(ctx): Extension<OperationContext>,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<EntityId>> {
    key.require(permissions::WRITE_ROLES)?;
    Ok(Json(
        state.registry.execute(DeleteRoleCommand { id }, &ctx).await?,
    ))
}

// =========================================================================
// Tenants
// =========================================================================

async fn create_tenant(
    State(state): State<AppState>,
    Extension(key): Extension<AuthenticatedApiKey>,
    Extension(ctx): Extension<OperationContext>,
    AppJson(command): AppJson<CreateTenantCommand>,
) -> AppResult<Created> {
    key.require(permissions::MANAGE_TENANTS)?;
    key.require_unbound()?;
    let id = state.registry.execute(command, &ctx).await?;
    Ok((StatusCode::CREATED, Json(id)))
}

async fn get_tenant(
    State(state): State<AppState>,
    Extension(key): Extension<AuthenticatedApiKey>,
    Extension(ctx): Extension<OperationContext>,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<Tenant>> {
    key.require(permissions::MANAGE_TENANTS)?;
    key.require_tenant(id)?;
    Ok(Json(state.registry.query(GetTenantQuery { id }, &ctx).await?))
}

async fn list_tenants(
    State(state): State<AppState>,
    Extension(key): Extension<AuthenticatedApiKey>,
    Extension(ctx): Extension<OperationContext>,
    AppQuery(params): AppQuery<ListParams>,
) -> AppResult<Json<Page<Tenant>>> {
    key.require(permissions::MANAGE_TENANTS)?;
    key.require_unbound()?;
    Ok(Json(
        state.registry.query(ListTenantsQuery { params }, &ctx).await?,
    ))
}

async fn tenant_columns(
    State(state): State<AppState>,
    Extension(key): Extension<AuthenticatedApiKey>,
    Extension(ctx): Extension<OperationContext>,
) -> AppResult<Json<Vec<ColumnDescriptor>>> {
    key.require(permissions::MANAGE_TENANTS)?;
    let columns = state.registry.query(TenantColumnsQuery, &ctx).await?;
    Ok(Json(columns.descriptors().to_vec()))
}

async fn update_tenant(
    State(state): State<AppState>,
    Extension(key): Extension<AuthenticatedApiKey>,
    Extension(ctx): Extension<OperationContext>,
    AppPath(id): AppPath<i64>,
    AppJson(request): AppJson<RenameRequest>,
) -> AppResult<Json<EntityId>> {
    key.require(permissions::MANAGE_TENANTS)?;
    key.require_tenant(id)?;
    let command = UpdateTenantCommand {
        id,
        name: request.name,
    };
    Ok(Json(state.registry.execute(command, &ctx).await?))
}

async fn delete_tenant(
    State(state): State<AppState>,
    Extension(key): Extension<AuthenticatedApiKey>,
    Extension(ctx): Extension<OperationContext>,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<EntityId>> {
    key.require(permissions::MANAGE_TENANTS)?;
    key.require_unbound()?;
    Ok(Json(
        state.registry.execute(DeleteTenantCommand { id }, &ctx).await?,
    ))
}
