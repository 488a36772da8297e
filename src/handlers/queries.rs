//! Query definitions

use crate::cqrs::Query;
use crate::domain::{Role, Tenant, UserView};
use crate::listing::{ColumnSet, ListParams, Page};

// =========================================================================
// Users
// =========================================================================

/// Fetch one user of the current tenant
#[derive(Debug, Clone, Copy)]
pub struct GetUserQuery {
    pub id: i64,
}

impl Query for GetUserQuery {
    type Output = UserView;
    const NAME: &'static str = "user.get";
}

#[derive(Debug, Clone, Default)]
pub struct ListUsersQuery {
    pub params: ListParams,
}

impl Query for ListUsersQuery {
    type Output = Page<UserView>;
    const NAME: &'static str = "user.list";
}

/// User table columns, with the tenant's roles as select options
#[derive(Debug, Clone, Copy, Default)]
pub struct UserColumnsQuery;

impl Query for UserColumnsQuery {
    type Output = ColumnSet;
    const NAME: &'static str = "user.columns";
}

// =========================================================================
// Roles
// =========================================================================

#[derive(Debug, Clone, Copy)]
pub struct GetRoleQuery {
    pub id: i64,
}

impl Query for GetRoleQuery {
    type Output = Role;
    const NAME: &'static str = "role.get";
}

#[derive(Debug, Clone, Default)]
pub struct ListRolesQuery {
    pub params: ListParams,
}

impl Query for ListRolesQuery {
    type Output = Page<Role>;
    const NAME: &'static str = "role.list";
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RoleColumnsQuery;

impl Query for RoleColumnsQuery {
    type Output = ColumnSet;
    const NAME: &'static str = "role.columns";
}

// =========================================================================
// Tenants
// =========================================================================

#[derive(Debug, Clone, Copy)]
pub struct GetTenantQuery {
    pub id: i64,
}

impl Query for GetTenantQuery {
    type Output = Tenant;
    const NAME: &'static str = "tenant.get";
}

#[derive(Debug, Clone, Default)]
pub struct ListTenantsQuery {
    pub params: ListParams,
}

impl Query for ListTenantsQuery {
    type Output = Page<Tenant>;
    const NAME: &'static str = "tenant.list";
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TenantColumnsQuery;

impl Query for TenantColumnsQuery {
    type Output = ColumnSet;
    const NAME: &'static str = "tenant.columns";
}
