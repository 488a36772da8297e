//! Handler wiring
//!
//! Built once at startup and shared through the router state.

use sqlx::PgPool;

use crate::domain::OperationContext;
use crate::error::AppResult;
use crate::handlers::*;
use crate::listing::PageLimits;

use super::{Command, CommandBus, Query, QueryBus};

/// Both buses with every handler of the application registered
pub struct CqrsRegistry {
    commands: CommandBus,
    queries: QueryBus,
}

impl CqrsRegistry {
    pub fn new(pool: PgPool, limits: PageLimits) -> Self {
        let users = UserHandlers::new(pool.clone(), limits);
        let roles = RoleHandlers::new(pool.clone(), limits);
        let tenants = TenantHandlers::new(pool, limits);

        let mut commands = CommandBus::new();
        commands.register::<CreateUserCommand, _>(users.clone());
        commands.register::<UpdateUserCommand, _>(users.clone());
        commands.register::<DeleteUserCommand, _>(users.clone());
        commands.register::<CreateRoleCommand, _>(roles.clone());
        commands.register::<UpdateRoleCommand, _>(roles.clone());
        commands.register::<DeleteRoleCommand, _>(roles.clone());
        commands.register::<CreateTenantCommand, _>(tenants.clone());
        commands.register::<UpdateTenantCommand, _>(tenants.clone());
        commands.register::<DeleteTenantCommand, _>(tenants.clone());

        let mut queries = QueryBus::new();
        queries.register::<GetUserQuery, _>(users.clone());
        queries.register::<ListUsersQuery, _>(users.clone());
        queries.register::<UserColumnsQuery, _>(users);
        queries.register::<GetRoleQuery, _>(roles.clone());
        queries.register::<ListRolesQuery, _>(roles.clone());
        queries.register::<RoleColumnsQuery, _>(roles);
        queries.register::<GetTenantQuery, _>(tenants.clone());
        queries.register::<ListTenantsQuery, _>(tenants.clone());
        queries.register::<TenantColumnsQuery, _>(tenants);

        tracing::debug!("CQRS handlers registered");

        Self { commands, queries }
    }

    pub fn command_bus(&self) -> &CommandBus {
        &self.commands
    }

    pub fn query_bus(&self) -> &QueryBus {
        &self.queries
    }

    pub async fn execute<C: Command>(&self, command: C, ctx: &OperationContext) -> AppResult<C::Output> {
        self.commands.execute(command, ctx).await
    }

    pub async fn query<Q: Query>(&self, query: Q, ctx: &OperationContext) -> AppResult<Q::Output> {
        self.queries.execute(query, ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    #[tokio::test]
    async fn test_every_message_is_registered() {
        // Lazy pools never connect until a query runs
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        let registry = CqrsRegistry::new(pool, PageLimits::default());

        for name in [
            CreateUserCommand::NAME,
            UpdateUserCommand::NAME,
            DeleteUserCommand::NAME,
            CreateRoleCommand::NAME,
            UpdateRoleCommand::NAME,
            DeleteRoleCommand::NAME,
            CreateTenantCommand::NAME,
            UpdateTenantCommand::NAME,
            DeleteTenantCommand::NAME,
        ] {
            assert!(registry.command_bus().is_registered(name), "{name}");
        }

        for name in [
            GetUserQuery::NAME,
            ListUsersQuery::NAME,
            UserColumnsQuery::NAME,
            GetRoleQuery::NAME,
            ListRolesQuery::NAME,
            RoleColumnsQuery::NAME,
            GetTenantQuery::NAME,
            ListTenantsQuery::NAME,
            TenantColumnsQuery::NAME,
        ] {
            assert!(registry.query_bus().is_registered(name), "{name}");
        }
    }

    #[tokio::test]
    async fn test_static_columns_query_needs_no_database() {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        let registry = CqrsRegistry::new(pool, PageLimits::default());

        let columns = registry
            .query(TenantColumnsQuery, &OperationContext::default())
            .await
            .unwrap();
        assert_eq!(columns.descriptors()[0].key, "id");
    }

    #[tokio::test]
    async fn test_validation_runs_before_database() {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        let registry = CqrsRegistry::new(pool, PageLimits::default());

        let err = registry
            .query(GetTenantQuery { id: 0 }, &OperationContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, crate::error::AppError::Domain(_)));
    }
}
