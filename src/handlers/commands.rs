//! Command definitions
//!
//! Commands represent intentions to change the system state. Tenant scoped
//! commands take their tenant from the [`OperationContext`](crate::domain::OperationContext).

use serde::{Deserialize, Serialize};

use crate::cqrs::Command;

/// Identifier of the row a command created or touched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EntityId {
    pub id: i64,
}

impl From<i64> for EntityId {
    fn from(id: i64) -> Self {
        Self { id }
    }
}

// =========================================================================
// Users
// =========================================================================

/// Command to create a user in the current tenant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserCommand {
    pub name: String,
    pub email: String,
    pub vsc_account: String,
    pub role_id: i64,
}

impl Command for CreateUserCommand {
    type Output = EntityId;
    const NAME: &'static str = "user.create";
}

/// Command to change some fields of a user
#[derive(Debug, Clone, Default)]
pub struct UpdateUserCommand {
    pub id: i64,
    pub name: Option<String>,
    pub email: Option<String>,
    pub vsc_account: Option<String>,
    pub role_id: Option<i64>,
}

impl Command for UpdateUserCommand {
    type Output = EntityId;
    const NAME: &'static str = "user.update";
}

#[derive(Debug, Clone, Copy)]
pub struct DeleteUserCommand {
    pub id: i64,
}

impl Command for DeleteUserCommand {
    type Output = EntityId;
    const NAME: &'static str = "user.delete";
}

// =========================================================================
// Roles
// =========================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRoleCommand {
    pub name: String,
}

impl Command for CreateRoleCommand {
    type Output = EntityId;
    const NAME: &'static str = "role.create";
}

#[derive(Debug, Clone, Default)]
pub struct UpdateRoleCommand {
    pub id: i64,
    pub name: Option<String>,
}

impl Command for UpdateRoleCommand {
    type Output = EntityId;
    const NAME: &'static str = "role.update";
}

/// Command to delete a role no user holds any more
#[derive(Debug, Clone, Copy)]
pub struct DeleteRoleCommand {
    pub id: i64,
}

impl Command for DeleteRoleCommand {
    type Output = EntityId;
    const NAME: &'static str = "role.delete";
}

// =========================================================================
// Tenants
// =========================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTenantCommand {
    pub name: String,
}

impl Command for CreateTenantCommand {
    type Output = EntityId;
    const NAME: &'static str = "tenant.create";
}

#[derive(Debug, Clone, Default)]
pub struct UpdateTenantCommand {
    pub id: i64,
    pub name: Option<String>,
}

impl Command for UpdateTenantCommand {
    type Output = EntityId;
    const NAME: &'static str = "tenant.update";
}

/// Command to delete a tenant that owns no roles or users
#[derive(Debug, Clone, Copy)]
pub struct DeleteTenantCommand {
    pub id: i64,
}

impl Command for DeleteTenantCommand {
    type Output = EntityId;
    const NAME: &'static str = "tenant.delete";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_names_are_unique() {
        let names = [
            CreateUserCommand::NAME,
            UpdateUserCommand::NAME,
            DeleteUserCommand::NAME,
            CreateRoleCommand::NAME,
            UpdateRoleCommand::NAME,
            DeleteRoleCommand::NAME,
            CreateTenantCommand::NAME,
            UpdateTenantCommand::NAME,
            DeleteTenantCommand::NAME,
        ];
        let unique: std::collections::HashSet<_> = names.iter().collect();
        assert_eq!(unique.len(), names.len());
    }

    #[test]
    fn test_create_user_deserialize() {
        let cmd: CreateUserCommand = serde_json::from_str(
            r#"{"name":"Jane","email":"jane@example.com","vsc_account":"jane","role_id":3}"#,
        )
        .unwrap();
        assert_eq!(cmd.role_id, 3);
        assert_eq!(cmd.vsc_account, "jane");
    }

    #[test]
    fn test_entity_id_serialize() {
        let json = serde_json::to_value(EntityId::from(7)).unwrap();
        assert_eq!(json, serde_json::json!({ "id": 7 }));
    }
}
