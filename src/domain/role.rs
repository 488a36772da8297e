//! Role entity
//!
//! Roles belong to a tenant; names are unique within that tenant.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use super::{normalize_name, DomainError};

pub const ROLE_NAME_MIN: usize = 2;
pub const ROLE_NAME_MAX: usize = 100;

/// Role row
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Role {
    pub id: i64,
    pub tenant_id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Validated input for a new role
#[derive(Debug, Clone, PartialEq)]
pub struct NewRole {
    pub tenant_id: i64,
    pub name: String,
}

impl NewRole {
    pub fn new(tenant_id: i64, name: &str) -> Result<Self, DomainError> {
        Ok(Self {
            tenant_id,
            name: normalize_name("Role", name, ROLE_NAME_MIN, ROLE_NAME_MAX)?,
        })
    }
}

/// Validated partial update for a role
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoleChanges {
    pub name: Option<String>,
}

impl RoleChanges {
    pub fn new(name: Option<&str>) -> Result<Self, DomainError> {
        let name = name
            .map(|n| normalize_name("Role", n, ROLE_NAME_MIN, ROLE_NAME_MAX))
            .transpose()?;
        Ok(Self { name })
    }

    pub fn diff(self, current: &Role) -> Self {
        Self {
            name: self.name.filter(|n| *n != current.name),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
    }
}
