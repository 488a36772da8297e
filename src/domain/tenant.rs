//! Tenant entity

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use super::{normalize_name, DomainError};

pub const TENANT_NAME_MIN: usize = 2;
pub const TENANT_NAME_MAX: usize = 250;

/// Tenant row
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Tenant {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Validated input for a new tenant
#[derive(Debug, Clone, PartialEq)]
pub struct NewTenant {
    pub name: String,
}

impl NewTenant {
    pub fn new(name: &str) -> Result<Self, DomainError> {
        Ok(Self {
            name: normalize_name("Tenant", name, TENANT_NAME_MIN, TENANT_NAME_MAX)?,
        })
    }
}

/// Validated partial update for a tenant
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TenantChanges {
    pub name: Option<String>,
}

impl TenantChanges {
    pub fn new(name: Option<&str>) -> Result<Self, DomainError> {
        let name = name
            .map(|n| normalize_name("Tenant", n, TENANT_NAME_MIN, TENANT_NAME_MAX))
            .transpose()?;
        Ok(Self { name })
    }

    /// Drop values equal to what the tenant already has
    pub fn diff(self, current: &Tenant) -> Self {
        Self {
            name: self.name.filter(|n| *n != current.name),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_tenant_normalizes_name() {
        let tenant = NewTenant::new("  acme corp ").unwrap();
        assert_eq!(tenant.name, "ACME CORP");
    }

    #[test]
    fn test_new_tenant_rejects_short_name() {
        assert!(NewTenant::new(" x ").is_err());
        assert!(NewTenant::new(&"a".repeat(251)).is_err());
        assert!(NewTenant::new(&"a".repeat(250)).is_ok());
    }

    #[test]
    fn test_changes_diff_drops_same_name() {
        let current = Tenant {
            id: 1,
            name: "ACME".to_string(),
            created_at: Utc::now(),
            updated_at: None,
        };

        let changes = TenantChanges::new(Some("acme")).unwrap().diff(&current);
        assert!(changes.is_empty());

        let changes = TenantChanges::new(Some("globex")).unwrap().diff(&current);
        assert_eq!(changes.name.as_deref(), Some("GLOBEX"));
    }
}
