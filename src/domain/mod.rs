//! Domain module
//!
//! Core domain types and business rules.

pub mod context;
pub mod error;
pub mod role;
pub mod tenant;
pub mod user;

pub use context::{OperationContext, TenantScope};
pub use error::DomainError;
pub use role::{NewRole, Role, RoleChanges};
pub use tenant::{NewTenant, Tenant, TenantChanges};
pub use user::{NewUser, User, UserChanges, UserView, RoleRef};

/// Trim and upper-case a display name, then check its length in characters.
pub(crate) fn normalize_name(
    entity: &'static str,
    raw: &str,
    min: usize,
    max: usize,
) -> Result<String, DomainError> {
    let name = raw.trim().to_uppercase();
    let len = name.chars().count();
    if len < min || len > max {
        return Err(DomainError::InvalidName { entity, min, max });
    }
    Ok(name)
}

/// Reject non-positive identifiers before they reach the database.
pub fn ensure_positive_id(entity: &'static str, id: i64) -> Result<i64, DomainError> {
    if id <= 0 {
        return Err(DomainError::InvalidId { entity, id });
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name_counts_characters() {
        // Multi-byte letters count once each
        assert_eq!(normalize_name("Role", " öz ", 2, 100).unwrap(), "ÖZ");
        assert!(normalize_name("Role", " a ", 2, 100).is_err());
    }

    #[test]
    fn test_ensure_positive_id() {
        assert_eq!(ensure_positive_id("User", 7).unwrap(), 7);
        assert!(matches!(
            ensure_positive_id("User", 0),
            Err(DomainError::InvalidId { entity: "User", id: 0 })
        ));
    }
}
