//! Domain Error Types
//!
//! Pure domain errors that don't depend on infrastructure.

use thiserror::Error;

/// Validation failures raised while normalizing tenants, roles and users.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// Name outside the allowed length after trimming
    #[error("{entity} name must be between {min} and {max} characters")]
    InvalidName {
        entity: &'static str,
        min: usize,
        max: usize,
    },

    /// Email does not look like `local@domain.tld`
    #[error("Invalid email format: {0}")]
    InvalidEmail(String),

    /// VSC account empty or too long
    #[error("VSC account must be between 1 and {max} characters")]
    InvalidVscAccount { max: usize },

    /// Identifier is zero or negative
    #[error("Invalid {entity} id: {id}")]
    InvalidId { entity: &'static str, id: i64 },
}

impl DomainError {
    /// Field the error refers to, reported back to the client
    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidName { .. } => "name",
            Self::InvalidEmail(_) => "email",
            Self::InvalidVscAccount { .. } => "vsc_account",
            Self::InvalidId { .. } => "id",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_name_message() {
        let err = DomainError::InvalidName {
            entity: "Tenant",
            min: 2,
            max: 250,
        };

        assert_eq!(err.field(), "name");
        assert!(err.to_string().contains("Tenant"));
        assert!(err.to_string().contains("250"));
    }

    #[test]
    fn test_invalid_email_message() {
        let err = DomainError::InvalidEmail("nope".to_string());

        assert_eq!(err.field(), "email");
        assert!(err.to_string().contains("nope"));
    }
}
