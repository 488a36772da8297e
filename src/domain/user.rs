//! User entity
//!
//! A user belongs to one tenant and holds one role of that tenant.
//! Names are stored upper-cased, emails and VSC accounts lower-cased.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;
use sqlx::FromRow;

use super::{normalize_name, DomainError};

pub const USER_NAME_MIN: usize = 2;
pub const USER_NAME_MAX: usize = 100;
pub const VSC_ACCOUNT_MAX: usize = 255;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

/// User row joined with its role name
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub tenant_id: i64,
    pub role_id: i64,
    pub role_name: String,
    pub name: String,
    pub email: String,
    pub vsc_account: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Role summary embedded in user responses
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoleRef {
    pub id: i64,
    pub name: String,
}

/// Read model returned by user queries
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub vsc_account: String,
    pub role: RoleRef,
    pub tenant_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            vsc_account: user.vsc_account,
            role: RoleRef {
                id: user.role_id,
                name: user.role_name,
            },
            tenant_id: user.tenant_id,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

pub fn normalize_email(raw: &str) -> Result<String, DomainError> {
    let email = raw.trim().to_lowercase();
    if !EMAIL_RE.is_match(&email) {
        return Err(DomainError::InvalidEmail(email));
    }
    Ok(email)
}

pub fn normalize_vsc_account(raw: &str) -> Result<String, DomainError> {
    let account = raw.trim().to_lowercase();
    let len = account.chars().count();
    if len == 0 || len > VSC_ACCOUNT_MAX {
        return Err(DomainError::InvalidVscAccount {
            max: VSC_ACCOUNT_MAX,
        });
    }
    Ok(account)
}

fn normalize_user_name(raw: &str) -> Result<String, DomainError> {
    normalize_name("User", raw, USER_NAME_MIN, USER_NAME_MAX)
}

/// Validated input for a new user
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub tenant_id: i64,
    pub role_id: i64,
    pub name: String,
    pub email: String,
    pub vsc_account: String,
}

impl NewUser {
    pub fn new(
        tenant_id: i64,
        role_id: i64,
        name: &str,
        email: &str,
        vsc_account: &str,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            tenant_id,
            role_id: super::ensure_positive_id("Role", role_id)?,
            name: normalize_user_name(name)?,
            email: normalize_email(email)?,
            vsc_account: normalize_vsc_account(vsc_account)?,
        })
    }
}

/// Validated partial update for a user
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub vsc_account: Option<String>,
    pub role_id: Option<i64>,
}

impl UserChanges {
    pub fn new(
        name: Option<&str>,
        email: Option<&str>,
        vsc_account: Option<&str>,
        role_id: Option<i64>,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            name: name.map(normalize_user_name).transpose()?,
            email: email.map(normalize_email).transpose()?,
            vsc_account: vsc_account.map(normalize_vsc_account).transpose()?,
            role_id: role_id
                .map(|id| super::ensure_positive_id("Role", id))
                .transpose()?,
        })
    }

    /// Keep only the fields that differ from the stored user
    pub fn diff(self, current: &User) -> Self {
        Self {
            name: self.name.filter(|v| *v != current.name),
            email: self.email.filter(|v| *v != current.email),
            vsc_account: self.vsc_account.filter(|v| *v != current.vsc_account),
            role_id: self.role_id.filter(|v| *v != current.role_id),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.vsc_account.is_none()
            && self.role_id.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored_user() -> User {
        User {
            id: 10,
            tenant_id: 1,
            role_id: 2,
            role_name: "ADMIN".to_string(),
            name: "JANE DOE".to_string(),
            email: "jane@example.com".to_string(),
            vsc_account: "jane".to_string(),
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn test_new_user_normalizes_fields() {
        let user = NewUser::new(1, 2, "  jane doe ", " Jane@Example.COM ", " JANE ").unwrap();

        assert_eq!(user.name, "JANE DOE");
        assert_eq!(user.email, "jane@example.com");
        assert_eq!(user.vsc_account, "jane");
    }

    #[test]
    fn test_email_validation() {
        assert!(normalize_email("a@b.co").is_ok());
        for bad in ["", "plain", "a@b", "a b@c.d", "@b.c", "a@@b.c"] {
            assert!(normalize_email(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn test_new_user_rejects_bad_role_id() {
        let err = NewUser::new(1, 0, "jane", "jane@example.com", "jane").unwrap_err();
        assert_eq!(err.field(), "id");
    }

    #[test]
    fn test_vsc_account_bounds() {
        assert!(normalize_vsc_account("   ").is_err());
        assert!(normalize_vsc_account(&"v".repeat(256)).is_err());
    }

    #[test]
    fn test_changes_diff() {
        let changes = UserChanges::new(
            Some("jane doe"),
            Some("JANE@example.com"),
            Some("j.doe"),
            Some(2),
        )
        .unwrap()
        .diff(&stored_user());

        assert_eq!(changes.name, None);
        assert_eq!(changes.email, None);
        assert_eq!(changes.vsc_account.as_deref(), Some("j.doe"));
        assert_eq!(changes.role_id, None);
        assert!(!changes.is_empty());
    }

    #[test]
    fn test_user_view_embeds_role() {
        let view = UserView::from(stored_user());
        assert_eq!(
            view.role,
            RoleRef {
                id: 2,
                name: "ADMIN".to_string()
            }
        );
    }
}
