//! Error handling module
//!
//! Centralized error types and HTTP response conversion.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::listing::ListingError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors (4xx)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Missing X-API-Key header")]
    MissingApiKey,

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("API key is disabled")]
    ApiKeyDisabled,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Missing required header: {0}")]
    MissingHeader(String),

    #[error("Invalid header value: {0}")]
    InvalidHeader(String),

    #[error("Tenant not found: {0}")]
    TenantNotFound(i64),

    #[error("Role not found: {0}")]
    RoleNotFound(i64),

    #[error("User not found: {0}")]
    UserNotFound(i64),

    #[error("Tenant already exists: {0}")]
    TenantExists(String),

    #[error("Role already exists: {0}")]
    RoleExists(String),

    #[error("User email already exists: {0}")]
    UserEmailExists(String),

    #[error("User VSC account already exists: {0}")]
    UserVscAccountExists(String),

    #[error("Tenant {0} still owns roles or users")]
    TenantInUse(i64),

    #[error("Role {0} is still assigned to users")]
    RoleInUse(i64),

    // Domain errors
    #[error(transparent)]
    Domain(#[from] crate::domain::DomainError),

    #[error(transparent)]
    Listing(#[from] ListingError),

    // Server errors (5xx)
    #[error("No handler registered for {0}")]
    HandlerNotFound(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Machine readable code and HTTP status for this error
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            AppError::MissingHeader(_) => (StatusCode::BAD_REQUEST, "missing_header"),
            AppError::InvalidHeader(_) => (StatusCode::BAD_REQUEST, "invalid_header"),
            AppError::Domain(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            AppError::Listing(_) => (StatusCode::BAD_REQUEST, "invalid_listing"),

            AppError::MissingApiKey => (StatusCode::UNAUTHORIZED, "missing_api_key"),
            AppError::InvalidApiKey => (StatusCode::UNAUTHORIZED, "invalid_api_key"),
            AppError::ApiKeyDisabled => (StatusCode::UNAUTHORIZED, "api_key_disabled"),

            AppError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),

            AppError::TenantNotFound(_) => (StatusCode::NOT_FOUND, "tenant_not_found"),
            AppError::RoleNotFound(_) => (StatusCode::NOT_FOUND, "role_not_found"),
            AppError::UserNotFound(_) => (StatusCode::NOT_FOUND, "user_not_found"),

            AppError::TenantExists(_) => (StatusCode::CONFLICT, "tenant_exists"),
            AppError::RoleExists(_) => (StatusCode::CONFLICT, "role_exists"),
            AppError::UserEmailExists(_) => (StatusCode::CONFLICT, "user_email_exists"),
            AppError::UserVscAccountExists(_) => {
                (StatusCode::CONFLICT, "user_vsc_account_exists")
            }
            AppError::TenantInUse(_) => (StatusCode::CONFLICT, "tenant_in_use"),
            AppError::RoleInUse(_) => (StatusCode::CONFLICT, "role_in_use"),

            AppError::Database(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                (StatusCode::CONFLICT, "conflict")
            }
            AppError::Database(sqlx::Error::Database(db_err))
                if db_err.is_foreign_key_violation() =>
            {
                (StatusCode::CONFLICT, "conflict")
            }

            AppError::HandlerNotFound(_) => (StatusCode::INTERNAL_SERVER_ERROR, "handler_not_found"),
            AppError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Listing(ListingError::InvalidQuery(rejection.body_text()))
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code) = self.status_and_code();

        let details = match &self {
            AppError::Domain(err) => Some(err.field().to_string()),
            AppError::Listing(err) => err.parameter().map(str::to_string),
            AppError::TenantNotFound(id) | AppError::RoleNotFound(id) | AppError::UserNotFound(id) => {
                Some(id.to_string())
            }
            _ => None,
        };

        if status.is_server_error() {
            tracing::error!(error = ?self, error_code, "Request failed");
        }

        // Server errors never leak internals to the client
        let error = if status.is_server_error() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorResponse {
            error,
            error_code: error_code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DomainError;

    #[test]
    fn test_not_found_status() {
        let (status, code) = AppError::UserNotFound(5).status_and_code();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(code, "user_not_found");
    }

    #[test]
    fn test_domain_error_is_bad_request() {
        let err: AppError = DomainError::InvalidEmail("x".to_string()).into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_conflicts() {
        for err in [
            AppError::TenantExists("ACME".into()),
            AppError::RoleInUse(1),
            AppError::UserEmailExists("a@b.c".into()),
        ] {
            assert_eq!(err.status_and_code().0, StatusCode::CONFLICT);
        }
    }

    #[test]
    fn test_handler_not_found_is_server_error() {
        let response = AppError::HandlerNotFound("user.create").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
