//! Centralized error handling.
//!
//! Provides a unified error type for the entire application,
//! with automatic HTTP response conversion.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::domain::PasswordRule;

/// Application error types
///
/// Every variant except `Database` and `Internal` is a recoverable, user-facing outcome.
/// Those two are infrastructure faults and never expose their details.
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Account is locked, try again in {minutes_remaining} minute(s)")]
    AccountLocked { minutes_remaining: i64 },

    #[error("Account has been deactivated")]
    AccountDeactivated,

    // Authorization
    #[error("Authentication required")]
    Unauthenticated,

    #[error("Access denied")]
    Forbidden,

    #[error("Account is awaiting approval")]
    PendingApproval,

    // Account lifecycle
    #[error("Email is already registered")]
    DuplicateEmail,

    #[error("Password does not meet the strength requirements")]
    WeakPassword(Vec<PasswordRule>),

    #[error("Cannot deactivate the last active administrator")]
    LastAdminProtected,

    // Resource errors
    #[error("Resource not found")]
    NotFound,

    // Validation
    #[error("{0}")]
    Validation(String),

    // Infrastructure
    #[error("Database error")]
    Database(#[from] sea_orm::DbErr),

    #[error("Internal server error")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub(crate) struct ErrorResponse {
    pub(crate) error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub(crate) struct ErrorBody {
    pub(crate) code: String,
    pub(crate) message: String,
}

impl AppError {
    /// Get error code for client
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidCredentials => "INVALID_CREDENTIALS",
            AppError::AccountLocked { .. } => "ACCOUNT_LOCKED",
            AppError::AccountDeactivated => "ACCOUNT_DEACTIVATED",
            AppError::Unauthenticated => "UNAUTHENTICATED",
            AppError::Forbidden => "FORBIDDEN",
            AppError::PendingApproval => "PENDING_APPROVAL",
            AppError::DuplicateEmail => "DUPLICATE_EMAIL",
            AppError::WeakPassword(_) => "WEAK_PASSWORD",
            AppError::LastAdminProtected => "LAST_ADMIN_PROTECTED",
            AppError::NotFound => "NOT_FOUND",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Database(_) | AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Get HTTP status code
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidCredentials | AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::AccountLocked { .. } => StatusCode::LOCKED,
            AppError::AccountDeactivated | AppError::Forbidden | AppError::PendingApproval => {
                StatusCode::FORBIDDEN
            }
            AppError::DuplicateEmail | AppError::LastAdminProtected => StatusCode::CONFLICT,
            AppError::WeakPassword(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// True for storage/connectivity faults, as opposed to policy outcomes.
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, AppError::Database(_) | AppError::Internal(_))
    }

    /// Get user-facing message (hides internal details)
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(msg) => msg.clone(),

            // Only the first violated rule is surfaced to the end user
            AppError::WeakPassword(violations) => violations
                .first()
                .map(|rule| rule.message().to_string())
                .unwrap_or_else(|| self.to_string()),

            // Hide details for internal errors
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                "An internal error occurred".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "An internal error occurred".to_string()
            }

            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.code().to_string(),
                message: self.user_message(),
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;

/// Extension trait for Option -> AppError conversion
pub trait OptionExt<T> {
    fn ok_or_not_found(self) -> AppResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self) -> AppResult<T> {
        self.ok_or(AppError::NotFound)
    }
}

/// Convenience constructors
impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }
}
