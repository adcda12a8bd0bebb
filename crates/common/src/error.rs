//! Error types for the portal.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application result type.
pub type AppResult<T> = Result<T, AppError>;

/// Application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // === Client Errors ===
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("User ID not found")]
    UserNotFound(String),

    #[error("Complaint not found: {0}")]
    ComplaintNotFound(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid user ID or password")]
    InvalidCredentials,

    #[error("Please complete your registration by setting a password")]
    PasswordNotSet(String),

    #[error("Please verify your registration with the OTP sent to your phone")]
    AccountNotVerified(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid OTP")]
    InvalidOtp,

    #[error("OTP expired, please request a new one")]
    OtpExpired,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Rate limited")]
    RateLimited,

    // === Server Errors ===
    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            // 4xx Client Errors
            Self::NotFound(_) | Self::UserNotFound(_) | Self::ComplaintNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            Self::Unauthorized | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) | Self::AccountNotVerified(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) | Self::Validation(_) | Self::InvalidOtp => {
                StatusCode::BAD_REQUEST
            }
            Self::OtpExpired => StatusCode::GONE,
            Self::Conflict(_) | Self::PasswordNotSet(_) => StatusCode::CONFLICT,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,

            // 5xx Server Errors
            Self::Database(_)
            | Self::Config(_)
            | Self::ExternalService(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::UserNotFound(_) => "USER_NOT_FOUND",
            Self::ComplaintNotFound(_) => "COMPLAINT_NOT_FOUND",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::PasswordNotSet(_) => "PASSWORD_NOT_SET",
            Self::AccountNotVerified(_) => "ACCOUNT_NOT_VERIFIED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InvalidOtp => "INVALID_OTP",
            Self::OtpExpired => "OTP_EXPIRED",
            Self::Conflict(_) => "CONFLICT",
            Self::RateLimited => "RATE_LIMITED",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::ExternalService(_) => "EXTERNAL_SERVICE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// The user ID the client should carry into its next step, if any.
    ///
    /// Set for errors that route the auth flow instead of ending it.
    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Self::PasswordNotSet(id) | Self::AccountNotVerified(id) => Some(id),
            _ => None,
        }
    }

    /// Returns whether this error should be logged at error level.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        if self.is_server_error() {
            tracing::error!(error = %self, code = code, "Server error occurred");
        } else {
            tracing::debug!(error = %self, code = code, "Client error occurred");
        }

        // Server error details stay in the log.
        let message = if self.is_server_error() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let mut error = json!({
            "code": code,
            "message": message,
        });
        if let Some(user_id) = self.user_id() {
            error["userId"] = json!(user_id);
        }

        let body = Json(json!({
            "success": false,
            "error": error,
        }));

        (status, body).into_response()
    }
}

// === From implementations ===

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_flow_errors_carry_user_id() {
        let err = AppError::PasswordNotSet("CGABC123".to_string());
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.user_id(), Some("CGABC123"));

        let err = AppError::AccountNotVerified("CGABC123".to_string());
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(err.error_code(), "ACCOUNT_NOT_VERIFIED");

        assert!(AppError::InvalidCredentials.user_id().is_none());
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::UserNotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(AppError::InvalidOtp.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::OtpExpired.status_code(), StatusCode::GONE);
        assert!(AppError::Database("boom".into()).is_server_error());
        assert!(!AppError::Validation("bad".into()).is_server_error());
    }

    #[test]
    fn test_user_not_found_message() {
        assert_eq!(
            AppError::UserNotFound("CG000000".into()).to_string(),
            "User ID not found"
        );
    }
}
