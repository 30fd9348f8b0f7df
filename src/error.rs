use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

/// Application error taxonomy. Every variant maps to a stable machine-readable
/// code surfaced in the API error envelope, so clients can branch on `code`
/// without parsing messages.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        details: Option<serde_json::Value>,
    },

    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error("Authentication required")]
    AuthenticationRequired,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Payment error: {0}")]
    Payment(String),

    #[error("Email error: {0}")]
    Email(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation { message: message.into(), details: None }
    }

    /// Stable error code for the API envelope.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation { .. } => "VALIDATION_ERROR",
            AppError::InvalidSchedule(_) => "INVALID_SCHEDULE",
            AppError::AuthenticationRequired => "AUTHENTICATION_REQUIRED",
            AppError::NotFound(_) => "RESOURCE_NOT_FOUND",
            AppError::Database(_)
            | AppError::Payment(_)
            | AppError::Email(_)
            | AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } | AppError::InvalidSchedule(_) => StatusCode::BAD_REQUEST,
            AppError::AuthenticationRequired => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(_)
            | AppError::Payment(_)
            | AppError::Email(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // 5xx details stay in the logs; clients get the generic message.
        let message = match &self {
            AppError::Database(msg) => {
                tracing::error!("Database error: {}", msg);
                "Internal server error".to_string()
            }
            AppError::Payment(msg) => {
                tracing::error!("Payment gateway error: {}", msg);
                "Internal server error".to_string()
            }
            AppError::Email(msg) => {
                tracing::error!("Email error: {}", msg);
                "Internal server error".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let details = match &self {
            AppError::Validation { details, .. } => details.clone(),
            _ => None,
        };

        let body = Json(json!({
            "data": null,
            "error": {
                "code": self.code(),
                "message": message,
                "details": details,
            },
        }));

        (status, body).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation {
            message: "Request validation failed".to_string(),
            details: serde_json::to_value(&err).ok(),
        }
    }
}
