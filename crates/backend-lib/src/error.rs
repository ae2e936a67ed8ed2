// crates/backend-lib/src/error.rs

//! Central error type + Axum integration.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Application error types with error codes and context
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("User already exists. Please choose another name")]
    UsernameTaken,

    #[error("Username must be at least {min} characters long")]
    UsernameTooShort { min: usize },

    #[error("Password must be at least {min} characters long")]
    PasswordTooShort { min: usize },

    #[error("Password must contain at least one uppercase letter, one lowercase letter, one number, and one special character")]
    PasswordTooWeak,

    #[error("Incorrect username or password")]
    InvalidCredentials,

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Hashing error: {0}")]
    Hashing(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::MissingField(_)
            | AppError::UsernameTaken
            | AppError::UsernameTooShort { .. }
            | AppError::PasswordTooShort { .. }
            | AppError::PasswordTooWeak
            | AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::MissingField(_) => "REG_001",
            AppError::UsernameTaken => "REG_002",
            AppError::UsernameTooShort { .. } => "REG_003",
            AppError::PasswordTooShort { .. } => "REG_004",
            AppError::PasswordTooWeak => "REG_005",
            AppError::InvalidCredentials => "AUTH_001",
            AppError::Persistence(_) => "STORE_001",
            AppError::Hashing(_) => "KDF_001",
            AppError::NotFound(_) => "NF_001",
            AppError::InvalidInput(_) => "VAL_001",
            AppError::RateLimitExceeded => "RATE_001",
            AppError::Internal(_) => "INT_001",
            AppError::Io(_) => "IO_001",
            AppError::Json(_) => "JSON_001",
        }
    }

    /// Get a sanitized message suitable for production use
    ///
    /// Validation errors keep their text (they are shown back on the form);
    /// persistence and hashing failures collapse to an opaque message so no
    /// internal detail reaches the client.
    pub fn sanitized_message(&self) -> String {
        match self {
            AppError::MissingField(_)
            | AppError::UsernameTaken
            | AppError::UsernameTooShort { .. }
            | AppError::PasswordTooShort { .. }
            | AppError::PasswordTooWeak
            | AppError::InvalidCredentials
            | AppError::InvalidInput(_) => self.to_string(),
            AppError::RateLimitExceeded => {
                "Too many attempts, please try again later".to_string()
            },
            AppError::NotFound(_) => "Resource not found".to_string(),
            AppError::Json(_) => "Invalid request format".to_string(),
            AppError::Persistence(_)
            | AppError::Hashing(_)
            | AppError::Internal(_)
            | AppError::Io(_) => "An internal server error occurred".to_string(),
        }
    }

    /// True for the registration/login validation variants that are recovered
    /// at the form boundary instead of surfacing as an HTTP error body.
    pub fn is_form_error(&self) -> bool {
        matches!(
            self,
            AppError::MissingField(_)
                | AppError::UsernameTaken
                | AppError::UsernameTooShort { .. }
                | AppError::PasswordTooShort { .. }
                | AppError::PasswordTooWeak
                | AppError::InvalidCredentials
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();

        // Use detailed messages in development, sanitized in production
        let message = if cfg!(debug_assertions) {
            self.to_string()
        } else {
            self.sanitized_message()
        };

        let body = serde_json::json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        });

        (status, axum::Json(body)).into_response()
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Internal(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Internal(msg.to_string())
    }
}
