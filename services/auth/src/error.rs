//! Authentication errors and their HTTP mapping

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Custom error type for authentication errors
#[derive(Error, Debug)]
pub enum AuthError {
    /// Malformed registration input
    #[error("{0}")]
    Validation(String),

    /// Email or username already registered
    #[error("{0}")]
    Conflict(String),

    /// Unknown email or wrong password, deliberately undifferentiated
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// No bearer credential presented
    #[error("Authentication required")]
    Unauthorized,

    /// Bad or expired token
    #[error("Invalid or expired token")]
    InvalidToken,

    /// Authenticated but not an administrator
    #[error("Admin access required")]
    AdminRequired,

    #[error("User not found")]
    UserNotFound,

    #[error("Too many login attempts, try again later")]
    TooManyRequests,

    #[error("Database error: {0}")]
    Database(#[from] common::DatabaseError),

    #[error("Internal server error")]
    Internal(#[source] anyhow::Error),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::Validation(_) | AuthError::InvalidCredentials => StatusCode::BAD_REQUEST,
            AuthError::Conflict(_) => StatusCode::CONFLICT,
            AuthError::Unauthorized => StatusCode::UNAUTHORIZED,
            AuthError::InvalidToken | AuthError::AdminRequired => StatusCode::FORBIDDEN,
            AuthError::UserNotFound => StatusCode::NOT_FOUND,
            AuthError::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            AuthError::Database(_) | AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to clients
    pub fn public_message(&self) -> String {
        match self {
            AuthError::Database(_) | AuthError::Internal(_) => "Server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Authentication failure: {}", self);
        }

        let body = Json(json!({
            "message": self.public_message(),
        }));

        (status, body).into_response()
    }
}

/// Type alias for authentication results
pub type AuthResult<T> = Result<T, AuthError>;
