//! Custom error types for the API service

use axum::{
    Json,
    extract::{multipart::MultipartError, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use auth::AuthError;

/// Custom error type for the API service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Malformed or out-of-range input
    #[error("{0}")]
    Validation(String),

    #[error("Invalid payment signature")]
    InvalidSignature,

    /// Authenticated but not allowed to touch the resource
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    /// Request clashes with the resource's current state
    #[error("{0}")]
    Conflict(String),

    /// Payment provider unreachable or refused the request
    #[error("Payment gateway error: {0}")]
    PaymentGateway(String),

    /// Email relay unreachable or refused the message
    #[error("Failed to send email")]
    EmailDelivery(String),

    /// Authentication failures keep their own status and message
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Database error: {0}")]
    Database(#[from] common::DatabaseError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::InvalidSignature => StatusCode::BAD_REQUEST,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::PaymentGateway(_) | ApiError::EmailDelivery(_) => StatusCode::BAD_GATEWAY,
            ApiError::Auth(err) => err.status(),
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to clients
    pub fn public_message(&self) -> String {
        match self {
            ApiError::Auth(err) => err.public_message(),
            ApiError::PaymentGateway(_) => "Payment gateway error".to_string(),
            ApiError::Database(_) | ApiError::Internal(_) => "Server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::Database(_) | ApiError::Internal(_) => {
                tracing::error!("Request failed: {}", self)
            }
            ApiError::PaymentGateway(cause) | ApiError::EmailDelivery(cause) => {
                tracing::error!("Upstream failure: {}", cause)
            }
            _ => {}
        }

        let body = Json(json!({
            "message": self.public_message(),
        }));

        (status, body).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::Validation(format!("Invalid form data: {}", err.body_text()))
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::Validation("bad".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::InvalidSignature.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::NotFound("Order not found".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Conflict("Order is not awaiting payment".into()).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::PaymentGateway("timeout".into()).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::EmailDelivery("refused".into()).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::from(AuthError::TooManyRequests).status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ApiError::from(AuthError::Unauthorized).status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_upstream_causes_are_not_leaked() {
        let err = ApiError::EmailDelivery("smtp relay 10.0.0.9 refused".into());
        assert_eq!(err.public_message(), "Failed to send email");

        let err = ApiError::PaymentGateway("401 from api.razorpay.com".into());
        assert_eq!(err.public_message(), "Payment gateway error");

        let err = ApiError::Internal("disk full".into());
        assert_eq!(err.public_message(), "Server error");
    }
}
