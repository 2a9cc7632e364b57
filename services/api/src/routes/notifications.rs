//! Order notification endpoint

use axum::{Json, Router, extract::State, response::IntoResponse, routing::post};
use axum_extra::extract::WithRejection;
use serde_json::json;
use tracing::info;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    models::NotifyAdminRequest,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/api/notify/admin", post(notify_admin))
}

/// Email the operator about a placed order and send the purchaser a receipt
pub async fn notify_admin(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<NotifyAdminRequest>, ApiError>,
) -> ApiResult<impl IntoResponse> {
    state
        .notifier
        .notify_admin(&payload)
        .await
        .map_err(|e| ApiError::EmailDelivery(e.to_string()))?;

    if state.notifier.notify_customer(&payload).await {
        info!("Order confirmation sent to purchaser");
    }

    Ok(Json(json!({
        "message": "Email sent to admin and user (if email present)"
    })))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use crate::testing::{FakeGateway, OPERATOR_ADDRESS, RecordingMailer, TestApp, json_request};

    fn notify_body(email: Option<&str>) -> Value {
        json!({
            "shippingDetails": {
                "fullName": "Meera Iyer",
                "address": "4 Lake View",
                "city": "Chennai",
                "state": "TN",
                "postalCode": "600001",
                "phone": "9876543210",
                "email": email,
            },
            "items": [
                {"name": "Ashwagandha", "quantity": 2, "price": 299.0},
                {"name": "Brahmi", "quantity": 1, "price": 180.5}
            ],
            "total": 778.5
        })
    }

    #[tokio::test]
    async fn test_notifies_operator_and_customer() {
        let app = TestApp::new();

        let (status, body) = app
            .send(json_request(
                "POST",
                "/api/notify/admin",
                None,
                notify_body(Some("meera@example.com")),
            ))
            .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        assert_eq!(body["message"], "Email sent to admin and user (if email present)");

        let sent = app.mailer.sent.lock().await;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].to, OPERATOR_ADDRESS);
        assert_eq!(sent[0].subject, "New Order Notification");
        assert!(sent[0].html.contains("Meera Iyer"));
        assert_eq!(sent[1].to, "meera@example.com");
        assert_eq!(sent[1].subject, "Order Confirmation");
        assert!(sent[1].html.contains("778.50"));
    }

    #[tokio::test]
    async fn test_customer_mail_skipped_without_address() {
        let app = TestApp::new();

        let (status, _) = app
            .send(json_request("POST", "/api/notify/admin", None, notify_body(None)))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(app.mailer.sent.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_operator_failure_fails_request() {
        let app = TestApp::with(
            RecordingMailer {
                fail_for: Some(OPERATOR_ADDRESS.to_string()),
                ..Default::default()
            },
            FakeGateway::default(),
        );

        let (status, body) = app
            .send(json_request(
                "POST",
                "/api/notify/admin",
                None,
                notify_body(Some("meera@example.com")),
            ))
            .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["message"], "Failed to send email");
        assert!(app.mailer.sent.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_customer_failure_is_not_fatal() {
        let app = TestApp::with(
            RecordingMailer {
                fail_for: Some("meera@example.com".to_string()),
                ..Default::default()
            },
            FakeGateway::default(),
        );

        let (status, _) = app
            .send(json_request(
                "POST",
                "/api/notify/admin",
                None,
                notify_body(Some("meera@example.com")),
            ))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(app.mailer.sent.lock().await.len(), 1);
    }
}
