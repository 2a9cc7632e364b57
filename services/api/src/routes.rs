//! API service routes

use axum::{Json, Router, extract::State, response::IntoResponse, routing::get};
use serde_json::json;
use tower_http::services::ServeDir;
use uuid::Uuid;

use crate::{AppState, error::ApiError, uploads::UPLOADS_ROUTE};

pub mod notifications;
pub mod orders;
pub mod payments;
pub mod products;

/// Create the router for the whole storefront API
pub fn create_router(state: AppState) -> Router {
    let jwt_service = state.auth.jwt_service().clone();
    let auth_routes = auth::routes::create_router(state.auth.clone());
    let uploads = ServeDir::new(state.images.dir());

    Router::new()
        .route("/health", get(health_check))
        .merge(products::router(jwt_service.clone()))
        .merge(orders::router(jwt_service.clone()))
        .merge(payments::router(jwt_service))
        .merge(notifications::router())
        .nest_service(UPLOADS_ROUTE, uploads)
        .with_state(state)
        .merge(auth_routes)
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database = match &state.db_pool {
        Some(pool) => match common::database::health_check(pool).await {
            Ok(true) => "up",
            _ => "down",
        },
        None => "in-memory",
    };

    Json(json!({
        "status": "ok",
        "service": "storefront-api",
        "database": database,
    }))
}

/// Parse a path id; ids that are not UUIDs cannot exist
pub(crate) fn parse_id(raw: &str, not_found: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound(not_found.to_string()))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::*;
    use crate::testing::{TestApp, empty_request};

    #[tokio::test]
    async fn test_health_reports_storage() {
        let app = TestApp::new();
        let (status, body) = app.send(empty_request("GET", "/health", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["database"], "in-memory");
    }

    #[test]
    fn test_parse_id_treats_garbage_as_missing() {
        let err = parse_id("not-a-uuid", "Order not found").unwrap_err();
        assert!(matches!(err, ApiError::NotFound(msg) if msg == "Order not found"));
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string(), "x").unwrap(), id);
    }
}
