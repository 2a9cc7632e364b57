//! Order endpoints

use std::collections::BTreeSet;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use axum_extra::extract::WithRejection;
use tracing::info;
use uuid::Uuid;

use auth::{AuthUser, JwtService, auth_middleware, require_admin};

use super::parse_id;
use crate::{
    AppState,
    error::{ApiError, ApiResult},
    models::{CreateOrderRequest, OrderStatus, UpdateStatusRequest},
};

const ORDER_NOT_FOUND: &str = "Order not found";

pub fn router(jwt_service: JwtService) -> Router<AppState> {
    let admin = Router::new()
        .route("/api/orders/:id/status", put(update_order_status))
        .route_layer(middleware::from_fn(require_admin));

    Router::new()
        .route("/api/orders", post(create_order).get(list_orders))
        .route("/api/orders/:id", get(get_order))
        .merge(admin)
        .route_layer(middleware::from_fn_with_state(jwt_service, auth_middleware))
}

/// Place an order for the current user
pub async fn create_order(
    State(state): State<AppState>,
    user: AuthUser,
    WithRejection(Json(payload), _): WithRejection<Json<CreateOrderRequest>, ApiError>,
) -> ApiResult<impl IntoResponse> {
    let new_order = payload.into_new_order(user.id)?;

    let product_ids: Vec<Uuid> = new_order
        .items
        .iter()
        .map(|item| item.product_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let existing = state.products.existing_ids(&product_ids).await?;
    if let Some(missing) = product_ids.iter().find(|id| !existing.contains(id)) {
        return Err(ApiError::Validation(format!("Product {} does not exist", missing)));
    }

    let order = state.orders.create(&new_order).await.map_err(|e| {
        if e.is_foreign_key_violation() {
            ApiError::Validation("Order references a product that no longer exists".to_string())
        } else {
            ApiError::Database(e)
        }
    })?;

    info!("User {} placed order {}", user.id, order.order.id);
    Ok((StatusCode::CREATED, Json(order)))
}

/// Admins see every order, other users their own
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<impl IntoResponse> {
    let owner = (!user.is_admin).then_some(user.id);
    let orders = state.orders.list(owner).await?;
    Ok(Json(orders))
}

/// Get an order by ID, visible to its owner and admins
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&id, ORDER_NOT_FOUND)?;
    let order = state
        .orders
        .find(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(ORDER_NOT_FOUND.to_string()))?;

    if !order.order.is_visible_to(&user) {
        return Err(ApiError::Forbidden(
            "Not authorized to view this order".to_string(),
        ));
    }

    Ok(Json(order))
}

/// Set an order's status; any transition is allowed
pub async fn update_order_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    WithRejection(Json(payload), _): WithRejection<Json<UpdateStatusRequest>, ApiError>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&id, ORDER_NOT_FOUND)?;
    let status: OrderStatus = payload.status.parse()?;

    let order = state
        .orders
        .update_status(id, status)
        .await?
        .ok_or_else(|| ApiError::NotFound(ORDER_NOT_FOUND.to_string()))?;

    info!("Order {} is now {}", order.id, order.status);
    Ok(Json(order))
}
