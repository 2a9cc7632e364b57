//! Payment gateway endpoints

use axum::{
    Json, Router, extract::State, middleware, response::IntoResponse, routing::post,
};
use axum_extra::extract::WithRejection;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, warn};
use uuid::Uuid;

use auth::{AuthUser, JwtService, auth_middleware};

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    models::Order,
    payment::{GatewayOrder, GatewayOrderRequest, to_minor_units},
};

pub fn router(jwt_service: JwtService) -> Router<AppState> {
    Router::new()
        .route("/api/payment/create-order", post(create_payment_order))
        .route("/api/payment/verify", post(verify_payment))
        .route_layer(middleware::from_fn_with_state(jwt_service, auth_middleware))
}

#[derive(Debug, Deserialize)]
pub struct CreatePaymentRequest {
    /// Major currency units, e.g. rupees; taken from the order when bound
    #[serde(default)]
    pub amount: Option<f64>,
    /// Local order paid through this gateway order
    #[serde(rename = "orderId", alias = "order_id", default)]
    pub order_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOrderResponse {
    #[serde(flatten)]
    pub order: GatewayOrder,
    pub key_id: String,
}

/// Fields the checkout widget hands back after a payment, plus our order id
#[derive(Debug, Deserialize)]
pub struct VerifyPaymentRequest {
    pub razorpay_payment_id: String,
    pub razorpay_order_id: String,
    pub razorpay_signature: String,
    #[serde(rename = "orderId", alias = "order_id", default)]
    pub order_id: Option<Uuid>,
}

fn not_awaiting_payment() -> ApiError {
    ApiError::Conflict("Order is not awaiting payment".to_string())
}

/// Load an order the caller may pay for
async fn payable_order(state: &AppState, user: &AuthUser, order_id: Uuid) -> ApiResult<Order> {
    let existing = state
        .orders
        .find(order_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Order not found".to_string()))?;

    if !existing.order.is_visible_to(user) {
        return Err(ApiError::Forbidden(
            "Not authorized to update this order".to_string(),
        ));
    }
    if !existing.order.awaiting_payment() {
        return Err(not_awaiting_payment());
    }
    Ok(existing.order)
}

/// Create a gateway order for the checkout widget.
///
/// With an `orderId` the amount comes from the order and the gateway order
/// is bound to it; only a bound gateway order can later pay that order.
pub async fn create_payment_order(
    State(state): State<AppState>,
    user: AuthUser,
    WithRejection(Json(payload), _): WithRejection<Json<CreatePaymentRequest>, ApiError>,
) -> ApiResult<impl IntoResponse> {
    let invalid_amount = || ApiError::Validation("Amount must be greater than zero".to_string());

    let bound = match payload.order_id {
        Some(order_id) => Some(payable_order(&state, &user, order_id).await?),
        None => None,
    };

    let amount = match (&bound, payload.amount) {
        (Some(order), requested) => {
            let total = to_minor_units(order.total).ok_or_else(invalid_amount)?;
            if let Some(requested) = requested {
                if to_minor_units(requested) != Some(total) {
                    return Err(ApiError::Validation(
                        "Amount does not match order total".to_string(),
                    ));
                }
            }
            total
        }
        (None, Some(requested)) => to_minor_units(requested).ok_or_else(invalid_amount)?,
        (None, None) => return Err(ApiError::Validation("amount is required".to_string())),
    };

    let request = GatewayOrderRequest {
        amount,
        currency: state.payments.currency().to_string(),
        receipt: format!("order_receipt_{}", Utc::now().timestamp_millis()),
        payment_capture: 1,
    };

    let gateway_order = state.payments.create_order(&request).await.map_err(|e| {
        error!("Failed to create gateway order for {}: {}", user.id, e);
        ApiError::PaymentGateway(e.to_string())
    })?;

    if let Some(order) = bound {
        state
            .orders
            .attach_gateway_order(order.id, &gateway_order.id)
            .await?
            .ok_or_else(not_awaiting_payment)?;
        info!("Gateway order {} opened for order {}", gateway_order.id, order.id);
    }

    Ok(Json(PaymentOrderResponse {
        order: gateway_order,
        key_id: state.payments.key_id().to_string(),
    }))
}

/// Verify the widget signature and record the payment on the order
pub async fn verify_payment(
    State(state): State<AppState>,
    user: AuthUser,
    WithRejection(Json(payload), _): WithRejection<Json<VerifyPaymentRequest>, ApiError>,
) -> ApiResult<impl IntoResponse> {
    let order_id = payload
        .order_id
        .ok_or_else(|| ApiError::Validation("orderId is required".to_string()))?;

    if !state.payments.verify_payment(
        &payload.razorpay_order_id,
        &payload.razorpay_payment_id,
        &payload.razorpay_signature,
    ) {
        warn!(
            "Signature mismatch for payment {} on order {}",
            payload.razorpay_payment_id, order_id
        );
        return Err(ApiError::InvalidSignature);
    }

    let existing = payable_order(&state, &user, order_id).await?;

    if existing.gateway_order_id.as_deref() != Some(payload.razorpay_order_id.as_str()) {
        warn!(
            "Payment {} from gateway order {} presented for order {}",
            payload.razorpay_payment_id, payload.razorpay_order_id, order_id
        );
        return Err(ApiError::Validation(
            "Payment does not belong to this order".to_string(),
        ));
    }

    let order = state
        .orders
        .record_payment(
            order_id,
            &payload.razorpay_order_id,
            &payload.razorpay_payment_id,
        )
        .await?
        .ok_or_else(not_awaiting_payment)?;

    info!("Payment {} recorded on order {}", payload.razorpay_payment_id, order.id);
    Ok(Json(json!({
        "success": true,
        "order": order,
    })))
}
