//! Order-first checkout
//!
//! [`CheckoutFlow::begin`] records the order and opens the gateway order the
//! payment widget is shown with, bound to it. Once the widget reports
//! success, [`CheckoutFlow::complete`] verifies the payment against that
//! order, empties the cart and lets the store know. The notification is
//! best-effort.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    api::CheckoutApi,
    auth::AuthStore,
    cart::CartStore,
    error::{ClientError, ClientResult},
    models::{
        CreateOrder, NotifyAdmin, Order, PaymentConfirmation, PaymentOrder, ShippingAddress,
        VerifyPayment,
    },
};

/// An order waiting for the payment widget
#[derive(Debug, Clone, PartialEq)]
pub struct PendingCheckout {
    pub order: Order,
    pub payment: PaymentOrder,
    pub shipping: ShippingAddress,
}

/// What the order-success page shows
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutReceipt {
    pub order_id: Uuid,
    pub payment_id: String,
    pub order: Order,
}

pub struct CheckoutFlow {
    api: Arc<dyn CheckoutApi>,
}

impl CheckoutFlow {
    pub fn new(api: Arc<dyn CheckoutApi>) -> Self {
        Self { api }
    }

    pub async fn begin(
        &self,
        auth: &AuthStore,
        cart: &CartStore,
        shipping: ShippingAddress,
    ) -> ClientResult<PendingCheckout> {
        let token = auth.token().ok_or(ClientError::NotAuthenticated)?;
        if cart.is_empty() {
            return Err(ClientError::EmptyCart);
        }

        let order = self
            .api
            .create_order(
                token,
                &CreateOrder {
                    items: cart.order_lines(),
                    shipping_address: shipping.clone(),
                    total: cart.total_price(),
                },
            )
            .await?;

        let payment = self
            .api
            .create_payment_order(token, order.id, order.total)
            .await?;
        info!("Order {} awaiting payment through {}", order.id, payment.id);

        Ok(PendingCheckout {
            order,
            payment,
            shipping,
        })
    }

    pub async fn complete(
        &self,
        auth: &AuthStore,
        cart: &mut CartStore,
        pending: &PendingCheckout,
        confirmation: PaymentConfirmation,
    ) -> ClientResult<CheckoutReceipt> {
        let token = auth.token().ok_or(ClientError::NotAuthenticated)?;

        let notify = NotifyAdmin {
            shipping_details: pending.shipping.clone(),
            items: cart.notify_items(),
            total: pending.order.total,
        };

        let payment_id = confirmation.razorpay_payment_id.clone();
        let verified = self
            .api
            .verify_payment(
                token,
                &VerifyPayment {
                    confirmation,
                    order_id: pending.order.id,
                },
            )
            .await?;

        cart.clear_cart();
        info!("Order {} paid with {}", verified.order.id, payment_id);

        if let Err(e) = self.api.notify_admin(&notify).await {
            warn!("Order {} placed but the store was not notified: {}", pending.order.id, e);
        }

        Ok(CheckoutReceipt {
            order_id: verified.order.id,
            payment_id,
            order: verified.order,
        })
    }
}
