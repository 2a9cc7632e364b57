//! Order models

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use auth::AuthUser;

use crate::{error::ApiError, models::Product};

/// Order lifecycle status, stored as the `order_status` enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "order_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(OrderStatus::Pending),
            "processing" => Ok(OrderStatus::Processing),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(ApiError::Validation(format!("Invalid order status: {}", other))),
        }
    }
}

/// Delivery details captured at checkout
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShippingAddress {
    pub full_name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl ShippingAddress {
    /// Purchaser email, if one was given
    pub fn contact_email(&self) -> Option<&str> {
        self.email.as_deref().map(str::trim).filter(|e| !e.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: OrderStatus,
    pub total: f64,
    pub payment_id: Option<String>,
    /// Gateway order opened for this order; a payment must come from it
    pub gateway_order_id: Option<String>,
    pub shipping_address: ShippingAddress,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Admins see every order, everyone else only their own
    pub fn is_visible_to(&self, user: &AuthUser) -> bool {
        user.is_admin || self.user_id == user.id
    }

    /// Pending and not yet paid
    pub fn awaiting_payment(&self) -> bool {
        self.status == OrderStatus::Pending && self.payment_id.is_none()
    }
}

/// One order line; `price` is the unit price at the time of purchase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Option<Uuid>,
    pub quantity: i32,
    pub price: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemDetail {
    #[serde(flatten)]
    pub item: OrderItem,
    /// `None` once the product has been deleted
    pub product: Option<Product>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderUser {
    pub id: Uuid,
    pub username: String,
}

/// Order with its owner and lines, as returned by the order endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub user: Option<OrderUser>,
    pub items: Vec<OrderItemDetail>,
}

/// A cart line as sent by the client
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineRequest {
    #[serde(alias = "id")]
    pub product_id: Uuid,
    pub quantity: i32,
    pub price: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub items: Vec<CartLineRequest>,
    #[serde(default)]
    pub shipping_address: ShippingAddress,
    pub total: f64,
}

impl CreateOrderRequest {
    /// Check the request and turn it into an insert for `user_id`
    pub fn into_new_order(self, user_id: Uuid) -> Result<NewOrder, ApiError> {
        if self.items.is_empty() {
            return Err(ApiError::Validation(
                "Order must contain at least one item".to_string(),
            ));
        }

        if !self.total.is_finite() || self.total < 0.0 {
            return Err(ApiError::Validation(
                "Order total cannot be negative".to_string(),
            ));
        }

        let items = self
            .items
            .into_iter()
            .map(|line| {
                if line.quantity < 1 {
                    return Err(ApiError::Validation(
                        "Item quantity must be at least 1".to_string(),
                    ));
                }
                if !line.price.is_finite() || line.price < 0.0 {
                    return Err(ApiError::Validation(
                        "Item price cannot be negative".to_string(),
                    ));
                }
                Ok(NewOrderItem {
                    product_id: line.product_id,
                    quantity: line.quantity,
                    price: line.price,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(NewOrder {
            user_id,
            total: self.total,
            shipping_address: self.shipping_address,
            items,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewOrderItem {
    pub product_id: Uuid,
    pub quantity: i32,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub user_id: Uuid,
    pub total: f64,
    pub shipping_address: ShippingAddress,
    pub items: Vec<NewOrderItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}
