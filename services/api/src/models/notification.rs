//! Order notification payloads

use serde::Deserialize;

use crate::models::ShippingAddress;

/// A purchased line as the client's cart reports it
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct NotifyItem {
    pub name: String,
    pub quantity: i64,
    pub price: f64,
}

impl Default for NotifyItem {
    fn default() -> Self {
        Self {
            name: "Product".to_string(),
            quantity: 1,
            price: 0.0,
        }
    }
}

impl NotifyItem {
    pub fn line_total(&self) -> f64 {
        self.price * self.quantity as f64
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifyAdminRequest {
    #[serde(default)]
    pub shipping_details: ShippingAddress,
    #[serde(default)]
    pub items: Vec<NotifyItem>,
    #[serde(default)]
    pub total: f64,
}
