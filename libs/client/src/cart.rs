//! Shopping cart persisted under the `cart` storage key

use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use crate::{
    error::ClientError,
    models::{CartItem, NotifyItem, OrderLine, Product},
    storage::{CART_KEY, KeyValueStore},
};

pub struct CartStore {
    storage: Arc<dyn KeyValueStore>,
    items: Vec<CartItem>,
}

impl CartStore {
    /// Load the saved cart; a missing or corrupt entry gives an empty cart
    pub fn load(storage: Arc<dyn KeyValueStore>) -> Self {
        let items = storage
            .get(CART_KEY)
            .and_then(|raw| match serde_json::from_str(&raw) {
                Ok(items) => Some(items),
                Err(e) => {
                    warn!("Discarding unreadable saved cart: {}", e);
                    None
                }
            })
            .unwrap_or_default();

        Self { storage, items }
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add `quantity` of a product, merging into an existing line
    pub fn add_to_cart(&mut self, product: &Product, quantity: u32) {
        if quantity == 0 {
            return;
        }

        match self.items.iter_mut().find(|i| i.product_id == product.id) {
            Some(item) => item.quantity = item.quantity.saturating_add(quantity),
            None => self.items.push(CartItem {
                product_id: product.id,
                name: product.name.clone(),
                price: product.price,
                image: product.image.clone(),
                brand: product.brand.clone(),
                quantity,
            }),
        }
        self.persist();
    }

    /// Set a line's quantity; zero or less removes it
    pub fn update_quantity(&mut self, product_id: Uuid, quantity: i64) {
        if quantity <= 0 {
            self.remove_from_cart(product_id);
            return;
        }

        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        if let Some(item) = self.items.iter_mut().find(|i| i.product_id == product_id) {
            item.quantity = quantity;
            self.persist();
        }
    }

    pub fn remove_from_cart(&mut self, product_id: Uuid) {
        let before = self.items.len();
        self.items.retain(|i| i.product_id != product_id);
        if self.items.len() != before {
            self.persist();
        }
    }

    pub fn clear_cart(&mut self) {
        self.items.clear();
        self.persist();
    }

    pub fn total_price(&self) -> f64 {
        self.items.iter().map(CartItem::line_total).sum()
    }

    pub fn total_items(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |total, i| total.saturating_add(i.quantity))
    }

    /// Order lines with the cart's prices
    pub fn order_lines(&self) -> Vec<OrderLine> {
        self.items
            .iter()
            .map(|i| OrderLine {
                product_id: i.product_id,
                quantity: i.quantity,
                price: i.price,
            })
            .collect()
    }

    pub fn notify_items(&self) -> Vec<NotifyItem> {
        self.items
            .iter()
            .map(|i| NotifyItem {
                name: i.name.clone(),
                quantity: i.quantity,
                price: i.price,
            })
            .collect()
    }

    fn persist(&self) {
        let result = serde_json::to_string(&self.items)
            .map_err(ClientError::from)
            .and_then(|raw| self.storage.set(CART_KEY, &raw));
        if let Err(e) = result {
            warn!("Failed to save cart: {}", e);
        }
    }
}
