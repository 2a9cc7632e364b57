//! Repositories for database operations
//!
//! Handlers depend on the [`ProductStore`] and [`OrderStore`] traits; the
//! PostgreSQL repositories back the running server and the in-memory stores
//! back router tests.

use async_trait::async_trait;
use common::DatabaseResult;
use uuid::Uuid;

use crate::models::{
    NewOrder, NewProduct, Order, OrderDetail, OrderStatus, Product, ProductQuery, ProductUpdate,
};

pub mod memory;
pub mod order;
pub mod product;

pub use memory::{MemoryOrderStore, MemoryProductStore};
pub use order::PgOrderRepository;
pub use product::PgProductRepository;

/// Catalog storage
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Products matching every set filter, oldest first
    async fn list(&self, query: &ProductQuery) -> DatabaseResult<Vec<Product>>;

    async fn find(&self, id: Uuid) -> DatabaseResult<Option<Product>>;

    async fn create(&self, product: &NewProduct) -> DatabaseResult<Product>;

    /// Apply a partial update, `None` if the product does not exist
    async fn update(&self, id: Uuid, update: &ProductUpdate) -> DatabaseResult<Option<Product>>;

    /// Returns false if nothing was deleted
    async fn delete(&self, id: Uuid) -> DatabaseResult<bool>;

    async fn count(&self) -> DatabaseResult<i64>;

    /// The subset of `ids` that exist
    async fn existing_ids(&self, ids: &[Uuid]) -> DatabaseResult<Vec<Uuid>>;
}

/// Order storage
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Insert the order and all of its lines atomically
    async fn create(&self, order: &NewOrder) -> DatabaseResult<OrderDetail>;

    /// Orders newest first, restricted to `owner` when given
    async fn list(&self, owner: Option<Uuid>) -> DatabaseResult<Vec<OrderDetail>>;

    async fn find(&self, id: Uuid) -> DatabaseResult<Option<OrderDetail>>;

    async fn update_status(&self, id: Uuid, status: OrderStatus) -> DatabaseResult<Option<Order>>;

    /// Bind a gateway order to an order that is still awaiting payment.
    ///
    /// `None` if the order is missing, already paid or past `pending`.
    async fn attach_gateway_order(
        &self,
        id: Uuid,
        gateway_order_id: &str,
    ) -> DatabaseResult<Option<Order>>;

    /// Attach a gateway payment id and move the order to `processing`.
    ///
    /// Only applies while the order is pending, unpaid and bound to
    /// `gateway_order_id`; otherwise `None`.
    async fn record_payment(
        &self,
        id: Uuid,
        gateway_order_id: &str,
        payment_id: &str,
    ) -> DatabaseResult<Option<Order>>;
}
