//! Order repository for database operations

use std::collections::HashMap;

use async_trait::async_trait;
use common::DatabaseResult;
use sqlx::{PgPool, Row, postgres::PgRow, types::Json};
use tracing::info;
use uuid::Uuid;

use super::{
    OrderStore,
    product::{PRODUCT_COLUMNS, product_from_row},
};
use crate::models::{
    NewOrder, Order, OrderDetail, OrderItem, OrderItemDetail, OrderStatus, OrderUser, Product,
    ShippingAddress,
};

const ORDER_COLUMNS: &str =
    "o.id, o.user_id, o.status, o.total, o.payment_id, o.gateway_order_id, o.shipping_address, o.created_at, o.updated_at";

const ITEM_COLUMNS: &str = "id, order_id, product_id, quantity, price, created_at";

/// Order repository
#[derive(Clone)]
pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    /// Create a new order repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Load owners, lines and line products for a batch of order rows
    async fn hydrate(&self, rows: Vec<PgRow>) -> DatabaseResult<Vec<OrderDetail>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let orders: Vec<(Order, Option<OrderUser>)> = rows
            .iter()
            .map(|row| {
                let username: Option<String> = row.get("username");
                let order = order_from_row(row);
                let user = username.map(|username| OrderUser {
                    id: order.user_id,
                    username,
                });
                (order, user)
            })
            .collect();
        let order_ids: Vec<Uuid> = orders.iter().map(|(o, _)| o.id).collect();

        let item_rows = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = ANY($1) ORDER BY created_at, id"
        ))
        .bind(&order_ids)
        .fetch_all(&self.pool)
        .await?;
        let items: Vec<OrderItem> = item_rows.iter().map(item_from_row).collect();

        let product_ids: Vec<Uuid> = items.iter().filter_map(|i| i.product_id).collect();
        let products: HashMap<Uuid, Product> = if product_ids.is_empty() {
            HashMap::new()
        } else {
            sqlx::query(&format!(
                "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ANY($1)"
            ))
            .bind(&product_ids)
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(|row| {
                let product = product_from_row(row);
                (product.id, product)
            })
            .collect()
        };

        let mut lines: HashMap<Uuid, Vec<OrderItemDetail>> = HashMap::new();
        for item in items {
            let product = item.product_id.and_then(|id| products.get(&id).cloned());
            lines
                .entry(item.order_id)
                .or_default()
                .push(OrderItemDetail { item, product });
        }

        Ok(orders
            .into_iter()
            .map(|(order, user)| OrderDetail {
                items: lines.remove(&order.id).unwrap_or_default(),
                order,
                user,
            })
            .collect())
    }
}

fn order_from_row(row: &PgRow) -> Order {
    let Json(shipping_address): Json<ShippingAddress> = row.get("shipping_address");
    Order {
        id: row.get("id"),
        user_id: row.get("user_id"),
        status: row.get("status"),
        total: row.get("total"),
        payment_id: row.get("payment_id"),
        gateway_order_id: row.get("gateway_order_id"),
        shipping_address,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn item_from_row(row: &PgRow) -> OrderItem {
    OrderItem {
        id: row.get("id"),
        order_id: row.get("order_id"),
        product_id: row.get("product_id"),
        quantity: row.get("quantity"),
        price: row.get("price"),
        created_at: row.get("created_at"),
    }
}

#[async_trait]
impl OrderStore for PgOrderRepository {
    async fn create(&self, order: &NewOrder) -> DatabaseResult<OrderDetail> {
        let mut tx = self.pool.begin().await?;

        let order_id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO orders (user_id, total, shipping_address, status)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(order.user_id)
        .bind(order.total)
        .bind(Json(&order.shipping_address))
        .bind(OrderStatus::Pending)
        .fetch_one(&mut *tx)
        .await?;

        for item in &order.items {
            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, product_id, quantity, price)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(order_id)
            .bind(item.product_id)
            .bind(item.quantity)
            .bind(item.price)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        info!("Created order {} with {} items", order_id, order.items.len());

        self.find(order_id)
            .await?
            .ok_or(common::DatabaseError::Query(sqlx::Error::RowNotFound))
    }

    async fn list(&self, owner: Option<Uuid>) -> DatabaseResult<Vec<OrderDetail>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {ORDER_COLUMNS}, u.username
            FROM orders o
            LEFT JOIN users u ON u.id = o.user_id
            WHERE $1::uuid IS NULL OR o.user_id = $1
            ORDER BY o.created_at DESC, o.id DESC
            "#
        ))
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        self.hydrate(rows).await
    }

    async fn find(&self, id: Uuid) -> DatabaseResult<Option<OrderDetail>> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {ORDER_COLUMNS}, u.username
            FROM orders o
            LEFT JOIN users u ON u.id = o.user_id
            WHERE o.id = $1
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn update_status(&self, id: Uuid, status: OrderStatus) -> DatabaseResult<Option<Order>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE orders o SET status = $2, updated_at = NOW()
            WHERE o.id = $1
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(order_from_row))
    }

    async fn attach_gateway_order(
        &self,
        id: Uuid,
        gateway_order_id: &str,
    ) -> DatabaseResult<Option<Order>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE orders o SET gateway_order_id = $2, updated_at = NOW()
            WHERE o.id = $1 AND o.payment_id IS NULL AND o.status = $3
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(gateway_order_id)
        .bind(OrderStatus::Pending)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(order_from_row))
    }

    async fn record_payment(
        &self,
        id: Uuid,
        gateway_order_id: &str,
        payment_id: &str,
    ) -> DatabaseResult<Option<Order>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE orders o SET payment_id = $3, status = $4, updated_at = NOW()
            WHERE o.id = $1
              AND o.gateway_order_id = $2
              AND o.payment_id IS NULL
              AND o.status = $5
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(gateway_order_id)
        .bind(payment_id)
        .bind(OrderStatus::Processing)
        .bind(OrderStatus::Pending)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(order_from_row))
    }
}
