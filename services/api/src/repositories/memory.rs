//! In-memory stores backing tests and database-less runs

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use common::DatabaseResult;
use tokio::sync::RwLock;
use uuid::Uuid;

use auth::repositories::UserStore;

use super::{OrderStore, ProductStore};
use crate::models::{
    NewOrder, NewProduct, Order, OrderDetail, OrderItem, OrderItemDetail, OrderStatus, OrderUser,
    Product, ProductQuery, ProductUpdate,
};

/// Products kept in insertion order
#[derive(Clone, Default)]
pub struct MemoryProductStore {
    products: Arc<RwLock<Vec<Product>>>,
}

impl MemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductStore for MemoryProductStore {
    async fn list(&self, query: &ProductQuery) -> DatabaseResult<Vec<Product>> {
        let products = self.products.read().await;
        Ok(products.iter().filter(|p| query.matches(p)).cloned().collect())
    }

    async fn find(&self, id: Uuid) -> DatabaseResult<Option<Product>> {
        let products = self.products.read().await;
        Ok(products.iter().find(|p| p.id == id).cloned())
    }

    async fn create(&self, product: &NewProduct) -> DatabaseResult<Product> {
        let mut products = self.products.write().await;
        // Strictly increasing timestamps keep creation order observable
        let now = products
            .last()
            .map(|p| (p.created_at + Duration::microseconds(1)).max(Utc::now()))
            .unwrap_or_else(Utc::now);
        let product = Product {
            id: Uuid::new_v4(),
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price,
            image: product.image.clone(),
            brand: product.brand.clone(),
            category: product.category.clone(),
            in_stock: product.in_stock,
            rating: product.rating,
            created_at: now,
            updated_at: now,
        };
        products.push(product.clone());
        Ok(product)
    }

    async fn update(&self, id: Uuid, update: &ProductUpdate) -> DatabaseResult<Option<Product>> {
        let mut products = self.products.write().await;
        let Some(product) = products.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        update.apply_to(product);
        product.updated_at = Utc::now();
        Ok(Some(product.clone()))
    }

    async fn delete(&self, id: Uuid) -> DatabaseResult<bool> {
        let mut products = self.products.write().await;
        let before = products.len();
        products.retain(|p| p.id != id);
        Ok(products.len() != before)
    }

    async fn count(&self) -> DatabaseResult<i64> {
        Ok(self.products.read().await.len() as i64)
    }

    async fn existing_ids(&self, ids: &[Uuid]) -> DatabaseResult<Vec<Uuid>> {
        let products = self.products.read().await;
        Ok(ids
            .iter()
            .filter(|id| products.iter().any(|p| p.id == **id))
            .copied()
            .collect())
    }
}

/// Orders with their lines; product and owner details are resolved on read
#[derive(Clone)]
pub struct MemoryOrderStore {
    orders: Arc<RwLock<Vec<(Order, Vec<OrderItem>)>>>,
    products: MemoryProductStore,
    users: Arc<dyn UserStore>,
}

impl MemoryOrderStore {
    pub fn new(products: MemoryProductStore, users: Arc<dyn UserStore>) -> Self {
        Self {
            orders: Arc::new(RwLock::new(Vec::new())),
            products,
            users,
        }
    }

    async fn detail(&self, order: &Order, items: &[OrderItem]) -> DatabaseResult<OrderDetail> {
        let user = self.users.find_by_id(order.user_id).await?.map(|u| OrderUser {
            id: u.id,
            username: u.username,
        });

        let mut lines = Vec::with_capacity(items.len());
        for item in items {
            let product = match item.product_id {
                Some(id) => self.products.find(id).await?,
                None => None,
            };
            let mut item = item.clone();
            // Mirrors ON DELETE SET NULL
            if product.is_none() {
                item.product_id = None;
            }
            lines.push(OrderItemDetail { item, product });
        }

        Ok(OrderDetail {
            order: order.clone(),
            user,
            items: lines,
        })
    }

    /// Apply `change` to the order, `None` if missing or `change` refuses
    async fn modify(
        &self,
        id: Uuid,
        change: impl FnOnce(&mut Order) -> bool + Send,
    ) -> DatabaseResult<Option<Order>> {
        let mut orders = self.orders.write().await;
        let Some((order, _)) = orders.iter_mut().find(|(o, _)| o.id == id) else {
            return Ok(None);
        };
        if !change(order) {
            return Ok(None);
        }
        order.updated_at = Utc::now();
        Ok(Some(order.clone()))
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn create(&self, new_order: &NewOrder) -> DatabaseResult<OrderDetail> {
        let (order, items) = {
            let mut orders = self.orders.write().await;
            let now = orders
                .last()
                .map(|(o, _)| (o.created_at + Duration::microseconds(1)).max(Utc::now()))
                .unwrap_or_else(Utc::now);

            let order = Order {
                id: Uuid::new_v4(),
                user_id: new_order.user_id,
                status: OrderStatus::Pending,
                total: new_order.total,
                payment_id: None,
                gateway_order_id: None,
                shipping_address: new_order.shipping_address.clone(),
                created_at: now,
                updated_at: now,
            };
            let items: Vec<OrderItem> = new_order
                .items
                .iter()
                .map(|line| OrderItem {
                    id: Uuid::new_v4(),
                    order_id: order.id,
                    product_id: Some(line.product_id),
                    quantity: line.quantity,
                    price: line.price,
                    created_at: now,
                })
                .collect();

            orders.push((order.clone(), items.clone()));
            (order, items)
        };

        self.detail(&order, &items).await
    }

    async fn list(&self, owner: Option<Uuid>) -> DatabaseResult<Vec<OrderDetail>> {
        let snapshot: Vec<(Order, Vec<OrderItem>)> = {
            let orders = self.orders.read().await;
            orders
                .iter()
                .rev()
                .filter(|(o, _)| owner.is_none_or(|owner| o.user_id == owner))
                .cloned()
                .collect()
        };

        let mut details = Vec::with_capacity(snapshot.len());
        for (order, items) in &snapshot {
            details.push(self.detail(order, items).await?);
        }
        Ok(details)
    }

    async fn find(&self, id: Uuid) -> DatabaseResult<Option<OrderDetail>> {
        let found = {
            let orders = self.orders.read().await;
            orders.iter().find(|(o, _)| o.id == id).cloned()
        };

        match found {
            Some((order, items)) => Ok(Some(self.detail(&order, &items).await?)),
            None => Ok(None),
        }
    }

    async fn update_status(&self, id: Uuid, status: OrderStatus) -> DatabaseResult<Option<Order>> {
        self.modify(id, |order| {
            order.status = status;
            true
        })
        .await
    }

    async fn attach_gateway_order(
        &self,
        id: Uuid,
        gateway_order_id: &str,
    ) -> DatabaseResult<Option<Order>> {
        let gateway_order_id = gateway_order_id.to_string();
        self.modify(id, move |order| {
            if !order.awaiting_payment() {
                return false;
            }
            order.gateway_order_id = Some(gateway_order_id);
            true
        })
        .await
    }

    async fn record_payment(
        &self,
        id: Uuid,
        gateway_order_id: &str,
        payment_id: &str,
    ) -> DatabaseResult<Option<Order>> {
        let gateway_order_id = gateway_order_id.to_string();
        let payment_id = payment_id.to_string();
        self.modify(id, move |order| {
            if !order.awaiting_payment()
                || order.gateway_order_id.as_deref() != Some(gateway_order_id.as_str())
            {
                return false;
            }
            order.payment_id = Some(payment_id);
            order.status = OrderStatus::Processing;
            true
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use auth::{models::NewUser, repositories::MemoryUserStore};

    use super::*;
    use crate::models::{NewOrderItem, ShippingAddress};

    fn new_product(name: &str, price: f64) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            description: None,
            price,
            image: None,
            brand: Some("Dabur".to_string()),
            category: None,
            in_stock: true,
            rating: 0.0,
        }
    }

    async fn fixture() -> (MemoryProductStore, MemoryOrderStore, Uuid) {
        let users = MemoryUserStore::new();
        let user = users
            .create(&NewUser {
                username: "meera".to_string(),
                email: "meera@example.com".to_string(),
                password_hash: "hash".to_string(),
                is_admin: false,
            })
            .await
            .unwrap();
        let products = MemoryProductStore::new();
        let orders = MemoryOrderStore::new(products.clone(), Arc::new(users));
        (products, orders, user.id)
    }

    #[tokio::test]
    async fn test_products_listed_in_creation_order() {
        let store = MemoryProductStore::new();
        for name in ["first", "second", "third"] {
            store.create(&new_product(name, 1.0)).await.unwrap();
        }

        let names: Vec<String> = store
            .list(&ProductQuery::default())
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, ["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_order_survives_product_deletion() {
        let (products, orders, user_id) = fixture().await;
        let product = products.create(&new_product("Amla Juice", 150.0)).await.unwrap();

        let created = orders
            .create(&NewOrder {
                user_id,
                total: 300.0,
                shipping_address: ShippingAddress::default(),
                items: vec![NewOrderItem {
                    product_id: product.id,
                    quantity: 2,
                    price: 150.0,
                }],
            })
            .await
            .unwrap();
        assert_eq!(created.user.as_ref().unwrap().username, "meera");
        assert_eq!(created.items[0].product.as_ref().unwrap().id, product.id);

        assert!(products.delete(product.id).await.unwrap());

        let reloaded = orders.find(created.order.id).await.unwrap().unwrap();
        assert_eq!(reloaded.items.len(), 1);
        assert_eq!(reloaded.items[0].item.price, 150.0);
        assert!(reloaded.items[0].product.is_none());
        assert!(reloaded.items[0].item.product_id.is_none());
    }

    #[tokio::test]
    async fn test_list_filters_by_owner_newest_first() {
        let (products, orders, user_id) = fixture().await;
        let product = products.create(&new_product("Neem", 10.0)).await.unwrap();
        let order = |user_id| NewOrder {
            user_id,
            total: 10.0,
            shipping_address: ShippingAddress::default(),
            items: vec![NewOrderItem {
                product_id: product.id,
                quantity: 1,
                price: 10.0,
            }],
        };

        let first = orders.create(&order(user_id)).await.unwrap();
        let other = orders.create(&order(Uuid::new_v4())).await.unwrap();
        let second = orders.create(&order(user_id)).await.unwrap();

        let mine: Vec<Uuid> = orders
            .list(Some(user_id))
            .await
            .unwrap()
            .iter()
            .map(|d| d.order.id)
            .collect();
        assert_eq!(mine, [second.order.id, first.order.id]);

        let all = orders.list(None).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[1].order.id, other.order.id);
        assert!(all[1].user.is_none());
    }

    #[tokio::test]
    async fn test_record_payment_moves_to_processing() {
        let (products, orders, user_id) = fixture().await;
        let product = products.create(&new_product("Neem", 10.0)).await.unwrap();
        let created = orders
            .create(&NewOrder {
                user_id,
                total: 10.0,
                shipping_address: ShippingAddress::default(),
                items: vec![NewOrderItem {
                    product_id: product.id,
                    quantity: 1,
                    price: 10.0,
                }],
            })
            .await
            .unwrap();

        let id = created.order.id;

        // Unbound orders cannot be paid
        assert!(orders.record_payment(id, "order_gw1", "pay_123").await.unwrap().is_none());

        orders.attach_gateway_order(id, "order_gw1").await.unwrap().unwrap();
        assert!(orders.record_payment(id, "order_gw2", "pay_123").await.unwrap().is_none());

        let paid = orders
            .record_payment(id, "order_gw1", "pay_123")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(paid.status, OrderStatus::Processing);
        assert_eq!(paid.payment_id.as_deref(), Some("pay_123"));
        assert_eq!(paid.gateway_order_id.as_deref(), Some("order_gw1"));

        // Paid once; neither a replay nor a rebind applies
        assert!(orders.record_payment(id, "order_gw1", "pay_456").await.unwrap().is_none());
        assert!(orders.attach_gateway_order(id, "order_gw3").await.unwrap().is_none());

        assert!(
            orders
                .record_payment(Uuid::new_v4(), "order_gw1", "pay_x")
                .await
                .unwrap()
                .is_none()
        );
    }
}
