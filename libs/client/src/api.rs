//! Typed HTTP client for the storefront API

use async_trait::async_trait;
use reqwest::{
    Client, RequestBuilder, Response,
    multipart::{Form, Part},
};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{
    error::{ClientError, ClientResult},
    models::{
        AuthResponse, CreateOrder, NotifyAdmin, Order, OrderStatus, PaymentOrder, Product,
        ProductInput, ProductQuery, User, VerifyPayment, VerifyResponse,
    },
};

/// Session endpoints used by [`crate::AuthStore`]
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> ClientResult<AuthResponse>;
    async fn register(&self, username: &str, email: &str, password: &str) -> ClientResult<AuthResponse>;
    async fn me(&self, token: &str) -> ClientResult<User>;
}

/// Endpoints driven by [`crate::CheckoutFlow`]
#[async_trait]
pub trait CheckoutApi: Send + Sync {
    /// Open a gateway order bound to the local order `order_id`
    async fn create_payment_order(&self, token: &str, order_id: Uuid, amount: f64) -> ClientResult<PaymentOrder>;
    async fn create_order(&self, token: &str, order: &CreateOrder) -> ClientResult<Order>;
    async fn verify_payment(&self, token: &str, request: &VerifyPayment) -> ClientResult<VerifyResponse>;
    async fn notify_admin(&self, request: &NotifyAdmin) -> ClientResult<()>;
}

#[derive(Deserialize)]
struct MessageBody {
    message: String,
}

#[derive(Debug, Clone)]
pub struct HttpApi {
    client: Client,
    base_url: String,
}

impl HttpApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a server-relative path such as an uploaded image
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn send<T: DeserializeOwned>(request: RequestBuilder) -> ClientResult<T> {
        let response = request.send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// Turn a non-2xx response into [`ClientError::Api`] with the server's message
    async fn check(response: Response) -> ClientResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = match response.json::<MessageBody>().await {
            Ok(body) => body.message,
            Err(_) => status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string(),
        };
        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }

    pub async fn health(&self) -> ClientResult<Value> {
        Self::send(self.client.get(self.url("/health"))).await
    }

    pub async fn list_users(&self, token: &str) -> ClientResult<Vec<User>> {
        Self::send(self.client.get(self.url("/api/users")).bearer_auth(token)).await
    }

    pub async fn list_products(&self, query: &ProductQuery) -> ClientResult<Vec<Product>> {
        Self::send(self.client.get(self.url("/api/products")).query(query)).await
    }

    pub async fn get_product(&self, id: Uuid) -> ClientResult<Product> {
        Self::send(self.client.get(self.url(&format!("/api/products/{}", id)))).await
    }

    pub async fn create_product(&self, token: &str, input: ProductInput) -> ClientResult<Product> {
        let request = self
            .client
            .post(self.url("/api/products"))
            .bearer_auth(token)
            .multipart(product_form(input));
        Self::send(request).await
    }

    pub async fn update_product(&self, token: &str, id: Uuid, input: ProductInput) -> ClientResult<Product> {
        let request = self
            .client
            .put(self.url(&format!("/api/products/{}", id)))
            .bearer_auth(token)
            .multipart(product_form(input));
        Self::send(request).await
    }

    pub async fn delete_product(&self, token: &str, id: Uuid) -> ClientResult<String> {
        let request = self
            .client
            .delete(self.url(&format!("/api/products/{}", id)))
            .bearer_auth(token);
        let body: MessageBody = Self::send(request).await?;
        Ok(body.message)
    }

    pub async fn list_orders(&self, token: &str) -> ClientResult<Vec<Order>> {
        Self::send(self.client.get(self.url("/api/orders")).bearer_auth(token)).await
    }

    pub async fn get_order(&self, token: &str, id: Uuid) -> ClientResult<Order> {
        let request = self
            .client
            .get(self.url(&format!("/api/orders/{}", id)))
            .bearer_auth(token);
        Self::send(request).await
    }

    pub async fn update_order_status(&self, token: &str, id: Uuid, status: OrderStatus) -> ClientResult<Order> {
        let request = self
            .client
            .put(self.url(&format!("/api/orders/{}/status", id)))
            .bearer_auth(token)
            .json(&json!({ "status": status }));
        Self::send(request).await
    }
}

/// Multipart body with only the fields that are set
fn product_form(input: ProductInput) -> Form {
    let mut form = Form::new();
    let texts = [
        ("name", input.name),
        ("description", input.description),
        ("price", input.price.map(|p| p.to_string())),
        ("brand", input.brand),
        ("category", input.category),
        ("inStock", input.in_stock.map(|s| s.to_string())),
        ("rating", input.rating.map(|r| r.to_string())),
    ];
    for (name, value) in texts {
        if let Some(value) = value {
            form = form.text(name, value);
        }
    }
    if let Some(image) = input.image {
        form = form.part("image", Part::bytes(image.bytes).file_name(image.file_name));
    }
    form
}

#[async_trait]
impl AuthApi for HttpApi {
    async fn login(&self, email: &str, password: &str) -> ClientResult<AuthResponse> {
        let request = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&json!({ "email": email, "password": password }));
        Self::send(request).await
    }

    async fn register(&self, username: &str, email: &str, password: &str) -> ClientResult<AuthResponse> {
        let request = self
            .client
            .post(self.url("/api/auth/register"))
            .json(&json!({ "username": username, "email": email, "password": password }));
        Self::send(request).await
    }

    async fn me(&self, token: &str) -> ClientResult<User> {
        Self::send(self.client.get(self.url("/api/auth/me")).bearer_auth(token)).await
    }
}

#[async_trait]
impl CheckoutApi for HttpApi {
    async fn create_payment_order(&self, token: &str, order_id: Uuid, amount: f64) -> ClientResult<PaymentOrder> {
        let request = self
            .client
            .post(self.url("/api/payment/create-order"))
            .bearer_auth(token)
            .json(&json!({ "orderId": order_id, "amount": amount }));
        Self::send(request).await
    }

    async fn create_order(&self, token: &str, order: &CreateOrder) -> ClientResult<Order> {
        let request = self
            .client
            .post(self.url("/api/orders"))
            .bearer_auth(token)
            .json(order);
        Self::send(request).await
    }

    async fn verify_payment(&self, token: &str, request: &VerifyPayment) -> ClientResult<VerifyResponse> {
        let request = self
            .client
            .post(self.url("/api/payment/verify"))
            .bearer_auth(token)
            .json(request);
        Self::send(request).await
    }

    async fn notify_admin(&self, request: &NotifyAdmin) -> ClientResult<()> {
        let response = self
            .client
            .post(self.url("/api/notify/admin"))
            .json(request)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}
