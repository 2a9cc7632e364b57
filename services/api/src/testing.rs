//! Fakes and an in-memory application for router tests

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use serde_json::Value;
use tokio::sync::Mutex;
use tower::ServiceExt;

use auth::{
    AuthService,
    jwt::{DEFAULT_TOKEN_EXPIRY, JwtConfig, JwtService},
    rate_limiter::RateLimiter,
    repositories::MemoryUserStore,
};

use crate::{
    AppState,
    mailer::{EmailMessage, Mailer, MailerConfig, MailerError, Notifier},
    payment::{GatewayOrder, GatewayOrderRequest, PaymentError, PaymentGateway, verify_signature},
    repositories::{MemoryOrderStore, MemoryProductStore},
    routes::create_router,
    uploads::ImageStore,
};

pub(crate) const GATEWAY_SECRET: &str = "test_gateway_secret";
pub(crate) const OPERATOR_ADDRESS: &str = "store@example.com";

/// Records every message, failing those addressed to `fail_for`
#[derive(Default)]
pub(crate) struct RecordingMailer {
    pub sent: Mutex<Vec<EmailMessage>>,
    pub fail_for: Option<String>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailerError> {
        if self.fail_for.as_deref() == Some(message.to.as_str()) {
            return Err(MailerError::Rejected {
                status: 503,
                body: "relay unavailable".to_string(),
            });
        }
        self.sent.lock().await.push(message.clone());
        Ok(())
    }
}

/// Gateway that answers locally and signs with [`GATEWAY_SECRET`]
#[derive(Default)]
pub(crate) struct FakeGateway {
    pub requests: Mutex<Vec<GatewayOrderRequest>>,
    pub fail: bool,
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_order(&self, request: &GatewayOrderRequest) -> Result<GatewayOrder, PaymentError> {
        if self.fail {
            return Err(PaymentError::Rejected {
                status: 401,
                body: "bad credentials".to_string(),
            });
        }

        let mut requests = self.requests.lock().await;
        requests.push(request.clone());
        Ok(GatewayOrder {
            id: format!("order_fake{}", requests.len()),
            amount: request.amount,
            currency: request.currency.clone(),
            receipt: Some(request.receipt.clone()),
            status: "created".to_string(),
        })
    }

    fn verify_payment(&self, gateway_order_id: &str, payment_id: &str, signature: &str) -> bool {
        verify_signature(GATEWAY_SECRET, gateway_order_id, payment_id, signature)
    }

    fn key_id(&self) -> &str {
        "rzp_test_fake"
    }

    fn currency(&self) -> &str {
        "INR"
    }
}

/// In-memory application plus handles to its collaborators
pub(crate) struct TestApp {
    pub router: Router,
    pub products: MemoryProductStore,
    pub mailer: Arc<RecordingMailer>,
    pub gateway: Arc<FakeGateway>,
    pub upload_dir: tempfile::TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with(RecordingMailer::default(), FakeGateway::default())
    }

    pub fn with(mailer: RecordingMailer, gateway: FakeGateway) -> Self {
        let users = MemoryUserStore::new();
        let products = MemoryProductStore::new();
        let orders = MemoryOrderStore::new(products.clone(), Arc::new(users.clone()));
        let jwt = JwtService::new(JwtConfig {
            secret: "api-test-secret".to_string(),
            token_expiry: DEFAULT_TOKEN_EXPIRY,
        });
        let mailer = Arc::new(mailer);
        let gateway = Arc::new(gateway);
        let upload_dir = tempfile::tempdir().unwrap();

        let state = AppState {
            db_pool: None,
            auth: AuthService::new(Arc::new(users), jwt, RateLimiter::default()),
            products: Arc::new(products.clone()),
            orders: Arc::new(orders),
            images: ImageStore::new(upload_dir.path()),
            payments: gateway.clone(),
            notifier: Notifier::new(
                mailer.clone(),
                MailerConfig {
                    relay_url: None,
                    api_key: None,
                    operator_address: OPERATOR_ADDRESS.to_string(),
                    from_name: "Ayurvedic Store".to_string(),
                },
            ),
        };

        Self {
            router: create_router(state),
            products,
            mailer,
            gateway,
            upload_dir,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::String(
                String::from_utf8_lossy(&bytes).into_owned(),
            ))
        };
        (status, body)
    }

    /// Register a user and return its bearer token
    pub async fn register(&self, username: &str, email: &str) -> String {
        let (status, body) = self
            .send(json_request(
                "POST",
                "/api/auth/register",
                None,
                serde_json::json!({"username": username, "email": email, "password": "secret123"}),
            ))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["token"].as_str().unwrap().to_string()
    }

    pub async fn admin_token(&self) -> String {
        self.register("admin", "admin@example.com").await
    }
}

pub(crate) fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub(crate) fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

pub(crate) const BOUNDARY: &str = "storefront-test-boundary";

/// Part of a multipart body: text field or file
pub(crate) enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a str, &'a [u8]),
}

pub(crate) fn multipart_request(method: &str, uri: &str, token: Option<&str>, parts: &[Part<'_>]) -> Request<Body> {
    let mut body: Vec<u8> = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n", name, value)
                        .as_bytes(),
                );
            }
            Part::File(name, file_name, bytes) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                        name, file_name
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
                body.extend_from_slice(b"\r\n");
            }
        }
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    let mut builder = Request::builder().method(method).uri(uri).header(
        header::CONTENT_TYPE,
        format!("multipart/form-data; boundary={}", BOUNDARY),
    );
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body)).unwrap()
}
