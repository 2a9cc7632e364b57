//! Razorpay payment gateway bridge

use std::env;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use tracing::{info, warn};

type HmacSha256 = Hmac<Sha256>;

pub const DEFAULT_GATEWAY_URL: &str = "https://api.razorpay.com";
pub const DEFAULT_CURRENCY: &str = "INR";

#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("gateway request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("gateway rejected the request with {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Razorpay credentials and endpoint
#[derive(Debug, Clone)]
pub struct RazorpayConfig {
    pub key_id: String,
    pub key_secret: String,
    pub base_url: String,
    pub currency: String,
}

impl RazorpayConfig {
    /// Create a new RazorpayConfig from environment variables
    pub fn from_env() -> Self {
        let key_id = env::var("RAZORPAY_KEY_ID").unwrap_or_else(|_| {
            warn!("RAZORPAY_KEY_ID not set, using placeholder test key");
            "rzp_test_your_key_id".to_string()
        });
        let key_secret = env::var("RAZORPAY_KEY_SECRET").unwrap_or_else(|_| {
            warn!("RAZORPAY_KEY_SECRET not set, payment verification will fail");
            "your_key_secret".to_string()
        });
        let base_url = env::var("RAZORPAY_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_GATEWAY_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let currency = env::var("PAYMENT_CURRENCY").unwrap_or_else(|_| DEFAULT_CURRENCY.to_string());

        Self {
            key_id,
            key_secret,
            base_url,
            currency,
        }
    }
}

/// Body of `POST /v1/orders`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GatewayOrderRequest {
    /// Minor currency units (paise)
    pub amount: i64,
    pub currency: String,
    pub receipt: String,
    pub payment_capture: u8,
}

/// Gateway order as returned to the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub receipt: Option<String>,
    #[serde(default)]
    pub status: String,
}

/// Payment provider operations used by the checkout endpoints
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_order(&self, request: &GatewayOrderRequest) -> Result<GatewayOrder, PaymentError>;

    /// Check the checkout widget's signature for a completed payment
    fn verify_payment(&self, gateway_order_id: &str, payment_id: &str, signature: &str) -> bool;

    /// Public key the client opens the checkout widget with
    fn key_id(&self) -> &str;

    fn currency(&self) -> &str;
}

/// Convert a major-unit amount to minor units, `None` unless strictly positive
pub fn to_minor_units(amount: f64) -> Option<i64> {
    if !amount.is_finite() || amount <= 0.0 {
        return None;
    }
    let minor = (amount * 100.0).round();
    (minor >= 1.0 && minor < i64::MAX as f64).then_some(minor as i64)
}

/// Compute the hex HMAC-SHA256 signature over `"<order_id>|<payment_id>"`
pub fn sign(secret: &str, gateway_order_id: &str, payment_id: &str) -> String {
    hex::encode(mac_for(secret, gateway_order_id, payment_id).finalize().into_bytes())
}

/// Constant-time check of a hex signature
pub fn verify_signature(secret: &str, gateway_order_id: &str, payment_id: &str, signature: &str) -> bool {
    let Ok(expected) = hex::decode(signature.trim()) else {
        return false;
    };
    mac_for(secret, gateway_order_id, payment_id)
        .verify_slice(&expected)
        .is_ok()
}

fn mac_for(secret: &str, gateway_order_id: &str, payment_id: &str) -> HmacSha256 {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes())
        .unwrap_or_else(|_| unreachable!("HMAC takes keys of any size"));
    mac.update(gateway_order_id.as_bytes());
    mac.update(b"|");
    mac.update(payment_id.as_bytes());
    mac
}

/// Razorpay REST client
#[derive(Clone)]
pub struct RazorpayClient {
    http: reqwest::Client,
    config: RazorpayConfig,
}

impl RazorpayClient {
    pub fn new(config: RazorpayConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl PaymentGateway for RazorpayClient {
    async fn create_order(&self, request: &GatewayOrderRequest) -> Result<GatewayOrder, PaymentError> {
        let url = format!("{}/v1/orders", self.config.base_url);
        let response = self
            .http
            .post(&url)
            .basic_auth(&self.config.key_id, Some(&self.config.key_secret))
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PaymentError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let order: GatewayOrder = response.json().await?;
        info!("Created gateway order {} for {} {}", order.id, order.amount, order.currency);
        Ok(order)
    }

    fn verify_payment(&self, gateway_order_id: &str, payment_id: &str, signature: &str) -> bool {
        verify_signature(&self.config.key_secret, gateway_order_id, payment_id, signature)
    }

    fn key_id(&self) -> &str {
        &self.config.key_id
    }

    fn currency(&self) -> &str {
        &self.config.currency
    }
}
