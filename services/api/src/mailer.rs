//! Order notification emails over an HTTP mail relay

use std::{env, fmt::Write as _, sync::Arc};

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::models::{NotifyAdminRequest, NotifyItem, ShippingAddress};

pub const DEFAULT_FROM_NAME: &str = "Ayurvedic Store";

#[derive(Error, Debug)]
pub enum MailerError {
    #[error("email relay is not configured")]
    NotConfigured,

    #[error("email relay request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("email relay rejected the message with {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Mail relay settings
#[derive(Debug, Clone)]
pub struct MailerConfig {
    /// Endpoint accepting `{from, to, subject, html}` as JSON
    pub relay_url: Option<String>,
    pub api_key: Option<String>,
    /// Store mailbox, used as sender and as the operator's inbox
    pub operator_address: String,
    pub from_name: String,
}

impl MailerConfig {
    /// Create a new MailerConfig from environment variables
    pub fn from_env() -> Self {
        let relay_url = env::var("EMAIL_RELAY_URL").ok().filter(|v| !v.is_empty());
        if relay_url.is_none() {
            warn!("EMAIL_RELAY_URL not set, order notifications will fail");
        }

        Self {
            relay_url,
            api_key: env::var("EMAIL_RELAY_API_KEY").ok().filter(|v| !v.is_empty()),
            operator_address: env::var("EMAIL_USER").unwrap_or_default(),
            from_name: env::var("EMAIL_FROM_NAME").unwrap_or_else(|_| DEFAULT_FROM_NAME.to_string()),
        }
    }

    /// `"Name" <address>` sender header
    pub fn sender(&self) -> String {
        format!("\"{}\" <{}>", self.from_name, self.operator_address)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailerError>;
}

/// Relay client posting messages as JSON with a bearer API key
#[derive(Clone)]
pub struct HttpMailRelay {
    http: reqwest::Client,
    relay_url: Option<String>,
    api_key: Option<String>,
}

impl HttpMailRelay {
    pub fn new(config: &MailerConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            relay_url: config.relay_url.clone(),
            api_key: config.api_key.clone(),
        }
    }
}

#[async_trait]
impl Mailer for HttpMailRelay {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailerError> {
        let url = self.relay_url.as_deref().ok_or(MailerError::NotConfigured)?;

        let mut request = self.http.post(url).json(message);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailerError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        info!("Mail sent to {}: {}", message.to, message.subject);
        Ok(())
    }
}

/// Sends the operator and purchaser emails for a placed order
#[derive(Clone)]
pub struct Notifier {
    mailer: Arc<dyn Mailer>,
    config: MailerConfig,
}

impl Notifier {
    pub fn new(mailer: Arc<dyn Mailer>, config: MailerConfig) -> Self {
        Self { mailer, config }
    }

    /// Email the operator; a failure here fails the notification
    pub async fn notify_admin(&self, request: &NotifyAdminRequest) -> Result<(), MailerError> {
        let message = EmailMessage {
            from: self.config.sender(),
            to: self.config.operator_address.clone(),
            subject: "New Order Notification".to_string(),
            html: render_admin_notification(request),
        };
        self.mailer.send(&message).await
    }

    /// Email the purchaser a receipt when an address is known.
    ///
    /// Returns whether a message was sent; failures are logged only.
    pub async fn notify_customer(&self, request: &NotifyAdminRequest) -> bool {
        let Some(email) = request.shipping_details.contact_email() else {
            return false;
        };
        if request.items.is_empty() {
            return false;
        }

        let message = EmailMessage {
            from: self.config.sender(),
            to: email.to_string(),
            subject: "Order Confirmation".to_string(),
            html: render_customer_receipt(&request.items, request.total),
        };

        match self.mailer.send(&message).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to send order confirmation to {}: {}", email, e);
                false
            }
        }
    }
}

/// Escape text for an HTML body
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn or_na(value: &str) -> String {
    if value.trim().is_empty() {
        "N/A".to_string()
    } else {
        escape_html(value)
    }
}

const CELL: &str = "border: 1px solid #ddd; padding: 8px;";
const CELL_RIGHT: &str = "border: 1px solid #ddd; padding: 8px; text-align: right;";

fn render_items_table(items: &[NotifyItem]) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        r#"<table style="width: 100%; border-collapse: collapse;"><thead><tr style="background-color: #f2f2f2;"><th style="{CELL} text-align: left;">Product</th><th style="{CELL_RIGHT}">Quantity</th><th style="{CELL_RIGHT}">Price (₹)</th><th style="{CELL_RIGHT}">Total (₹)</th></tr></thead><tbody>"#
    );
    for item in items {
        let _ = write!(
            html,
            r#"<tr><td style="{CELL}">{}</td><td style="{CELL_RIGHT}">{}</td><td style="{CELL_RIGHT}">{:.2}</td><td style="{CELL_RIGHT}">{:.2}</td></tr>"#,
            escape_html(&item.name),
            item.quantity,
            item.price,
            item.line_total(),
        );
    }
    html.push_str("</tbody></table>");
    html
}

fn render_shipping(address: &ShippingAddress) -> String {
    format!(
        "<h3>Shipping Details</h3>\
         <p><strong>Name:</strong> {}</p>\
         <p><strong>Address:</strong> {}, {}, {} - {}</p>\
         <p><strong>Phone:</strong> {}</p>",
        or_na(&address.full_name),
        escape_html(&address.address),
        escape_html(&address.city),
        escape_html(&address.state),
        escape_html(&address.postal_code),
        or_na(&address.phone),
    )
}

/// Operator summary: shipping block, item table and grand total
pub fn render_admin_notification(request: &NotifyAdminRequest) -> String {
    format!(
        r#"<div style="font-family: Arial, sans-serif; color: #333;"><h2 style="color: #007BFF;">New Order Received</h2>{}<h3>Ordered Items</h3>{}<h3 style="text-align: right; margin-top: 20px;">Total Amount: <span style="color: #007BFF;">₹{:.2}</span></h3></div>"#,
        render_shipping(&request.shipping_details),
        render_items_table(&request.items),
        request.total,
    )
}

/// Purchaser receipt listing every line
pub fn render_customer_receipt(items: &[NotifyItem], total: f64) -> String {
    format!(
        r#"<div style="font-family: Arial, sans-serif; color: #333;"><h3>Thank you for your order!</h3><p>Your order has been received.</p><p>Status: Received</p>{}<p><strong>Total: ₹{:.2}</strong></p></div>"#,
        render_items_table(items),
        total,
    )
}
