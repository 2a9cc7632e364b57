//! Application state shared across handlers

use std::sync::Arc;

use sqlx::PgPool;

use auth::AuthService;

use crate::{
    mailer::Notifier,
    payment::PaymentGateway,
    repositories::{OrderStore, ProductStore},
    uploads::ImageStore,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// `None` when running on in-memory stores
    pub db_pool: Option<PgPool>,
    pub auth: AuthService,
    pub products: Arc<dyn ProductStore>,
    pub orders: Arc<dyn OrderStore>,
    pub images: ImageStore,
    pub payments: Arc<dyn PaymentGateway>,
    pub notifier: Notifier,
}
