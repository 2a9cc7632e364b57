//! Shri Ayu Wellness storefront API
//!
//! Composes the authentication routes with the catalog, order, payment and
//! notification endpoints over PostgreSQL, and serves uploaded product
//! images from disk.

use std::{net::SocketAddr, sync::Arc};

use anyhow::{Context, Result};
use axum::{
    Router,
    http::{HeaderValue, Method, header},
};
use tokio::{net::TcpListener, signal};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

use auth::{
    AuthService, JwtConfig, JwtService, rate_limiter::RateLimiter,
    repositories::PgUserRepository,
};
use common::database::{DatabaseConfig, health_check, init_pool, run_migrations};

pub mod config;
pub mod error;
pub mod mailer;
pub mod models;
pub mod payment;
pub mod repositories;
pub mod routes;
pub mod seed;
pub mod state;
pub mod uploads;

#[cfg(test)]
pub(crate) mod testing;

pub use state::AppState;

use crate::{
    config::Settings,
    mailer::{HttpMailRelay, MailerConfig, Notifier},
    payment::{RazorpayClient, RazorpayConfig},
    repositories::{PgOrderRepository, PgProductRepository},
    uploads::ImageStore,
};

/// Wrap the routes in the CORS and tracing layers
pub fn build_app(state: AppState, cors_origin: &str) -> Result<Router> {
    let origin: HeaderValue = cors_origin
        .parse()
        .with_context(|| format!("Invalid CORS origin: {}", cors_origin))?;

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true);

    Ok(routes::create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http()))
}

/// Start the storefront server and run until a shutdown signal arrives
pub async fn run() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting storefront API");

    let settings = Settings::load().context("Failed to load settings")?;

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    if health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    run_migrations(&pool).await?;

    let jwt_service = JwtService::new(JwtConfig::from_env()?);
    let auth = AuthService::new(
        Arc::new(PgUserRepository::new(pool.clone())),
        jwt_service,
        RateLimiter::default(),
    );

    let products = Arc::new(PgProductRepository::new(pool.clone()));
    seed::bootstrap(
        &auth,
        products.as_ref(),
        &settings.admin_password,
        settings.seed_sample_products,
    )
    .await?;

    let mailer_config = MailerConfig::from_env();
    let state = AppState {
        db_pool: Some(pool.clone()),
        auth,
        products,
        orders: Arc::new(PgOrderRepository::new(pool)),
        images: ImageStore::new(&settings.upload_dir),
        payments: Arc::new(RazorpayClient::new(RazorpayConfig::from_env())),
        notifier: Notifier::new(Arc::new(HttpMailRelay::new(&mailer_config)), mailer_config),
    };

    tokio::fs::create_dir_all(&settings.upload_dir)
        .await
        .with_context(|| format!("Failed to create {}", settings.upload_dir.display()))?;

    let app = build_app(state, &settings.cors_origin)?;

    let address = settings.bind_address();
    let listener = TcpListener::bind(&address).await?;
    info!("Storefront API listening on {}", address);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
