//! intent-gateway HTTP Server
//!
//! Axum-based server that fronts the payment provider's intent and refund
//! operations with a small JSON API.

mod config;
mod handlers;
mod routes;
mod state;

use gateway_payments::PaymentService;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ServerConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    let config = ServerConfig::from_env()?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.log_filter))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Initialize payments
    let provider = config.build_provider(|key| std::env::var(key).ok())?;

    match &provider {
        Some(provider) => tracing::info!("✓ Payment provider configured: {}", provider.name()),
        None => {
            tracing::warn!("⚠ Stripe not configured - payment endpoints will return 500");
            tracing::warn!("  Set STRIPE_API_KEY in .env");
        }
    }

    let state = AppState::new(provider.map(PaymentService::new));
    let app = routes::router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;

    tracing::info!("Server listening on http://{}", config.bind_addr);
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health                            - Health check");
    tracing::info!("  POST /api/v1/create_intent              - Create payment intent");
    tracing::info!("  POST /api/v1/confirm_payment_intent/{{id}} - Confirm intent");
    tracing::info!("  POST /api/v1/capture_intent/{{id}}        - Capture intent");
    tracing::info!("  POST /api/v1/create_refund/{{id}}         - Refund intent");
    tracing::info!("  GET  /api/v1/get_intents                - List intents");

    axum::serve(listener, app).await?;

    Ok(())
}
