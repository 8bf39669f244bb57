//! tier-relay HTTP Server
//!
//! Axum server exposing the subscription checkout, confirmation and
//! cancellation operations for Stripe, PayPal and Paystack, plus the AI
//! completion proxy.

mod auth;
mod config;
mod cors;
mod error;
mod handlers;
mod routes;
mod state;

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use relay_core::{
    GatewayRegistry, IdentityVerifier, MemorySubscriptionStore, ProviderKind,
    StaticTokenVerifier, SubscriptionLifecycle,
};
use relay_payments::{PayPalGateway, PaystackGateway, StripeGateway};
use relay_runtime::OpenAiProxy;

use crate::auth::JwtVerifier;
use crate::config::ServerConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env();
    let http = reqwest::Client::new();

    // Payment providers; missing credentials leave the adapter unconfigured
    let mut gateways = GatewayRegistry::new();
    gateways.register(StripeGateway::from_env());
    gateways.register(PayPalGateway::from_env(http.clone()));
    gateways.register(PaystackGateway::from_env(http.clone()));

    for kind in ProviderKind::ALL {
        if gateways.is_configured(kind) {
            tracing::info!("✓ {} configured", kind);
        } else {
            tracing::warn!("⚠ {} not configured - its endpoints return 500", kind);
        }
    }

    let proxy = OpenAiProxy::from_env(http);
    if proxy.is_configured() {
        tracing::info!("✓ AI proxy configured");
    } else {
        tracing::warn!("⚠ AI proxy not configured - set OPENAI_API_KEY in .env");
    }

    let verifier: Arc<dyn IdentityVerifier> = match &config.jwt {
        Some(jwt) => Arc::new(JwtVerifier::new(jwt)),
        None => {
            tracing::warn!("⚠ AUTH_JWT_SECRET not set - all authenticated requests will be rejected");
            Arc::new(StaticTokenVerifier::new())
        }
    };

    // Records live for the life of the process
    let store = Arc::new(MemorySubscriptionStore::new());

    // Build application state
    let state = AppState {
        lifecycle: Arc::new(SubscriptionLifecycle::new(store, gateways, config.prices.clone())),
        verifier,
        proxy: Arc::new(proxy),
        cors: Arc::new(config.cors.clone()),
        app_origin: config.app_origin.as_str().into(),
    };

    let app = routes::router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 tier-relay server running on http://{}", config.bind_addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health                    - Health check");
    tracing::info!("  POST /createStripeCheckout      - Stripe checkout session");
    tracing::info!("  POST /verifyStripePayment       - Confirm Stripe payment");
    tracing::info!("  POST /createPayPalOrder         - PayPal order");
    tracing::info!("  POST /verifyPayPalPayment       - Capture PayPal order");
    tracing::info!("  POST /createPaystackTransaction - Paystack transaction");
    tracing::info!("  POST /verifyPaystackPayment     - Verify Paystack transaction");
    tracing::info!("  POST /cancelSubscription        - Cancel a subscription");
    tracing::info!("  POST /openaiProxy               - AI completion proxy");
    tracing::info!("");

    axum::serve(listener, app).await?;

    Ok(())
}
