//! bakehouse HTTP Server
//!
//! Axum-based edge handlers gluing the storefront checkout to the payment
//! provider, the spreadsheet sink, and the calendar feed. Every handler is a
//! stateless request/response transform; the only durable record of anything
//! lives in the sink.

mod config;
mod handlers;
mod sink;
mod state;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bakehouse_core::UnsubscribeTokens;
use bakehouse_payments::StripeGateway;

use crate::config::ServerConfig;
use crate::handlers::{
    create_session, health_check, list_slots, newsletter_signup, stripe_webhook, unsubscribe,
};
use crate::sink::SinkClient;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();

    let config = Arc::new(ServerConfig::from_env());
    let http = reqwest::Client::new();

    // Payment gateway
    let stripe = StripeGateway::from_env().ok();
    if stripe.is_some() {
        tracing::info!("✓ Stripe configured");
    } else {
        tracing::warn!("⚠ Stripe not configured - checkout disabled");
        tracing::warn!("  Set STRIPE_SECRET_KEY and STRIPE_WEBHOOK_SECRET in .env");
    }

    // Spreadsheet sink
    let sink = config
        .sink_url
        .as_ref()
        .map(|url| Arc::new(SinkClient::new(http.clone(), url)));
    if sink.is_some() {
        tracing::info!("✓ Sink configured");
    } else {
        tracing::warn!("⚠ SINK_URL not set - orders and signups will not be forwarded");
    }

    // Unsubscribe tokens
    let tokens = config
        .unsubscribe_secret
        .as_ref()
        .map(|secret| Arc::new(UnsubscribeTokens::new(secret.clone())));
    if tokens.is_none() {
        tracing::warn!("⚠ UNSUBSCRIBE_SECRET not set - unsubscribe links disabled");
    }

    if config.slots_feed_url.is_some() {
        tracing::info!("✓ Calendar feed configured");
    }

    // Build application state
    let state = AppState {
        config: config.clone(),
        stripe: stripe.map(Arc::new),
        sink,
        tokens,
        http,
    };

    // CORS: mirror the Origin back only when it passes the allow-list.
    let cors_config = config.clone();
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin, _| {
            origin
                .to_str()
                .is_ok_and(|o| cors_config.origin_allowed(o))
        }))
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router
    let app = Router::new()
        .route("/health", get(health_check))
        .route("/", post(newsletter_signup))
        .route("/session", post(create_session))
        .route("/webhook", post(stripe_webhook))
        .route("/slots", get(list_slots))
        .route("/unsubscribe", get(unsubscribe))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;

    tracing::info!("🥖 bakehouse server running on http://{}", config.bind_addr);
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health      - Health check");
    tracing::info!("  POST /            - Newsletter signup");
    tracing::info!("  POST /session     - Create payment session");
    tracing::info!("  POST /webhook     - Payment-provider webhook");
    tracing::info!("  GET  /slots       - Upcoming fulfillment slots");
    tracing::info!("  GET  /unsubscribe - Unsubscribe link target");

    axum::serve(listener, app).await?;

    Ok(())
}
