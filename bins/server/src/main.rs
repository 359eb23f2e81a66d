//! ZorgMatch API Server
//!
//! Main entry point for the ZorgMatch backend service.

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use zorgmatch_api::{AppState, BillingSettings, create_router};
use zorgmatch_core::payment::{PaymentProvider, StripeClient};
use zorgmatch_db::connect;
use zorgmatch_shared::{AppConfig, JwtConfig, JwtService};

/// Buffered chat frames per subscriber before slow clients start
/// skipping.
const CHAT_CHANNEL_CAPACITY: usize = 256;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "zorgmatch=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Connect to database
    let db = connect(&config.database.url).await?;
    info!("Connected to database");

    // Create JWT service
    let jwt_config = JwtConfig {
        secret: config.jwt.secret.clone(),
        #[allow(clippy::cast_possible_wrap)]
        access_token_expires_minutes: (config.jwt.access_token_expiry_secs / 60) as i64,
    };
    let jwt_service = JwtService::new(jwt_config);

    // Wire up the payment processor when configured; billing endpoints
    // answer 503 without it.
    let (payments, billing) = match &config.stripe {
        Some(stripe) => {
            info!(api_base = %stripe.api_base, "Payment processor configured");
            let client: Arc<dyn PaymentProvider> = Arc::new(StripeClient::new(
                stripe.secret_key.clone(),
                stripe.api_base.clone(),
            ));
            (
                Some(client),
                BillingSettings {
                    webhook_secret: stripe.webhook_secret.clone(),
                    subscription_price_cents: stripe.subscription_price_cents,
                    currency: stripe.currency.clone(),
                },
            )
        }
        None => {
            info!("Payment processor not configured, billing endpoints disabled");
            (
                None,
                BillingSettings {
                    webhook_secret: None,
                    subscription_price_cents: 1499,
                    currency: "eur".to_string(),
                },
            )
        }
    };

    let (chat, _) = broadcast::channel(CHAT_CHANNEL_CAPACITY);

    // Create application state
    let state = AppState {
        db: Arc::new(db),
        jwt_service: Arc::new(jwt_service),
        payments,
        billing,
        chat,
    };

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
