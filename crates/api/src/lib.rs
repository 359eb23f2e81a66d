//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes
//! - Authentication middleware
//! - The webhook ingestion endpoint
//! - The WebSocket chat relay

pub mod middleware;
pub mod routes;

use axum::Router;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use zorgmatch_core::payment::PaymentProvider;
use zorgmatch_shared::JwtService;

/// Billing configuration shared across handlers.
#[derive(Clone)]
pub struct BillingSettings {
    /// Webhook endpoint signing secret. Webhook ingestion answers 503
    /// when absent.
    pub webhook_secret: Option<String>,
    /// Monthly subscription price in minor units.
    pub subscription_price_cents: i64,
    /// ISO currency code for all charges.
    pub currency: String,
}

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// JWT service for token validation.
    pub jwt_service: Arc<JwtService>,
    /// Payment processor client. `None` when payments are not configured;
    /// billing endpoints then answer 503.
    pub payments: Option<Arc<dyn PaymentProvider>>,
    /// Billing configuration.
    pub billing: BillingSettings,
    /// Chat relay channel. Every text frame received on a WebSocket
    /// connection fans out to all subscribers.
    pub chat: broadcast::Sender<String>,
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api", routes::api_routes_with_state(state.clone()))
        .merge(routes::health::routes())
        .merge(routes::chat::routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
