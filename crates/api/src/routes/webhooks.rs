//! Processor webhook ingestion.
//!
//! The only authentication on this endpoint is the signature header:
//! the raw body is verified against the endpoint secret before any
//! parsing. Unknown subscriptions and unhandled event types are
//! acknowledged with 200 so the processor stops retrying.

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
};
use serde_json::json;

use crate::{AppState, routes::error_response};
use zorgmatch_core::payment::{SubscriptionEvent, parse_subscription_event, verify_signature};
use zorgmatch_db::UserRepository;
use zorgmatch_shared::AppError;

pub fn routes() -> Router<AppState> {
    Router::new().route("/webhooks/stripe", post(handle_stripe_webhook))
}

/// POST /api/webhooks/stripe
async fn handle_stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(secret) = &state.billing.webhook_secret else {
        return error_response(&AppError::PaymentUnavailable);
    };

    let Some(signature) = headers
        .get("Stripe-Signature")
        .and_then(|h| h.to_str().ok())
    else {
        return bad_signature("Missing Stripe-Signature header");
    };

    let now = chrono::Utc::now().timestamp();
    if let Err(e) = verify_signature(&body, signature, secret, now) {
        tracing::warn!(error = %e, "rejected webhook");
        return bad_signature("Webhook signature verification failed");
    }

    let event = match parse_subscription_event(&body) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(error = %e, "malformed webhook payload");
            return bad_signature("Malformed webhook payload");
        }
    };

    match event {
        SubscriptionEvent::StatusChanged {
            subscription_id,
            status,
        } => {
            let users = UserRepository::new((*state.db).clone());
            match users
                .update_status_by_subscription(&subscription_id, status.as_str())
                .await
            {
                Ok(Some(user)) => {
                    tracing::info!(
                        user_id = %user.id,
                        subscription_id = %subscription_id,
                        status = %status,
                        "mirrored subscription status"
                    );
                }
                Ok(None) => {
                    // Not necessarily ours; acknowledge so the processor
                    // stops retrying.
                    tracing::warn!(
                        subscription_id = %subscription_id,
                        "webhook for unknown subscription"
                    );
                }
                Err(e) => return error_response(&AppError::Database(e.to_string())),
            }
        }
        SubscriptionEvent::Ignored => {}
    }

    Json(json!({ "received": true })).into_response()
}

fn bad_signature(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "error": "INVALID_SIGNATURE",
            "message": message,
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, http::Request};
    use hmac::{Hmac, Mac};
    use http_body_util::BodyExt;
    use sea_orm::DatabaseConnection;
    use sha2::Sha256;
    use std::sync::Arc;
    use tokio::sync::broadcast;
    use tower::ServiceExt;
    use zorgmatch_shared::{JwtConfig, JwtService};

    use crate::BillingSettings;

    const SECRET: &str = "whsec_test";

    fn test_state(webhook_secret: Option<&str>) -> AppState {
        let (chat, _) = broadcast::channel(8);
        AppState {
            db: Arc::new(DatabaseConnection::Disconnected),
            jwt_service: Arc::new(JwtService::new(JwtConfig::default())),
            payments: None,
            billing: BillingSettings {
                webhook_secret: webhook_secret.map(ToString::to_string),
                subscription_price_cents: 1499,
                currency: "eur".to_string(),
            },
            chat,
        }
    }

    fn test_app(state: AppState) -> Router {
        Router::new().merge(routes()).with_state(state)
    }

    fn sign(payload: &str, secret: &str, timestamp: i64) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(format!("{timestamp}.{payload}").as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());
        format!("t={timestamp},v1={signature}")
    }

    fn webhook_request(payload: &str, signature: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/webhooks/stripe")
            .header("Content-Type", "application/json");
        if let Some(signature) = signature {
            builder = builder.header("Stripe-Signature", signature);
        }
        builder.body(Body::from(payload.to_string())).unwrap()
    }

    #[tokio::test]
    async fn test_webhook_without_secret_is_503() {
        let app = test_app(test_state(None));

        let response = app
            .oneshot(webhook_request("{}", Some("t=1,v1=aa")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_webhook_missing_signature_is_400() {
        let app = test_app(test_state(Some(SECRET)));

        let response = app.oneshot(webhook_request("{}", None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_webhook_bad_signature_is_400() {
        let app = test_app(test_state(Some(SECRET)));
        let payload = r#"{"type":"invoice.paid","data":{"object":{}}}"#;
        let signature = sign(payload, "whsec_wrong", chrono::Utc::now().timestamp());

        let response = app
            .oneshot(webhook_request(payload, Some(&signature)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "INVALID_SIGNATURE");
    }

    #[tokio::test]
    async fn test_webhook_acknowledges_ignored_event() {
        let app = test_app(test_state(Some(SECRET)));
        let payload = r#"{"type":"invoice.paid","data":{"object":{}}}"#;
        let signature = sign(payload, SECRET, chrono::Utc::now().timestamp());

        let response = app
            .oneshot(webhook_request(payload, Some(&signature)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["received"], true);
    }

    #[tokio::test]
    async fn test_webhook_rejects_stale_timestamp() {
        let app = test_app(test_state(Some(SECRET)));
        let payload = r#"{"type":"invoice.paid","data":{"object":{}}}"#;
        let stale = chrono::Utc::now().timestamp() - 3600;
        let signature = sign(payload, SECRET, stale);

        let response = app
            .oneshot(webhook_request(payload, Some(&signature)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
