//! Billing endpoints: credit purchases, subscriptions, and the
//! transaction log.
//!
//! The payment processor stays authoritative on money movement. Credit
//! purchases are only applied after re-fetching the intent from the
//! processor and checking it succeeded for the calling user; nothing a
//! client sends is trusted for amounts.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, middleware::AuthUser, routes::error_response};
use zorgmatch_core::billing::{
    BillingError, IntentMetadata, SubscriptionStatus, amount_from_minor_units,
    confirmable_metadata, purchase_amount,
};
use zorgmatch_core::payment::{
    CreateCustomerRequest, CreateIntentRequest, CreateSubscriptionRequest, PaymentError,
    PaymentProvider,
};
use zorgmatch_db::{
    LedgerError, LedgerRepository, UserRepository,
    entities::sea_orm_active_enums::{TransactionStatus, TransactionType},
    entities::{transactions, users},
};
use zorgmatch_shared::AppError;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/create-payment-intent", post(create_payment_intent))
        .route("/confirm-payment", post(confirm_payment))
        .route("/create-subscription", post(create_subscription))
        .route("/cancel-subscription", post(cancel_subscription))
        .route("/transactions", get(list_transactions))
}

fn provider(state: &AppState) -> Result<Arc<dyn PaymentProvider>, AppError> {
    state.payments.clone().ok_or(AppError::PaymentUnavailable)
}

fn payment_error(err: &PaymentError) -> AppError {
    AppError::ExternalService(err.to_string())
}

fn billing_error(err: &BillingError) -> AppError {
    match err {
        BillingError::InvalidCredits(_)
        | BillingError::InvalidPrice(_)
        | BillingError::AmountOutOfRange(_) => AppError::Validation(err.to_string()),
        BillingError::MetadataInvalid(_)
        | BillingError::IntentNotSucceeded(_)
        | BillingError::IntentOwnerMismatch => AppError::PaymentNotCompleted(err.to_string()),
    }
}

fn ledger_error(err: LedgerError) -> AppError {
    match err {
        LedgerError::UserNotFound(id) => AppError::NotFound(format!("User not found: {id}")),
        LedgerError::InsufficientCredits { required, current } => {
            AppError::InsufficientCredits { required, current }
        }
        LedgerError::InvalidCredits(n) => {
            AppError::Validation(format!("Credit amount must be positive, got {n}"))
        }
        LedgerError::Database(e) => AppError::Database(e.to_string()),
    }
}

#[derive(Debug, Deserialize)]
struct CreateIntentBody {
    credits: i32,
    price: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateIntentResponse {
    client_secret: Option<String>,
    /// Echoed price in currency units; the processor holds minor units.
    amount: Decimal,
    credits: i32,
}

/// POST /api/create-payment-intent
async fn create_payment_intent(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<CreateIntentBody>,
) -> Response {
    let payments = match provider(&state) {
        Ok(p) => p,
        Err(e) => return error_response(&e),
    };

    let amount = match purchase_amount(body.credits, body.price) {
        Ok(amount) => amount,
        Err(e) => return error_response(&billing_error(&e)),
    };

    let request = CreateIntentRequest {
        amount,
        currency: state.billing.currency.clone(),
        metadata: IntentMetadata {
            user_id: auth.user_id(),
            credits: body.credits,
        },
    };

    match payments.create_intent(request).await {
        Ok(intent) => Json(CreateIntentResponse {
            client_secret: intent.client_secret,
            amount: amount_from_minor_units(intent.amount),
            credits: body.credits,
        })
        .into_response(),
        Err(e) => error_response(&payment_error(&e)),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfirmPaymentBody {
    payment_intent_id: String,
}

#[derive(Debug, Serialize)]
struct ConfirmPaymentResponse {
    success: bool,
    credits: i32,
}

/// POST /api/confirm-payment
///
/// Re-fetches the intent from the processor and only credits when it
/// succeeded, carries valid metadata, and belongs to the caller.
/// Confirming the same intent twice returns the same balance without
/// crediting again.
async fn confirm_payment(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<ConfirmPaymentBody>,
) -> Response {
    let payments = match provider(&state) {
        Ok(p) => p,
        Err(e) => return error_response(&e),
    };

    let intent = match payments.retrieve_intent(&body.payment_intent_id).await {
        Ok(intent) => intent,
        Err(e) => return error_response(&payment_error(&e)),
    };

    let metadata = match confirmable_metadata(&intent, auth.user_id()) {
        Ok(metadata) => metadata,
        Err(e) => return error_response(&billing_error(&e)),
    };

    let ledger = LedgerRepository::new((*state.db).clone());
    let outcome = ledger
        .apply_credit_purchase(
            auth.user_id(),
            &intent.id,
            amount_from_minor_units(intent.amount),
            metadata.credits,
            &format!("Purchase of {} credits", metadata.credits),
        )
        .await;

    match outcome {
        Ok(outcome) => {
            if outcome.already_applied {
                tracing::info!(
                    intent_id = %intent.id,
                    "replayed payment confirmation, no credits applied"
                );
            }
            Json(ConfirmPaymentResponse {
                success: true,
                credits: outcome.credits_after,
            })
            .into_response()
        }
        Err(e) => error_response(&ledger_error(e)),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateSubscriptionResponse {
    subscription_id: String,
    client_secret: Option<String>,
}

/// POST /api/create-subscription
async fn create_subscription(State(state): State<AppState>, auth: AuthUser) -> Response {
    let payments = match provider(&state) {
        Ok(p) => p,
        Err(e) => return error_response(&e),
    };

    let users = UserRepository::new((*state.db).clone());
    let user = match users.find_by_id(auth.user_id()).await {
        Ok(Some(user)) => user,
        Ok(None) => return error_response(&AppError::NotFound("User not found".to_string())),
        Err(e) => return error_response(&AppError::Database(e.to_string())),
    };

    if user.stripe_subscription_id.is_some()
        && SubscriptionStatus::parse(&user.subscription_status).is_active()
    {
        return error_response(&AppError::AlreadySubscribed);
    }

    let customer_id = match ensure_customer(&payments, &users, &user).await {
        Ok(id) => id,
        Err(e) => return error_response(&e),
    };

    let request = CreateSubscriptionRequest {
        customer_id,
        price_cents: state.billing.subscription_price_cents,
        currency: state.billing.currency.clone(),
        product_name: "ZorgMatch Premium Subscription".to_string(),
        product_description: "Unlimited applications for independent contractors".to_string(),
    };

    let subscription = match payments.create_subscription(request).await {
        Ok(sub) => sub,
        Err(e) => return error_response(&payment_error(&e)),
    };

    if let Err(e) = users
        .set_subscription(user.id, &subscription.id, subscription.status.as_str())
        .await
    {
        return error_response(&AppError::Database(e.to_string()));
    }

    Json(CreateSubscriptionResponse {
        subscription_id: subscription.id,
        client_secret: subscription.client_secret,
    })
    .into_response()
}

/// Returns the user's processor customer id, creating the customer on
/// first use and persisting the id.
async fn ensure_customer(
    payments: &Arc<dyn PaymentProvider>,
    users: &UserRepository,
    user: &users::Model,
) -> Result<String, AppError> {
    if let Some(id) = &user.stripe_customer_id {
        return Ok(id.clone());
    }

    let customer = payments
        .create_customer(CreateCustomerRequest {
            email: user.email.clone(),
            name: format!("{} {}", user.first_name, user.last_name),
            user_id: user.id,
        })
        .await
        .map_err(|e| payment_error(&e))?;

    users
        .set_stripe_customer(user.id, &customer.id)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(customer.id)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CancelSubscriptionResponse {
    success: bool,
    message: String,
    cancel_at: Option<i64>,
}

/// POST /api/cancel-subscription
///
/// Schedules cancellation at the end of the billing period; access
/// continues until the processor reports the subscription deleted.
async fn cancel_subscription(State(state): State<AppState>, auth: AuthUser) -> Response {
    let payments = match provider(&state) {
        Ok(p) => p,
        Err(e) => return error_response(&e),
    };

    let users = UserRepository::new((*state.db).clone());
    let user = match users.find_by_id(auth.user_id()).await {
        Ok(Some(user)) => user,
        Ok(None) => return error_response(&AppError::NotFound("User not found".to_string())),
        Err(e) => return error_response(&AppError::Database(e.to_string())),
    };

    let Some(subscription_id) = user.stripe_subscription_id else {
        return error_response(&AppError::NoActiveSubscription);
    };

    let subscription = match payments.cancel_at_period_end(&subscription_id).await {
        Ok(sub) => sub,
        Err(e) => return error_response(&payment_error(&e)),
    };

    if let Err(e) = users
        .update_subscription_status(user.id, subscription.status.as_str())
        .await
    {
        return error_response(&AppError::Database(e.to_string()));
    }

    Json(CancelSubscriptionResponse {
        success: true,
        message: "Subscription will be canceled at the end of the billing period".to_string(),
        cancel_at: subscription.cancel_at,
    })
    .into_response()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TransactionResponse {
    id: Uuid,
    #[serde(rename = "type")]
    transaction_type: String,
    amount: Decimal,
    credits: i32,
    description: String,
    status: String,
    stripe_payment_intent_id: Option<String>,
    created_at: chrono::DateTime<chrono::FixedOffset>,
}

pub(crate) const fn tx_type_to_string(tx_type: &TransactionType) -> &'static str {
    match tx_type {
        TransactionType::CreditPurchase => "credit_purchase",
        TransactionType::ApplicationCredit => "application_credit",
        TransactionType::SubscriptionPayment => "subscription_payment",
    }
}

pub(crate) const fn tx_status_to_string(status: &TransactionStatus) -> &'static str {
    match status {
        TransactionStatus::Pending => "pending",
        TransactionStatus::Completed => "completed",
        TransactionStatus::Failed => "failed",
    }
}

impl From<transactions::Model> for TransactionResponse {
    fn from(tx: transactions::Model) -> Self {
        Self {
            id: tx.id,
            transaction_type: tx_type_to_string(&tx.transaction_type).to_string(),
            amount: tx.amount,
            credits: tx.credits,
            description: tx.description,
            status: tx_status_to_string(&tx.status).to_string(),
            stripe_payment_intent_id: tx.stripe_payment_intent_id,
            created_at: tx.created_at,
        }
    }
}

/// GET /api/transactions
async fn list_transactions(State(state): State<AppState>, auth: AuthUser) -> Response {
    let ledger = LedgerRepository::new((*state.db).clone());

    match ledger.list_for_user(auth.user_id()).await {
        Ok(rows) => {
            let items: Vec<TransactionResponse> =
                rows.into_iter().map(TransactionResponse::from).collect();
            Json(items).into_response()
        }
        Err(e) => error_response(&AppError::Database(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode, header::AUTHORIZATION},
        middleware::from_fn_with_state,
    };
    use http_body_util::BodyExt;
    use sea_orm::DatabaseConnection;
    use std::collections::HashMap;
    use tokio::sync::broadcast;
    use tower::ServiceExt;
    use zorgmatch_core::payment::{Customer, IntentStatus, PaymentIntent, ProcessorSubscription};
    use zorgmatch_shared::{JwtConfig, JwtService};

    use crate::{BillingSettings, middleware::auth_middleware};

    /// In-memory provider serving canned responses. Endpoints that never
    /// reach the database can run against a disconnected pool.
    struct FakeProvider {
        intent: PaymentIntent,
    }

    impl FakeProvider {
        fn with_intent(intent: PaymentIntent) -> Self {
            Self { intent }
        }
    }

    #[async_trait::async_trait]
    impl PaymentProvider for FakeProvider {
        async fn create_intent(
            &self,
            request: CreateIntentRequest,
        ) -> Result<PaymentIntent, PaymentError> {
            let mut intent = self.intent.clone();
            intent.amount = request.amount;
            intent.metadata = request.metadata.to_pairs().into_iter().collect();
            Ok(intent)
        }

        async fn retrieve_intent(&self, _intent_id: &str) -> Result<PaymentIntent, PaymentError> {
            Ok(self.intent.clone())
        }

        async fn create_customer(
            &self,
            _request: CreateCustomerRequest,
        ) -> Result<Customer, PaymentError> {
            Ok(Customer {
                id: "cus_test".to_string(),
            })
        }

        async fn create_subscription(
            &self,
            _request: CreateSubscriptionRequest,
        ) -> Result<ProcessorSubscription, PaymentError> {
            Err(PaymentError::Transport("not under test".to_string()))
        }

        async fn cancel_at_period_end(
            &self,
            _subscription_id: &str,
        ) -> Result<ProcessorSubscription, PaymentError> {
            Err(PaymentError::Transport("not under test".to_string()))
        }
    }

    fn intent(status: &str, metadata: HashMap<String, String>) -> PaymentIntent {
        PaymentIntent {
            id: "pi_test".to_string(),
            client_secret: Some("pi_test_secret".to_string()),
            status: IntentStatus::parse(status),
            amount: 750,
            currency: "eur".to_string(),
            metadata,
        }
    }

    fn test_state(payments: Option<Arc<dyn PaymentProvider>>) -> AppState {
        let (chat, _) = broadcast::channel(8);
        AppState {
            db: Arc::new(DatabaseConnection::Disconnected),
            jwt_service: Arc::new(JwtService::new(JwtConfig::default())),
            payments,
            billing: BillingSettings {
                webhook_secret: None,
                subscription_price_cents: 1499,
                currency: "eur".to_string(),
            },
            chat,
        }
    }

    fn test_app(state: AppState) -> Router {
        Router::new()
            .merge(routes())
            .layer(from_fn_with_state(state.clone(), auth_middleware))
            .with_state(state)
    }

    fn auth_header(state: &AppState, user_id: Uuid) -> String {
        let token = state
            .jwt_service
            .generate_access_token(user_id, "zzper")
            .expect("should generate token");
        format!("Bearer {token}")
    }

    fn post_json(uri: &str, auth: Option<&str>, body: &str) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", "application/json");
        if let Some(auth) = auth {
            builder = builder.header(AUTHORIZATION, auth);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    #[tokio::test]
    async fn test_create_payment_intent_requires_auth() {
        let app = test_app(test_state(None));

        let response = app
            .oneshot(post_json(
                "/create-payment-intent",
                None,
                r#"{"credits":5,"price":"7.50"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_create_payment_intent_without_processor_is_503() {
        let state = test_state(None);
        let auth = auth_header(&state, Uuid::new_v4());
        let app = test_app(state);

        let response = app
            .oneshot(post_json(
                "/create-payment-intent",
                Some(&auth),
                r#"{"credits":5,"price":"7.50"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "PAYMENT_UNAVAILABLE");
    }

    #[tokio::test]
    async fn test_create_payment_intent_rejects_bad_input() {
        let provider: Arc<dyn PaymentProvider> =
            Arc::new(FakeProvider::with_intent(intent("succeeded", HashMap::new())));
        let state = test_state(Some(provider));
        let auth = auth_header(&state, Uuid::new_v4());
        let app = test_app(state);

        for body in [
            r#"{"credits":0,"price":"7.50"}"#,
            r#"{"credits":-3,"price":"7.50"}"#,
            r#"{"credits":5,"price":"0"}"#,
            r#"{"credits":5,"price":"-1"}"#,
        ] {
            let response = app
                .clone()
                .oneshot(post_json("/create-payment-intent", Some(&auth), body))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");
        }
    }

    #[tokio::test]
    async fn test_create_payment_intent_returns_client_secret() {
        let provider: Arc<dyn PaymentProvider> =
            Arc::new(FakeProvider::with_intent(intent("requires_payment_method", HashMap::new())));
        let state = test_state(Some(provider));
        let auth = auth_header(&state, Uuid::new_v4());
        let app = test_app(state);

        let response = app
            .oneshot(post_json(
                "/create-payment-intent",
                Some(&auth),
                r#"{"credits":5,"price":"7.50"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["clientSecret"], "pi_test_secret");
        // The processor carries 750 minor units; the response echoes the
        // price in currency units.
        assert_eq!(json["amount"], "7.50");
        assert_eq!(json["credits"], 5);
    }

    #[tokio::test]
    async fn test_confirm_payment_rejects_unsucceeded_intent() {
        let provider: Arc<dyn PaymentProvider> =
            Arc::new(FakeProvider::with_intent(intent("processing", HashMap::new())));
        let state = test_state(Some(provider));
        let auth = auth_header(&state, Uuid::new_v4());
        let app = test_app(state);

        let response = app
            .oneshot(post_json(
                "/confirm-payment",
                Some(&auth),
                r#"{"paymentIntentId":"pi_test"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "PAYMENT_NOT_COMPLETED");
    }

    #[tokio::test]
    async fn test_confirm_payment_rejects_foreign_intent() {
        let mut metadata = HashMap::new();
        metadata.insert("userId".to_string(), Uuid::new_v4().to_string());
        metadata.insert("credits".to_string(), "5".to_string());

        let provider: Arc<dyn PaymentProvider> =
            Arc::new(FakeProvider::with_intent(intent("succeeded", metadata)));
        let state = test_state(Some(provider));
        // Caller differs from the user baked into the intent metadata.
        let auth = auth_header(&state, Uuid::new_v4());
        let app = test_app(state);

        let response = app
            .oneshot(post_json(
                "/confirm-payment",
                Some(&auth),
                r#"{"paymentIntentId":"pi_test"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "PAYMENT_NOT_COMPLETED");
    }
}
