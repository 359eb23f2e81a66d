//! Stripe implementation of the payment provider capability.
//!
//! Talks to the Stripe REST API with form-encoded requests. Only the
//! fields this system mirrors are deserialized; everything else on the
//! wire is ignored.

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::billing::SubscriptionStatus;

use super::provider::{PaymentError, PaymentProvider};
use super::types::{
    CreateCustomerRequest, CreateIntentRequest, CreateSubscriptionRequest, Customer, PaymentIntent,
    ProcessorSubscription,
};

/// Stripe API client.
#[derive(Clone)]
pub struct StripeClient {
    http: reqwest::Client,
    api_base: String,
    secret_key: String,
}

impl std::fmt::Debug for StripeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeClient")
            .field("api_base", &self.api_base)
            .field("secret_key", &"[hidden]")
            .finish()
    }
}

/// Stripe error envelope: `{"error": {"message": "..."}}`.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
}

/// Subscription as Stripe returns it, with the first invoice's payment
/// intent expanded so the client secret comes back in one round trip.
#[derive(Debug, Deserialize)]
struct ApiSubscription {
    id: String,
    status: String,
    cancel_at: Option<i64>,
    latest_invoice: Option<ApiInvoice>,
}

#[derive(Debug, Deserialize)]
struct ApiInvoice {
    payment_intent: Option<ApiInvoiceIntent>,
}

#[derive(Debug, Deserialize)]
struct ApiInvoiceIntent {
    client_secret: Option<String>,
}

impl From<ApiSubscription> for ProcessorSubscription {
    fn from(api: ApiSubscription) -> Self {
        let client_secret = api
            .latest_invoice
            .and_then(|inv| inv.payment_intent)
            .and_then(|pi| pi.client_secret);
        Self {
            id: api.id,
            status: SubscriptionStatus::parse(&api.status),
            cancel_at: api.cancel_at,
            client_secret,
        }
    }
}

impl StripeClient {
    /// Creates a new client against the given API base.
    #[must_use]
    pub fn new(secret_key: String, api_base: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base,
            secret_key,
        }
    }

    async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> Result<T, PaymentError> {
        let url = format!("{}{path}", self.api_base);
        debug!(path, "stripe request");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.secret_key)
            .form(params)
            .send()
            .await
            .map_err(|e| PaymentError::Transport(e.to_string()))?;

        Self::read_response(response).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, PaymentError> {
        let url = format!("{}{path}", self.api_base);
        debug!(path, "stripe request");

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(|e| PaymentError::Transport(e.to_string()))?;

        Self::read_response(response).await
    }

    async fn read_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, PaymentError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PaymentError::Transport(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map_or_else(|_| body.clone(), |e| e.error.message);
            return Err(PaymentError::Api {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| PaymentError::InvalidResponse(e.to_string()))
    }
}

/// Assembles the form parameters for an inline-priced monthly subscription.
fn subscription_params(request: &CreateSubscriptionRequest) -> Vec<(String, String)> {
    vec![
        ("customer".to_string(), request.customer_id.clone()),
        (
            "items[0][price_data][currency]".to_string(),
            request.currency.clone(),
        ),
        (
            "items[0][price_data][product_data][name]".to_string(),
            request.product_name.clone(),
        ),
        (
            "items[0][price_data][product_data][description]".to_string(),
            request.product_description.clone(),
        ),
        (
            "items[0][price_data][unit_amount]".to_string(),
            request.price_cents.to_string(),
        ),
        (
            "items[0][price_data][recurring][interval]".to_string(),
            "month".to_string(),
        ),
        (
            "payment_behavior".to_string(),
            "default_incomplete".to_string(),
        ),
        (
            "payment_settings[save_default_payment_method]".to_string(),
            "on_subscription".to_string(),
        ),
        (
            "expand[]".to_string(),
            "latest_invoice.payment_intent".to_string(),
        ),
    ]
}

#[async_trait]
impl PaymentProvider for StripeClient {
    async fn create_intent(
        &self,
        request: CreateIntentRequest,
    ) -> Result<PaymentIntent, PaymentError> {
        let mut params = vec![
            ("amount".to_string(), request.amount.to_string()),
            ("currency".to_string(), request.currency),
        ];
        for (key, value) in request.metadata.to_pairs() {
            params.push((format!("metadata[{key}]"), value));
        }

        self.post_form("/payment_intents", &params).await
    }

    async fn retrieve_intent(&self, intent_id: &str) -> Result<PaymentIntent, PaymentError> {
        self.get(&format!("/payment_intents/{intent_id}")).await
    }

    async fn create_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> Result<Customer, PaymentError> {
        let params = vec![
            ("email".to_string(), request.email),
            ("name".to_string(), request.name),
            ("metadata[userId]".to_string(), request.user_id.to_string()),
        ];

        self.post_form("/customers", &params).await
    }

    async fn create_subscription(
        &self,
        request: CreateSubscriptionRequest,
    ) -> Result<ProcessorSubscription, PaymentError> {
        let params = subscription_params(&request);
        let api: ApiSubscription = self.post_form("/subscriptions", &params).await?;
        Ok(api.into())
    }

    async fn cancel_at_period_end(
        &self,
        subscription_id: &str,
    ) -> Result<ProcessorSubscription, PaymentError> {
        let params = vec![("cancel_at_period_end".to_string(), "true".to_string())];
        let api: ApiSubscription = self
            .post_form(&format!("/subscriptions/{subscription_id}"), &params)
            .await?;
        Ok(api.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscription_params_inline_price() {
        let request = CreateSubscriptionRequest {
            customer_id: "cus_123".to_string(),
            price_cents: 1499,
            currency: "eur".to_string(),
            product_name: "Premium".to_string(),
            product_description: "Unlimited applications".to_string(),
        };

        let params = subscription_params(&request);
        let get = |key: &str| {
            params
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };

        assert_eq!(get("customer"), Some("cus_123"));
        assert_eq!(get("items[0][price_data][unit_amount]"), Some("1499"));
        assert_eq!(
            get("items[0][price_data][recurring][interval]"),
            Some("month")
        );
        assert_eq!(get("payment_behavior"), Some("default_incomplete"));
        assert_eq!(get("expand[]"), Some("latest_invoice.payment_intent"));
    }

    #[test]
    fn test_subscription_response_flattening() {
        let api: ApiSubscription = serde_json::from_str(
            r#"{
                "id": "sub_42",
                "status": "incomplete",
                "cancel_at": null,
                "latest_invoice": {
                    "payment_intent": {"client_secret": "pi_9_secret_x"}
                }
            }"#,
        )
        .unwrap();

        let sub: ProcessorSubscription = api.into();
        assert_eq!(sub.id, "sub_42");
        assert_eq!(sub.status, SubscriptionStatus::Incomplete);
        assert_eq!(sub.client_secret.as_deref(), Some("pi_9_secret_x"));
        assert_eq!(sub.cancel_at, None);
    }

    #[test]
    fn test_error_body_parsing() {
        let body: ApiErrorBody =
            serde_json::from_str(r#"{"error": {"message": "No such payment_intent"}}"#).unwrap();
        assert_eq!(body.error.message, "No such payment_intent");
    }
}
