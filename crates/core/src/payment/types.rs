//! Domain types for payment processor objects.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::billing::{IntentMetadata, SubscriptionStatus};

/// Status of a payment intent, tracked through the processor's lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum IntentStatus {
    /// Charge completed.
    Succeeded,
    /// Charge in flight.
    Processing,
    /// Awaiting a payment method.
    RequiresPaymentMethod,
    /// Awaiting confirmation.
    RequiresConfirmation,
    /// Awaiting additional customer action (e.g. 3DS).
    RequiresAction,
    /// Intent canceled.
    Canceled,
    /// Unknown status, preserved verbatim.
    Other(String),
}

impl IntentStatus {
    /// Parses a processor status string, preserving unknown values.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "succeeded" => Self::Succeeded,
            "processing" => Self::Processing,
            "requires_payment_method" => Self::RequiresPaymentMethod,
            "requires_confirmation" => Self::RequiresConfirmation,
            "requires_action" => Self::RequiresAction,
            "canceled" => Self::Canceled,
            other => Self::Other(other.to_string()),
        }
    }

    /// Returns the processor's wire representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Succeeded => "succeeded",
            Self::Processing => "processing",
            Self::RequiresPaymentMethod => "requires_payment_method",
            Self::RequiresConfirmation => "requires_confirmation",
            Self::RequiresAction => "requires_action",
            Self::Canceled => "canceled",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for IntentStatus {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<IntentStatus> for String {
    fn from(status: IntentStatus) -> Self {
        status.as_str().to_string()
    }
}

/// A processor-side payment intent.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntent {
    /// Processor intent id (`pi_...`).
    pub id: String,
    /// Client-usable secret for completing the payment.
    pub client_secret: Option<String>,
    /// Current lifecycle status.
    pub status: IntentStatus,
    /// Amount in minor units.
    pub amount: i64,
    /// ISO currency code.
    pub currency: String,
    /// Opaque metadata echoed back by the processor.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// A processor-side customer record.
#[derive(Debug, Clone, Deserialize)]
pub struct Customer {
    /// Processor customer id (`cus_...`).
    pub id: String,
}

/// A processor-side subscription, flattened to what this system mirrors.
#[derive(Debug, Clone)]
pub struct ProcessorSubscription {
    /// Processor subscription id (`sub_...`).
    pub id: String,
    /// Current status, mirrored verbatim into the user row.
    pub status: SubscriptionStatus,
    /// Unix timestamp at which a pending cancellation takes effect.
    pub cancel_at: Option<i64>,
    /// Client secret of the first invoice's payment intent, when present.
    pub client_secret: Option<String>,
}

/// Parameters for creating a payment intent.
#[derive(Debug, Clone)]
pub struct CreateIntentRequest {
    /// Amount in minor units.
    pub amount: i64,
    /// ISO currency code.
    pub currency: String,
    /// Metadata identifying the purchase.
    pub metadata: IntentMetadata,
}

/// Parameters for creating a customer.
#[derive(Debug, Clone)]
pub struct CreateCustomerRequest {
    /// Customer email.
    pub email: String,
    /// Customer display name.
    pub name: String,
    /// Local user id, stored as processor metadata.
    pub user_id: Uuid,
}

/// Parameters for creating a monthly subscription.
#[derive(Debug, Clone)]
pub struct CreateSubscriptionRequest {
    /// Processor customer to subscribe.
    pub customer_id: String,
    /// Monthly price in minor units.
    pub price_cents: i64,
    /// ISO currency code.
    pub currency: String,
    /// Product name shown on invoices.
    pub product_name: String,
    /// Product description shown on invoices.
    pub product_description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_status_round_trip() {
        assert_eq!(IntentStatus::parse("succeeded"), IntentStatus::Succeeded);
        assert_eq!(
            IntentStatus::parse("requires_action"),
            IntentStatus::RequiresAction
        );
        let unknown = IntentStatus::parse("requires_capture");
        assert_eq!(unknown.as_str(), "requires_capture");
    }

    #[test]
    fn test_intent_deserializes_from_processor_json() {
        let intent: PaymentIntent = serde_json::from_str(
            r#"{
                "id": "pi_123",
                "client_secret": "pi_123_secret_abc",
                "status": "succeeded",
                "amount": 750,
                "currency": "eur",
                "metadata": {"userId": "8c3f8f64-1111-2222-3333-444455556666", "credits": "5"}
            }"#,
        )
        .unwrap();

        assert_eq!(intent.status, IntentStatus::Succeeded);
        assert_eq!(intent.amount, 750);
        assert_eq!(intent.metadata.get("credits").unwrap(), "5");
    }
}
