//! The payment provider capability trait.

use async_trait::async_trait;
use thiserror::Error;

use super::types::{
    CreateCustomerRequest, CreateIntentRequest, CreateSubscriptionRequest, Customer, PaymentIntent,
    ProcessorSubscription,
};

/// Errors returned by the payment provider.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// The processor rejected the request.
    #[error("processor API error ({status}): {message}")]
    Api {
        /// HTTP status returned by the processor.
        status: u16,
        /// Processor-supplied error message.
        message: String,
    },

    /// The request never reached the processor or the connection failed.
    #[error("processor transport error: {0}")]
    Transport(String),

    /// The processor answered with a body this client cannot interpret.
    #[error("unexpected processor response: {0}")]
    InvalidResponse(String),
}

/// External payment processor capability.
///
/// The processor is authoritative on money movement; this system only
/// reacts to its success signals and mirrors status. Every balance-affecting
/// decision re-fetches from this interface rather than trusting anything a
/// client sent.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Creates a payment intent; the returned client secret lets the
    /// client complete the charge directly with the processor.
    async fn create_intent(
        &self,
        request: CreateIntentRequest,
    ) -> Result<PaymentIntent, PaymentError>;

    /// Retrieves an intent by id. Source of truth for its status.
    async fn retrieve_intent(&self, intent_id: &str) -> Result<PaymentIntent, PaymentError>;

    /// Creates a customer record. Called at most once per user; the
    /// returned id is persisted for the account's lifetime.
    async fn create_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> Result<Customer, PaymentError>;

    /// Creates a monthly subscription with payment collection deferred
    /// until the first invoice is confirmed by the client.
    async fn create_subscription(
        &self,
        request: CreateSubscriptionRequest,
    ) -> Result<ProcessorSubscription, PaymentError>;

    /// Schedules cancellation at the end of the current billing period
    /// and returns the subscription's resulting state.
    async fn cancel_at_period_end(
        &self,
        subscription_id: &str,
    ) -> Result<ProcessorSubscription, PaymentError>;
}
