//! Payment processor integration.
//!
//! The processor is modeled as an external capability behind the
//! [`PaymentProvider`] trait. The ledger never trusts client-supplied
//! status; it always re-fetches from this interface before crediting.
//!
//! - `provider` - The capability trait and its error type
//! - `types` - Wire-adjacent domain types (intents, customers, subscriptions)
//! - `stripe` - The `reqwest`-backed Stripe implementation
//! - `webhook` - Signed-webhook verification and event mapping

pub mod provider;
pub mod stripe;
pub mod types;
pub mod webhook;

pub use provider::{PaymentError, PaymentProvider};
pub use stripe::StripeClient;
pub use types::{
    CreateCustomerRequest, CreateIntentRequest, CreateSubscriptionRequest, Customer, IntentStatus,
    PaymentIntent, ProcessorSubscription,
};
pub use webhook::{SubscriptionEvent, WebhookError, parse_subscription_event, verify_signature};
