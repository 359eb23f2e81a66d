//! Entitlement and billing ledger domain logic.
//!
//! This module implements the decision logic of the credits/subscription
//! paywall:
//! - Entitlement check (subscription overrides credits)
//! - Minor-unit money conversion for processor charges
//! - Subscription status mirroring types
//! - Payment intent metadata round-tripping
//! - Error types for billing operations

pub mod entitlement;
pub mod error;
pub mod purchase;
pub mod types;

#[cfg(test)]
mod entitlement_props;

pub use entitlement::{APPLICATION_CREDIT_COST, has_full_access};
pub use error::BillingError;
pub use purchase::{confirmable_metadata, purchase_amount};
pub use types::{IntentMetadata, SubscriptionStatus, amount_from_minor_units, to_minor_units};
