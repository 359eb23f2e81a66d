//! Core business logic for ZorgMatch.
//!
//! This crate contains the entitlement and billing ledger domain logic,
//! plus the payment processor capability behind a trait. No database
//! dependencies live here.
//!
//! # Modules
//!
//! - `billing` - Entitlement checks, credit arithmetic, subscription status
//! - `payment` - Payment provider trait, Stripe client, webhook verification

pub mod billing;
pub mod payment;
