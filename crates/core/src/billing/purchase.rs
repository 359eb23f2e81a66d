//! Credit purchase validation.
//!
//! The two checkpoints of the purchase flow: validating a purchase
//! request before an intent is created, and validating a retrieved
//! intent before the ledger is credited. Handlers stay thin; the rules
//! live here.

use uuid::Uuid;

use super::error::BillingError;
use super::types::{IntentMetadata, to_minor_units};
use crate::payment::types::{IntentStatus, PaymentIntent};

/// Validates a purchase request and returns the charge in minor units.
///
/// # Errors
///
/// Returns `BillingError::InvalidCredits` for a non-positive credit
/// count and the `to_minor_units` errors for a bad price.
pub fn purchase_amount(credits: i32, price: rust_decimal::Decimal) -> Result<i64, BillingError> {
    if credits <= 0 {
        return Err(BillingError::InvalidCredits(credits));
    }
    to_minor_units(price)
}

/// Validates a retrieved intent for confirmation by `caller` and returns
/// its metadata.
///
/// The intent must have succeeded, carry well-formed metadata, and name
/// the caller as the purchaser. The processor-retrieved intent is the
/// only input; nothing client-supplied is trusted.
///
/// # Errors
///
/// Returns `BillingError::IntentNotSucceeded`, `MetadataInvalid`, or
/// `IntentOwnerMismatch` for the corresponding failed check.
pub fn confirmable_metadata(
    intent: &PaymentIntent,
    caller: Uuid,
) -> Result<IntentMetadata, BillingError> {
    if intent.status != IntentStatus::Succeeded {
        return Err(BillingError::IntentNotSucceeded(intent.id.clone()));
    }

    let metadata = IntentMetadata::parse(&intent.metadata)?;
    if metadata.user_id != caller {
        return Err(BillingError::IntentOwnerMismatch);
    }

    Ok(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn intent(status: &str, metadata: HashMap<String, String>) -> PaymentIntent {
        PaymentIntent {
            id: "pi_test".to_string(),
            client_secret: None,
            status: IntentStatus::parse(status),
            amount: 750,
            currency: "eur".to_string(),
            metadata,
        }
    }

    fn metadata_for(user_id: Uuid, credits: i32) -> HashMap<String, String> {
        IntentMetadata { user_id, credits }.to_pairs().into_iter().collect()
    }

    #[test]
    fn test_purchase_amount() {
        assert_eq!(purchase_amount(5, dec!(7.50)).unwrap(), 750);
        assert!(matches!(
            purchase_amount(0, dec!(7.50)),
            Err(BillingError::InvalidCredits(0))
        ));
        assert!(matches!(
            purchase_amount(5, dec!(0)),
            Err(BillingError::InvalidPrice(_))
        ));
    }

    #[test]
    fn test_confirmable_metadata_happy_path() {
        let user_id = Uuid::new_v4();
        let intent = intent("succeeded", metadata_for(user_id, 5));

        let metadata = confirmable_metadata(&intent, user_id).unwrap();
        assert_eq!(metadata.user_id, user_id);
        assert_eq!(metadata.credits, 5);
    }

    #[test]
    fn test_confirmable_metadata_rejects_unsucceeded() {
        let user_id = Uuid::new_v4();
        let intent = intent("processing", metadata_for(user_id, 5));

        assert!(matches!(
            confirmable_metadata(&intent, user_id),
            Err(BillingError::IntentNotSucceeded(_))
        ));
    }

    #[test]
    fn test_confirmable_metadata_rejects_foreign_caller() {
        let intent = intent("succeeded", metadata_for(Uuid::new_v4(), 5));

        assert!(matches!(
            confirmable_metadata(&intent, Uuid::new_v4()),
            Err(BillingError::IntentOwnerMismatch)
        ));
    }

    #[test]
    fn test_confirmable_metadata_rejects_missing_metadata() {
        let user_id = Uuid::new_v4();
        let intent = intent("succeeded", HashMap::new());

        assert!(matches!(
            confirmable_metadata(&intent, user_id),
            Err(BillingError::MetadataInvalid(_))
        ));
    }
}
