//! Billing error types.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur during billing operations.
#[derive(Debug, Error)]
pub enum BillingError {
    /// Credit count must be positive.
    #[error("Credit count must be positive, got {0}")]
    InvalidCredits(i32),

    /// Price must be positive.
    #[error("Price must be positive, got {0}")]
    InvalidPrice(Decimal),

    /// Price does not fit in processor minor units.
    #[error("Amount out of range: {0}")]
    AmountOutOfRange(Decimal),

    /// Payment intent metadata is missing or malformed.
    #[error("Payment intent metadata invalid: {0}")]
    MetadataInvalid(&'static str),

    /// The retrieved intent has not succeeded.
    #[error("Payment intent {0} has not succeeded")]
    IntentNotSucceeded(String),

    /// The intent belongs to a different user than the caller.
    #[error("Payment intent does not belong to the calling user")]
    IntentOwnerMismatch,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            BillingError::InvalidCredits(0).to_string(),
            "Credit count must be positive, got 0"
        );
        assert_eq!(
            BillingError::IntentOwnerMismatch.to_string(),
            "Payment intent does not belong to the calling user"
        );
    }
}
