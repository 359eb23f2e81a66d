//! Domain types for the billing ledger.

use std::collections::HashMap;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::BillingError;

/// Subscription status mirrored verbatim from the payment processor.
///
/// The processor is authoritative; this system only mirrors what it
/// reports. Unknown statuses survive the round trip through `Other` so a
/// new processor-side status never gets silently rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SubscriptionStatus {
    /// No subscription has ever been started (local default).
    None,
    /// First invoice awaiting payment.
    Incomplete,
    /// First invoice expired unpaid.
    IncompleteExpired,
    /// In a trial period.
    Trialing,
    /// Paid and current. The only status granting unlimited entitlement.
    Active,
    /// A renewal payment failed.
    PastDue,
    /// Terminally canceled.
    Canceled,
    /// Retries exhausted, unpaid.
    Unpaid,
    /// Any status this system does not know about, preserved verbatim.
    Other(String),
}

impl SubscriptionStatus {
    /// Returns the processor's wire representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::None => "none",
            Self::Incomplete => "incomplete",
            Self::IncompleteExpired => "incomplete_expired",
            Self::Trialing => "trialing",
            Self::Active => "active",
            Self::PastDue => "past_due",
            Self::Canceled => "canceled",
            Self::Unpaid => "unpaid",
            Self::Other(s) => s,
        }
    }

    /// Parses a processor status string, preserving unknown values.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "none" => Self::None,
            "incomplete" => Self::Incomplete,
            "incomplete_expired" => Self::IncompleteExpired,
            "trialing" => Self::Trialing,
            "active" => Self::Active,
            "past_due" => Self::PastDue,
            "canceled" => Self::Canceled,
            "unpaid" => Self::Unpaid,
            other => Self::Other(other.to_string()),
        }
    }

    /// Whether this status grants unlimited entitlement.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl From<String> for SubscriptionStatus {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<SubscriptionStatus> for String {
    fn from(status: SubscriptionStatus) -> Self {
        status.as_str().to_string()
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata embedded on a payment intent so the confirmation step is
/// self-describing: the intent itself says who bought how many credits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentMetadata {
    /// The purchasing user.
    pub user_id: Uuid,
    /// Credits to apply once the intent succeeds.
    pub credits: i32,
}

impl IntentMetadata {
    /// Serializes to the processor's string-to-string metadata map.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        vec![
            ("userId".to_string(), self.user_id.to_string()),
            ("credits".to_string(), self.credits.to_string()),
        ]
    }

    /// Reads the metadata back off a retrieved intent.
    ///
    /// # Errors
    ///
    /// Returns `BillingError::MetadataInvalid` if either key is missing
    /// or unparseable.
    pub fn parse(metadata: &HashMap<String, String>) -> Result<Self, BillingError> {
        let user_id = metadata
            .get("userId")
            .and_then(|v| Uuid::parse_str(v).ok())
            .ok_or(BillingError::MetadataInvalid("userId"))?;
        let credits = metadata
            .get("credits")
            .and_then(|v| v.parse::<i32>().ok())
            .ok_or(BillingError::MetadataInvalid("credits"))?;

        Ok(Self { user_id, credits })
    }
}

/// Converts a price in currency units to processor minor units (cents).
///
/// # Errors
///
/// Returns `BillingError::InvalidPrice` for non-positive prices and
/// `BillingError::AmountOutOfRange` when the rounded amount does not fit
/// in an `i64`.
pub fn to_minor_units(price: Decimal) -> Result<i64, BillingError> {
    if price <= Decimal::ZERO {
        return Err(BillingError::InvalidPrice(price));
    }

    let minor = (price * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, rust_decimal::RoundingStrategy::MidpointAwayFromZero);
    minor
        .to_i64()
        .ok_or(BillingError::AmountOutOfRange(price))
}

/// Converts processor minor units back to a currency-unit amount for the
/// transaction log.
#[must_use]
pub fn amount_from_minor_units(minor: i64) -> Decimal {
    Decimal::new(minor, 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case("active", SubscriptionStatus::Active)]
    #[case("past_due", SubscriptionStatus::PastDue)]
    #[case("canceled", SubscriptionStatus::Canceled)]
    #[case("none", SubscriptionStatus::None)]
    fn test_status_parse_known(#[case] wire: &str, #[case] expected: SubscriptionStatus) {
        assert_eq!(SubscriptionStatus::parse(wire), expected);
        assert_eq!(SubscriptionStatus::parse(wire).as_str(), wire);
    }

    #[test]
    fn test_status_preserves_unknown_verbatim() {
        let status = SubscriptionStatus::parse("paused");
        assert_eq!(status, SubscriptionStatus::Other("paused".to_string()));
        assert_eq!(status.as_str(), "paused");
        assert!(!status.is_active());
    }

    #[test]
    fn test_only_active_is_active() {
        assert!(SubscriptionStatus::Active.is_active());
        assert!(!SubscriptionStatus::Trialing.is_active());
        assert!(!SubscriptionStatus::Incomplete.is_active());
        assert!(!SubscriptionStatus::PastDue.is_active());
    }

    #[test]
    fn test_metadata_round_trip() {
        let meta = IntentMetadata {
            user_id: Uuid::new_v4(),
            credits: 5,
        };
        let map: HashMap<String, String> = meta.to_pairs().into_iter().collect();
        assert_eq!(IntentMetadata::parse(&map).unwrap(), meta);
    }

    #[test]
    fn test_metadata_missing_keys() {
        let map = HashMap::new();
        assert!(matches!(
            IntentMetadata::parse(&map),
            Err(BillingError::MetadataInvalid("userId"))
        ));

        let mut map = HashMap::new();
        map.insert("userId".to_string(), Uuid::new_v4().to_string());
        map.insert("credits".to_string(), "not-a-number".to_string());
        assert!(matches!(
            IntentMetadata::parse(&map),
            Err(BillingError::MetadataInvalid("credits"))
        ));
    }

    #[rstest]
    #[case(dec!(7.50), 750)]
    #[case(dec!(14.99), 1499)]
    #[case(dec!(0.01), 1)]
    #[case(dec!(10), 1000)]
    // Sub-cent prices round half away from zero, matching the processor's
    // own rounding of charge amounts.
    #[case(dec!(0.005), 1)]
    fn test_to_minor_units(#[case] price: Decimal, #[case] expected: i64) {
        assert_eq!(to_minor_units(price).unwrap(), expected);
    }

    #[test]
    fn test_to_minor_units_rejects_non_positive() {
        assert!(matches!(
            to_minor_units(Decimal::ZERO),
            Err(BillingError::InvalidPrice(_))
        ));
        assert!(matches!(
            to_minor_units(dec!(-1)),
            Err(BillingError::InvalidPrice(_))
        ));
    }

    #[test]
    fn test_amount_from_minor_units() {
        assert_eq!(amount_from_minor_units(750), dec!(7.50));
        assert_eq!(amount_from_minor_units(0), dec!(0.00));
        assert_eq!(amount_from_minor_units(1499), dec!(14.99));
    }
}
