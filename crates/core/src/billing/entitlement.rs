//! Entitlement check for the credits/subscription paywall.

use super::types::SubscriptionStatus;

/// Credits consumed per application submission by non-subscribed users.
pub const APPLICATION_CREDIT_COST: i32 = 1;

/// Returns whether a user may view full vacancy content or submit an
/// application.
///
/// True iff the subscription is active OR the credit balance is positive.
/// Pure function of the two fields; the subscription fully overrides
/// credits, so an active subscriber is never charged a credit regardless
/// of balance.
#[must_use]
pub const fn has_full_access(status: &SubscriptionStatus, credits: i32) -> bool {
    status.is_active() || credits > 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(SubscriptionStatus::Active, 0, true)]
    #[case(SubscriptionStatus::Active, 10, true)]
    #[case(SubscriptionStatus::None, 1, true)]
    #[case(SubscriptionStatus::None, 0, false)]
    #[case(SubscriptionStatus::Canceled, 0, false)]
    #[case(SubscriptionStatus::PastDue, 0, false)]
    #[case(SubscriptionStatus::Incomplete, 3, true)]
    #[case(SubscriptionStatus::Trialing, 0, false)]
    fn test_has_full_access(
        #[case] status: SubscriptionStatus,
        #[case] credits: i32,
        #[case] expected: bool,
    ) {
        assert_eq!(has_full_access(&status, credits), expected);
    }

    #[test]
    fn test_pending_cancellation_keeps_access() {
        // Cancel-at-period-end leaves the mirrored status active until the
        // processor reports a terminal status.
        assert!(has_full_access(&SubscriptionStatus::Active, 0));
        assert!(!has_full_access(&SubscriptionStatus::Canceled, 0));
    }
}
