//! Property-based tests for the credit balance model.

use proptest::prelude::*;

use super::entitlement::APPLICATION_CREDIT_COST;

/// Pure model of the ledger semantics: purchases add credits, consumption
/// is a conditional decrement that refuses rather than clamps, and every
/// applied mutation appends its delta to the audit log.
struct LedgerModel {
    credits: i32,
    log: Vec<i32>,
}

impl LedgerModel {
    const fn new() -> Self {
        Self {
            credits: 0,
            log: Vec::new(),
        }
    }

    fn purchase(&mut self, credits: i32) {
        self.credits += credits;
        self.log.push(credits);
    }

    fn consume(&mut self) -> bool {
        if self.credits >= APPLICATION_CREDIT_COST {
            self.credits -= APPLICATION_CREDIT_COST;
            self.log.push(-APPLICATION_CREDIT_COST);
            true
        } else {
            false
        }
    }
}

#[derive(Debug, Clone)]
enum Op {
    Purchase(i32),
    Consume,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (1i32..100).prop_map(Op::Purchase),
        Just(Op::Consume),
    ]
}

proptest! {
    /// Balance never goes negative under any purchase/consume interleaving.
    #[test]
    fn test_balance_never_negative(ops in proptest::collection::vec(op_strategy(), 0..200)) {
        let mut model = LedgerModel::new();
        for op in ops {
            match op {
                Op::Purchase(n) => model.purchase(n),
                Op::Consume => {
                    model.consume();
                }
            }
            prop_assert!(model.credits >= 0);
        }
    }

    /// Reconciliation: the sum of logged deltas always equals the balance.
    /// The conditional decrement removes the clamp divergence, so this
    /// holds exactly.
    #[test]
    fn test_log_sum_equals_balance(ops in proptest::collection::vec(op_strategy(), 0..200)) {
        let mut model = LedgerModel::new();
        for op in ops {
            match op {
                Op::Purchase(n) => model.purchase(n),
                Op::Consume => {
                    model.consume();
                }
            }
        }
        let logged: i32 = model.log.iter().sum();
        prop_assert_eq!(logged, model.credits);
    }

    /// A refused consumption changes neither the balance nor the log.
    #[test]
    fn test_denied_consume_is_a_noop(purchases in 0i32..1) {
        let mut model = LedgerModel::new();
        model.credits = purchases; // 0: below the cost of one application
        let log_len = model.log.len();

        prop_assert!(!model.consume());
        prop_assert_eq!(model.credits, purchases);
        prop_assert_eq!(model.log.len(), log_len);
    }
}
