//! Credit ledger repository.
//!
//! All balance changes go through this repository so that every change is
//! paired with an append-only transaction row inside a single database
//! transaction. Consumption uses a conditional decrement so the balance can
//! never go below zero, regardless of how many requests race; purchase
//! confirmation is keyed on the payment intent ID so replays credit at most
//! once.

use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set, SqlErr, TransactionTrait,
};
use uuid::Uuid;

use crate::entities::{
    sea_orm_active_enums::{TransactionStatus, TransactionType},
    transactions, users,
};

/// Error types for ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// User does not exist.
    #[error("User not found: {0}")]
    UserNotFound(Uuid),

    /// Balance too low for the requested consumption.
    #[error("Insufficient credits: {required} required, {current} available")]
    InsufficientCredits {
        /// Credits the operation needs.
        required: i32,
        /// Credits the user currently has.
        current: i32,
    },

    /// Credit delta must be positive.
    #[error("Credit amount must be positive, got {0}")]
    InvalidCredits(i32),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Result of confirming a credit purchase.
#[derive(Debug, Clone, Copy)]
pub struct PurchaseOutcome {
    /// Balance after the purchase was applied (or after the original
    /// application, on replay).
    pub credits_after: i32,
    /// True when the payment intent had already been credited and this
    /// call changed nothing.
    pub already_applied: bool,
}

/// Repository for credit balance and transaction log operations.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    db: DatabaseConnection,
}

impl LedgerRepository {
    /// Creates a new ledger repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Atomically consumes `cost` credits from a user's balance and logs
    /// the consumption.
    ///
    /// The decrement only takes effect when the current balance covers the
    /// cost (`UPDATE ... WHERE credits >= cost`), so concurrent consumers
    /// cannot drive the balance negative. Returns the balance after the
    /// decrement.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InsufficientCredits`] when the balance is too
    /// low, [`LedgerError::UserNotFound`] when the user does not exist.
    pub async fn consume_credits(
        &self,
        user_id: Uuid,
        cost: i32,
        description: &str,
    ) -> Result<i32, LedgerError> {
        if cost <= 0 {
            return Err(LedgerError::InvalidCredits(cost));
        }

        let txn = self.db.begin().await?;

        let updated = users::Entity::update_many()
            .col_expr(
                users::Column::Credits,
                Expr::col(users::Column::Credits).sub(cost),
            )
            .filter(users::Column::Id.eq(user_id))
            .filter(users::Column::Credits.gte(cost))
            .exec(&txn)
            .await?;

        if updated.rows_affected == 0 {
            txn.rollback().await?;
            let user = users::Entity::find_by_id(user_id)
                .one(&self.db)
                .await?
                .ok_or(LedgerError::UserNotFound(user_id))?;
            return Err(LedgerError::InsufficientCredits {
                required: cost,
                current: user.credits,
            });
        }

        self.insert_row(
            &txn,
            user_id,
            TransactionType::ApplicationCredit,
            Decimal::ZERO,
            -cost,
            None,
            description,
        )
        .await?;

        let balance = self.current_balance(&txn, user_id).await?;
        txn.commit().await?;

        Ok(balance)
    }

    /// Applies a confirmed credit purchase: increments the balance and logs
    /// the purchase, keyed on the payment intent ID.
    ///
    /// Confirming the same intent twice is a no-op; the outcome reports the
    /// unchanged balance with `already_applied` set. The UNIQUE constraint
    /// on the intent column backs this up when two confirmations race past
    /// the initial lookup.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::UserNotFound`] when the user does not exist,
    /// [`LedgerError::InvalidCredits`] when `credits` is not positive.
    pub async fn apply_credit_purchase(
        &self,
        user_id: Uuid,
        payment_intent_id: &str,
        amount: Decimal,
        credits: i32,
        description: &str,
    ) -> Result<PurchaseOutcome, LedgerError> {
        if credits <= 0 {
            return Err(LedgerError::InvalidCredits(credits));
        }

        let txn = self.db.begin().await?;

        let existing = transactions::Entity::find()
            .filter(transactions::Column::StripePaymentIntentId.eq(payment_intent_id))
            .one(&txn)
            .await?;

        if existing.is_some() {
            let balance = self.current_balance(&txn, user_id).await?;
            txn.rollback().await?;
            return Ok(PurchaseOutcome {
                credits_after: balance,
                already_applied: true,
            });
        }

        let updated = users::Entity::update_many()
            .col_expr(
                users::Column::Credits,
                Expr::col(users::Column::Credits).add(credits),
            )
            .filter(users::Column::Id.eq(user_id))
            .exec(&txn)
            .await?;

        if updated.rows_affected == 0 {
            txn.rollback().await?;
            return Err(LedgerError::UserNotFound(user_id));
        }

        let inserted = self
            .insert_row(
                &txn,
                user_id,
                TransactionType::CreditPurchase,
                amount,
                credits,
                Some(payment_intent_id),
                description,
            )
            .await;

        // A concurrent confirmation may have inserted the same intent
        // between our lookup and insert; the UNIQUE index turns the loser
        // into a replay.
        if let Err(err) = inserted {
            txn.rollback().await?;
            if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                let balance = users::Entity::find_by_id(user_id)
                    .one(&self.db)
                    .await?
                    .ok_or(LedgerError::UserNotFound(user_id))?
                    .credits;
                return Ok(PurchaseOutcome {
                    credits_after: balance,
                    already_applied: true,
                });
            }
            return Err(err.into());
        }

        let balance = self.current_balance(&txn, user_id).await?;
        txn.commit().await?;

        Ok(PurchaseOutcome {
            credits_after: balance,
            already_applied: false,
        })
    }

    /// Logs a subscription payment. Subscription payments do not change
    /// the credit balance; entitlement comes from the mirrored status.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn record_subscription_payment(
        &self,
        user_id: Uuid,
        amount: Decimal,
        description: &str,
    ) -> Result<transactions::Model, LedgerError> {
        let row = self
            .insert_row(
                &self.db,
                user_id,
                TransactionType::SubscriptionPayment,
                amount,
                0,
                None,
                description,
            )
            .await?;
        Ok(row)
    }

    /// Lists a user's transactions, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<transactions::Model>, DbErr> {
        transactions::Entity::find()
            .filter(transactions::Column::UserId.eq(user_id))
            .order_by_desc(transactions::Column::CreatedAt)
            .all(&self.db)
            .await
    }

    async fn current_balance<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: Uuid,
    ) -> Result<i32, LedgerError> {
        let user = users::Entity::find_by_id(user_id)
            .one(conn)
            .await?
            .ok_or(LedgerError::UserNotFound(user_id))?;
        Ok(user.credits)
    }

    #[allow(clippy::too_many_arguments)]
    async fn insert_row<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: Uuid,
        transaction_type: TransactionType,
        amount: Decimal,
        credits: i32,
        payment_intent_id: Option<&str>,
        description: &str,
    ) -> Result<transactions::Model, DbErr> {
        let row = transactions::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            transaction_type: Set(transaction_type),
            amount: Set(amount),
            credits: Set(credits),
            stripe_payment_intent_id: Set(payment_intent_id.map(ToString::to_string)),
            description: Set(description.to_string()),
            status: Set(TransactionStatus::Completed),
            created_at: Set(chrono::Utc::now().into()),
        };

        row.insert(conn).await
    }
}
