//! Database enum types mapped to PostgreSQL enums.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Marketplace role of a user.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "user_role")]
pub enum UserRole {
    /// Independent contractor looking for work.
    #[sea_orm(string_value = "zzper")]
    Zzper,
    /// Organization posting vacancies.
    #[sea_orm(string_value = "organisatie")]
    Organisatie,
}

/// Kind of ledger transaction.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "transaction_type")]
pub enum TransactionType {
    /// Credits bought through a payment intent.
    #[sea_orm(string_value = "credit_purchase")]
    CreditPurchase,
    /// One credit consumed by an application submission.
    #[sea_orm(string_value = "application_credit")]
    ApplicationCredit,
    /// A subscription invoice payment.
    #[sea_orm(string_value = "subscription_payment")]
    SubscriptionPayment,
}

/// Status of a ledger transaction.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "transaction_status")]
pub enum TransactionStatus {
    /// Awaiting settlement.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Settled; the normal terminal state.
    #[sea_orm(string_value = "completed")]
    Completed,
    /// Settlement failed.
    #[sea_orm(string_value = "failed")]
    Failed,
}

/// Publication status of a vacancy.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "vacancy_status")]
pub enum VacancyStatus {
    /// Open for applications.
    #[sea_orm(string_value = "active")]
    Active,
    /// No longer accepting applications.
    #[sea_orm(string_value = "closed")]
    Closed,
}

/// Review status of an application.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "application_status")]
pub enum ApplicationStatus {
    /// Awaiting review by the vacancy owner.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Accepted by the vacancy owner.
    #[sea_orm(string_value = "accepted")]
    Accepted,
    /// Rejected by the vacancy owner.
    #[sea_orm(string_value = "rejected")]
    Rejected,
}
