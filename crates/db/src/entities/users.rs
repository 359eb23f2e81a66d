//! `SeaORM` Entity for the users table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::UserRole;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    /// Non-negative credit balance; enforced by a CHECK constraint and
    /// only ever decremented conditionally.
    pub credits: i32,
    /// Processor subscription status mirrored verbatim; `active` is the
    /// only value granting unlimited entitlement.
    pub subscription_status: String,
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
    #[sea_orm(has_one = "super::zzp_profiles::Entity")]
    ZzpProfiles,
    #[sea_orm(has_many = "super::vacancies::Entity")]
    Vacancies,
    #[sea_orm(has_many = "super::applications::Entity")]
    Applications,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl Related<super::zzp_profiles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ZzpProfiles.def()
    }
}

impl Related<super::vacancies::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vacancies.def()
    }
}

impl Related<super::applications::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Applications.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
