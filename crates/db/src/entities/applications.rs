//! `SeaORM` Entity for the applications table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::ApplicationStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "applications")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub vacancy_id: Uuid,
    pub applicant_id: Uuid,
    pub message: Option<String>,
    pub status: ApplicationStatus,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::vacancies::Entity",
        from = "Column::VacancyId",
        to = "super::vacancies::Column::Id"
    )]
    Vacancies,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::ApplicantId",
        to = "super::users::Column::Id"
    )]
    Users,
}

impl Related<super::vacancies::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vacancies.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
