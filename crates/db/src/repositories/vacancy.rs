//! Vacancy repository for database operations.

use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use crate::entities::{
    sea_orm_active_enums::{UserRole, VacancyStatus},
    users, vacancies,
};

/// Error types for vacancy operations.
#[derive(Debug, thiserror::Error)]
pub enum VacancyError {
    /// Vacancy not found.
    #[error("Vacancy not found: {0}")]
    NotFound(Uuid),

    /// Poster does not exist.
    #[error("User not found: {0}")]
    UserNotFound(Uuid),

    /// Only organizations may post vacancies.
    #[error("Only organizations can post vacancies")]
    NotAnOrganization,

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a vacancy.
#[derive(Debug, Clone)]
pub struct CreateVacancyInput {
    /// Posting organization's user ID.
    pub user_id: Uuid,
    /// Vacancy title.
    pub title: String,
    /// Full vacancy body.
    pub description: String,
    /// Work location.
    pub location: String,
    /// Expected hours per week.
    pub hours_per_week: Option<i32>,
    /// Offered hourly rate.
    pub hourly_rate: Option<Decimal>,
}

/// Vacancy repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct VacancyRepository {
    db: DatabaseConnection,
}

impl VacancyRepository {
    /// Creates a new vacancy repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists active vacancies, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_active(&self) -> Result<Vec<vacancies::Model>, DbErr> {
        vacancies::Entity::find()
            .filter(vacancies::Column::Status.eq(VacancyStatus::Active))
            .order_by_desc(vacancies::Column::CreatedAt)
            .all(&self.db)
            .await
    }

    /// Finds a vacancy by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<vacancies::Model>, DbErr> {
        vacancies::Entity::find_by_id(id).one(&self.db).await
    }

    /// Creates a vacancy. The poster must hold the organization role.
    ///
    /// # Errors
    ///
    /// Returns [`VacancyError::NotAnOrganization`] when the poster is a
    /// zzper, [`VacancyError::UserNotFound`] when the poster does not exist.
    pub async fn create(&self, input: CreateVacancyInput) -> Result<vacancies::Model, VacancyError> {
        let poster = users::Entity::find_by_id(input.user_id)
            .one(&self.db)
            .await?
            .ok_or(VacancyError::UserNotFound(input.user_id))?;

        if poster.role != UserRole::Organisatie {
            return Err(VacancyError::NotAnOrganization);
        }

        let now = chrono::Utc::now().into();
        let vacancy = vacancies::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(input.user_id),
            title: Set(input.title),
            description: Set(input.description),
            location: Set(input.location),
            hours_per_week: Set(input.hours_per_week),
            hourly_rate: Set(input.hourly_rate),
            status: Set(VacancyStatus::Active),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(vacancy.insert(&self.db).await?)
    }

    /// Lists all vacancies posted by an organization, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_owner(&self, user_id: Uuid) -> Result<Vec<vacancies::Model>, DbErr> {
        vacancies::Entity::find()
            .filter(vacancies::Column::UserId.eq(user_id))
            .order_by_desc(vacancies::Column::CreatedAt)
            .all(&self.db)
            .await
    }

    /// Closes a vacancy. Only the posting organization may close it.
    ///
    /// # Errors
    ///
    /// Returns [`VacancyError::NotFound`] when the vacancy does not exist
    /// or belongs to another user.
    pub async fn close(&self, id: Uuid, owner_id: Uuid) -> Result<vacancies::Model, VacancyError> {
        let vacancy = vacancies::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .filter(|v| v.user_id == owner_id)
            .ok_or(VacancyError::NotFound(id))?;

        let mut active: vacancies::ActiveModel = vacancy.into();
        active.status = Set(VacancyStatus::Closed);
        Ok(active.update(&self.db).await?)
    }
}
