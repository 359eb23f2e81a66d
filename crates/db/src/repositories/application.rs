//! Application repository for database operations.
//!
//! Submitting an application is the operation that consumes a ledger
//! credit; the credit consumption itself lives in
//! [`LedgerRepository`](super::LedgerRepository) so the route handler can
//! sequence the two.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::entities::{
    applications,
    sea_orm_active_enums::{ApplicationStatus, UserRole},
    users, vacancies,
};

/// Error types for application operations.
#[derive(Debug, thiserror::Error)]
pub enum ApplicationError {
    /// Vacancy not found.
    #[error("Vacancy not found: {0}")]
    VacancyNotFound(Uuid),

    /// Applicant does not exist.
    #[error("User not found: {0}")]
    UserNotFound(Uuid),

    /// Only zzpers may apply to vacancies.
    #[error("Only zzpers can apply to vacancies")]
    NotAZzper,

    /// The applicant already applied to this vacancy.
    #[error("Already applied to vacancy {0}")]
    AlreadyApplied(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Application joined with its vacancy, for listings.
#[derive(Debug, Clone)]
pub struct ApplicationWithVacancy {
    /// The application record.
    pub application: applications::Model,
    /// The vacancy applied to.
    pub vacancy: vacancies::Model,
}

/// Application repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct ApplicationRepository {
    db: DatabaseConnection,
}

impl ApplicationRepository {
    /// Creates a new application repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Validates that `applicant_id` can apply to `vacancy_id`.
    ///
    /// Checked before credits are consumed, so a doomed submission never
    /// touches the balance.
    ///
    /// # Errors
    ///
    /// Returns the first failed check as an [`ApplicationError`].
    pub async fn check_can_apply(
        &self,
        vacancy_id: Uuid,
        applicant_id: Uuid,
    ) -> Result<(), ApplicationError> {
        let applicant = users::Entity::find_by_id(applicant_id)
            .one(&self.db)
            .await?
            .ok_or(ApplicationError::UserNotFound(applicant_id))?;

        if applicant.role != UserRole::Zzper {
            return Err(ApplicationError::NotAZzper);
        }

        vacancies::Entity::find_by_id(vacancy_id)
            .one(&self.db)
            .await?
            .ok_or(ApplicationError::VacancyNotFound(vacancy_id))?;

        let existing = applications::Entity::find()
            .filter(applications::Column::VacancyId.eq(vacancy_id))
            .filter(applications::Column::ApplicantId.eq(applicant_id))
            .count(&self.db)
            .await?;

        if existing > 0 {
            return Err(ApplicationError::AlreadyApplied(vacancy_id));
        }

        Ok(())
    }

    /// Creates an application in the pending state.
    ///
    /// # Errors
    ///
    /// Returns [`ApplicationError::AlreadyApplied`] when a concurrent
    /// submission got there first (backed by the unique index).
    pub async fn create(
        &self,
        vacancy_id: Uuid,
        applicant_id: Uuid,
        message: Option<String>,
    ) -> Result<applications::Model, ApplicationError> {
        let now = chrono::Utc::now().into();
        let application = applications::ActiveModel {
            id: Set(Uuid::new_v4()),
            vacancy_id: Set(vacancy_id),
            applicant_id: Set(applicant_id),
            message: Set(message),
            status: Set(ApplicationStatus::Pending),
            created_at: Set(now),
            updated_at: Set(now),
        };

        application.insert(&self.db).await.map_err(|err| {
            if matches!(
                err.sql_err(),
                Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
            ) {
                ApplicationError::AlreadyApplied(vacancy_id)
            } else {
                err.into()
            }
        })
    }

    /// Lists a zzper's applications with their vacancies, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_applicant(
        &self,
        applicant_id: Uuid,
    ) -> Result<Vec<ApplicationWithVacancy>, DbErr> {
        let rows = applications::Entity::find()
            .filter(applications::Column::ApplicantId.eq(applicant_id))
            .find_also_related(vacancies::Entity)
            .order_by_desc(applications::Column::CreatedAt)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(application, vacancy)| {
                vacancy.map(|vacancy| ApplicationWithVacancy {
                    application,
                    vacancy,
                })
            })
            .collect())
    }

    /// Lists all applications to an organization's vacancies, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_vacancy_owner(
        &self,
        owner_id: Uuid,
    ) -> Result<Vec<ApplicationWithVacancy>, DbErr> {
        let vacancy_ids = vacancies::Entity::find()
            .filter(vacancies::Column::UserId.eq(owner_id))
            .select_only()
            .column(vacancies::Column::Id)
            .into_tuple::<Uuid>()
            .all(&self.db)
            .await?;

        if vacancy_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = applications::Entity::find()
            .filter(applications::Column::VacancyId.is_in(vacancy_ids))
            .find_also_related(vacancies::Entity)
            .order_by_desc(applications::Column::CreatedAt)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(application, vacancy)| {
                vacancy.map(|vacancy| ApplicationWithVacancy {
                    application,
                    vacancy,
                })
            })
            .collect())
    }

    /// Updates an application's status. Only the owning organization's
    /// vacancies qualify.
    ///
    /// # Errors
    ///
    /// Returns `None` wrapped errors as [`ApplicationError::VacancyNotFound`]
    /// when the application does not belong to one of the owner's vacancies.
    pub async fn update_status(
        &self,
        application_id: Uuid,
        owner_id: Uuid,
        status: ApplicationStatus,
    ) -> Result<applications::Model, ApplicationError> {
        let row = applications::Entity::find_by_id(application_id)
            .find_also_related(vacancies::Entity)
            .one(&self.db)
            .await?;

        let Some((application, Some(vacancy))) = row else {
            return Err(ApplicationError::VacancyNotFound(application_id));
        };
        if vacancy.user_id != owner_id {
            return Err(ApplicationError::VacancyNotFound(application_id));
        }

        let mut active: applications::ActiveModel = application.into();
        active.status = Set(status);
        Ok(active.update(&self.db).await?)
    }
}
