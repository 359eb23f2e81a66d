//! Zzp profile repository for database operations.

use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set, SqlErr,
};
use uuid::Uuid;

use crate::entities::{sea_orm_active_enums::UserRole, users, zzp_profiles};

/// Error types for profile operations.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    /// No profile exists for this user or id.
    #[error("Profile not found")]
    NotFound,

    /// Owner does not exist.
    #[error("User not found: {0}")]
    UserNotFound(Uuid),

    /// Only zzpers carry a profile.
    #[error("Only zzpers can create a profile")]
    NotAZzper,

    /// The user already has a profile.
    #[error("Profile already exists for this user")]
    AlreadyExists,

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Profile fields as the owner submits them.
#[derive(Debug, Clone)]
pub struct ProfileInput {
    /// Professional headline.
    pub title: String,
    /// Free-form introduction.
    pub bio: Option<String>,
    /// Care specialization.
    pub specialization: Option<String>,
    /// Asking hourly rate.
    pub hourly_rate: Option<Decimal>,
    /// Hours available per week.
    pub hours_per_week: Option<i32>,
    /// Preferred work region.
    pub location: Option<String>,
    /// Open to assignments.
    pub available: bool,
}

/// Zzp profile repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct ProfileRepository {
    db: DatabaseConnection,
}

impl ProfileRepository {
    /// Creates a new profile repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds the profile owned by a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Option<zzp_profiles::Model>, DbErr> {
        zzp_profiles::Entity::find()
            .filter(zzp_profiles::Column::UserId.eq(user_id))
            .one(&self.db)
            .await
    }

    /// Finds a profile by its own id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<zzp_profiles::Model>, DbErr> {
        zzp_profiles::Entity::find_by_id(id).one(&self.db).await
    }

    /// Lists all profiles, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_all(&self) -> Result<Vec<zzp_profiles::Model>, DbErr> {
        zzp_profiles::Entity::find()
            .order_by_desc(zzp_profiles::Column::CreatedAt)
            .all(&self.db)
            .await
    }

    /// Creates the profile for a user. The owner must hold the zzper role
    /// and may have at most one profile; the UNIQUE `user_id` column backs
    /// the at-most-one rule under concurrent creates.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::NotAZzper`] when the owner is an
    /// organization, [`ProfileError::AlreadyExists`] when a profile is
    /// already present.
    pub async fn create(
        &self,
        user_id: Uuid,
        input: ProfileInput,
    ) -> Result<zzp_profiles::Model, ProfileError> {
        let owner = users::Entity::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or(ProfileError::UserNotFound(user_id))?;

        if owner.role != UserRole::Zzper {
            return Err(ProfileError::NotAZzper);
        }

        let now = chrono::Utc::now().into();
        let profile = zzp_profiles::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            title: Set(input.title),
            bio: Set(input.bio),
            specialization: Set(input.specialization),
            hourly_rate: Set(input.hourly_rate),
            hours_per_week: Set(input.hours_per_week),
            location: Set(input.location),
            available: Set(input.available),
            created_at: Set(now),
            updated_at: Set(now),
        };

        match profile.insert(&self.db).await {
            Ok(model) => Ok(model),
            Err(err) => {
                if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                    return Err(ProfileError::AlreadyExists);
                }
                Err(err.into())
            }
        }
    }

    /// Replaces the mutable fields of the caller's profile.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::NotFound`] when the user has no profile.
    pub async fn update(
        &self,
        user_id: Uuid,
        input: ProfileInput,
    ) -> Result<zzp_profiles::Model, ProfileError> {
        let profile = self
            .find_for_user(user_id)
            .await?
            .ok_or(ProfileError::NotFound)?;

        let mut active: zzp_profiles::ActiveModel = profile.into();
        active.title = Set(input.title);
        active.bio = Set(input.bio);
        active.specialization = Set(input.specialization);
        active.hourly_rate = Set(input.hourly_rate);
        active.hours_per_week = Set(input.hours_per_week);
        active.location = Set(input.location);
        active.available = Set(input.available);

        Ok(active.update(&self.db).await?)
    }
}
