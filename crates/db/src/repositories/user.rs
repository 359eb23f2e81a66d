//! User repository for database operations.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
};
use uuid::Uuid;

use crate::entities::{sea_orm_active_enums::UserRole, users};

/// User repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find_by_id(id).one(&self.db).await
    }

    /// Finds a user by email.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await
    }

    /// Creates a new user with a zero credit balance and no subscription.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create(
        &self,
        email: &str,
        first_name: &str,
        last_name: &str,
        role: UserRole,
    ) -> Result<users::Model, DbErr> {
        let now = chrono::Utc::now().into();
        let user = users::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(email.to_string()),
            first_name: Set(first_name.to_string()),
            last_name: Set(last_name.to_string()),
            role: Set(role),
            credits: Set(0),
            subscription_status: Set("none".to_string()),
            stripe_customer_id: Set(None),
            stripe_subscription_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        user.insert(&self.db).await
    }

    /// Updates a user's role.
    ///
    /// # Errors
    ///
    /// Returns an error if the user does not exist or the update fails.
    pub async fn update_role(&self, id: Uuid, role: UserRole) -> Result<users::Model, DbErr> {
        let user = users::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("user {id}")))?;

        let mut active: users::ActiveModel = user.into();
        active.role = Set(role);
        active.update(&self.db).await
    }

    /// Stores the payment processor's customer ID for a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the user does not exist or the update fails.
    pub async fn set_stripe_customer(
        &self,
        id: Uuid,
        customer_id: &str,
    ) -> Result<users::Model, DbErr> {
        let user = users::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("user {id}")))?;

        let mut active: users::ActiveModel = user.into();
        active.stripe_customer_id = Set(Some(customer_id.to_string()));
        active.update(&self.db).await
    }

    /// Stores the subscription ID and mirrored status after a subscription
    /// is created at the processor.
    ///
    /// # Errors
    ///
    /// Returns an error if the user does not exist or the update fails.
    pub async fn set_subscription(
        &self,
        id: Uuid,
        subscription_id: &str,
        status: &str,
    ) -> Result<users::Model, DbErr> {
        let user = users::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("user {id}")))?;

        let mut active: users::ActiveModel = user.into();
        active.stripe_subscription_id = Set(Some(subscription_id.to_string()));
        active.subscription_status = Set(status.to_string());
        active.update(&self.db).await
    }

    /// Updates the mirrored subscription status for a user.
    ///
    /// The status string is stored verbatim; interpretation happens in the
    /// entitlement check.
    ///
    /// # Errors
    ///
    /// Returns an error if the user does not exist or the update fails.
    pub async fn update_subscription_status(
        &self,
        id: Uuid,
        status: &str,
    ) -> Result<users::Model, DbErr> {
        let user = users::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("user {id}")))?;

        let mut active: users::ActiveModel = user.into();
        active.subscription_status = Set(status.to_string());
        active.update(&self.db).await
    }

    /// Updates the mirrored status of whichever user owns the given
    /// processor subscription. Used by the webhook handler, which only
    /// knows the subscription ID.
    ///
    /// Returns `None` when no user holds that subscription; webhook events
    /// for unknown subscriptions are acknowledged and dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query or update fails.
    pub async fn update_status_by_subscription(
        &self,
        subscription_id: &str,
        status: &str,
    ) -> Result<Option<users::Model>, DbErr> {
        let user = users::Entity::find()
            .filter(users::Column::StripeSubscriptionId.eq(subscription_id))
            .one(&self.db)
            .await?;

        let Some(user) = user else {
            return Ok(None);
        };

        let mut active: users::ActiveModel = user.into();
        active.subscription_status = Set(status.to_string());
        active.update(&self.db).await.map(Some)
    }
}
