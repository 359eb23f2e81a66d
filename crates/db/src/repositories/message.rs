//! Message repository for database operations.

use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::entities::messages;

/// Message repository for direct messages between users.
#[derive(Debug, Clone)]
pub struct MessageRepository {
    db: DatabaseConnection,
}

impl MessageRepository {
    /// Creates a new message repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Stores a message.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create(
        &self,
        sender_id: Uuid,
        receiver_id: Uuid,
        content: &str,
    ) -> Result<messages::Model, DbErr> {
        let message = messages::ActiveModel {
            id: Set(Uuid::new_v4()),
            sender_id: Set(sender_id),
            receiver_id: Set(receiver_id),
            content: Set(content.to_string()),
            is_read: Set(false),
            created_at: Set(chrono::Utc::now().into()),
        };

        message.insert(&self.db).await
    }

    /// Lists the conversation between two users, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn conversation(
        &self,
        user_a: Uuid,
        user_b: Uuid,
    ) -> Result<Vec<messages::Model>, DbErr> {
        messages::Entity::find()
            .filter(
                Condition::any()
                    .add(
                        Condition::all()
                            .add(messages::Column::SenderId.eq(user_a))
                            .add(messages::Column::ReceiverId.eq(user_b)),
                    )
                    .add(
                        Condition::all()
                            .add(messages::Column::SenderId.eq(user_b))
                            .add(messages::Column::ReceiverId.eq(user_a)),
                    ),
            )
            .order_by_asc(messages::Column::CreatedAt)
            .all(&self.db)
            .await
    }

    /// Marks every message from `sender_id` to `receiver_id` as read.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn mark_conversation_read(
        &self,
        receiver_id: Uuid,
        sender_id: Uuid,
    ) -> Result<u64, DbErr> {
        let result = messages::Entity::update_many()
            .col_expr(messages::Column::IsRead, Expr::value(true))
            .filter(messages::Column::ReceiverId.eq(receiver_id))
            .filter(messages::Column::SenderId.eq(sender_id))
            .filter(messages::Column::IsRead.eq(false))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected)
    }

    /// Counts unread messages for a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn unread_count(&self, receiver_id: Uuid) -> Result<u64, DbErr> {
        messages::Entity::find()
            .filter(messages::Column::ReceiverId.eq(receiver_id))
            .filter(messages::Column::IsRead.eq(false))
            .count(&self.db)
            .await
    }
}
