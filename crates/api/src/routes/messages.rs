//! Direct message endpoints.
//!
//! Fetching a conversation marks the caller's incoming messages read;
//! unread counts elsewhere stay accurate without a separate ack call.

use axum::{
    Json, Router,
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, middleware::AuthUser, routes::error_response};
use zorgmatch_db::{MessageRepository, entities::messages};
use zorgmatch_shared::AppError;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/messages", post(send_message))
        .route("/messages/unread-count", get(unread_count))
        .route("/messages/{other_user_id}", get(get_conversation))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MessageResponse {
    id: Uuid,
    sender_id: Uuid,
    receiver_id: Uuid,
    content: String,
    is_read: bool,
    created_at: chrono::DateTime<chrono::FixedOffset>,
}

impl From<messages::Model> for MessageResponse {
    fn from(msg: messages::Model) -> Self {
        Self {
            id: msg.id,
            sender_id: msg.sender_id,
            receiver_id: msg.receiver_id,
            content: msg.content,
            is_read: msg.is_read,
            created_at: msg.created_at,
        }
    }
}

/// GET /api/messages/{other_user_id}
///
/// The conversation with another user, oldest first.
async fn get_conversation(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(other_user_id): Path<Uuid>,
) -> Response {
    let repo = MessageRepository::new((*state.db).clone());

    if let Err(e) = repo
        .mark_conversation_read(auth.user_id(), other_user_id)
        .await
    {
        return error_response(&AppError::Database(e.to_string()));
    }

    match repo.conversation(auth.user_id(), other_user_id).await {
        Ok(rows) => {
            let items: Vec<MessageResponse> =
                rows.into_iter().map(MessageResponse::from).collect();
            Json(items).into_response()
        }
        Err(e) => error_response(&AppError::Database(e.to_string())),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendMessageBody {
    receiver_id: Uuid,
    content: String,
}

/// POST /api/messages
async fn send_message(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<SendMessageBody>,
) -> Response {
    if body.content.trim().is_empty() {
        return error_response(&AppError::Validation(
            "Message content is required".to_string(),
        ));
    }
    if body.receiver_id == auth.user_id() {
        return error_response(&AppError::Validation(
            "Cannot send a message to yourself".to_string(),
        ));
    }

    let repo = MessageRepository::new((*state.db).clone());
    match repo
        .create(auth.user_id(), body.receiver_id, &body.content)
        .await
    {
        Ok(message) => Json(MessageResponse::from(message)).into_response(),
        Err(e) => error_response(&AppError::Database(e.to_string())),
    }
}

#[derive(Debug, Serialize)]
struct UnreadCountResponse {
    count: u64,
}

/// GET /api/messages/unread-count
async fn unread_count(State(state): State<AppState>, auth: AuthUser) -> Response {
    let repo = MessageRepository::new((*state.db).clone());
    match repo.unread_count(auth.user_id()).await {
        Ok(count) => Json(UnreadCountResponse { count }).into_response(),
        Err(e) => error_response(&AppError::Database(e.to_string())),
    }
}
