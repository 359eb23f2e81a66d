//! Authenticated user profile endpoints.

use axum::{
    Json, Router,
    extract::State,
    response::IntoResponse,
    routing::{get, patch},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, middleware::AuthUser, routes::error_response};
use zorgmatch_db::{UserRepository, entities::sea_orm_active_enums::UserRole, entities::users};
use zorgmatch_shared::AppError;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/user", get(get_current_user))
        .route("/auth/user/role", patch(update_role))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UserResponse {
    id: Uuid,
    email: String,
    first_name: String,
    last_name: String,
    role: String,
    credits: i32,
    subscription_status: String,
}

impl From<users::Model> for UserResponse {
    fn from(user: users::Model) -> Self {
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            role: role_to_string(&user.role).to_string(),
            credits: user.credits,
            subscription_status: user.subscription_status,
        }
    }
}

pub(crate) const fn role_to_string(role: &UserRole) -> &'static str {
    match role {
        UserRole::Zzper => "zzper",
        UserRole::Organisatie => "organisatie",
    }
}

fn parse_role(value: &str) -> Option<UserRole> {
    match value {
        "zzper" => Some(UserRole::Zzper),
        "organisatie" => Some(UserRole::Organisatie),
        _ => None,
    }
}

/// GET /api/auth/user
async fn get_current_user(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    let repo = UserRepository::new((*state.db).clone());

    match repo.find_by_id(auth.user_id()).await {
        Ok(Some(user)) => Json(UserResponse::from(user)).into_response(),
        Ok(None) => error_response(&AppError::NotFound("User not found".to_string())),
        Err(e) => error_response(&AppError::Database(e.to_string())),
    }
}

#[derive(Debug, Deserialize)]
struct UpdateRoleRequest {
    role: String,
}

/// PATCH /api/auth/user/role
async fn update_role(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<UpdateRoleRequest>,
) -> impl IntoResponse {
    let Some(role) = parse_role(&payload.role) else {
        return error_response(&AppError::Validation(
            "Role must be 'zzper' or 'organisatie'".to_string(),
        ));
    };

    let repo = UserRepository::new((*state.db).clone());

    match repo.update_role(auth.user_id(), role).await {
        Ok(user) => Json(UserResponse::from(user)).into_response(),
        Err(sea_orm::DbErr::RecordNotFound(_)) => {
            error_response(&AppError::NotFound("User not found".to_string()))
        }
        Err(e) => error_response(&AppError::Database(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_role() {
        assert_eq!(parse_role("zzper"), Some(UserRole::Zzper));
        assert_eq!(parse_role("organisatie"), Some(UserRole::Organisatie));
        assert_eq!(parse_role("admin"), None);
        assert_eq!(parse_role(""), None);
    }

    #[test]
    fn test_role_round_trip() {
        for role in [UserRole::Zzper, UserRole::Organisatie] {
            assert_eq!(parse_role(role_to_string(&role)), Some(role));
        }
    }
}
