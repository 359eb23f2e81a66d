//! Zzp profile endpoints.
//!
//! Zzpers present themselves to organizations through a profile: a
//! headline, an introduction, and availability. One profile per user;
//! organizations browse the directory but never carry one.

use axum::{
    Json, Router,
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::get,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, middleware::AuthUser, routes::error_response};
use zorgmatch_db::{ProfileError, ProfileInput, ProfileRepository, entities::zzp_profiles};
use zorgmatch_shared::AppError;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/profile",
            get(get_my_profile).post(create_profile).patch(update_profile),
        )
        .route("/profiles", get(list_profiles))
        .route("/profiles/{id}", get(get_profile))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProfileResponse {
    id: Uuid,
    user_id: Uuid,
    title: String,
    bio: Option<String>,
    specialization: Option<String>,
    hourly_rate: Option<Decimal>,
    hours_per_week: Option<i32>,
    location: Option<String>,
    available: bool,
    created_at: chrono::DateTime<chrono::FixedOffset>,
}

impl From<zzp_profiles::Model> for ProfileResponse {
    fn from(profile: zzp_profiles::Model) -> Self {
        Self {
            id: profile.id,
            user_id: profile.user_id,
            title: profile.title,
            bio: profile.bio,
            specialization: profile.specialization,
            hourly_rate: profile.hourly_rate,
            hours_per_week: profile.hours_per_week,
            location: profile.location,
            available: profile.available,
            created_at: profile.created_at,
        }
    }
}

fn profile_error(err: ProfileError) -> AppError {
    match err {
        ProfileError::NotFound => AppError::NotFound("Profile not found".to_string()),
        ProfileError::UserNotFound(_) => AppError::NotFound("User not found".to_string()),
        ProfileError::NotAZzper => {
            AppError::Forbidden("Only zzpers can create a profile".to_string())
        }
        ProfileError::AlreadyExists => {
            AppError::Conflict("Profile already exists for this user".to_string())
        }
        ProfileError::Database(e) => AppError::Database(e.to_string()),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileBody {
    title: String,
    bio: Option<String>,
    specialization: Option<String>,
    hourly_rate: Option<Decimal>,
    hours_per_week: Option<i32>,
    location: Option<String>,
    available: Option<bool>,
}

impl ProfileBody {
    /// Validates the body and converts it to repository input.
    fn into_input(self) -> Result<ProfileInput, AppError> {
        if self.title.trim().is_empty() {
            return Err(AppError::Validation("Title is required".to_string()));
        }
        Ok(ProfileInput {
            title: self.title,
            bio: self.bio,
            specialization: self.specialization,
            hourly_rate: self.hourly_rate,
            hours_per_week: self.hours_per_week,
            location: self.location,
            available: self.available.unwrap_or(true),
        })
    }
}

/// GET /api/profile
async fn get_my_profile(State(state): State<AppState>, auth: AuthUser) -> Response {
    let repo = ProfileRepository::new((*state.db).clone());
    match repo.find_for_user(auth.user_id()).await {
        Ok(Some(profile)) => Json(ProfileResponse::from(profile)).into_response(),
        Ok(None) => error_response(&AppError::NotFound("Profile not found".to_string())),
        Err(e) => error_response(&AppError::Database(e.to_string())),
    }
}

/// POST /api/profile
async fn create_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<ProfileBody>,
) -> Response {
    let input = match body.into_input() {
        Ok(input) => input,
        Err(e) => return error_response(&e),
    };

    let repo = ProfileRepository::new((*state.db).clone());
    match repo.create(auth.user_id(), input).await {
        Ok(profile) => Json(ProfileResponse::from(profile)).into_response(),
        Err(e) => error_response(&profile_error(e)),
    }
}

/// PATCH /api/profile
async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<ProfileBody>,
) -> Response {
    let input = match body.into_input() {
        Ok(input) => input,
        Err(e) => return error_response(&e),
    };

    let repo = ProfileRepository::new((*state.db).clone());
    match repo.update(auth.user_id(), input).await {
        Ok(profile) => Json(ProfileResponse::from(profile)).into_response(),
        Err(e) => error_response(&profile_error(e)),
    }
}

/// GET /api/profiles
async fn list_profiles(State(state): State<AppState>) -> Response {
    let repo = ProfileRepository::new((*state.db).clone());
    match repo.list_all().await {
        Ok(rows) => {
            let items: Vec<ProfileResponse> =
                rows.into_iter().map(ProfileResponse::from).collect();
            Json(items).into_response()
        }
        Err(e) => error_response(&AppError::Database(e.to_string())),
    }
}

/// GET /api/profiles/{id}
async fn get_profile(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    let repo = ProfileRepository::new((*state.db).clone());
    match repo.find_by_id(id).await {
        Ok(Some(profile)) => Json(ProfileResponse::from(profile)).into_response(),
        Ok(None) => error_response(&AppError::NotFound("Profile not found".to_string())),
        Err(e) => error_response(&AppError::Database(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode, header::AUTHORIZATION},
        middleware::from_fn_with_state,
    };
    use http_body_util::BodyExt;
    use sea_orm::DatabaseConnection;
    use std::sync::Arc;
    use tokio::sync::broadcast;
    use tower::ServiceExt;
    use zorgmatch_shared::{JwtConfig, JwtService};

    use crate::{BillingSettings, middleware::auth_middleware};

    fn test_state() -> AppState {
        let (chat, _) = broadcast::channel(8);
        AppState {
            db: Arc::new(DatabaseConnection::Disconnected),
            jwt_service: Arc::new(JwtService::new(JwtConfig::default())),
            payments: None,
            billing: BillingSettings {
                webhook_secret: None,
                subscription_price_cents: 1499,
                currency: "eur".to_string(),
            },
            chat,
        }
    }

    fn test_app(state: AppState) -> Router {
        Router::new()
            .merge(routes())
            .layer(from_fn_with_state(state.clone(), auth_middleware))
            .with_state(state)
    }

    #[tokio::test]
    async fn test_profile_requires_auth() {
        let app = test_app(test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/profile")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_create_profile_rejects_empty_title() {
        let state = test_state();
        let token = state
            .jwt_service
            .generate_access_token(Uuid::new_v4(), "zzper")
            .expect("should generate token");
        let app = test_app(state);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/profile")
                    .header("Content-Type", "application/json")
                    .header(AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::from(r#"{"title":"   "}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "VALIDATION_ERROR");
    }

    #[test]
    fn test_body_defaults_to_available() {
        let body: ProfileBody =
            serde_json::from_str(r#"{"title":"Wijkverpleegkundige"}"#).unwrap();
        let input = body.into_input().unwrap();
        assert!(input.available);
        assert_eq!(input.title, "Wijkverpleegkundige");
    }
}
