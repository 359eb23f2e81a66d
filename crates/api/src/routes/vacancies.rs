//! Vacancy endpoints.
//!
//! Vacancy detail bodies are the paywalled content: zzpers without an
//! active subscription or credits only see a preview of the description.
//! Organizations always see full bodies.

use axum::{
    Json, Router,
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, middleware::AuthUser, routes::error_response};
use zorgmatch_core::billing::{SubscriptionStatus, has_full_access};
use zorgmatch_db::{
    CreateVacancyInput, UserRepository, VacancyError, VacancyRepository,
    entities::sea_orm_active_enums::{UserRole, VacancyStatus},
    entities::{users, vacancies},
};
use zorgmatch_shared::AppError;

/// Characters of the description shown to callers without entitlement.
const PREVIEW_LENGTH: usize = 150;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/vacancies", get(list_vacancies).post(create_vacancy))
        .route("/vacancies/{id}", get(get_vacancy))
        .route("/vacancies/{id}/close", post(close_vacancy))
        .route("/my-vacancies", get(list_my_vacancies))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VacancyResponse {
    id: Uuid,
    user_id: Uuid,
    title: String,
    description: String,
    location: String,
    hours_per_week: Option<i32>,
    hourly_rate: Option<Decimal>,
    status: String,
    created_at: chrono::DateTime<chrono::FixedOffset>,
}

const fn vacancy_status_to_string(status: &VacancyStatus) -> &'static str {
    match status {
        VacancyStatus::Active => "active",
        VacancyStatus::Closed => "closed",
    }
}

impl VacancyResponse {
    fn new(vacancy: vacancies::Model, full_access: bool) -> Self {
        let description = if full_access {
            vacancy.description
        } else {
            redact_description(&vacancy.description)
        };

        Self {
            id: vacancy.id,
            user_id: vacancy.user_id,
            title: vacancy.title,
            description,
            location: vacancy.location,
            hours_per_week: vacancy.hours_per_week,
            hourly_rate: vacancy.hourly_rate,
            status: vacancy_status_to_string(&vacancy.status).to_string(),
            created_at: vacancy.created_at,
        }
    }
}

/// Truncates a description to a preview for callers without entitlement.
fn redact_description(description: &str) -> String {
    if description.chars().count() <= PREVIEW_LENGTH {
        return description.to_string();
    }
    let preview: String = description.chars().take(PREVIEW_LENGTH).collect();
    format!("{preview}...")
}

/// Whether this caller sees full vacancy bodies.
///
/// Organizations always do; zzpers need an active subscription or at
/// least one credit.
fn caller_has_full_access(user: &users::Model) -> bool {
    if user.role == UserRole::Organisatie {
        return true;
    }
    has_full_access(
        &SubscriptionStatus::parse(&user.subscription_status),
        user.credits,
    )
}

async fn load_caller(state: &AppState, user_id: Uuid) -> Result<users::Model, AppError> {
    UserRepository::new((*state.db).clone())
        .find_by_id(user_id)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

/// GET /api/vacancies
async fn list_vacancies(State(state): State<AppState>, auth: AuthUser) -> Response {
    let caller = match load_caller(&state, auth.user_id()).await {
        Ok(user) => user,
        Err(e) => return error_response(&e),
    };
    let full_access = caller_has_full_access(&caller);

    let repo = VacancyRepository::new((*state.db).clone());
    match repo.list_active().await {
        Ok(rows) => {
            let items: Vec<VacancyResponse> = rows
                .into_iter()
                .map(|v| {
                    // Owners always see their own postings in full.
                    let own = v.user_id == caller.id;
                    VacancyResponse::new(v, full_access || own)
                })
                .collect();
            Json(items).into_response()
        }
        Err(e) => error_response(&AppError::Database(e.to_string())),
    }
}

/// GET /api/vacancies/{id}
async fn get_vacancy(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Response {
    let caller = match load_caller(&state, auth.user_id()).await {
        Ok(user) => user,
        Err(e) => return error_response(&e),
    };

    let repo = VacancyRepository::new((*state.db).clone());
    match repo.find_by_id(id).await {
        Ok(Some(vacancy)) => {
            let full_access = caller_has_full_access(&caller) || vacancy.user_id == caller.id;
            Json(VacancyResponse::new(vacancy, full_access)).into_response()
        }
        Ok(None) => error_response(&AppError::NotFound(format!("Vacancy not found: {id}"))),
        Err(e) => error_response(&AppError::Database(e.to_string())),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateVacancyBody {
    title: String,
    description: String,
    location: String,
    hours_per_week: Option<i32>,
    hourly_rate: Option<Decimal>,
}

/// POST /api/vacancies
async fn create_vacancy(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<CreateVacancyBody>,
) -> Response {
    if body.title.trim().is_empty() || body.description.trim().is_empty() {
        return error_response(&AppError::Validation(
            "Title and description are required".to_string(),
        ));
    }

    let repo = VacancyRepository::new((*state.db).clone());
    let input = CreateVacancyInput {
        user_id: auth.user_id(),
        title: body.title,
        description: body.description,
        location: body.location,
        hours_per_week: body.hours_per_week,
        hourly_rate: body.hourly_rate,
    };

    match repo.create(input).await {
        Ok(vacancy) => Json(VacancyResponse::new(vacancy, true)).into_response(),
        Err(VacancyError::NotAnOrganization) => error_response(&AppError::Forbidden(
            "Only organizations can post vacancies".to_string(),
        )),
        Err(VacancyError::UserNotFound(_)) => {
            error_response(&AppError::NotFound("User not found".to_string()))
        }
        Err(e) => error_response(&AppError::Database(e.to_string())),
    }
}

/// POST /api/vacancies/{id}/close
async fn close_vacancy(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Response {
    let repo = VacancyRepository::new((*state.db).clone());
    match repo.close(id, auth.user_id()).await {
        Ok(vacancy) => Json(VacancyResponse::new(vacancy, true)).into_response(),
        Err(VacancyError::NotFound(id)) => {
            error_response(&AppError::NotFound(format!("Vacancy not found: {id}")))
        }
        Err(e) => error_response(&AppError::Database(e.to_string())),
    }
}

/// GET /api/my-vacancies
async fn list_my_vacancies(State(state): State<AppState>, auth: AuthUser) -> Response {
    let repo = VacancyRepository::new((*state.db).clone());
    match repo.list_for_owner(auth.user_id()).await {
        Ok(rows) => {
            let items: Vec<VacancyResponse> = rows
                .into_iter()
                .map(|v| VacancyResponse::new(v, true))
                .collect();
            Json(items).into_response()
        }
        Err(e) => error_response(&AppError::Database(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_short_description_not_truncated() {
        assert_eq!(redact_description("short body"), "short body");
    }

    #[test]
    fn test_long_description_truncated_with_ellipsis() {
        let long = "x".repeat(400);
        let redacted = redact_description(&long);
        assert_eq!(redacted.chars().count(), PREVIEW_LENGTH + 3);
        assert!(redacted.ends_with("..."));
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let long = "é".repeat(200);
        let redacted = redact_description(&long);
        assert!(redacted.starts_with('é'));
        assert_eq!(redacted.chars().count(), PREVIEW_LENGTH + 3);
    }

    fn user_with(role: UserRole, status: &str, credits: i32) -> users::Model {
        let now = chrono::Utc::now().into();
        users::Model {
            id: Uuid::new_v4(),
            email: "test@example.com".to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            role,
            credits,
            subscription_status: status.to_string(),
            stripe_customer_id: None,
            stripe_subscription_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[rstest]
    #[case(UserRole::Zzper, "none", 0, false)]
    #[case(UserRole::Zzper, "none", 1, true)]
    #[case(UserRole::Zzper, "active", 0, true)]
    #[case(UserRole::Zzper, "past_due", 0, false)]
    #[case(UserRole::Organisatie, "none", 0, true)]
    fn test_caller_access(
        #[case] role: UserRole,
        #[case] status: &str,
        #[case] credits: i32,
        #[case] expected: bool,
    ) {
        let user = user_with(role, status, credits);
        assert_eq!(caller_has_full_access(&user), expected);
    }
}
