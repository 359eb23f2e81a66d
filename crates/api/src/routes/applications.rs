//! Application endpoints.
//!
//! Submission is the operation that consumes a ledger credit. The
//! eligibility checks run before the credit is touched so a doomed
//! submission never charges anyone; subscribed zzpers bypass the
//! ledger entirely.

use axum::{
    Json, Router,
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::{get, patch},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, middleware::AuthUser, routes::error_response};
use zorgmatch_core::billing::{APPLICATION_CREDIT_COST, SubscriptionStatus};
use zorgmatch_db::{
    ApplicationError, ApplicationRepository, ApplicationWithVacancy, LedgerError, LedgerRepository,
    UserRepository,
    entities::applications,
    entities::sea_orm_active_enums::ApplicationStatus,
};
use zorgmatch_shared::AppError;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/applications", get(list_received).post(submit_application))
        .route("/applications/{id}/status", patch(update_status))
        .route("/my-applications", get(list_my_applications))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApplicationResponse {
    id: Uuid,
    vacancy_id: Uuid,
    applicant_id: Uuid,
    message: Option<String>,
    status: String,
    created_at: chrono::DateTime<chrono::FixedOffset>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApplicationWithVacancyResponse {
    #[serde(flatten)]
    application: ApplicationResponse,
    vacancy_title: String,
    vacancy_location: String,
}

const fn application_status_to_string(status: &ApplicationStatus) -> &'static str {
    match status {
        ApplicationStatus::Pending => "pending",
        ApplicationStatus::Accepted => "accepted",
        ApplicationStatus::Rejected => "rejected",
    }
}

fn parse_application_status(value: &str) -> Option<ApplicationStatus> {
    match value {
        "pending" => Some(ApplicationStatus::Pending),
        "accepted" => Some(ApplicationStatus::Accepted),
        "rejected" => Some(ApplicationStatus::Rejected),
        _ => None,
    }
}

impl From<applications::Model> for ApplicationResponse {
    fn from(app: applications::Model) -> Self {
        Self {
            id: app.id,
            vacancy_id: app.vacancy_id,
            applicant_id: app.applicant_id,
            message: app.message,
            status: application_status_to_string(&app.status).to_string(),
            created_at: app.created_at,
        }
    }
}

impl From<ApplicationWithVacancy> for ApplicationWithVacancyResponse {
    fn from(row: ApplicationWithVacancy) -> Self {
        Self {
            application: ApplicationResponse::from(row.application),
            vacancy_title: row.vacancy.title,
            vacancy_location: row.vacancy.location,
        }
    }
}

fn application_error(err: ApplicationError) -> AppError {
    match err {
        ApplicationError::VacancyNotFound(id) => {
            AppError::NotFound(format!("Vacancy not found: {id}"))
        }
        ApplicationError::UserNotFound(_) => AppError::NotFound("User not found".to_string()),
        ApplicationError::NotAZzper => {
            AppError::Forbidden("Only zzpers can apply to vacancies".to_string())
        }
        ApplicationError::AlreadyApplied(_) => {
            AppError::Conflict("Already applied to this vacancy".to_string())
        }
        ApplicationError::Database(e) => AppError::Database(e.to_string()),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitApplicationBody {
    vacancy_id: Uuid,
    message: Option<String>,
}

/// POST /api/applications
///
/// Non-subscribed zzpers pay one credit; the conditional decrement in
/// the ledger answers 402 when the balance cannot cover it.
async fn submit_application(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<SubmitApplicationBody>,
) -> Response {
    let applications = ApplicationRepository::new((*state.db).clone());

    if let Err(e) = applications
        .check_can_apply(body.vacancy_id, auth.user_id())
        .await
    {
        return error_response(&application_error(e));
    }

    let users = UserRepository::new((*state.db).clone());
    let user = match users.find_by_id(auth.user_id()).await {
        Ok(Some(user)) => user,
        Ok(None) => return error_response(&AppError::NotFound("User not found".to_string())),
        Err(e) => return error_response(&AppError::Database(e.to_string())),
    };

    let subscribed = SubscriptionStatus::parse(&user.subscription_status).is_active();
    if !subscribed {
        let ledger = LedgerRepository::new((*state.db).clone());
        let consumed = ledger
            .consume_credits(
                auth.user_id(),
                APPLICATION_CREDIT_COST,
                "Credit used for application",
            )
            .await;

        match consumed {
            Ok(remaining) => {
                tracing::info!(
                    user_id = %auth.user_id(),
                    vacancy_id = %body.vacancy_id,
                    remaining,
                    "consumed application credit"
                );
            }
            Err(LedgerError::InsufficientCredits { required, current }) => {
                return error_response(&AppError::InsufficientCredits { required, current });
            }
            Err(LedgerError::UserNotFound(_)) => {
                return error_response(&AppError::NotFound("User not found".to_string()));
            }
            Err(e) => return error_response(&AppError::Database(e.to_string())),
        }
    }

    match applications
        .create(body.vacancy_id, auth.user_id(), body.message)
        .await
    {
        Ok(application) => Json(ApplicationResponse::from(application)).into_response(),
        Err(e) => error_response(&application_error(e)),
    }
}

/// GET /api/my-applications
async fn list_my_applications(State(state): State<AppState>, auth: AuthUser) -> Response {
    let repo = ApplicationRepository::new((*state.db).clone());
    match repo.list_for_applicant(auth.user_id()).await {
        Ok(rows) => {
            let items: Vec<ApplicationWithVacancyResponse> = rows
                .into_iter()
                .map(ApplicationWithVacancyResponse::from)
                .collect();
            Json(items).into_response()
        }
        Err(e) => error_response(&AppError::Database(e.to_string())),
    }
}

/// GET /api/applications
///
/// Applications received on the caller's vacancies.
async fn list_received(State(state): State<AppState>, auth: AuthUser) -> Response {
    let repo = ApplicationRepository::new((*state.db).clone());
    match repo.list_for_vacancy_owner(auth.user_id()).await {
        Ok(rows) => {
            let items: Vec<ApplicationWithVacancyResponse> = rows
                .into_iter()
                .map(ApplicationWithVacancyResponse::from)
                .collect();
            Json(items).into_response()
        }
        Err(e) => error_response(&AppError::Database(e.to_string())),
    }
}

#[derive(Debug, Deserialize)]
struct UpdateStatusBody {
    status: String,
}

/// PATCH /api/applications/{id}/status
async fn update_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateStatusBody>,
) -> Response {
    let Some(status) = parse_application_status(&body.status) else {
        return error_response(&AppError::Validation(
            "Status must be 'pending', 'accepted' or 'rejected'".to_string(),
        ));
    };

    let repo = ApplicationRepository::new((*state.db).clone());
    match repo.update_status(id, auth.user_id(), status).await {
        Ok(application) => Json(ApplicationResponse::from(application)).into_response(),
        Err(ApplicationError::VacancyNotFound(_)) => {
            error_response(&AppError::NotFound("Application not found".to_string()))
        }
        Err(e) => error_response(&application_error(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_application_status() {
        assert_eq!(
            parse_application_status("accepted"),
            Some(ApplicationStatus::Accepted)
        );
        assert_eq!(
            parse_application_status("rejected"),
            Some(ApplicationStatus::Rejected)
        );
        assert_eq!(parse_application_status("archived"), None);
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            ApplicationStatus::Pending,
            ApplicationStatus::Accepted,
            ApplicationStatus::Rejected,
        ] {
            assert_eq!(
                parse_application_status(application_status_to_string(&status)),
                Some(status)
            );
        }
    }
}
