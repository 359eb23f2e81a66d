//! API route definitions.

pub mod applications;
pub mod billing;
pub mod chat;
pub mod health;
pub mod messages;
pub mod profiles;
pub mod users;
pub mod vacancies;
pub mod webhooks;

use axum::{
    Json, Router, http::StatusCode, middleware as axum_middleware, response::Response,
};
use serde_json::json;

use crate::{AppState, middleware::auth_middleware};
use zorgmatch_shared::AppError;

/// Builds the `/api` route tree.
///
/// Everything except the webhook endpoint sits behind the JWT
/// authentication middleware. Webhooks authenticate with the signature
/// header instead.
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .merge(users::routes())
        .merge(billing::routes())
        .merge(profiles::routes())
        .merge(vacancies::routes())
        .merge(applications::routes())
        .merge(messages::routes())
        .layer(axum_middleware::from_fn_with_state(state, auth_middleware));

    protected.merge(webhooks::routes())
}

/// Renders an [`AppError`] as the standard JSON error body.
///
/// Server-side failures are logged with their detail and answered with
/// a generic message so internals never leak to clients.
pub fn error_response(err: &AppError) -> Response {
    use axum::response::IntoResponse;

    let status = StatusCode::from_u16(err.status_code())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        tracing::error!(error = %err, "request failed");
        return (
            status,
            Json(json!({
                "error": err.error_code(),
                "message": "An internal error occurred"
            })),
        )
            .into_response();
    }

    let mut body = json!({
        "error": err.error_code(),
        "message": err.to_string(),
    });

    // Credit shortfalls carry the numbers the client needs to prompt a
    // top-up.
    if let AppError::InsufficientCredits { required, current } = err {
        body["creditsNeeded"] = json!(required);
        body["currentCredits"] = json!(current);
    }

    (status, Json(body)).into_response()
}
