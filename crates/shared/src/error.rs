//! Application-wide error types.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// Access denied.
    #[error("Access denied: {0}")]
    Forbidden(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Not enough credits to perform the operation.
    #[error("Insufficient credits: {required} required, {current} available")]
    InsufficientCredits {
        /// Credits required for the operation.
        required: i32,
        /// Credits currently available.
        current: i32,
    },

    /// Payment was not completed by the processor.
    #[error("Payment not completed: {0}")]
    PaymentNotCompleted(String),

    /// Payment processor is not configured.
    #[error("Payments are currently unavailable")]
    PaymentUnavailable,

    /// User already has an active subscription.
    #[error("An active subscription already exists")]
    AlreadySubscribed,

    /// User has no subscription to cancel.
    #[error("No active subscription found")]
    NoActiveSubscription,

    /// Conflict (e.g., duplicate entry).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// External service error.
    #[error("External service error: {0}")]
    ExternalService(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Unauthorized(_) => 401,
            Self::InsufficientCredits { .. } => 402,
            Self::Forbidden(_) => 403,
            Self::NotFound(_) | Self::NoActiveSubscription => 404,
            Self::Validation(_) | Self::PaymentNotCompleted(_) | Self::AlreadySubscribed => 400,
            Self::Conflict(_) => 409,
            Self::PaymentUnavailable => 503,
            Self::Database(_) | Self::ExternalService(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InsufficientCredits { .. } => "INSUFFICIENT_CREDITS",
            Self::PaymentNotCompleted(_) => "PAYMENT_NOT_COMPLETED",
            Self::PaymentUnavailable => "PAYMENT_UNAVAILABLE",
            Self::AlreadySubscribed => "ALREADY_SUBSCRIBED",
            Self::NoActiveSubscription => "NO_ACTIVE_SUBSCRIPTION",
            Self::Conflict(_) => "CONFLICT",
            Self::Database(_) => "DATABASE_ERROR",
            Self::ExternalService(_) => "EXTERNAL_SERVICE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(AppError::Unauthorized(String::new()).status_code(), 401);
        assert_eq!(
            AppError::InsufficientCredits {
                required: 1,
                current: 0
            }
            .status_code(),
            402
        );
        assert_eq!(AppError::Forbidden(String::new()).status_code(), 403);
        assert_eq!(AppError::NotFound(String::new()).status_code(), 404);
        assert_eq!(AppError::Validation(String::new()).status_code(), 400);
        assert_eq!(
            AppError::PaymentNotCompleted(String::new()).status_code(),
            400
        );
        assert_eq!(AppError::AlreadySubscribed.status_code(), 400);
        assert_eq!(AppError::NoActiveSubscription.status_code(), 404);
        assert_eq!(AppError::PaymentUnavailable.status_code(), 503);
        assert_eq!(AppError::Conflict(String::new()).status_code(), 409);
        assert_eq!(AppError::Database(String::new()).status_code(), 500);
        assert_eq!(AppError::ExternalService(String::new()).status_code(), 500);
        assert_eq!(AppError::Internal(String::new()).status_code(), 500);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            AppError::InsufficientCredits {
                required: 1,
                current: 0
            }
            .error_code(),
            "INSUFFICIENT_CREDITS"
        );
        assert_eq!(
            AppError::PaymentUnavailable.error_code(),
            "PAYMENT_UNAVAILABLE"
        );
        assert_eq!(
            AppError::PaymentNotCompleted(String::new()).error_code(),
            "PAYMENT_NOT_COMPLETED"
        );
        assert_eq!(
            AppError::AlreadySubscribed.error_code(),
            "ALREADY_SUBSCRIBED"
        );
        assert_eq!(
            AppError::NoActiveSubscription.error_code(),
            "NO_ACTIVE_SUBSCRIPTION"
        );
        assert_eq!(AppError::NotFound(String::new()).error_code(), "NOT_FOUND");
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            AppError::InsufficientCredits {
                required: 1,
                current: 0
            }
            .to_string(),
            "Insufficient credits: 1 required, 0 available"
        );
        assert_eq!(
            AppError::PaymentUnavailable.to_string(),
            "Payments are currently unavailable"
        );
        assert_eq!(
            AppError::NotFound("msg".into()).to_string(),
            "Not found: msg"
        );
    }
}
