//! Error types for gradebook-api
//!
//! Every failing handler answers `{"error": {"code", "message"}}`. Server-side
//! failures are logged here and reach the client as a generic message.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use gradebook_common::api::{AuthError, ErrorResponse, SignatureError};
use gradebook_common::{NotFoundOrForbidden, Plan};
use thiserror::Error;
use tracing::{error, warn};

use crate::services::AnalysisError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or invalid credential (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Record missing or owned by another parent (404)
    #[error("Resource not found")]
    NotFoundOrForbidden,

    /// Resource not found (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Plan capacity exhausted (402)
    #[error("Plan limit reached: {plan} plan allows {limit} children")]
    PlanLimitReached { plan: Plan, limit: i64 },

    /// Language-model provider failed (502)
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Feature not configured (503)
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Common error: {0}")]
    Common(#[from] gradebook_common::Error),
}

impl From<NotFoundOrForbidden> for ApiError {
    fn from(_: NotFoundOrForbidden) -> Self {
        ApiError::NotFoundOrForbidden
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Unauthorized(err.to_string())
    }
}

impl From<SignatureError> for ApiError {
    fn from(err: SignatureError) -> Self {
        ApiError::Unauthorized(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<AnalysisError> for ApiError {
    fn from(err: AnalysisError) -> Self {
        match err {
            AnalysisError::NoGrades => ApiError::BadRequest(err.to_string()),
            AnalysisError::EmptyResponse
            | AnalysisError::Timeout(_)
            | AnalysisError::Backend(_) => ApiError::Upstream(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::Unauthorized(msg) => {
                warn!("Rejected credential: {}", msg);
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg)
            }
            ApiError::NotFoundOrForbidden => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                "Resource not found".to_string(),
            ),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::PlanLimitReached { plan, limit } => (
                StatusCode::PAYMENT_REQUIRED,
                "PLAN_LIMIT_REACHED",
                format!(
                    "The {} plan allows at most {} {}; upgrade to add more",
                    plan,
                    limit,
                    if limit == 1 { "child" } else { "children" }
                ),
            ),
            ApiError::Upstream(msg) => {
                error!("Upstream failure: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    "UPSTREAM_ERROR",
                    "Analysis service failed".to_string(),
                )
            }
            ApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, "UNAVAILABLE", msg),
            ApiError::Internal(ref msg) => {
                error!("Internal error: {}", msg);
                internal()
            }
            ApiError::Database(ref err) => {
                error!("Database error: {}", err);
                internal()
            }
            ApiError::Common(ref err) => {
                error!("Common error: {}", err);
                internal()
            }
        };

        (status, Json(ErrorResponse::new(code, message))).into_response()
    }
}

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "Internal server error".to_string(),
    )
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
