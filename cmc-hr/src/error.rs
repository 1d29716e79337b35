//! Error types for cmc-hr
//!
//! Every handler returns [`ApiResult`]; failures render as
//! `{"error": {"code", "message"}}` with extra fields for validation and
//! checklist failures.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cmc_common::api::ErrorResponse;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::checklist::{ChecklistError, ChecklistSummary};
use crate::onboarding::{Phase, TransitionError};
use crate::validation::FieldError;

/// Result alias for handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("{0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("{0}")]
    BadRequest(String),

    /// Form validation failed (400) with per-field messages
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    /// Missing, invalid or expired session (401)
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated but not allowed (403)
    #[error("{0}")]
    Forbidden(String),

    /// Caller's onboarding checklist is incomplete (403)
    #[error("Complete your onboarding checklist first ({}% done)", .0.percent_complete)]
    ChecklistIncomplete(ChecklistSummary),

    /// Write conflicts with current state (409)
    #[error("{0}")]
    Conflict(String),

    /// Onboarding transition not allowed from the current phase (409)
    #[error("Cannot move onboarding from {from} to {to}")]
    InvalidTransition { from: Phase, to: Phase },

    /// HR-area write before the onboarding workflow reached its phase (409)
    #[error("System setup has not reached the {required} phase (currently {current})")]
    SetupPhaseNotReached { required: Phase, current: Phase },

    /// Internal server error (500)
    #[error("{0}")]
    Internal(String),

    /// Database error (500)
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    /// Generic error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_FAILED"),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            ApiError::ChecklistIncomplete(_) => (StatusCode::FORBIDDEN, "CHECKLIST_INCOMPLETE"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            ApiError::InvalidTransition { .. } => (StatusCode::CONFLICT, "INVALID_TRANSITION"),
            ApiError::SetupPhaseNotReached { .. } => {
                (StatusCode::CONFLICT, "SETUP_PHASE_NOT_REACHED")
            }
            ApiError::Internal(_) | ApiError::Database(_) | ApiError::Other(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        if status.is_server_error() {
            error!("{}: {}", code, self);
        }

        let mut body = json!(ErrorResponse::new(code, self.to_string()));

        match &self {
            ApiError::Validation(fields) => {
                body["error"]["fields"] = json!(fields);
            }
            ApiError::ChecklistIncomplete(summary) => {
                body["checklist"] = json!(summary);
            }
            _ => {}
        }

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Record not found".to_string()),
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                ApiError::Conflict(format!("Duplicate value: {}", db_err.message()))
            }
            sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                ApiError::Conflict(format!("Referenced record conflict: {}", db_err.message()))
            }
            _ => ApiError::Database(err),
        }
    }
}

impl From<cmc_common::Error> for ApiError {
    fn from(err: cmc_common::Error) -> Self {
        use cmc_common::Error;

        match err {
            Error::Database(db_err) => db_err.into(),
            Error::NotFound(msg) => ApiError::NotFound(msg),
            Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            Error::Conflict(msg) => ApiError::Conflict(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<TransitionError> for ApiError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::InvalidTransition { from, to } => {
                ApiError::InvalidTransition { from, to }
            }
            TransitionError::NotPhaseOwner { .. } => ApiError::Forbidden(err.to_string()),
        }
    }
}

impl From<ChecklistError> for ApiError {
    fn from(err: ChecklistError) -> Self {
        match err {
            ChecklistError::UnknownItem(_) => ApiError::NotFound(err.to_string()),
            ChecklistError::ProfileBacked(_) => ApiError::BadRequest(err.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}
