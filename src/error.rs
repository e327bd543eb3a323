use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;
use uuid::Uuid;

use crate::models::entity::EntityType;
use crate::services::authorization::Rule;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {rule}")]
    Forbidden { rule: Rule },

    #[error("Cannot {action} a {from} record (allowed next states: {allowed:?})")]
    InvalidTransition {
        from: String,
        action: String,
        allowed: Vec<String>,
        reason: Option<String>,
    },

    #[error("Submission cycle {0} is not accepting submissions")]
    InactiveCycle(Uuid),

    #[error("Missing required document: {0}")]
    MissingRequiredDocument(String),

    #[error("Company {0} is blacklisted")]
    CompanyBlacklisted(Uuid),

    #[error("Application {0} already has an evaluation")]
    DuplicateEvaluation(Uuid),

    #[error("Rating must be an integer from 1 to 5")]
    InvalidRating(Option<i64>),

    #[error("A reason is required: {0}")]
    MissingReason(String),

    #[error("Concurrent modification of {entity} {id}: {detail}")]
    ConcurrentModification {
        entity: EntityType,
        id: Uuid,
        detail: String,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Excel export error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}

impl Error {
    pub fn forbidden(rule: Rule) -> Self {
        Error::Forbidden { rule }
    }

    /// Stable machine-readable kind, surfaced as the `error` field.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Config(_) => "config",
            Error::BadRequest(_) => "bad_request",
            Error::Unauthorized(_) => "unauthorized",
            Error::NotFound(_) => "not_found",
            Error::Forbidden { .. } => "forbidden",
            Error::InvalidTransition { .. } => "invalid_transition",
            Error::InactiveCycle(_) => "inactive_cycle",
            Error::MissingRequiredDocument(_) => "missing_required_document",
            Error::CompanyBlacklisted(_) => "company_blacklisted",
            Error::DuplicateEvaluation(_) => "duplicate_evaluation",
            Error::InvalidRating(_) => "invalid_rating",
            Error::MissingReason(_) => "missing_reason",
            Error::ConcurrentModification { .. } => "concurrent_modification",
            Error::Validation(_) => "validation",
            Error::Json(_) => "bad_json",
            Error::Reqwest(_) => "upstream",
            Error::Internal(_) => "internal",
            Error::Xlsx(_) => "export",
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::ConcurrentModification { .. })
    }

    fn status(&self) -> StatusCode {
        match self {
            Error::BadRequest(_) | Error::Validation(_) | Error::Json(_) => StatusCode::BAD_REQUEST,
            Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Error::Forbidden { .. } => StatusCode::FORBIDDEN,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::InvalidTransition { .. }
            | Error::DuplicateEvaluation(_)
            | Error::ConcurrentModification { .. } => StatusCode::CONFLICT,
            Error::InactiveCycle(_)
            | Error::MissingRequiredDocument(_)
            | Error::CompanyBlacklisted(_)
            | Error::InvalidRating(_)
            | Error::MissingReason(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::Reqwest(_) => StatusCode::BAD_GATEWAY,
            Error::Config(_) | Error::Internal(_) | Error::Xlsx(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let mut body = json!({
            "error": self.kind(),
            "message": self.to_string(),
        });
        match &self {
            Error::Forbidden { rule } => {
                body["rule"] = json!(rule.as_str());
            }
            Error::InvalidTransition {
                from,
                action,
                allowed,
                reason,
            } => {
                body["from"] = json!(from);
                body["action"] = json!(action);
                body["allowed"] = json!(allowed);
                body["reason"] = json!(reason);
            }
            Error::ConcurrentModification { entity, id, .. } => {
                body["entity"] = json!(entity);
                body["id"] = json!(id);
                body["retryable"] = json!(true);
            }
            Error::InvalidRating(rating) => {
                body["rating"] = json!(rating);
            }
            _ => {}
        }

        (status, Json(body)).into_response()
    }
}
