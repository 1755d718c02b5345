use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::domain::services::IneligibilityReason;
use crate::export::ExportError;
use crate::store::StoreError;
use crate::MarketplaceError;

/// HTTP error rendered as `{"error": {"type", "message", "statusCode"}}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("invalid request: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("unauthorized")]
    Unauthorized,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("no data to export")]
    NoData,

    #[error("internal error: {0}")]
    Internal(String),
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

impl From<ExportError> for ApiError {
    fn from(err: ExportError) -> Self {
        match err {
            ExportError::NoData => ApiError::NoData,
            ExportError::InvalidFileName(e) => ApiError::BadRequest(e.to_string()),
        }
    }
}

impl From<MarketplaceError> for ApiError {
    fn from(err: MarketplaceError) -> Self {
        match err {
            MarketplaceError::ReviewNotFound => ApiError::NotFound("review".to_string()),
            MarketplaceError::Ineligible(IneligibilityReason::Unauthenticated) => ApiError::Unauthorized,
            MarketplaceError::Ineligible(reason) => ApiError::Conflict(reason.to_string()),
            MarketplaceError::Review(e) => ApiError::Conflict(e.to_string()),
            MarketplaceError::Export(e) => e.into(),
            MarketplaceError::Storage(StoreError::NotFound) => ApiError::NotFound("record".to_string()),
            MarketplaceError::Storage(e @ StoreError::DuplicateReview) => ApiError::Conflict(e.to_string()),
            MarketplaceError::Storage(e) => ApiError::Internal(e.to_string()),
            MarketplaceError::Internal(msg) => ApiError::Internal(msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            ApiError::NotFound(what) => (StatusCode::NOT_FOUND, "notFound", format!("{what} not found")),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "badRequest", msg.clone()),
            ApiError::Validation(errors) => (StatusCode::BAD_REQUEST, "validation", errors.to_string()),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", "Authentication required".to_string()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            ApiError::NoData => (StatusCode::UNPROCESSABLE_ENTITY, "noData", "No data to export".to_string()),
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                (StatusCode::INTERNAL_SERVER_ERROR, "internalError", "An internal error occurred".to_string())
            }
        };

        let body = json!({
            "error": {
                "type": error_type,
                "message": message,
                "statusCode": status.as_u16(),
            }
        });

        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
