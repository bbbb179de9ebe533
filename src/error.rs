use actix_web::{HttpResponse, http::StatusCode};
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;

/// Failure taxonomy of the engine. Every workflow error is one of these;
/// the HTTP layer maps them straight to status codes.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("internal server error")]
    Internal(#[source] StoreError),
}

impl EngineError {
    pub fn validation(msg: impl Into<String>) -> Self {
        EngineError::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        EngineError::Conflict(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        EngineError::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        EngineError::NotFound(msg.into())
    }
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => EngineError::NotFound(format!("{what} not found")),
            StoreError::Duplicate => EngineError::Conflict("record already exists".into()),
            StoreError::Stale => EngineError::Conflict("request already processed".into()),
            other => EngineError::Internal(other),
        }
    }
}

impl actix_web::ResponseError for EngineError {
    fn status_code(&self) -> StatusCode {
        match self {
            EngineError::Validation(_) => StatusCode::BAD_REQUEST,
            EngineError::Conflict(_) => StatusCode::CONFLICT,
            EngineError::Forbidden(_) => StatusCode::FORBIDDEN,
            EngineError::NotFound(_) => StatusCode::NOT_FOUND,
            EngineError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let EngineError::Internal(source) = self {
            tracing::error!(error = %source, "request failed");
        }
        HttpResponse::build(self.status_code()).json(json!({ "message": self.to_string() }))
    }
}
