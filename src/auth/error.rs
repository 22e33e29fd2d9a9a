use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::auth::{
    dto::ErrorResponse, password::HashError, repo_types::StoreError, validation::ValidationError,
};

/// Errors surfaced to HTTP clients, each with a fixed status code.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("invalid phone number or password")]
    InvalidCredentials,
    #[error("Phone number already registered")]
    Conflict,
    #[error("invalid token")]
    Forbidden,
    #[error("{0}")]
    Internal(String),
}

impl ServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) | ServiceError::InvalidCredentials => {
                StatusCode::BAD_REQUEST
            }
            ServiceError::Conflict => StatusCode::CONFLICT,
            ServiceError::Forbidden => StatusCode::FORBIDDEN,
            ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(e: ValidationError) -> Self {
        ServiceError::Validation(e.to_string())
    }
}

impl From<HashError> for ServiceError {
    fn from(e: HashError) -> Self {
        ServiceError::Internal(e.0)
    }
}

impl From<JsonRejection> for ServiceError {
    fn from(e: JsonRejection) -> Self {
        ServiceError::Validation(e.body_text())
    }
}

/// Conflict and infra failures only; callers decide what `NotFound` means.
impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict => ServiceError::Conflict,
            StoreError::NotFound => ServiceError::Internal("record not found".into()),
            StoreError::Unavailable(msg) => ServiceError::Internal(msg),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(ErrorResponse { message: self.to_string() })).into_response()
    }
}
