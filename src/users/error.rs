use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::gateway::GatewayError;

/// One rejected request field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

fn describe(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|f| format!("{}: {}", f.field, f.message))
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Error)]
pub enum UserError {
    #[error("User {0} not found")]
    NotFound(i64),

    #[error("Email '{0}' is already registered")]
    DuplicateEmail(String),

    #[error("Invalid input: {}", describe(.0))]
    Validation(Vec<FieldError>),

    #[error("Storage error: {0}")]
    Storage(#[from] GatewayError),
}

pub type UserResult<T> = Result<T, UserError>;

impl IntoResponse for UserError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            UserError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            UserError::DuplicateEmail(_) => (StatusCode::BAD_REQUEST, "duplicate_email"),
            UserError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error"),
            UserError::Storage(e) => {
                tracing::error!(error = %e, "storage error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        };

        let body = match self {
            UserError::Validation(fields) => json!({
                "error": {
                    "type": error_type,
                    "message": "Request validation failed",
                    "fields": fields,
                }
            }),
            UserError::Storage(_) => json!({
                "error": {
                    "type": error_type,
                    "message": "An internal error occurred",
                }
            }),
            other => json!({
                "error": {
                    "type": error_type,
                    "message": other.to_string(),
                }
            }),
        };

        (status, Json(body)).into_response()
    }
}
