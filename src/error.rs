use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use thiserror::Error;

/// ApiError
///
/// The application-wide failure taxonomy. Every fallible operation in the
/// service, engine, and repository layers returns this type; the HTTP boundary
/// converts it into the structured error envelope.
///
/// Variants map directly to response status codes:
/// - `BadRequest` (400): malformed or invalid input, optionally naming the
///   offending field.
/// - `NotFound` (404): a referenced entity is absent.
/// - `AuthenticationRequired` (401): no or invalid credential.
/// - `Forbidden` (403): authenticated but denied by policy.
/// - `Internal` (500): unexpected or collaborator failure. The underlying
///   cause is logged where the error is constructed; only a generic message
///   crosses the boundary.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    BadRequest {
        message: String,
        field: Option<String>,
    },

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    AuthenticationRequired(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Internal Server Error")]
    Internal,
}

impl ApiError {
    /// Builds a `BadRequest` without field detail.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
            field: None,
        }
    }

    /// Builds a `BadRequest` naming the offending input field.
    pub fn bad_request_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// internal
    ///
    /// Records an unexpected failure with its operation context and returns the
    /// generic `Internal` variant. The detail stays in the logs; callers only
    /// ever see "Internal Server Error".
    pub fn internal(operation: &'static str, err: impl std::fmt::Debug) -> Self {
        tracing::error!(operation, error = ?err, "unexpected internal failure");
        Self::Internal
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::AuthenticationRequired(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    /// Renders the error envelope shared by every failed request:
    /// `{ "success": false, "status": <code>, "message": <text>, "data": {...} }`.
    /// A `BadRequest` carrying a field name surfaces it under `data.field`.
    fn into_response(self) -> Response {
        let status = self.status_code();

        let data: Value = match &self {
            ApiError::BadRequest {
                field: Some(field), ..
            } => json!({ "field": field }),
            _ => json!({}),
        };

        let body = json!({
            "success": false,
            "status": status.as_u16(),
            "message": self.to_string(),
            "data": data,
        });

        (status, Json(body)).into_response()
    }
}
