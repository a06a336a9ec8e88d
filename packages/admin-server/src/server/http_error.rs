//! HTTP error handling for the admin server
//!
//! Every failed request answers with the same JSON body shape; the status
//! code is derived from the machine-readable `code`.

use arbor_core::{TreeServiceError, ValidationError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};

pub const NODE_NOT_FOUND: &str = "NODE_NOT_FOUND";
pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
pub const FORBIDDEN: &str = "FORBIDDEN";
pub const CONCURRENCY_CONFLICT: &str = "CONCURRENCY_CONFLICT";
pub const DATABASE_ERROR: &str = "DATABASE_ERROR";

/// HTTP error response body
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpError {
    /// User-facing error message
    pub message: String,
    /// Machine-readable error code
    pub code: String,
    /// Optional detailed error information for debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl HttpError {
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            details: None,
        }
    }

    pub fn with_details(
        message: impl Into<String>,
        code: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            details: Some(details.into()),
        }
    }

    pub fn not_found(id: i64) -> Self {
        Self::new(format!("Node not found: {}", id), NODE_NOT_FOUND)
    }

    pub fn status(&self) -> StatusCode {
        match self.code.as_str() {
            NODE_NOT_FOUND => StatusCode::NOT_FOUND,
            VALIDATION_ERROR => StatusCode::UNPROCESSABLE_ENTITY,
            UNAUTHORIZED => StatusCode::UNAUTHORIZED,
            FORBIDDEN => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = %self.code, details = ?self.details, "{}", self.message);
        }
        (status, Json(self)).into_response()
    }
}

impl From<ValidationError> for HttpError {
    fn from(err: ValidationError) -> Self {
        HttpError::with_details(err.to_string(), VALIDATION_ERROR, err.field())
    }
}

impl From<TreeServiceError> for HttpError {
    fn from(err: TreeServiceError) -> Self {
        match err {
            TreeServiceError::NodeNotFound { id } => HttpError::not_found(id),
            TreeServiceError::ValidationFailed(err) => err.into(),
            TreeServiceError::ConcurrencyConflict { id } => HttpError::with_details(
                format!("Node {} was modified by another request", id),
                CONCURRENCY_CONFLICT,
                format!("node_id: {}", id),
            ),
            TreeServiceError::DatabaseError(err) => {
                HttpError::with_details("Database operation failed", DATABASE_ERROR, err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(HttpError::not_found(3).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            HttpError::new("bad", VALIDATION_ERROR).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(HttpError::new("who", UNAUTHORIZED).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(HttpError::new("no", FORBIDDEN).status(), StatusCode::FORBIDDEN);
        assert_eq!(
            HttpError::new("x", CONCURRENCY_CONFLICT).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_from_service_error() {
        let err: HttpError = TreeServiceError::node_not_found(9).into();
        assert_eq!(err.code, NODE_NOT_FOUND);

        let err: HttpError = TreeServiceError::from(ValidationError::InvalidCharacters).into();
        assert_eq!(err.code, VALIDATION_ERROR);
        assert_eq!(err.details.as_deref(), Some("name"));

        let err: HttpError = TreeServiceError::ConcurrencyConflict { id: 4 }.into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(HttpError::not_found(1)).unwrap();
        assert_eq!(json["code"], "NODE_NOT_FOUND");
        assert!(json.get("details").is_none());
    }
}
