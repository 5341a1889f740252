pub mod codes;
pub mod handlers;

pub use codes::ErrorCode;

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Field name to the messages of every rule it failed.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// JSON body of every error response.
///
/// ```json
/// { "error": "User not found" }
/// ```
///
/// Validation failures also carry the failing fields:
///
/// ```json
/// {
///   "error": "One or more validation errors occurred.",
///   "errors": { "name": ["Name must be at least 3 characters."] }
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            errors: None,
        }
    }
}

/// Application error type that can be converted to HTTP responses.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppError {
    #[error("JSON extraction error: {0}")]
    JsonExtractorRejection(#[from] JsonRejection),

    #[error("Validation failed for {} field(s)", .0.len())]
    Validation(FieldErrors),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Request cancelled")]
    RequestCancelled,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::JsonExtractorRejection(_) | AppError::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Database(e) if is_unavailable(e) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::RequestCancelled => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

fn is_unavailable(error: &DbErr) -> bool {
    matches!(error, DbErr::ConnectionAcquire(_) | DbErr::Conn(_))
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let (code, body) = match self {
            AppError::JsonExtractorRejection(e) => {
                tracing::warn!(
                    error_code = ErrorCode::JsonExtraction.code(),
                    "JSON extraction error: {}",
                    e
                );
                (ErrorCode::JsonExtraction, ErrorResponse::new(e.body_text()))
            }
            AppError::Validation(errors) => {
                tracing::info!(
                    error_code = ErrorCode::ValidationError.code(),
                    fields = ?errors.keys().collect::<Vec<_>>(),
                    "Validation failed"
                );
                (
                    ErrorCode::ValidationError,
                    ErrorResponse {
                        error: ErrorCode::ValidationError.default_message().to_string(),
                        errors: Some(errors),
                    },
                )
            }
            AppError::Database(e) => {
                let code = if is_unavailable(&e) {
                    ErrorCode::DatabaseUnavailable
                } else {
                    ErrorCode::DatabaseError
                };
                tracing::error!(error_code = code.code(), "Database error: {:?}", e);
                (code, ErrorResponse::new(code.default_message()))
            }
            AppError::NotFound(msg) => {
                tracing::info!(error_code = ErrorCode::NotFound.code(), "Not found: {}", msg);
                (ErrorCode::NotFound, ErrorResponse::new(msg))
            }
            AppError::Conflict(msg) => {
                tracing::info!(error_code = ErrorCode::Conflict.code(), "Conflict: {}", msg);
                (ErrorCode::Conflict, ErrorResponse::new(msg))
            }
            AppError::RequestCancelled => {
                tracing::warn!(
                    error_code = ErrorCode::RequestCancelled.code(),
                    "Request cancelled before completion"
                );
                (
                    ErrorCode::RequestCancelled,
                    ErrorResponse::new(ErrorCode::RequestCancelled.default_message()),
                )
            }
        };

        let mut response = (status, Json(body)).into_response();
        response.extensions_mut().insert(code);
        response
    }
}

/// Build an error response outside of the [`AppError`] flow, e.g. for fallbacks.
pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorResponse::new(message))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use sea_orm::ConnAcquireErr;
    use serde_json::{Value, json};

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_not_found_body() {
        let response = AppError::NotFound("User not found".to_string()).into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.extensions().get::<ErrorCode>(), Some(&ErrorCode::NotFound));
        assert_eq!(body_json(response).await, json!({ "error": "User not found" }));
    }

    #[tokio::test]
    async fn test_validation_body_lists_every_field() {
        let mut errors = FieldErrors::new();
        errors.insert(
            "name".to_string(),
            vec![
                "Name is required.".to_string(),
                "Name must be at least 3 characters.".to_string(),
            ],
        );
        errors.insert("phone".to_string(), vec!["Bad phone".to_string()]);

        let response = AppError::Validation(errors).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["error"], "One or more validation errors occurred.");
        assert_eq!(body["errors"]["name"].as_array().unwrap().len(), 2);
        assert_eq!(body["errors"]["phone"][0], "Bad phone");
    }

    #[tokio::test]
    async fn test_database_error_hides_details() {
        let response =
            AppError::Database(DbErr::Custom("relation users does not exist".to_string()))
                .into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert!(!body["error"].as_str().unwrap().contains("relation"));
    }

    #[tokio::test]
    async fn test_exhausted_pool_is_unavailable() {
        let response = AppError::Database(DbErr::ConnectionAcquire(ConnAcquireErr::Timeout))
            .into_response();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            response.extensions().get::<ErrorCode>(),
            Some(&ErrorCode::DatabaseUnavailable)
        );
        assert_eq!(
            body_json(response).await["error"],
            ErrorCode::DatabaseUnavailable.default_message()
        );
    }

    #[test]
    fn test_cancelled_maps_to_service_unavailable() {
        assert_eq!(
            AppError::RequestCancelled.status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(AppError::Conflict(String::new()).status(), StatusCode::CONFLICT);
    }
}
