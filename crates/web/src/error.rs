use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;
use storage::error::StorageError;
use validator::ValidationErrors;

/// Web layer errors
#[derive(Debug)]
pub enum WebError {
    Storage(StorageError),
    Validation(ValidationErrors),
    BadRequest(String),
    Unauthorized,
    Forbidden(String),
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage(e) => write!(f, "Storage error: {}", e),
            Self::Validation(e) => write!(f, "Validation error: {}", e),
            Self::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            Self::Unauthorized => write!(f, "Unauthorized"),
            Self::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status_code = match &self {
            Self::Storage(StorageError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Storage(StorageError::Validation { .. }) => StatusCode::BAD_REQUEST,
            Self::Storage(StorageError::Forbidden(_)) => StatusCode::FORBIDDEN,
            Self::Storage(StorageError::ConstraintViolation(_) | StorageError::Conflict(_)) => {
                StatusCode::CONFLICT
            }
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
        };

        let body = match &self {
            Self::Storage(e @ StorageError::NotFound(_)) => {
                json!({
                    "error": e.to_string()
                })
            }
            Self::Storage(StorageError::Validation { field, message }) => {
                json!({
                    "error": "Validation failed",
                    "details": [format!("{}: {}", field, message)]
                })
            }
            Self::Storage(
                StorageError::Forbidden(msg)
                | StorageError::ConstraintViolation(msg)
                | StorageError::Conflict(msg),
            ) => {
                json!({
                    "error": msg
                })
            }
            Self::Storage(e) => {
                tracing::error!("Storage error: {:?}", e);
                json!({
                    "error": "An internal error occurred"
                })
            }
            Self::Validation(errors) => {
                let field_errors: Vec<String> = errors
                    .field_errors()
                    .iter()
                    .flat_map(|(field, errors)| {
                        errors.iter().map(move |e| {
                            format!(
                                "{}: {}",
                                field,
                                e.message
                                    .as_ref()
                                    .map(|m| m.to_string())
                                    .unwrap_or_else(|| e.code.to_string())
                            )
                        })
                    })
                    .collect();

                json!({
                    "error": "Validation failed",
                    "details": field_errors
                })
            }
            Self::BadRequest(msg) | Self::Forbidden(msg) => {
                json!({
                    "error": msg
                })
            }
            Self::Unauthorized => {
                json!({
                    "error": "Unauthorized"
                })
            }
        };

        (status_code, Json(body)).into_response()
    }
}

impl From<StorageError> for WebError {
    fn from(error: StorageError) -> Self {
        Self::Storage(error)
    }
}

impl From<ValidationErrors> for WebError {
    fn from(error: ValidationErrors) -> Self {
        Self::Validation(error)
    }
}

pub type ApiResult<T> = Result<T, WebError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_errors_map_to_status_codes() {
        let cases = [
            (StorageError::NotFound("mark record"), StatusCode::NOT_FOUND),
            (
                StorageError::validation("marks", "must be between 0 and 100"),
                StatusCode::BAD_REQUEST,
            ),
            (
                StorageError::Forbidden("not yours".to_string()),
                StatusCode::FORBIDDEN,
            ),
            (
                StorageError::Conflict("stale version".to_string()),
                StatusCode::CONFLICT,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(WebError::from(error).into_response().status(), expected);
        }
    }

    #[test]
    fn test_identity_errors() {
        assert_eq!(
            WebError::Unauthorized.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            WebError::Forbidden("faculty only".to_string())
                .into_response()
                .status(),
            StatusCode::FORBIDDEN
        );
    }
}
