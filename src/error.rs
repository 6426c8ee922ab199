use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::JsonRejection,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::users::{StoreError, UniqueField};

pub type AppResult<T> = Result<T, AppError>;

/// One rejected input field.
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

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    MissingToken,
    InvalidToken,
    Expired,
    InvalidCredentials,
}

impl AuthFailure {
    fn message(self) -> &'static str {
        match self {
            AuthFailure::MissingToken => "No token provided or invalid format",
            AuthFailure::InvalidToken => "Invalid token",
            AuthFailure::Expired => "Token expired",
            AuthFailure::InvalidCredentials => "Invalid credentials",
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed")]
    Validation(Vec<FieldError>),

    #[error("authentication failed: {0:?}")]
    Authentication(AuthFailure),

    #[error("{0}")]
    Authorization(String),

    #[error("{0}")]
    NotFound(String),

    #[error("User with this {0} already exists")]
    Conflict(UniqueField),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation(vec![FieldError::new(field, message)])
    }

    pub fn user_not_found() -> Self {
        AppError::NotFound("User not found".into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Authentication(_) => StatusCode::UNAUTHORIZED,
            AppError::Authorization(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(field) => AppError::Conflict(field),
            StoreError::Backend(e) => AppError::Internal(e),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::invalid("body", rejection.body_text())
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        AppError::invalid("body", rejection.body_text())
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError::invalid("body", err.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            AppError::Validation(errors) => json!({
                "success": false,
                "message": "Validation failed",
                "errors": errors,
            }),
            AppError::Authentication(failure) => json!({
                "success": false,
                "message": failure.message(),
            }),
            AppError::Internal(ref e) => {
                tracing::error!(error = ?e, "internal error");
                json!({
                    "success": false,
                    "message": "Internal server error",
                })
            }
            other => json!({
                "success": false,
                "message": other.to_string(),
            }),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let res = err.into_response();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn validation_lists_fields() {
        let (status, body) = body_json(AppError::Validation(vec![
            FieldError::new("email", "Invalid email format"),
            FieldError::new("password", "Password must be at least 6 characters"),
        ]))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["errors"][0]["field"], "email");
        assert_eq!(body["errors"][1]["field"], "password");
    }

    #[tokio::test]
    async fn conflict_names_the_field() {
        let (status, body) = body_json(AppError::Conflict(UniqueField::Username)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["message"], "User with this username already exists");
    }

    #[tokio::test]
    async fn expired_token_is_reported_as_such() {
        let (status, body) = body_json(AppError::Authentication(AuthFailure::Expired)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Token expired");
    }

    #[tokio::test]
    async fn internal_error_hides_details() {
        let (status, body) =
            body_json(AppError::Internal(anyhow::anyhow!("connection reset by peer"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Internal server error");
        assert!(!body.to_string().contains("connection reset"));
    }

    #[test]
    fn duplicate_from_store_becomes_conflict() {
        let err: AppError = StoreError::Duplicate(UniqueField::Email).into();
        assert!(matches!(err, AppError::Conflict(UniqueField::Email)));
    }
}
