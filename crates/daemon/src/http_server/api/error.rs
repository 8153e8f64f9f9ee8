//! Error taxonomy shared by every endpoint.
//!
//! Every failure leaves the server as `{"error": "<message>"}` with a status
//! from a small fixed set. Internal details are logged, never returned.

use std::fmt::Display;

use axum::extract::rejection::BytesRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use common::prelude::{AccountError, FileError};

/// Message returned for any failed login, whatever the cause.
pub const INVALID_CREDENTIALS: &str = "invalid username or password";

/// Body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    NotFound(String),
    /// The catalog references content the blob store cannot produce
    #[error("{0}")]
    Corrupt(String),
    #[error("request body too large")]
    PayloadTooLarge,
    /// Detail is logged; the client only sees a generic message
    #[error("internal error")]
    Internal(String),
}

impl ApiError {
    pub fn internal(err: impl Display) -> Self {
        ApiError::Internal(err.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) | ApiError::Corrupt(_) => StatusCode::NOT_FOUND,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(detail) = &self {
            tracing::error!(error = %detail, "internal error");
        }
        let body = ErrorBody {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

impl<E: Display> From<AccountError<E>> for ApiError {
    fn from(err: AccountError<E>) -> Self {
        match err {
            AccountError::Validation(e) => ApiError::Validation(e.to_string()),
            AccountError::Conflict(_) => ApiError::Conflict("username already exists".to_string()),
            AccountError::NotFound(_) | AccountError::Unauthorized(_) => {
                ApiError::Unauthorized(INVALID_CREDENTIALS.to_string())
            }
            AccountError::Provider(e) => ApiError::internal(e),
            AccountError::Hashing(e) => ApiError::Internal(e),
        }
    }
}

impl<E: Display> From<FileError<E>> for ApiError {
    fn from(err: FileError<E>) -> Self {
        match err {
            FileError::Validation(e) => ApiError::Validation(e.to_string()),
            e @ FileError::LengthMismatch { .. } => ApiError::Validation(e.to_string()),
            FileError::Conflict(_, filename) => {
                ApiError::Conflict(format!("file already exists: {filename}"))
            }
            FileError::NotFound(_, filename) => {
                ApiError::NotFound(format!("file not found: {filename}"))
            }
            FileError::Corrupt { .. } => ApiError::Corrupt(
                "file content is missing or damaged on the server".to_string(),
            ),
            FileError::Catalog(e) => ApiError::internal(e),
            FileError::Blob(e) => ApiError::internal(e),
        }
    }
}

/// Decode a JSON request body collected by the `Bytes` extractor, turning
/// an over-limit body into `413` and anything unparseable into `400`.
pub fn json_body<T: DeserializeOwned>(body: Result<Bytes, BytesRejection>) -> Result<T, ApiError> {
    let body = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge
        } else {
            ApiError::Validation(rejection.body_text())
        }
    })?;

    serde_json::from_slice(&body)
        .map_err(|e| ApiError::Validation(format!("malformed request body: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::validation::{Filename, Username, ValidationError};

    async fn body_of(err: ApiError) -> (StatusCode, ErrorBody) {
        let response = err.into_response();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_internal_detail_is_hidden() {
        let (status, body) = body_of(ApiError::Internal("disk on fire at /var/x".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error, "internal error");
    }

    #[tokio::test]
    async fn test_login_failures_are_uniform() {
        let alice = Username::parse("alice").unwrap();
        let unknown: ApiError = AccountError::<String>::NotFound("mallory".into()).into();
        let wrong: ApiError = AccountError::<String>::Unauthorized(alice).into();

        let (s1, b1) = body_of(unknown).await;
        let (s2, b2) = body_of(wrong).await;
        assert_eq!(s1, StatusCode::FORBIDDEN);
        assert_eq!((s1, b1), (s2, b2));
    }

    #[test]
    fn test_file_error_statuses() {
        let alice = Username::parse("alice").unwrap();
        let name = Filename::parse("a.txt").unwrap();

        let cases: Vec<(FileError<String>, StatusCode)> = vec![
            (
                FileError::Validation(ValidationError::FilenameEmpty),
                StatusCode::BAD_REQUEST,
            ),
            (
                FileError::Conflict(alice.clone(), name.clone()),
                StatusCode::BAD_REQUEST,
            ),
            (
                FileError::NotFound(alice.clone(), name.clone()),
                StatusCode::NOT_FOUND,
            ),
            (
                FileError::Corrupt {
                    key: "alice/a.txt".into(),
                    reason: "blob is missing".into(),
                },
                StatusCode::NOT_FOUND,
            ),
            (
                FileError::LengthMismatch {
                    declared: 2,
                    received: 1,
                },
                StatusCode::BAD_REQUEST,
            ),
            (FileError::Catalog("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            let api: ApiError = err.into();
            assert_eq!(api.status(), expected, "{api:?}");
        }
    }
}
