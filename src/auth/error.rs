use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::auth::{dto::ErrorResponse, repo::StoreError, validation::ValidationErrors};

#[derive(Debug, Error)]
pub enum SignupError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error("passwords do not match")]
    PasswordMismatch,
    #[error("user with provided email exists")]
    EmailTaken,
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for SignupError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateEmail => SignupError::EmailTaken,
            other => SignupError::Internal(other.to_string()),
        }
    }
}

impl SignupError {
    /// Text sent to the client. Internal details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            SignupError::Internal(_) => "internal server error".to_owned(),
            other => other.to_string(),
        }
    }
}

/// Every signup failure is answered with 401, whatever its kind.
impl IntoResponse for SignupError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.public_message(),
        };
        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}
