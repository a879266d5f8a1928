//! HTTP error responses.

use crate::auth::TokenError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use idle_core::api::{ApiResponse, FieldError};
use idle_core::{AccountError, GameError, RosterError};
use thiserror::Error;

/// Everything a handler can fail with, mapped onto a status code and the
/// standard envelope.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Validation error")]
    Validation(Vec<FieldError>),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// Logged; the client only sees a generic message.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::Validation(details) => {
                ApiResponse::<()>::failure("Validation error").with_details(details)
            }
            ApiError::Internal(cause) => {
                tracing::error!(%cause, "request failed");
                ApiResponse::failure("Internal server error")
            }
            other => ApiResponse::failure(other.to_string()),
        };
        (status, Json(body)).into_response()
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::InvalidCredentials => ApiError::Unauthorized(err.to_string()),
            AccountError::NotFound => ApiError::NotFound(err.to_string()),
            AccountError::AlreadyExists
            | AccountError::UsernameTaken
            | AccountError::EmailTaken => ApiError::BadRequest(err.to_string()),
            AccountError::Store(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<RosterError> for ApiError {
    fn from(err: RosterError) -> Self {
        match err {
            RosterError::NotFound => ApiError::NotFound(err.to_string()),
            RosterError::Store(_) => ApiError::Internal(err.to_string()),
            RosterError::NameExists
            | RosterError::NameTaken
            | RosterError::CharacterLimitReached
            | RosterError::Allocation(_) => ApiError::BadRequest(err.to_string()),
        }
    }
}

impl From<GameError> for ApiError {
    fn from(err: GameError) -> Self {
        match err {
            GameError::NotFound => ApiError::NotFound(err.to_string()),
            GameError::Action(_) => ApiError::BadRequest(err.to_string()),
            GameError::Conflict { .. } => ApiError::Conflict(err.to_string()),
            GameError::Store(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::InvalidKey => ApiError::Internal(err.to_string()),
            _ => ApiError::Forbidden("Invalid or expired token".to_string()),
        }
    }
}
