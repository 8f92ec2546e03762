//! Custom error types for the API service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::error::DatabaseError;
use thiserror::Error;
use tracing::error;

use crate::{jwt::TokenError, lifecycle::TransitionError, response::ApiResponse};

/// Custom error type for the API service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Malformed or missing input: headers, body, token shape
    #[error("Bad request, {0}")]
    BadRequest(String),

    /// Credential absent, invalid or not acceptable
    #[error("Unauthorized, {0}")]
    Unauthorized(String),

    /// Credential verified but past its expiry
    #[error("Unauthorized, token expired")]
    Expired,

    /// Entity absent
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Uniqueness violation or state conflict
    #[error("Conflict, {0}")]
    Conflict(String),

    /// Internal server error
    #[error("Internal server error")]
    InternalServerError(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Expired => StatusCode::REQUEST_TIMEOUT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Database(DatabaseError::UniqueViolation(_)) => StatusCode::CONFLICT,
            ApiError::InternalServerError(_) | ApiError::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::NotParseable => {
                ApiError::Unauthorized("failed to decode token".to_string())
            }
            TokenError::Invalid => ApiError::Unauthorized("invalid token".to_string()),
            TokenError::Expired => ApiError::Expired,
            TokenError::Signing => {
                ApiError::InternalServerError("failed to sign token".to_string())
            }
        }
    }
}

impl From<TransitionError> for ApiError {
    fn from(err: TransitionError) -> Self {
        ApiError::Conflict(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::InternalServerError(detail) => {
                error!("Internal server error: {}", detail);
                "Internal server error".to_string()
            }
            ApiError::Database(DatabaseError::UniqueViolation(_)) => {
                "Conflict, duplicate".to_string()
            }
            ApiError::Database(e) => {
                error!("Database error: {}", e);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        ApiResponse::<()>::with_status(status, message, None).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_errors_map_to_distinct_statuses() {
        assert_eq!(
            ApiError::from(TokenError::NotParseable).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(TokenError::Invalid).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(TokenError::Expired).status(),
            StatusCode::REQUEST_TIMEOUT
        );
        assert_eq!(
            ApiError::from(TokenError::Signing).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn unique_violations_are_conflicts() {
        let err = ApiError::from(DatabaseError::UniqueViolation("bets_pkey".to_string()));
        assert_eq!(err.status(), StatusCode::CONFLICT);

        let err = ApiError::from(DatabaseError::Query(sqlx::Error::PoolClosed));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
