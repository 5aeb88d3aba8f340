// src/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::lifecycle::RequestAction;
use crate::models::RequestStatus;

/// Every failure a handler can surface. All variants are terminal for the
/// single operation; nothing in here is retried by the engine.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    /// Also the surface of every cross-city access: a record that exists in
    /// another city is reported exactly like one that does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("not enough resources available")]
    InsufficientStock,

    #[error("cannot {action} a request that is {from}")]
    InvalidTransition {
        from: RequestStatus,
        action: RequestAction,
    },

    #[error("upstream service error: {0}")]
    Upstream(String),

    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => ApiError::NotFound("record"),
            other => ApiError::Database(other),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::InsufficientStock => (StatusCode::CONFLICT, "INSUFFICIENT_STOCK"),
            ApiError::InvalidTransition { .. } => (StatusCode::CONFLICT, "INVALID_TRANSITION"),
            ApiError::Upstream(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
            ApiError::Database(e) => {
                tracing::error!(error = %e, "database failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR")
            }
        };

        // Store internals never reach the client.
        let message = match &self {
            ApiError::Database(_) => "internal error".to_string(),
            other => other.to_string(),
        };

        (status, Json(ErrorBody { error: message, code })).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(
            ApiError::Validation("x".into()).into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::Unauthorized("x".into()).into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::NotFound("resource").into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::InsufficientStock.into_response().status(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn row_not_found_folds_into_not_found() {
        let e: ApiError = sqlx::Error::RowNotFound.into();
        assert!(matches!(e, ApiError::NotFound(_)));
    }

    #[test]
    fn insufficient_stock_message_is_verbatim() {
        assert_eq!(
            ApiError::InsufficientStock.to_string(),
            "not enough resources available"
        );
    }
}
