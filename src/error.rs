use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use log::error;
use serde::Serialize;
use serde_json::json;

use crate::db::repository::RepositoryError;
use crate::services::{
    estimate_session::SessionError, pricing_service::PricingInputError,
    room_normalizer::RoomLimitError,
};

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized,
    Forbidden,
    NotFound(String),
    Validation(serde_json::Value),
    Internal(String),
}

impl ApiError {
    /// 422 with the list of problems as the body.
    pub fn validation<T: Serialize>(issues: &T) -> Self {
        ApiError::Validation(serde_json::to_value(issues).unwrap_or_default())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized => write!(f, "Unauthorized"),
            ApiError::Forbidden => write!(f, "Forbidden"),
            ApiError::NotFound(what) => write!(f, "{} not found", what),
            ApiError::Validation(_) => write!(f, "Validation failed"),
            ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            ApiError::Validation(issues) => json!({ "error": self.to_string(), "issues": issues }),
            // Store details stay in the log.
            ApiError::Internal(msg) => {
                error!("{}", msg);
                json!({ "error": "Internal server error" })
            }
            _ => json!({ "error": self.to_string() }),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => ApiError::NotFound("Document".to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::RoomNotFound(id) => ApiError::NotFound(format!("Room {}", id)),
            SessionError::EmptyRoom | SessionError::Limit(_) => ApiError::BadRequest(err.to_string()),
            SessionError::Repository(inner) => inner.into(),
        }
    }
}

impl From<RoomLimitError> for ApiError {
    fn from(err: RoomLimitError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<PricingInputError> for ApiError {
    fn from(err: PricingInputError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}
