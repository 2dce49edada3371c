//! JSON error bodies and the mapping from pool errors to HTTP statuses.

use crate::error::PoolError;
use log::error;
use rocket::http::Status;
use rocket::response::status as rocket_status;
use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorKind {
    NotFound,
    BadRequest,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorKind,
    pub message: String,
}

impl ApiErrorBody {
    fn new(error: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            error,
            message: message.into(),
        }
    }
}

pub type ApiError = rocket_status::Custom<Json<ApiErrorBody>>;
pub type ApiResult<T> = Result<Json<T>, ApiError>;

pub fn api_error(status: Status, kind: ApiErrorKind, message: impl Into<String>) -> ApiError {
    rocket_status::Custom(status, Json(ApiErrorBody::new(kind, message)))
}

pub fn not_found_error(message: impl Into<String>) -> ApiError {
    api_error(Status::NotFound, ApiErrorKind::NotFound, message)
}

pub fn bad_request_error(message: impl Into<String>) -> ApiError {
    api_error(Status::BadRequest, ApiErrorKind::BadRequest, message)
}

pub fn internal_error(message: impl Into<String>) -> ApiError {
    api_error(Status::InternalServerError, ApiErrorKind::Internal, message)
}

impl From<PoolError> for ApiError {
    fn from(err: PoolError) -> Self {
        if err.is_validation() {
            return bad_request_error(err.to_string());
        }
        match err {
            PoolError::NotFound(_) => not_found_error("Entry not found."),
            PoolError::PersistenceFailure { action, source } => {
                error!("Failed to {}: {}", action, source);
                internal_error(format!("Failed to {}.", action))
            }
            PoolError::CorruptEntry { entry_id, reason } => {
                error!("Stored entry {} is unreadable: {}", entry_id, reason);
                internal_error(format!("Stored entry {} could not be read.", entry_id))
            }
            other => bad_request_error(other.to_string()),
        }
    }
}
