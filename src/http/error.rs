use rouille::Response;
use serde::{Deserialize, Serialize};

use crate::storage::error::StorageError;

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Conflict(String),
    Internal(String),
}

/// Error body carried inside JSON responses
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    pub kind: String,
    pub message: String,
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Validation { .. } => ApiError::BadRequest(err.to_string()),

            StorageError::Conflict { .. } => ApiError::Conflict(err.to_string()),

            StorageError::Database(_) | StorageError::Internal(_) => {
                ApiError::Internal("internal server error".into())
            }
        }
    }
}

impl ApiError {
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::NotFound(_) => 404,
            ApiError::BadRequest(_) => 400,
            ApiError::Conflict(_) => 409,
            ApiError::Internal(_) => 500,
        }
    }

    pub fn body(&self) -> ErrorBody {
        let (kind, message) = match self {
            ApiError::NotFound(msg) => ("not_found", msg),
            ApiError::BadRequest(msg) => ("bad_request", msg),
            ApiError::Conflict(msg) => ("conflict", msg),
            ApiError::Internal(msg) => ("internal", msg),
        };
        ErrorBody {
            kind: kind.to_string(),
            message: message.clone(),
        }
    }

    pub fn into_response(self) -> Response {
        Response::json(&self.body()).with_status_code(self.status_code())
    }
}
