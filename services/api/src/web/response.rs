//! services/api/src/web/response.rs
//!
//! The JSON envelope every endpoint answers with, and the mapping from core
//! errors to HTTP statuses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use duotrack_core::ports::PortError;
use duotrack_core::CoreError;
use serde::Serialize;
use tracing::error;

/// `{ "success": bool, "message": string, "data"?: T }`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    pub fn message(success: bool, message: impl Into<String>) -> Self {
        Self {
            success,
            message: message.into(),
            data: None,
        }
    }
}

/// A successful response with a payload.
pub fn respond<T: Serialize>(status: StatusCode, message: &str, data: T) -> Response {
    (status, Json(ApiResponse::ok(message, data))).into_response()
}

/// A successful response without a payload.
pub fn respond_empty(status: StatusCode, message: &str) -> Response {
    (status, Json(ApiResponse::message(true, message))).into_response()
}

//=========================================================================================
// Error Responses
//=========================================================================================

/// An error on its way to the client.
#[derive(Debug)]
pub struct HttpError {
    pub status: StatusCode,
    pub message: String,
}

pub type HttpResult = Result<Response, HttpError>;

impl HttpError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }
}

impl From<CoreError> for HttpError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(msg) => Self::new(StatusCode::BAD_REQUEST, msg),
            CoreError::NotFound(msg) => Self::new(StatusCode::NOT_FOUND, msg),
            CoreError::Forbidden(msg) => Self::new(StatusCode::FORBIDDEN, msg),
            CoreError::Conflict(msg) => Self::new(StatusCode::CONFLICT, msg),
            CoreError::Port(PortError::Unauthorized) => Self::unauthorized("Unauthorized"),
            CoreError::Port(e) => {
                // Storage details stay in the log.
                error!("Request failed in a service port: {:?}", e);
                Self::internal()
            }
        }
    }
}

impl From<PortError> for HttpError {
    fn from(err: PortError) -> Self {
        CoreError::from(err).into()
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        (self.status, Json(ApiResponse::message(false, self.message))).into_response()
    }
}
