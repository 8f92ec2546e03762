//! Response envelope shared by every endpoint

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// `{success, message, code, body?}` envelope
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 200 response carrying `body`
    pub fn ok(message: impl Into<String>, body: T) -> Self {
        Self::with_status(StatusCode::OK, message, Some(body))
    }

    pub fn with_status(status: StatusCode, message: impl Into<String>, body: Option<T>) -> Self {
        Self {
            success: status.is_success(),
            message: message.into(),
            code: status.as_u16(),
            body,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}
