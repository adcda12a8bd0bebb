//! API response types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Success envelope: `{"success": true, "data": ...}`.
///
/// Failures are rendered by `AppError`'s `IntoResponse` with the same
/// `success` flag set to `false`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
    #[serde(skip)]
    status: StatusCode,
}

impl<T: Serialize> ApiResponse<T> {
    /// 200 response.
    pub const fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            status: StatusCode::OK,
        }
    }

    /// 201 response for newly filed records.
    pub const fn created(data: T) -> Self {
        Self {
            success: true,
            data,
            status: StatusCode::CREATED,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// Body-less acknowledgement payload.
#[derive(Debug, Serialize)]
pub struct Ack {
    pub message: &'static str,
}

/// Success response carrying only a message.
#[must_use]
pub const fn ack(message: &'static str) -> ApiResponse<Ack> {
    ApiResponse::ok(Ack { message })
}
