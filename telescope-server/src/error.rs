use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use telescope_types::{Error, ErrorKind};

/// Wraps the crate-wide [`Error`] so handlers can just `?` it and get the
/// status mapping from §7 for free.
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError(e)
    }
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::RangeError => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::NotConnected
        | ErrorKind::AlreadyConnected
        | ErrorKind::SessionClosed => StatusCode::BAD_REQUEST,
        ErrorKind::Disconnected | ErrorKind::DriverError | ErrorKind::TimeoutError | ErrorKind::Internal => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        let status = status_for(kind);
        let body = Json(json!({
            "error": kind.to_string(),
            "message": self.0.to_string(),
        }));
        (status, body).into_response()
    }
}

/// A handler-level validation failure (bad query parameter) that never made
/// it into an [`Error`] because no device was involved.
pub struct ValidationError(pub String);

impl IntoResponse for ValidationError {
    fn into_response(self) -> Response {
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "error": "range_error", "message": self.0 })),
        )
            .into_response()
    }
}
