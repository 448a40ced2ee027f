//! HTTP error mapping

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use folio_errors::{Error, InventoryError, SyncError, TrackerError};
use serde_json::json;

/// Wrapper turning domain errors into JSON error responses.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl<E: Into<Error>> From<E> for ApiError {
    fn from(e: E) -> Self {
        Self(e.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::Tracker(TrackerError::AlreadyRunning { .. }) => StatusCode::CONFLICT,
            Error::Sync(SyncError::FolderNotFound { .. })
            | Error::Inventory(InventoryError::PathUnavailable { .. }) => StatusCode::NOT_FOUND,
            Error::Sync(_) | Error::Network(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        tracing::debug!(%status, "request failed: {}", self.0);
        let body = Json(json!({ "ok": false, "error": self.0.to_string() }));
        (status, body).into_response()
    }
}
