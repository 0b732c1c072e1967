use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use super::error_response;
use crate::dialog;

/// `POST /api/fs/pick-folder`: show the native folder picker and return the
/// selected path, or `cancelled: true` when the user dismissed the dialog.
pub async fn pick_folder() -> Response {
    let result = dialog::pick_folder().await;

    if let Some(message) = result.error {
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "DIALOG_ERROR", message);
    }

    Json(json!({ "path": result.path, "cancelled": result.cancelled })).into_response()
}
