use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

use super::{AppState, error_response};
use crate::issues::IssueError;

/// `GET /api/issues`: every issue of the active project.
pub async fn list_issues(State(state): State<AppState>) -> Response {
    match state.issues.list() {
        Ok(issues) => Json(issues).into_response(),
        Err(err) => internal_error(err),
    }
}

/// `GET /api/issues/{id}`: one issue, 404 when unknown.
pub async fn get_issue(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    if id.trim().is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            "INVALID_ID",
            "Invalid issue ID format",
        );
    }

    match state.issues.get(&id) {
        Ok(Some(issue)) => Json(issue).into_response(),
        Ok(None) => error_response(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("Issue with ID '{id}' not found"),
        ),
        Err(err) => internal_error(err),
    }
}

/// `GET /api/labels`: labels of the active project.
pub async fn list_labels(State(state): State<AppState>) -> Response {
    match state.issues.labels() {
        Ok(labels) => Json(labels).into_response(),
        Err(err) => internal_error(err),
    }
}

fn internal_error(err: IssueError) -> Response {
    error!(error = %err, "issue request failed");
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An unexpected error occurred",
    )
}
