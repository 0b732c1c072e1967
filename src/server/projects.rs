use std::path::PathBuf;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tracing::error;

use super::{AppState, error_response};
use crate::config::{ConfigError, Project};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectList {
    pub projects: Vec<Project>,
    pub active_project_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddProjectBody {
    pub path: PathBuf,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetActiveBody {
    pub id: String,
}

/// `GET /api/projects`: registered projects plus the active id.
pub async fn list_projects(State(state): State<AppState>) -> Response {
    match state.config.load() {
        Ok(config) => Json(ProjectList {
            projects: config.projects,
            active_project_id: config.active_project_id,
        })
        .into_response(),
        Err(err) => internal_error(err),
    }
}

/// `POST /api/projects`: register a project folder.
pub async fn add_project(
    State(state): State<AppState>,
    Json(body): Json<AddProjectBody>,
) -> Response {
    match state.config.add_project(&body.path, body.name) {
        Ok(project) => (StatusCode::CREATED, Json(project)).into_response(),
        Err(err @ ConfigError::InvalidProject(_)) => {
            error_response(StatusCode::BAD_REQUEST, "INVALID_PATH", err.to_string())
        }
        Err(err @ ConfigError::ProjectExists(_)) => {
            error_response(StatusCode::CONFLICT, "PROJECT_EXISTS", err.to_string())
        }
        Err(err) => internal_error(err),
    }
}

/// `DELETE /api/projects/{id}`: forget a project. The watcher keeps its
/// current target until the next events subscription re-resolves the active
/// project.
pub async fn remove_project(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.config.remove_project(&id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => internal_error(err),
    }
}

/// `PUT /api/projects/active`: switch the active project.
pub async fn set_active_project(
    State(state): State<AppState>,
    Json(body): Json<SetActiveBody>,
) -> Response {
    match state.config.set_active_project(&body.id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err @ ConfigError::ProjectNotFound(_)) => {
            error_response(StatusCode::NOT_FOUND, "NOT_FOUND", err.to_string())
        }
        Err(err) => internal_error(err),
    }
}

fn internal_error(err: ConfigError) -> Response {
    error!(error = %err, "project request failed");
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An unexpected error occurred",
    )
}
