//! HTTP layer: REST read API, project management, and the SSE change
//! notification endpoint.

pub mod events;
mod fs;
mod issues;
mod projects;

use axum::Json;
use axum::Router;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::config::ConfigStore;
use crate::issues::IssueRepository;
use crate::watch::ChangeWatcher;

/// Shared handler state, assembled once at startup.
#[derive(Clone)]
pub struct AppState {
    pub config: ConfigStore,
    pub issues: IssueRepository,
    pub watcher: ChangeWatcher,
}

impl AppState {
    pub fn new(config: ConfigStore, watcher: ChangeWatcher) -> Self {
        let issues = IssueRepository::new(config.clone());
        Self {
            config,
            issues,
            watcher,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/issues", get(issues::list_issues))
        .route("/api/issues/{id}", get(issues::get_issue))
        .route("/api/labels", get(issues::list_labels))
        .route(
            "/api/projects",
            get(projects::list_projects).post(projects::add_project),
        )
        .route("/api/projects/active", put(projects::set_active_project))
        .route("/api/projects/{id}", delete(projects::remove_project))
        .route("/api/events", get(events::stream_events))
        .route("/api/fs/pick-folder", post(fs::pick_folder))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn serve(host: &str, port: u16, state: AppState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    info!(addr = %listener.local_addr()?, "bealin backend listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Error body shared by all API handlers:
/// `{"error": {"code": ..., "message": ...}}`.
pub(crate) fn error_response(
    status: StatusCode,
    code: &str,
    message: impl Into<String>,
) -> Response {
    (
        status,
        Json(json!({ "error": { "code": code, "message": message.into() } })),
    )
        .into_response()
}
