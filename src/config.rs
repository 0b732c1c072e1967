use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Name of the directory inside a project that holds the beads data files.
pub const BEADS_DIR: &str = ".beads";
/// Issues storage file inside the beads directory.
pub const ISSUES_FILE: &str = "issues.jsonl";
/// Dependency database inside the beads directory.
pub const DB_FILE: &str = "beads.db";

/// A registered beads project. `path` is the project folder itself, not its
/// `.beads` subdirectory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub path: PathBuf,
    pub added_at: String,
}

impl Project {
    pub fn beads_dir(&self) -> PathBuf {
        self.path.join(BEADS_DIR)
    }

    pub fn issues_path(&self) -> PathBuf {
        self.beads_dir().join(ISSUES_FILE)
    }

    pub fn db_path(&self) -> PathBuf {
        self.beads_dir().join(DB_FILE)
    }
}

/// Application configuration persisted as `~/.bealin/config.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub active_project_id: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine home directory")]
    NoHomeDir,
    #[error("invalid project {0}: no .beads/issues.jsonl found")]
    InvalidProject(PathBuf),
    #[error("project already exists: {0}")]
    ProjectExists(PathBuf),
    #[error("project not found: {0}")]
    ProjectNotFound(String),
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// File-backed store for the application config.
///
/// Every operation reads the file fresh and writes it back; the config is a
/// few hundred bytes and the single-session design (one desktop user per
/// process) makes caching pointless.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    config_dir: PathBuf,
    config_path: PathBuf,
}

impl ConfigStore {
    /// Store rooted at `~/.bealin`.
    pub fn new() -> Result<Self, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(Self::with_dir(home.join(".bealin")))
    }

    /// Store rooted at an explicit directory. Used by tests and by anyone
    /// pointing the backend at a non-default config location.
    pub fn with_dir(config_dir: PathBuf) -> Self {
        let config_path = config_dir.join("config.json");
        Self {
            config_dir,
            config_path,
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Load the config, defaulting to an empty one when the file is absent.
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        if !self.config_path.exists() {
            return Ok(AppConfig::default());
        }
        let content = std::fs::read_to_string(&self.config_path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, config: &AppConfig) -> Result<(), ConfigError> {
        if !self.config_dir.exists() {
            std::fs::create_dir_all(&self.config_dir)?;
        }
        let content = serde_json::to_string_pretty(config)?;
        std::fs::write(&self.config_path, content)?;
        Ok(())
    }

    /// All registered projects.
    pub fn projects(&self) -> Result<Vec<Project>, ConfigError> {
        Ok(self.load()?.projects)
    }

    /// The currently active project, or `None` when nothing is selected.
    pub fn active_project(&self) -> Result<Option<Project>, ConfigError> {
        let config = self.load()?;
        let Some(active_id) = config.active_project_id else {
            return Ok(None);
        };
        Ok(config.projects.into_iter().find(|p| p.id == active_id))
    }

    /// Register a project folder. The folder must contain
    /// `.beads/issues.jsonl`; the first registered project becomes active.
    pub fn add_project(
        &self,
        project_path: &Path,
        name: Option<String>,
    ) -> Result<Project, ConfigError> {
        let mut config = self.load()?;

        let issues_path = project_path.join(BEADS_DIR).join(ISSUES_FILE);
        if !issues_path.exists() {
            return Err(ConfigError::InvalidProject(project_path.to_path_buf()));
        }
        if config.projects.iter().any(|p| p.path == project_path) {
            return Err(ConfigError::ProjectExists(project_path.to_path_buf()));
        }

        let project = Project {
            id: Uuid::new_v4().to_string(),
            name: name.unwrap_or_else(|| name_from_path(project_path)),
            path: project_path.to_path_buf(),
            added_at: jiff::Timestamp::now().to_string(),
        };

        config.projects.push(project.clone());
        if config.active_project_id.is_none() {
            config.active_project_id = Some(project.id.clone());
        }
        self.save(&config)?;
        Ok(project)
    }

    /// Remove a project. When the removed project was active, the first
    /// remaining project (if any) becomes active.
    pub fn remove_project(&self, project_id: &str) -> Result<(), ConfigError> {
        let mut config = self.load()?;
        config.projects.retain(|p| p.id != project_id);
        if config.active_project_id.as_deref() == Some(project_id) {
            config.active_project_id = config.projects.first().map(|p| p.id.clone());
        }
        self.save(&config)
    }

    pub fn set_active_project(&self, project_id: &str) -> Result<(), ConfigError> {
        let mut config = self.load()?;
        if !config.projects.iter().any(|p| p.id == project_id) {
            return Err(ConfigError::ProjectNotFound(project_id.to_string()));
        }
        config.active_project_id = Some(project_id.to_string());
        self.save(&config)
    }
}

/// Display name for a project: the last path segment.
fn name_from_path(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.to_string())
        .unwrap_or_else(|| "Unnamed".to_string())
}
