use std::collections::HashMap;

use thiserror::Error;

use crate::config::{ConfigError, ConfigStore, Project};
use crate::model::{Issue, IssueDependency, IssuePriority, IssueStatus, IssueType, Label, RawIssue};
use crate::store::sqlite::DependencyEdges;
use crate::store::{jsonl, sqlite};

#[derive(Debug, Error)]
pub enum IssueError {
    #[error("no active project selected")]
    NoActiveProject,
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to read issue data: {0}")]
    Io(#[from] std::io::Error),
}

/// Read-only repository over the active project's beads data: issues from
/// the JSONL file, dependency edges from the SQLite database.
#[derive(Debug, Clone)]
pub struct IssueRepository {
    config: ConfigStore,
}

impl IssueRepository {
    pub fn new(config: ConfigStore) -> Self {
        Self { config }
    }

    fn active_project(&self) -> Result<Project, IssueError> {
        self.config
            .active_project()?
            .ok_or(IssueError::NoActiveProject)
    }

    /// All issues of the active project, with dependency summaries attached.
    pub fn list(&self) -> Result<Vec<Issue>, IssueError> {
        let project = self.active_project()?;
        let raw_issues: Vec<RawIssue> = jsonl::read_all(&project.issues_path())?;

        let issue_map: HashMap<&str, &RawIssue> =
            raw_issues.iter().map(|raw| (raw.id.as_str(), raw)).collect();

        let ids: Vec<String> = raw_issues.iter().map(|raw| raw.id.clone()).collect();
        let all_deps = sqlite::all_dependencies(&project.db_path(), &ids);

        Ok(raw_issues
            .iter()
            .map(|raw| {
                let edges = all_deps.get(&raw.id).cloned().unwrap_or_default();
                map_issue(raw, &edges, &issue_map)
            })
            .collect())
    }

    /// A single issue by id, or `None` when no record matches.
    pub fn get(&self, id: &str) -> Result<Option<Issue>, IssueError> {
        let project = self.active_project()?;
        let raw_issues: Vec<RawIssue> = jsonl::read_all(&project.issues_path())?;

        let Some(raw) = raw_issues.iter().find(|r| r.id == id) else {
            return Ok(None);
        };

        let issue_map: HashMap<&str, &RawIssue> =
            raw_issues.iter().map(|r| (r.id.as_str(), r)).collect();

        let db_path = project.db_path();
        let edges = DependencyEdges {
            blocked_by: sqlite::blocked_by(&db_path, id),
            blocks: sqlite::blocks(&db_path, id),
        };

        Ok(Some(map_issue(raw, &edges, &issue_map)))
    }

    /// Labels of the active project. A missing labels file yields an empty
    /// list, same as the issues file.
    pub fn labels(&self) -> Result<Vec<Label>, IssueError> {
        let project = self.active_project()?;
        let labels_path = project.beads_dir().join("labels.jsonl");
        Ok(jsonl::read_all(&labels_path)?)
    }
}

fn map_issue(
    raw: &RawIssue,
    edges: &DependencyEdges,
    issue_map: &HashMap<&str, &RawIssue>,
) -> Issue {
    Issue {
        id: raw.id.clone(),
        title: raw.title.clone(),
        description: raw.description.clone(),
        status: IssueStatus::from_raw(&raw.status),
        priority: IssuePriority::from_raw(raw.priority),
        issue_type: IssueType::from_raw(raw.issue_type.as_deref()),
        labels: Vec::new(),
        created_at: raw.created_at.clone(),
        updated_at: raw.updated_at.clone(),
        blocks: map_dependencies(&edges.blocks, issue_map),
        blocked_by: map_dependencies(&edges.blocked_by, issue_map),
    }
}

/// Resolve dependency ids to issue summaries. Ids with no matching issue
/// record (stale edges in the database) are dropped.
fn map_dependencies(
    dep_ids: &[String],
    issue_map: &HashMap<&str, &RawIssue>,
) -> Vec<IssueDependency> {
    dep_ids
        .iter()
        .filter_map(|dep_id| issue_map.get(dep_id.as_str()))
        .map(|raw| IssueDependency {
            id: raw.id.clone(),
            title: raw.title.clone(),
            status: IssueStatus::from_raw(&raw.status),
            issue_type: IssueType::from_raw(raw.issue_type.as_deref()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn setup_project(dir: &TempDir) -> (ConfigStore, PathBuf) {
        let project = dir.path().join("proj");
        let beads = project.join(".beads");
        std::fs::create_dir_all(&beads).unwrap();
        std::fs::write(
            beads.join("issues.jsonl"),
            concat!(
                r#"{"id":"be-1","title":"Ship parser","status":"closed","priority":2,"issue_type":"feature","created_at":"2026-01-01T00:00:00Z","updated_at":"2026-01-03T00:00:00Z"}"#,
                "\n",
                r#"{"id":"be-2","title":"Fix crash","status":"open","priority":1,"issue_type":"bug","created_at":"2026-01-02T00:00:00Z","updated_at":"2026-01-02T00:00:00Z"}"#,
                "\n",
            ),
        )
        .unwrap();

        let store = ConfigStore::with_dir(dir.path().join(".bealin"));
        store.add_project(&project, None).unwrap();
        (store, project)
    }

    fn write_deps(project: &Path) {
        let conn = rusqlite::Connection::open(project.join(".beads/beads.db")).unwrap();
        conn.execute_batch(
            "CREATE TABLE dependencies (issue_id TEXT, depends_on_id TEXT, type TEXT);
             INSERT INTO dependencies VALUES ('be-2', 'be-1', 'blocks');
             INSERT INTO dependencies VALUES ('be-2', 'be-gone', 'blocks');",
        )
        .unwrap();
    }

    #[test]
    fn test_list_maps_raw_records() {
        let dir = tempfile::tempdir().unwrap();
        let (store, _) = setup_project(&dir);
        let repo = IssueRepository::new(store);

        let issues = repo.list().unwrap();
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].status, IssueStatus::Done);
        assert_eq!(issues[1].status, IssueStatus::Todo);
        assert_eq!(issues[1].priority, IssuePriority::Urgent);
        assert_eq!(issues[1].issue_type, IssueType::Bug);
    }

    #[test]
    fn test_list_attaches_dependencies_and_drops_stale_ids() {
        let dir = tempfile::tempdir().unwrap();
        let (store, project) = setup_project(&dir);
        write_deps(&project);
        let repo = IssueRepository::new(store);

        let issues = repo.list().unwrap();
        let be1 = issues.iter().find(|i| i.id == "be-1").unwrap();
        let be2 = issues.iter().find(|i| i.id == "be-2").unwrap();

        assert_eq!(be2.blocked_by.len(), 1, "stale 'be-gone' edge must be dropped");
        assert_eq!(be2.blocked_by[0].id, "be-1");
        assert_eq!(be1.blocks.len(), 1);
        assert_eq!(be1.blocks[0].id, "be-2");
    }

    #[test]
    fn test_get_by_id() {
        let dir = tempfile::tempdir().unwrap();
        let (store, project) = setup_project(&dir);
        write_deps(&project);
        let repo = IssueRepository::new(store);

        let issue = repo.get("be-2").unwrap().unwrap();
        assert_eq!(issue.title, "Fix crash");
        assert_eq!(issue.blocked_by[0].title, "Ship parser");

        assert!(repo.get("be-404").unwrap().is_none());
    }

    #[test]
    fn test_no_active_project() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::with_dir(dir.path().join(".bealin"));
        let repo = IssueRepository::new(store);

        assert!(matches!(repo.list(), Err(IssueError::NoActiveProject)));
        assert!(matches!(repo.get("be-1"), Err(IssueError::NoActiveProject)));
    }

    #[test]
    fn test_labels_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let (store, project) = setup_project(&dir);
        let repo = IssueRepository::new(store);

        assert!(repo.labels().unwrap().is_empty());

        std::fs::write(
            project.join(".beads/labels.jsonl"),
            r##"{"id":"l1","name":"backend","color":"#ff0000"}"##,
        )
        .unwrap();
        let labels = repo.labels().unwrap();
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].name, "backend");
    }
}
