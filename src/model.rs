use serde::{Deserialize, Serialize};

/// Workflow status of an issue as presented to the UI.
///
/// The beads JSONL file stores a coarser status set (`open`, `in_progress`,
/// `closed`); [`IssueStatus::from_raw`] maps between the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    Backlog,
    Todo,
    InProgress,
    Done,
    Canceled,
}

impl IssueStatus {
    /// Map a raw beads status string to the UI status.
    /// Unknown statuses land in the backlog rather than failing.
    pub fn from_raw(raw: &str) -> Self {
        match raw {
            "open" => Self::Todo,
            "in_progress" => Self::InProgress,
            "closed" => Self::Done,
            _ => Self::Backlog,
        }
    }
}

/// Issue priority. Beads stores priorities as small integers (1 = most urgent).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssuePriority {
    None,
    Low,
    Medium,
    High,
    Urgent,
}

impl IssuePriority {
    pub fn from_raw(raw: i64) -> Self {
        match raw {
            1 => Self::Urgent,
            2 => Self::High,
            3 => Self::Medium,
            4 => Self::Low,
            _ => Self::None,
        }
    }
}

/// Issue type. Missing or unknown types default to `task`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    Task,
    Bug,
    Feature,
    Epic,
    Chore,
}

impl IssueType {
    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw {
            Some("bug") => Self::Bug,
            Some("feature") => Self::Feature,
            Some("epic") => Self::Epic,
            Some("chore") => Self::Chore,
            _ => Self::Task,
        }
    }
}

/// Raw issue record as stored in `.beads/issues.jsonl`, one JSON object per
/// line. Fields beyond these exist in the file (close reason, estimates,
/// comments); they are ignored here since this backend only projects data.
#[derive(Debug, Clone, Deserialize)]
pub struct RawIssue {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: String,
    #[serde(default)]
    pub priority: i64,
    #[serde(default)]
    pub issue_type: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

/// Issue as served by the read API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: IssueStatus,
    pub priority: IssuePriority,
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    pub labels: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
    pub blocks: Vec<IssueDependency>,
    pub blocked_by: Vec<IssueDependency>,
}

/// Summary of an issue referenced from another issue's dependency list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueDependency {
    pub id: String,
    pub title: String,
    pub status: IssueStatus,
    #[serde(rename = "type")]
    pub issue_type: IssueType,
}

/// Label record from `.beads/labels.jsonl`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Label {
    pub id: String,
    pub name: String,
    #[serde(default = "default_label_color")]
    pub color: String,
}

fn default_label_color() -> String {
    "#808080".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(IssueStatus::from_raw("open"), IssueStatus::Todo);
        assert_eq!(IssueStatus::from_raw("in_progress"), IssueStatus::InProgress);
        assert_eq!(IssueStatus::from_raw("closed"), IssueStatus::Done);
        assert_eq!(IssueStatus::from_raw("weird"), IssueStatus::Backlog);
        assert_eq!(IssueStatus::from_raw(""), IssueStatus::Backlog);
    }

    #[test]
    fn test_priority_mapping() {
        assert_eq!(IssuePriority::from_raw(1), IssuePriority::Urgent);
        assert_eq!(IssuePriority::from_raw(2), IssuePriority::High);
        assert_eq!(IssuePriority::from_raw(3), IssuePriority::Medium);
        assert_eq!(IssuePriority::from_raw(4), IssuePriority::Low);
        assert_eq!(IssuePriority::from_raw(0), IssuePriority::None);
        assert_eq!(IssuePriority::from_raw(99), IssuePriority::None);
    }

    #[test]
    fn test_type_mapping_defaults_to_task() {
        assert_eq!(IssueType::from_raw(Some("bug")), IssueType::Bug);
        assert_eq!(IssueType::from_raw(Some("epic")), IssueType::Epic);
        assert_eq!(IssueType::from_raw(Some("task")), IssueType::Task);
        assert_eq!(IssueType::from_raw(Some("unknown")), IssueType::Task);
        assert_eq!(IssueType::from_raw(None), IssueType::Task);
    }

    #[test]
    fn test_raw_issue_tolerates_extra_fields() {
        let line = r#"{"id":"be-1","title":"Fix login","status":"open","priority":2,"created_at":"2026-01-01T00:00:00Z","updated_at":"2026-01-02T00:00:00Z","close_reason":null,"estimate":3}"#;
        let raw: RawIssue = serde_json::from_str(line).unwrap();
        assert_eq!(raw.id, "be-1");
        assert_eq!(raw.priority, 2);
        assert!(raw.issue_type.is_none());
    }

    #[test]
    fn test_issue_serializes_camel_case() {
        let issue = Issue {
            id: "be-1".into(),
            title: "Fix login".into(),
            description: String::new(),
            status: IssueStatus::InProgress,
            priority: IssuePriority::High,
            issue_type: IssueType::Bug,
            labels: vec![],
            created_at: "2026-01-01T00:00:00Z".into(),
            updated_at: "2026-01-02T00:00:00Z".into(),
            blocks: vec![],
            blocked_by: vec![],
        };
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["status"], "in_progress");
        assert_eq!(json["type"], "bug");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("blockedBy").is_some());
    }
}
