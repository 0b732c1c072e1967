use std::collections::HashMap;
use std::path::Path;

use rusqlite::{Connection, OpenFlags};
use tracing::debug;

/// Dependency edges for a single issue, both directions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DependencyEdges {
    /// Issues this issue depends on (it is blocked by them).
    pub blocked_by: Vec<String>,
    /// Issues that depend on this issue (it blocks them).
    pub blocks: Vec<String>,
}

/// Dependency rows live in the beads SQLite database alongside the JSONL
/// file: `dependencies(issue_id, depends_on_id, type)`, where a `blocks`
/// edge means `issue_id` is blocked by `depends_on_id`.
const DEP_TYPE: &str = "blocks";

fn open_read_only(db_path: &Path) -> rusqlite::Result<Connection> {
    Connection::open_with_flags(db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)
}

/// Issue ids that block the given issue.
///
/// A missing, locked, or otherwise unreadable database yields an empty list, so
/// the issue listing still works, just without dependency decoration.
pub fn blocked_by(db_path: &Path, issue_id: &str) -> Vec<String> {
    query_blocked_by(db_path, issue_id).unwrap_or_else(|err| {
        debug!(db = %db_path.display(), error = %err, "dependency query failed");
        Vec::new()
    })
}

/// Issue ids that the given issue blocks.
pub fn blocks(db_path: &Path, issue_id: &str) -> Vec<String> {
    query_blocks(db_path, issue_id).unwrap_or_else(|err| {
        debug!(db = %db_path.display(), error = %err, "dependency query failed");
        Vec::new()
    })
}

fn query_blocked_by(db_path: &Path, issue_id: &str) -> rusqlite::Result<Vec<String>> {
    let conn = open_read_only(db_path)?;
    let mut stmt =
        conn.prepare("SELECT depends_on_id FROM dependencies WHERE issue_id = ?1 AND type = ?2")?;
    let rows = stmt.query_map((issue_id, DEP_TYPE), |row| row.get::<_, String>(0))?;
    rows.collect()
}

fn query_blocks(db_path: &Path, issue_id: &str) -> rusqlite::Result<Vec<String>> {
    let conn = open_read_only(db_path)?;
    let mut stmt =
        conn.prepare("SELECT issue_id FROM dependencies WHERE depends_on_id = ?1 AND type = ?2")?;
    let rows = stmt.query_map((issue_id, DEP_TYPE), |row| row.get::<_, String>(0))?;
    rows.collect()
}

/// Batch variant used by the full issue listing: one pass over the database
/// for all issues instead of two queries per issue.
///
/// Every requested id gets an entry (empty edges when it has none). Database
/// errors degrade to the empty result, same as the single-issue queries.
pub fn all_dependencies(db_path: &Path, issue_ids: &[String]) -> HashMap<String, DependencyEdges> {
    let mut result: HashMap<String, DependencyEdges> = issue_ids
        .iter()
        .map(|id| (id.clone(), DependencyEdges::default()))
        .collect();

    if issue_ids.is_empty() {
        return result;
    }

    if let Err(err) = query_all_dependencies(db_path, issue_ids, &mut result) {
        debug!(db = %db_path.display(), error = %err, "batch dependency query failed");
    }

    result
}

fn query_all_dependencies(
    db_path: &Path,
    issue_ids: &[String],
    result: &mut HashMap<String, DependencyEdges>,
) -> rusqlite::Result<()> {
    let conn = open_read_only(db_path)?;
    let placeholders = vec!["?"; issue_ids.len()].join(",");

    let sql = format!(
        "SELECT issue_id, depends_on_id FROM dependencies \
         WHERE issue_id IN ({placeholders}) AND type = '{DEP_TYPE}'"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(issue_ids), |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;
    for row in rows {
        let (issue_id, depends_on_id) = row?;
        if let Some(edges) = result.get_mut(&issue_id) {
            edges.blocked_by.push(depends_on_id);
        }
    }

    let sql = format!(
        "SELECT issue_id, depends_on_id FROM dependencies \
         WHERE depends_on_id IN ({placeholders}) AND type = '{DEP_TYPE}'"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(issue_ids), |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;
    for row in rows {
        let (issue_id, depends_on_id) = row?;
        if let Some(edges) = result.get_mut(&depends_on_id) {
            edges.blocks.push(issue_id);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn fixture_db(dir: &Path) -> PathBuf {
        let db_path = dir.join("beads.db");
        let conn = Connection::open(&db_path).unwrap();
        conn.execute_batch(
            "CREATE TABLE dependencies (
                issue_id TEXT NOT NULL,
                depends_on_id TEXT NOT NULL,
                type TEXT NOT NULL
            );
            INSERT INTO dependencies VALUES ('be-2', 'be-1', 'blocks');
            INSERT INTO dependencies VALUES ('be-3', 'be-1', 'blocks');
            INSERT INTO dependencies VALUES ('be-3', 'be-2', 'blocks');
            INSERT INTO dependencies VALUES ('be-4', 'be-1', 'related');",
        )
        .unwrap();
        db_path
    }

    #[test]
    fn test_blocked_by_and_blocks() {
        let dir = tempfile::tempdir().unwrap();
        let db = fixture_db(dir.path());

        assert_eq!(blocked_by(&db, "be-2"), vec!["be-1".to_string()]);
        let mut blockers = blocked_by(&db, "be-3");
        blockers.sort();
        assert_eq!(blockers, vec!["be-1".to_string(), "be-2".to_string()]);

        let mut blocked = blocks(&db, "be-1");
        blocked.sort();
        assert_eq!(blocked, vec!["be-2".to_string(), "be-3".to_string()]);

        // 'related' edges are not dependency edges
        assert!(blocked_by(&db, "be-4").is_empty());
    }

    #[test]
    fn test_missing_database_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("absent.db");
        assert!(blocked_by(&db, "be-1").is_empty());
        assert!(blocks(&db, "be-1").is_empty());
        let all = all_dependencies(&db, &["be-1".to_string()]);
        assert_eq!(all["be-1"], DependencyEdges::default());
    }

    #[test]
    fn test_all_dependencies_batch() {
        let dir = tempfile::tempdir().unwrap();
        let db = fixture_db(dir.path());
        let ids: Vec<String> = ["be-1", "be-2", "be-3"].iter().map(|s| s.to_string()).collect();

        let all = all_dependencies(&db, &ids);
        assert_eq!(all.len(), 3);
        assert!(all["be-1"].blocked_by.is_empty());
        assert_eq!(all["be-1"].blocks.len(), 2);
        assert_eq!(all["be-2"].blocked_by, vec!["be-1".to_string()]);
        assert_eq!(all["be-2"].blocks, vec!["be-3".to_string()]);
        assert_eq!(all["be-3"].blocked_by.len(), 2);
        assert!(all["be-3"].blocks.is_empty());
    }

    #[test]
    fn test_all_dependencies_empty_ids() {
        let dir = tempfile::tempdir().unwrap();
        let db = fixture_db(dir.path());
        assert!(all_dependencies(&db, &[]).is_empty());
    }
}
