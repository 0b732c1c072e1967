use std::io;
use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::warn;

/// Read all records from a JSONL file (one JSON object per line).
///
/// A missing file yields an empty vec, since a project with no data yet is a
/// normal state, not an error. Blank lines are skipped. Malformed lines are
/// logged at warn level and skipped so a half-written line during a save
/// never takes the whole listing down.
pub fn read_all<T: DeserializeOwned>(path: &Path) -> io::Result<Vec<T>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err),
    };

    let mut records = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<T>(line) {
            Ok(record) => records.push(record),
            Err(err) => {
                let preview: String = line.chars().take(50).collect();
                warn!(path = %path.display(), error = %err, "skipping malformed JSONL line: {preview}...");
            }
        }
    }

    Ok(records)
}
