//! The flat-file sessions index: a Markdown table in each output
//! directory, keyed by short session id and rewritten on every export.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

const INDEX_TITLE: &str = "# Conversation Sessions Index";
const TABLE_HEADER: &str = "| Last Updated | Session ID | Project | Summary | HTML |";
const TABLE_SEPARATOR: &str = "|--------------|------------|---------|---------|------|";

/// Insert or replace one session's row in `sessions_index.md`.
///
/// Existing rows for other sessions are preserved; rows are written newest
/// first (the timestamp leads each row, so plain string order works). An
/// index written by an older layout without the Summary column is
/// rebuilt from the rows it carries.
pub fn update_sessions_index(
    index_path: &Path,
    short_id: &str,
    html_filename: &str,
    timestamp: &str,
    project_name: &str,
    summary: &str,
) -> Result<()> {
    let mut entries: HashMap<String, String> = HashMap::new();

    if index_path.exists() {
        let existing = fs::read_to_string(index_path)
            .with_context(|| format!("Failed to read index: {}", index_path.display()))?;

        let mut in_table = false;
        for line in existing.lines() {
            if line.starts_with('|') && line.contains("Session ID") {
                in_table = true;
            } else if line.starts_with("|---") {
                continue;
            } else if line.starts_with('|') && in_table {
                let cells: Vec<&str> = line.split('|').map(str::trim).collect();
                // cells[0] and the last cell are the empty strings around
                // the outer pipes; the session id sits in the second column.
                if cells.len() >= 4 {
                    let existing_id = cells[2].trim_matches('`').trim().to_string();
                    if !existing_id.is_empty() {
                        entries.insert(existing_id, line.to_string());
                    }
                }
            }
        }
    }

    entries.insert(
        short_id.to_string(),
        format!(
            "| {timestamp} | `{short_id}` | {project_name} | {summary} | \
             [{html_filename}](./{html_filename}) |"
        ),
    );

    let mut rows: Vec<&String> = entries.values().collect();
    rows.sort();
    rows.reverse();

    let mut out = String::new();
    out.push_str(INDEX_TITLE);
    out.push_str("\n\n");
    out.push_str(TABLE_HEADER);
    out.push('\n');
    out.push_str(TABLE_SEPARATOR);
    out.push('\n');
    for row in rows {
        out.push_str(row);
        out.push('\n');
    }

    fs::write(index_path, out)
        .with_context(|| format!("Failed to write index: {}", index_path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn read(path: &Path) -> String {
        fs::read_to_string(path).unwrap()
    }

    #[test]
    fn test_creates_index_with_header_and_row() {
        let dir = TempDir::new().unwrap();
        let index = dir.path().join("sessions_index.md");

        update_sessions_index(&index, "abc12345", "abc12345_fix.html", "20260115_100000", "demo", "Fixing Bug")
            .unwrap();

        let content = read(&index);
        assert!(content.starts_with("# Conversation Sessions Index\n"));
        assert!(content.contains("| Last Updated | Session ID | Project | Summary | HTML |"));
        assert!(content.contains("| 20260115_100000 | `abc12345` | demo | Fixing Bug | [abc12345_fix.html](./abc12345_fix.html) |"));
    }

    #[test]
    fn test_updating_same_session_replaces_row() {
        let dir = TempDir::new().unwrap();
        let index = dir.path().join("sessions_index.md");

        update_sessions_index(&index, "abc12345", "abc12345_fix.html", "20260115_100000", "demo", "Old").unwrap();
        update_sessions_index(&index, "abc12345", "abc12345_fix.html", "20260116_090000", "demo", "New").unwrap();

        let content = read(&index);
        assert_eq!(content.matches("`abc12345`").count(), 1);
        assert!(content.contains("New"));
        assert!(!content.contains("Old"));
    }

    #[test]
    fn test_multiple_sessions_sorted_newest_first() {
        let dir = TempDir::new().unwrap();
        let index = dir.path().join("sessions_index.md");

        update_sessions_index(&index, "aaaa1111", "aaaa1111_one.html", "20260110_000000", "demo", "One").unwrap();
        update_sessions_index(&index, "bbbb2222", "bbbb2222_two.html", "20260120_000000", "demo", "Two").unwrap();

        let content = read(&index);
        let newer = content.find("bbbb2222").unwrap();
        let older = content.find("aaaa1111").unwrap();
        assert!(newer < older, "newest entry should come first:\n{content}");
    }
}
