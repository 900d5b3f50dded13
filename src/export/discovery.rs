//! On-disk session discovery for each supported producer.
//!
//! Claude Code keeps one `<uuid>.jsonl` per session under
//! `~/.claude/projects/<encoded-project-dir>/`; Codex nests
//! `rollout-*.jsonl` files under dated subdirectories of
//! `~/.codex/sessions/`; OpenClaw keeps per-agent session files under
//! `~/.openclaw/agents/<agent>/sessions/`. Discovery is best-effort:
//! unreadable directories and oddly named files are skipped with warnings,
//! never failing the whole scan.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use regex::Regex;
use uuid::Uuid;
use walkdir::WalkDir;

use crate::parsers::{ClaudeCode, Codex, OpenClaw, TranscriptFormat};
use crate::utils::{
    decode_project_dir, get_claude_dir, get_codex_dir, get_openclaw_dir, validate_decoded_path,
    validate_path_not_symlink,
};

/// One discovered session transcript, with enough metadata to filter,
/// list and export it.
#[derive(Clone)]
pub struct SessionSource {
    pub format: &'static dyn TranscriptFormat,
    pub transcript_path: PathBuf,
    pub session_id: String,
    /// The project working directory, when the on-disk layout reveals it.
    /// Codex sessions carry it inside the transcript instead.
    pub project_dir: Option<PathBuf>,
    pub modified: Option<DateTime<Utc>>,
    pub file_size: u64,
}

impl std::fmt::Debug for SessionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSource")
            .field("format", &self.format.name())
            .field("transcript_path", &self.transcript_path)
            .field("session_id", &self.session_id)
            .field("project_dir", &self.project_dir)
            .field("modified", &self.modified)
            .field("file_size", &self.file_size)
            .finish()
    }
}

impl SessionSource {
    /// A source constructed from an explicit file path rather than
    /// discovery.
    pub fn from_path(path: &Path, format: &'static dyn TranscriptFormat) -> Self {
        let session_id = session_id_from_stem(path);
        let (modified, file_size) = file_metadata(path);
        Self {
            format,
            transcript_path: path.to_path_buf(),
            session_id,
            project_dir: None,
            modified,
            file_size,
        }
    }

    pub fn short_id(&self) -> &str {
        crate::export::short_id(&self.session_id)
    }

    pub fn project_name(&self) -> String {
        self.project_dir
            .as_ref()
            .and_then(|dir| dir.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

/// Discover sessions across every producer found on this machine, newest
/// first.
pub fn find_all_sessions() -> Vec<SessionSource> {
    let mut sessions = Vec::new();

    match get_claude_dir().map(|dir| find_claude_sessions(&dir)) {
        Ok(Ok(found)) => sessions.extend(found),
        Ok(Err(e)) => eprintln!("Warning: Claude Code discovery failed: {e}"),
        Err(e) => eprintln!("Warning: {e}"),
    }
    match get_codex_dir().map(|dir| find_codex_sessions(&dir)) {
        Ok(Ok(found)) => sessions.extend(found),
        Ok(Err(e)) => eprintln!("Warning: Codex discovery failed: {e}"),
        Err(e) => eprintln!("Warning: {e}"),
    }
    match get_openclaw_dir().map(|dir| find_openclaw_sessions(&dir)) {
        Ok(Ok(found)) => sessions.extend(found),
        Ok(Err(e)) => eprintln!("Warning: OpenClaw discovery failed: {e}"),
        Err(e) => eprintln!("Warning: {e}"),
    }

    sessions.sort_by(|a, b| b.modified.cmp(&a.modified));
    sessions
}

/// Discover Claude Code sessions under `<claude_dir>/projects/`.
///
/// Only files whose stem is a UUID are sessions; `agent-*.jsonl` subagent
/// transcripts and other artifacts are skipped. Returns an empty vec when
/// the projects directory doesn't exist.
pub fn find_claude_sessions(claude_dir: &Path) -> Result<Vec<SessionSource>> {
    let projects_dir = claude_dir.join("projects");
    if !projects_dir.exists() {
        return Ok(Vec::new());
    }

    let mut sessions = Vec::new();
    let entries = fs::read_dir(&projects_dir)
        .with_context(|| format!("Failed to read projects directory: {}", projects_dir.display()))?;

    for entry in entries {
        let entry = entry.context("Failed to read directory entry")?;
        let project_folder = entry.path();
        if !project_folder.is_dir() {
            continue;
        }
        let Some(encoded_name) = project_folder.file_name().map(|n| n.to_string_lossy()) else {
            continue;
        };

        let decoded = decode_project_dir(&encoded_name);
        if let Err(e) = validate_decoded_path(&decoded) {
            eprintln!("Warning: Skipping invalid project directory {encoded_name}: {e}");
            continue;
        }
        if let Err(e) = validate_path_not_symlink(&project_folder) {
            eprintln!("Warning: Skipping project directory {encoded_name}: {e}");
            continue;
        }

        let files = match fs::read_dir(&project_folder) {
            Ok(files) => files,
            Err(e) => {
                eprintln!(
                    "Warning: Failed to read project directory {}: {}",
                    project_folder.display(),
                    e
                );
                continue;
            }
        };

        for file in files.flatten() {
            let path = file.path();
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let session_id = stem.to_string();
            let is_jsonl = path.extension().is_some_and(|ext| ext == "jsonl");
            if !is_jsonl || Uuid::parse_str(&session_id).is_err() {
                continue;
            }
            if validate_path_not_symlink(&path).is_err() {
                eprintln!("Warning: Skipping symlinked transcript {}", path.display());
                continue;
            }

            let (modified, file_size) = file_metadata(&path);
            sessions.push(SessionSource {
                format: &ClaudeCode,
                transcript_path: path,
                session_id,
                project_dir: Some(decoded.clone()),
                modified,
                file_size,
            });
        }
    }

    Ok(sessions)
}

/// Discover Codex rollout files under `<codex_dir>/sessions/`, recursively.
pub fn find_codex_sessions(codex_dir: &Path) -> Result<Vec<SessionSource>> {
    let sessions_dir = codex_dir.join("sessions");
    if !sessions_dir.exists() {
        return Ok(Vec::new());
    }

    let mut sessions = Vec::new();
    for entry in WalkDir::new(&sessions_dir).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                eprintln!("Warning: Codex discovery error: {e}");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if !name.starts_with("rollout-") || !name.ends_with(".jsonl") {
            continue;
        }

        let path = entry.into_path();
        let session_id = session_id_from_stem(&path);
        let (modified, file_size) = file_metadata(&path);
        sessions.push(SessionSource {
            format: &Codex,
            transcript_path: path,
            session_id,
            project_dir: None,
            modified,
            file_size,
        });
    }

    Ok(sessions)
}

/// Discover OpenClaw sessions under `<openclaw_dir>/agents/*/sessions/`,
/// skipping `-topic-` compaction artifacts.
pub fn find_openclaw_sessions(openclaw_dir: &Path) -> Result<Vec<SessionSource>> {
    let agents_dir = openclaw_dir.join("agents");
    if !agents_dir.exists() {
        return Ok(Vec::new());
    }

    let mut sessions = Vec::new();
    let agents = fs::read_dir(&agents_dir)
        .with_context(|| format!("Failed to read agents directory: {}", agents_dir.display()))?;

    for agent in agents {
        let agent = agent.context("Failed to read directory entry")?;
        let agent_dir = agent.path();
        let sessions_dir = agent_dir.join("sessions");
        if !sessions_dir.is_dir() {
            continue;
        }

        let files = match fs::read_dir(&sessions_dir) {
            Ok(files) => files,
            Err(e) => {
                eprintln!(
                    "Warning: Failed to read sessions directory {}: {}",
                    sessions_dir.display(),
                    e
                );
                continue;
            }
        };

        for file in files.flatten() {
            let path = file.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !name.ends_with(".jsonl") || name.contains("-topic-") {
                continue;
            }

            let session_id = session_id_from_stem(&path);
            let (modified, file_size) = file_metadata(&path);
            sessions.push(SessionSource {
                format: &OpenClaw,
                transcript_path: path,
                session_id,
                // The agent directory stands in for a project: exports
                // group under the agent's name.
                project_dir: Some(agent_dir.clone()),
                modified,
                file_size,
            });
        }
    }

    Ok(sessions)
}

/// Find the most recently modified session, optionally restricted to one
/// producer.
pub fn find_latest_session(format_name: Option<&str>) -> Option<SessionSource> {
    find_all_sessions()
        .into_iter()
        .find(|s| format_name.is_none_or(|name| s.format.name() == name))
}

/// Find a session whose id contains `query`, optionally restricted to one
/// producer. Newest match wins.
pub fn find_session_by_id(query: &str, format_name: Option<&str>) -> Option<SessionSource> {
    find_all_sessions()
        .into_iter()
        .filter(|s| format_name.is_none_or(|name| s.format.name() == name))
        .find(|s| s.session_id.contains(query))
}

/// Session id from a file stem; Codex rollout stems embed the UUID at the
/// end, everything else uses the full stem.
fn session_id_from_stem(path: &Path) -> String {
    static UUID_SUFFIX_RE: OnceLock<Regex> = OnceLock::new();
    let re = UUID_SUFFIX_RE.get_or_init(|| {
        Regex::new(
            r"([0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12})$",
        )
        .expect("valid uuid-suffix regex")
    });

    let stem = path.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
    re.captures(&stem)
        .map(|caps| caps[1].to_string())
        .unwrap_or_else(|| stem.into_owned())
}

fn file_metadata(path: &Path) -> (Option<DateTime<Utc>>, u64) {
    match fs::metadata(path) {
        Ok(metadata) => {
            let modified = metadata.modified().ok().map(DateTime::<Utc>::from);
            (modified, metadata.len())
        }
        Err(_) => (None, 0),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    const SESSION_UUID: &str = "550e8400-e29b-41d4-a716-446655440000";

    fn make_claude_tree(root: &Path) -> PathBuf {
        let claude = root.join(".claude");
        let project = claude.join("projects").join("-work-demo");
        fs::create_dir_all(&project).unwrap();
        fs::write(project.join(format!("{SESSION_UUID}.jsonl")), "{}\n").unwrap();
        fs::write(project.join("agent-12345.jsonl"), "{}\n").unwrap();
        fs::write(project.join("notes.txt"), "x").unwrap();
        claude
    }

    #[test]
    fn test_find_claude_sessions_uuid_stems_only() {
        let root = TempDir::new().unwrap();
        let claude = make_claude_tree(root.path());

        let sessions = find_claude_sessions(&claude).unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].session_id, SESSION_UUID);
        assert_eq!(sessions[0].format.name(), "claude-code");
        assert_eq!(sessions[0].project_name(), "demo");
    }

    #[test]
    fn test_find_claude_sessions_missing_dir_is_empty() {
        let root = TempDir::new().unwrap();
        let sessions = find_claude_sessions(&root.path().join(".claude")).unwrap();
        assert!(sessions.is_empty());
    }

    #[test]
    fn test_find_codex_sessions_recursive_rollouts() {
        let root = TempDir::new().unwrap();
        let codex = root.path().join(".codex");
        let day_dir = codex.join("sessions").join("2026").join("02").join("01");
        fs::create_dir_all(&day_dir).unwrap();
        fs::write(
            day_dir.join(format!("rollout-2026-02-01T08-00-00-{SESSION_UUID}.jsonl")),
            "{}\n",
        )
        .unwrap();
        fs::write(day_dir.join("other.jsonl"), "{}\n").unwrap();

        let sessions = find_codex_sessions(&codex).unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].session_id, SESSION_UUID);
        assert_eq!(sessions[0].format.name(), "codex");
        assert_eq!(sessions[0].project_name(), "unknown");
    }

    #[test]
    fn test_find_openclaw_sessions_skips_topic_files() {
        let root = TempDir::new().unwrap();
        let openclaw = root.path().join(".openclaw");
        let sessions_dir = openclaw.join("agents").join("main").join("sessions");
        fs::create_dir_all(&sessions_dir).unwrap();
        fs::write(sessions_dir.join("abc123.jsonl"), "{}\n").unwrap();
        fs::write(sessions_dir.join("abc123-topic-compact.jsonl"), "{}\n").unwrap();

        let sessions = find_openclaw_sessions(&openclaw).unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].session_id, "abc123");
        assert_eq!(sessions[0].project_name(), "main");
    }

    #[test]
    fn test_session_id_from_stem() {
        assert_eq!(
            session_id_from_stem(Path::new(&format!(
                "/x/rollout-2026-02-01T08-00-00-{SESSION_UUID}.jsonl"
            ))),
            SESSION_UUID
        );
        assert_eq!(session_id_from_stem(Path::new("/x/plain-name.jsonl")), "plain-name");
    }

    #[test]
    fn test_from_path_uses_stem_as_session_id() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("my-session.jsonl");
        fs::write(&path, "{}\n").unwrap();

        let source = SessionSource::from_path(&path, &ClaudeCode);
        assert_eq!(source.session_id, "my-session");
        assert!(source.modified.is_some());
        assert!(source.file_size > 0);
    }
}
