use std::borrow::Cow;
use std::env;
use std::fs::File;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result, bail};

// Maximum transcript size: 100MB
const MAX_TRANSCRIPT_SIZE_BYTES: u64 = 100 * 1024 * 1024;

/// Decodes a Claude Code project directory name back to a file system path.
///
/// Project directories encode the working directory by replacing `/` with
/// `-` (e.g. `-Users-alice-code-my-app`). The encoding is ambiguous when
/// directory names themselves contain dashes, so decoding greedily probes
/// the filesystem: at each step the longest dash-joined candidate segment
/// whose path exists wins, falling back to single segments when nothing
/// matches.
///
/// # Examples
///
/// ```no_run
/// use ai_session_exporter::decode_project_dir;
///
/// // Resolves to /Users/alice/code/my-app when that directory exists.
/// let decoded = decode_project_dir("-Users-alice-code-my-app");
/// ```
pub fn decode_project_dir(encoded: &str) -> PathBuf {
    decode_project_dir_against(encoded, Path::new("/"))
}

/// Internal helper with an explicit probe root (for testing).
pub(crate) fn decode_project_dir_against(encoded: &str, root: &Path) -> PathBuf {
    let stripped = encoded.strip_prefix('-').unwrap_or(encoded);
    let parts: Vec<&str> = stripped.split('-').collect();

    let mut resolved = root.to_path_buf();
    let mut i = 0;

    while i < parts.len() {
        let mut advanced = false;
        // Longest candidate first, so directory names containing dashes
        // beat the split interpretation.
        for j in (i + 1..=parts.len()).rev() {
            let candidate = parts[i..j].join("-");
            if resolved.join(&candidate).exists() {
                resolved.push(candidate);
                i = j;
                advanced = true;
                break;
            }
        }
        if !advanced {
            // Nothing on disk matches; take the single segment as-is.
            resolved.push(parts[i]);
            i += 1;
        }
    }

    resolved
}

/// Validates that a decoded path is safe to use as a project directory.
///
/// # Errors
///
/// Returns an error if:
/// - The path contains '..' components (path traversal)
/// - The path is not absolute
pub fn validate_decoded_path(path: &Path) -> Result<()> {
    for component in path.components() {
        if component == Component::ParentDir {
            bail!("Path contains '..' component: {}", path.display());
        }
    }

    if !path.is_absolute() {
        bail!("Path must be absolute: {}", path.display());
    }

    Ok(())
}

/// Validates that a path is not a symlink.
///
/// Discovery skips symlinked project directories and transcripts so an
/// export run never follows links out of the history tree.
pub fn validate_path_not_symlink(path: &Path) -> Result<()> {
    let metadata = path
        .symlink_metadata()
        .with_context(|| format!("Failed to read metadata: {}", path.display()))?;
    if metadata.file_type().is_symlink() {
        bail!("Path is a symlink: {}", path.display());
    }
    Ok(())
}

/// Opens a transcript file, validating its size first.
///
/// # Errors
///
/// Returns an error if the file cannot be opened, its metadata cannot be
/// read, or it exceeds the 100MB limit.
pub fn open_transcript(path: &Path) -> Result<File> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open transcript: {}", path.display()))?;

    let metadata = file
        .metadata()
        .with_context(|| format!("Failed to read file metadata: {}", path.display()))?;
    if metadata.len() > MAX_TRANSCRIPT_SIZE_BYTES {
        bail!(
            "Transcript too large: {} ({} bytes, max {} bytes)",
            path.display(),
            metadata.len(),
            MAX_TRANSCRIPT_SIZE_BYTES
        );
    }

    Ok(file)
}

/// Formats a path with ~ substitution for the home directory
///
/// # Examples
///
/// ```no_run
/// use std::path::PathBuf;
/// use ai_session_exporter::format_path_with_tilde;
///
/// let path = PathBuf::from("/Users/alice/Documents");
/// // Returns "~/Documents" if HOME=/Users/alice
/// let formatted = format_path_with_tilde(&path);
/// ```
pub fn format_path_with_tilde(path: &Path) -> String {
    format_path_with_tilde_internal(path, None)
}

/// Internal helper for path formatting with optional home override (for testing)
pub(crate) fn format_path_with_tilde_internal(path: &Path, home_override: Option<&str>) -> String {
    let home_from_env = env::var("HOME").ok();
    let home = home_override.or(home_from_env.as_deref());

    let path_str = path.to_string_lossy();
    if let Some(home) = home
        && path_str.starts_with(home)
    {
        return path_str.replacen(home, "~", 1);
    }

    // Avoid double allocation when converting Cow to String
    match path_str {
        Cow::Borrowed(s) => s.to_string(),
        Cow::Owned(s) => s,
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_decode_simple_path() {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join("Users/alice/project")).unwrap();

        let decoded = decode_project_dir_against("-Users-alice-project", root.path());
        assert_eq!(decoded, root.path().join("Users/alice/project"));
    }

    #[test]
    fn test_decode_prefers_existing_dashed_directory() {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join("Users/alice/my-app")).unwrap();

        let decoded = decode_project_dir_against("-Users-alice-my-app", root.path());
        assert_eq!(decoded, root.path().join("Users/alice/my-app"));
    }

    #[test]
    fn test_decode_greedy_longest_match_wins() {
        // Both interpretations exist on disk; the longer segment wins.
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join("work/my/app")).unwrap();
        fs::create_dir_all(root.path().join("work/my-app")).unwrap();

        let decoded = decode_project_dir_against("-work-my-app", root.path());
        assert_eq!(decoded, root.path().join("work/my-app"));
    }

    #[test]
    fn test_decode_falls_back_to_single_segments_when_nothing_exists() {
        let root = TempDir::new().unwrap();

        let decoded = decode_project_dir_against("-gone-project-dir", root.path());
        assert_eq!(decoded, root.path().join("gone/project/dir"));
    }

    #[test]
    fn test_validate_safe_path() {
        let safe_path = PathBuf::from("/Users/foo/bar");
        assert!(validate_decoded_path(&safe_path).is_ok());
    }

    #[test]
    fn test_validate_path_with_parent_dir() {
        let unsafe_path = PathBuf::from("/Users/foo/../etc/passwd");
        assert!(validate_decoded_path(&unsafe_path).is_err());
    }

    #[test]
    fn test_validate_relative_path() {
        let relative = PathBuf::from("Users/foo/bar");
        assert!(validate_decoded_path(&relative).is_err());
    }

    #[test]
    fn test_open_transcript_missing_file() {
        let result = open_transcript(Path::new("/nonexistent/transcript.jsonl"));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Failed to open"));
    }

    #[test]
    fn test_validate_not_symlink_accepts_regular_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("plain.jsonl");
        fs::write(&file, "{}").unwrap();
        assert!(validate_path_not_symlink(&file).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_validate_not_symlink_rejects_symlink() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("target.jsonl");
        fs::write(&target, "{}").unwrap();
        let link = dir.path().join("link.jsonl");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        assert!(validate_path_not_symlink(&link).is_err());
    }

    #[test]
    fn test_format_path_with_tilde() {
        // Test with explicit home directory (no unsafe needed)
        let path = PathBuf::from("/Users/testuser/Documents/project");
        let formatted = format_path_with_tilde_internal(&path, Some("/Users/testuser"));
        assert_eq!(formatted, "~/Documents/project");

        // Path not under home
        let path2 = PathBuf::from("/opt/local/bin");
        let formatted2 = format_path_with_tilde_internal(&path2, Some("/Users/testuser"));
        assert_eq!(formatted2, "/opt/local/bin");
    }
}
