//! Batch export over every discovered session.
//!
//! Each session's reconstruction is fully independent, so exports run in
//! parallel across sessions with rayon. A failed session is reported and
//! counted, never aborting the batch.

use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use rayon::prelude::*;

use crate::config::ExportConfig;
use crate::export::discovery::{SessionSource, find_all_sessions};
use crate::export::{ExportOptions, OutputFormat, export_session, find_existing_exports, output_directory};

/// Which sessions a batch run covers.
#[derive(Debug, Clone, Default)]
pub struct BatchFilter {
    /// Restrict to one producer format (by name).
    pub source: Option<String>,
    /// Substring match against the project name, case-insensitive.
    pub project: Option<String>,
    /// Only sessions modified on or after this date.
    pub since: Option<NaiveDate>,
    /// Only sessions modified before this date.
    pub before: Option<NaiveDate>,
}

/// How a batch run behaves.
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    pub dry_run: bool,
    pub skip_existing: bool,
    pub list_only: bool,
    /// Overrides the central export location from config.
    pub central: Option<PathBuf>,
    pub verbose: bool,
    pub format: OutputFormat,
}

/// Outcome counters for a batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub exported: usize,
    pub failed: usize,
    pub skipped_existing: usize,
}

/// Run a batch export across all discovered sessions.
pub fn run_batch(
    filter: &BatchFilter,
    options: &BatchOptions,
    config: &ExportConfig,
) -> Result<BatchSummary> {
    // The central override becomes part of the run's config value, so
    // every output-directory decision downstream sees it.
    let config = match &options.central {
        Some(central) => ExportConfig {
            central_export_location: Some(central.to_string_lossy().into_owned()),
            ..config.clone()
        },
        None => config.clone(),
    };

    let mut sessions = find_all_sessions();
    apply_filter(&mut sessions, filter);

    if sessions.is_empty() {
        println!("No sessions found.");
        return Ok(BatchSummary::default());
    }

    if options.list_only {
        print_session_table(&sessions, &config);
        return Ok(BatchSummary::default());
    }

    let mut summary = BatchSummary::default();

    if options.skip_existing {
        let original = sessions.len();
        sessions.retain(|s| !has_existing_export(s, &config));
        summary.skipped_existing = original - sessions.len();
        if summary.skipped_existing > 0 {
            println!("Skipping {} already exported session(s)", summary.skipped_existing);
        }
    }

    if sessions.is_empty() {
        println!("No sessions to export after applying filters.");
        return Ok(summary);
    }

    let prefix = if options.dry_run { "[DRY RUN] " } else { "" };
    println!("\n{prefix}Exporting {} session(s)...\n", sessions.len());

    if options.dry_run {
        for (i, session) in sessions.iter().enumerate() {
            println!(
                "[{}/{}] {} ({})... would export",
                i + 1,
                sessions.len(),
                session.project_name(),
                session.short_id()
            );
        }
        summary.exported = sessions.len();
        println!("\n[DRY RUN] Complete: {} would be exported", summary.exported);
        return Ok(summary);
    }

    let export_opts = ExportOptions { format: options.format, output_override: None };
    let results: Vec<(usize, Result<Vec<PathBuf>>)> = sessions
        .par_iter()
        .enumerate()
        .map(|(i, session)| {
            let result =
                export_session(session, &config, &export_opts).map(|outcome| outcome.written);
            (i, result)
        })
        .collect();

    for (i, result) in results {
        let session = &sessions[i];
        let label = format!("{} ({})", session.project_name(), session.short_id());
        match result {
            Ok(written) => {
                summary.exported += 1;
                if options.verbose {
                    println!("[{}/{}] {label}... OK", i + 1, sessions.len());
                    for path in written {
                        println!("    {}", path.display());
                    }
                } else {
                    println!("[{}/{}] {label}... OK", i + 1, sessions.len());
                }
            }
            Err(e) => {
                summary.failed += 1;
                println!("[{}/{}] {label}... FAILED\n    {e:#}", i + 1, sessions.len());
            }
        }
    }

    println!("\nComplete: {} exported, {} failed", summary.exported, summary.failed);
    Ok(summary)
}

fn apply_filter(sessions: &mut Vec<SessionSource>, filter: &BatchFilter) {
    if let Some(source) = &filter.source {
        sessions.retain(|s| s.format.name() == source);
    }
    if let Some(project) = &filter.project {
        let needle = project.to_lowercase();
        sessions.retain(|s| s.project_name().to_lowercase().contains(&needle));
    }
    if let Some(since) = filter.since {
        sessions.retain(|s| s.modified.is_some_and(|m| m.date_naive() >= since));
    }
    if let Some(before) = filter.before {
        sessions.retain(|s| s.modified.is_some_and(|m| m.date_naive() < before));
    }
}

/// Whether a session already has an HTML export in its output directory.
///
/// Sessions whose project directory is only known after parsing (Codex)
/// cannot be checked cheaply and count as not exported.
fn has_existing_export(session: &SessionSource, config: &ExportConfig) -> bool {
    let Some(project_dir) = &session.project_dir else {
        return false;
    };
    let output_dir = output_directory(project_dir, config);
    match find_existing_exports(&output_dir, session.short_id()) {
        Ok((html, _)) => !html.is_empty(),
        Err(_) => false,
    }
}

fn print_session_table(sessions: &[SessionSource], config: &ExportConfig) {
    println!("\nFound {} session(s):\n", sessions.len());
    println!(
        "{:<12} {:<10} {:<30} {:<20} {:<10} {:<10}",
        "Session ID", "Source", "Project", "Modified", "Size", "Exported?"
    );
    println!("{}", "-".repeat(96));

    for session in sessions {
        let modified = session
            .modified
            .map(|m| m.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "Unknown".to_string());
        let exported = if has_existing_export(session, config) { "Yes" } else { "No" };
        println!(
            "{:<12} {:<10} {:<30} {:<20} {:<10} {:<10}",
            session.short_id(),
            session.format.name(),
            session.project_name(),
            modified,
            format_size(session.file_size),
            exported
        );
    }
    println!();
}

fn format_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    for unit in ["B", "KB", "MB", "GB"] {
        if size < 1024.0 {
            return format!("{size:.1} {unit}");
        }
        size /= 1024.0;
    }
    format!("{size:.1} TB")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::{ClaudeCode, Codex};

    fn source(name: &str, project: &str, modified: Option<&str>) -> SessionSource {
        SessionSource {
            format: if name == "codex" { &Codex } else { &ClaudeCode },
            transcript_path: PathBuf::from(format!("/tmp/{project}.jsonl")),
            session_id: format!("{project}-id"),
            project_dir: Some(PathBuf::from(format!("/work/{project}"))),
            modified: modified.map(|m| {
                format!("{m}T12:00:00Z").parse().expect("valid test timestamp")
            }),
            file_size: 10,
        }
    }

    #[test]
    fn test_filter_by_source() {
        let mut sessions =
            vec![source("claude-code", "alpha", None), source("codex", "beta", None)];
        apply_filter(
            &mut sessions,
            &BatchFilter { source: Some("codex".to_string()), ..Default::default() },
        );
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].format.name(), "codex");
    }

    #[test]
    fn test_filter_by_project_substring_case_insensitive() {
        let mut sessions =
            vec![source("claude-code", "WebApp", None), source("claude-code", "other", None)];
        apply_filter(
            &mut sessions,
            &BatchFilter { project: Some("webapp".to_string()), ..Default::default() },
        );
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].project_name(), "WebApp");
    }

    #[test]
    fn test_filter_by_date_window() {
        let mut sessions = vec![
            source("claude-code", "old", Some("2026-01-01")),
            source("claude-code", "mid", Some("2026-02-15")),
            source("claude-code", "new", Some("2026-03-20")),
            source("claude-code", "undated", None),
        ];
        apply_filter(
            &mut sessions,
            &BatchFilter {
                since: Some(NaiveDate::from_ymd_opt(2026, 2, 1).unwrap()),
                before: Some(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()),
                ..Default::default()
            },
        );
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].project_name(), "mid");
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512.0 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
    }
}
