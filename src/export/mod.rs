//! Session export: the parse → reconstruct → aggregate → summarize →
//! render pipeline, plus output naming, deduplication and the sessions
//! index.
//!
//! # Error Handling Strategy
//!
//! Within one session the pipeline is best-effort (bad lines skipped, bad
//! fields absent); an export fails only on I/O problems with the
//! transcript or the output directory, reported with `anyhow` context.
//! Batch mode (`batch` module) isolates those failures per session.

pub mod batch;
pub mod discovery;
pub mod index;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::ValueEnum;
use regex::Regex;

use crate::config::ExportConfig;
use crate::models::Session;
use crate::parsers::{TranscriptFormat, read_events};
use crate::reconstruct::Reconstructor;
use crate::render::html::PageContext;
use crate::render::{format_datetime, render_html, render_markdown};
use crate::stats::StatsAggregator;
use crate::summary::generate_summary;

pub use discovery::SessionSource;

/// Maximum slug length in generated file names.
const SLUG_MAX_LENGTH: usize = 50;

/// Which renderers an export runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    Html,
    Md,
    #[default]
    Both,
}

impl OutputFormat {
    fn wants_html(self) -> bool {
        matches!(self, OutputFormat::Html | OutputFormat::Both)
    }

    fn wants_markdown(self) -> bool {
        matches!(self, OutputFormat::Md | OutputFormat::Both)
    }
}

/// Per-invocation export options (CLI flags, not config-file settings).
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    pub format: OutputFormat,
    /// Overrides the config-derived output directory entirely.
    pub output_override: Option<PathBuf>,
}

/// What one export wrote.
#[derive(Debug, Clone)]
pub struct ExportOutcome {
    pub written: Vec<PathBuf>,
    pub summary: String,
}

/// Run the core pipeline over one transcript file.
///
/// Both folds (reconstruction and statistics) run in a single pass over
/// the classified event sequence.
pub fn parse_transcript(
    path: &Path,
    format: &dyn TranscriptFormat,
    config: &ExportConfig,
) -> Result<Session> {
    let events = read_events(path, format)?;

    let mut reconstructor = Reconstructor::new(config.reconstruct_options(format));
    let mut aggregator = StatsAggregator::new();
    for event in &events {
        aggregator.observe(event);
        reconstructor.push(event);
    }

    let reconstruction = reconstructor.finish();
    let stats = aggregator.finish(&reconstruction.turns);

    Ok(Session {
        meta: reconstruction.meta,
        turns: reconstruction.turns,
        tool_calls: reconstruction.tool_calls,
        stats,
    })
}

/// Export one session to HTML and/or Markdown, updating the sessions index.
///
/// Re-exports of a session already present in the output directory reuse
/// its filename and carry its original "Created" date forward.
pub fn export_session(
    source: &SessionSource,
    config: &ExportConfig,
    opts: &ExportOptions,
) -> Result<ExportOutcome> {
    let session = parse_transcript(&source.transcript_path, source.format, config)?;

    let project_dir = source
        .project_dir
        .clone()
        .or_else(|| session.meta.cwd.clone())
        .unwrap_or_else(|| PathBuf::from("."));
    let project_name = dir_name(&project_dir);

    let session_id = if !source.session_id.is_empty() {
        source.session_id.clone()
    } else {
        session.meta.session_id.clone().unwrap_or_else(|| "unknown".to_string())
    };
    let short = short_id(&session_id).to_string();

    let summary = if config.generate_summary {
        generate_summary(&session.turns, &project_name)
    } else {
        String::new()
    };

    let output_dir = opts
        .output_override
        .clone()
        .unwrap_or_else(|| output_directory(&project_dir, config));
    fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create output directory: {}", output_dir.display()))?;

    let (existing_html, existing_jsonl) = find_existing_exports(&output_dir, &short)?;

    // Resumed sessions keep their filename and original creation date.
    let mut created_date = None;
    let mut html_filename = None;
    if let Some(first) = existing_html.first() {
        created_date = extract_created_date(first);
        html_filename = first.file_name().map(|n| n.to_string_lossy().into_owned());
        if opts.format.wants_html() {
            for old in existing_html.iter().chain(existing_jsonl.iter()) {
                if let Err(e) = fs::remove_file(old) {
                    eprintln!("Warning: could not remove old export {}: {}", old.display(), e);
                }
            }
        }
    }

    let updated = format_datetime(&Utc::now(), &config.date_format);
    let created = created_date.unwrap_or_else(|| {
        session
            .meta
            .created
            .or(session.stats.first_timestamp)
            .map(|ts| format_datetime(&ts, &config.date_format))
            .unwrap_or_else(|| updated.clone())
    });

    let html_filename = match html_filename {
        Some(name) => name,
        None => {
            let slug = if summary.is_empty() {
                "session".to_string()
            } else {
                slugify(&summary, SLUG_MAX_LENGTH)
            };
            unique_filename(&output_dir, &short, &slug)
        }
    };

    let page = PageContext {
        project_name: project_name.clone(),
        project_dir: project_dir.to_string_lossy().into_owned(),
        session_id: session_id.clone(),
        created,
        updated: updated.clone(),
    };

    let mut written = Vec::new();

    if opts.format.wants_html() {
        let html_path = output_dir.join(&html_filename);
        fs::write(&html_path, render_html(&session, &summary, &page, config))
            .with_context(|| format!("Failed to write {}", html_path.display()))?;

        // The raw transcript travels alongside the report.
        let jsonl_path = html_path.with_extension("jsonl");
        if let Err(e) = fs::copy(&source.transcript_path, &jsonl_path) {
            eprintln!("Warning: could not copy transcript to {}: {}", jsonl_path.display(), e);
        } else {
            written.push(jsonl_path);
        }

        let index_path = output_dir.join("sessions_index.md");
        if let Err(e) = index::update_sessions_index(
            &index_path,
            &short,
            &html_filename,
            &updated,
            &project_name,
            &summary,
        ) {
            eprintln!("Warning: could not update {}: {}", index_path.display(), e);
        }

        written.insert(0, html_path);
    }

    if opts.format.wants_markdown() {
        let md_path = output_dir.join(&html_filename).with_extension("md");
        fs::write(&md_path, render_markdown(&session, &source.transcript_path))
            .with_context(|| format!("Failed to write {}", md_path.display()))?;
        written.push(md_path);
    }

    Ok(ExportOutcome { written, summary })
}

/// Resolve the output directory for a project per config: a per-project
/// subdirectory of the central location when one is set, else the
/// project-relative output directory.
pub fn output_directory(project_dir: &Path, config: &ExportConfig) -> PathBuf {
    match &config.central_export_location {
        Some(central) if !central.is_empty() => {
            expand_tilde(central).join(dir_name(project_dir))
        }
        _ => project_dir.join(&config.output_dir),
    }
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/")
        && let Ok(home) = crate::utils::get_home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(path)
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "session".to_string())
}

/// First eight characters of a session id.
pub fn short_id(session_id: &str) -> &str {
    if session_id.len() > 8 { &session_id[..8] } else { session_id }
}

/// Convert text to a URL-friendly slug.
pub fn slugify(text: &str, max_length: usize) -> String {
    let mut slug = String::new();
    for c in text.to_lowercase().chars() {
        if c.is_alphanumeric() {
            slug.push(c);
        } else if c.is_whitespace() || c == '_' || c == '-' {
            // Runs of separators collapse to a single hyphen.
            if !slug.ends_with('-') {
                slug.push('-');
            }
        }
    }
    let slug = slug.trim_matches('-');
    slug.chars().take(max_length).collect::<String>().trim_end_matches('-').to_string()
}

/// Find previous exports of a session in `output_dir`.
///
/// Matches both the current naming (`<short>_<slug>.html`) and the legacy
/// `<timestamp>_<short>.html` layout. Returns (html files, jsonl files),
/// each sorted by name.
pub fn find_existing_exports(
    output_dir: &Path,
    short: &str,
) -> Result<(Vec<PathBuf>, Vec<PathBuf>)> {
    let mut html = Vec::new();
    let mut jsonl = Vec::new();

    if !output_dir.exists() {
        return Ok((html, jsonl));
    }

    let entries = fs::read_dir(output_dir)
        .with_context(|| format!("Failed to read output directory: {}", output_dir.display()))?;
    for entry in entries {
        let entry = entry.context("Failed to read directory entry")?;
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if session_file_matches(name, short, ".html") {
            html.push(path);
        } else if session_file_matches(name, short, ".jsonl") {
            jsonl.push(path);
        }
    }

    html.sort();
    jsonl.sort();
    Ok((html, jsonl))
}

fn session_file_matches(name: &str, short: &str, ext: &str) -> bool {
    let Some(stem) = name.strip_suffix(ext) else {
        return false;
    };
    stem.starts_with(&format!("{short}_")) || stem.ends_with(&format!("_{short}"))
}

/// Scrape the original "Created" date out of a previously exported report.
fn extract_created_date(html_path: &Path) -> Option<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"<strong>Created(?: \(UTC\))?:</strong>\s*([^<]+)")
            .expect("valid created-date regex")
    });

    let content = fs::read_to_string(html_path).ok()?;
    re.captures(&content).map(|caps| caps[1].trim().to_string())
}

/// Pick a fresh `<short>_<slug>.html` name, suffixing `-N` on collisions
/// with exports of other sessions that share the slug.
fn unique_filename(output_dir: &Path, short: &str, slug: &str) -> String {
    let base = format!("{short}_{slug}");
    let mut filename = format!("{base}.html");
    let mut counter = 1;
    while output_dir.join(&filename).exists() {
        filename = format!("{base}-{counter}.html");
        counter += 1;
    }
    filename
}
