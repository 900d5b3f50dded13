use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::config::ExportConfig;
use crate::export::batch::{BatchFilter, BatchOptions, run_batch};
use crate::export::discovery::{SessionSource, find_latest_session, find_session_by_id};
use crate::export::{ExportOptions, OutputFormat, export_session, parse_transcript};
use crate::parsers::{detect_format, format_by_name};
use crate::render::{format_duration, format_token_count};
use crate::summary::generate_summary;
use crate::utils::format_path_with_tilde;

const SOURCE_NAMES: [&str; 3] = ["claude-code", "codex", "openclaw"];

#[derive(Parser)]
#[command(name = "ai-session-exporter")]
#[command(version = "0.1.0")]
#[command(about = "Export AI coding assistant sessions to themeable HTML reports", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Export one session to HTML and/or Markdown
    Export {
        /// Export the most recently modified session
        #[arg(long)]
        latest: bool,
        /// Session id (or prefix), or a path to a transcript file
        #[arg(long)]
        session: Option<String>,
        /// Restrict to one producer format
        #[arg(long, value_parser = SOURCE_NAMES)]
        source: Option<String>,
        /// Which renderers to run
        #[arg(long, value_enum, default_value_t = OutputFormat::Both)]
        format: OutputFormat,
        /// Output directory (overrides config)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Theme name (overrides config)
        #[arg(long)]
        theme: Option<String>,
    },
    /// Export every discovered session
    ExportAll {
        /// Preview without writing anything
        #[arg(long, short = 'n')]
        dry_run: bool,
        /// Skip sessions that already have an export
        #[arg(long, short = 's')]
        skip_existing: bool,
        /// Filter by project name (partial match)
        #[arg(long, short = 'p')]
        project: Option<String>,
        /// Only sessions modified on or after this date (YYYY-MM-DD)
        #[arg(long)]
        since: Option<NaiveDate>,
        /// Only sessions modified before this date (YYYY-MM-DD)
        #[arg(long)]
        before: Option<NaiveDate>,
        /// List sessions without exporting
        #[arg(long, short = 'l')]
        list: bool,
        /// Override the central export location
        #[arg(long)]
        central: Option<PathBuf>,
        /// Restrict to one producer format
        #[arg(long, value_parser = SOURCE_NAMES)]
        source: Option<String>,
        /// Which renderers to run
        #[arg(long, value_enum, default_value_t = OutputFormat::Both)]
        format: OutputFormat,
        /// Show written file paths per session
        #[arg(long, short = 'v')]
        verbose: bool,
    },
    /// Print a session's reconstructed statistics
    Stats {
        /// Session id (or prefix), or a path to a transcript file
        #[arg(long)]
        session: Option<String>,
        /// Use the most recently modified session
        #[arg(long)]
        latest: bool,
        /// Restrict to one producer format
        #[arg(long, value_parser = SOURCE_NAMES)]
        source: Option<String>,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = ExportConfig::load();

    match cli.command {
        Some(Commands::Export { latest, session, source, format, output, theme }) => {
            let config = apply_theme(config, theme);
            let resolved = resolve_session(session.as_deref(), latest, source.as_deref())?;
            let opts = ExportOptions { format, output_override: output };
            let outcome = export_session(&resolved, &config, &opts)?;
            for path in &outcome.written {
                println!("{}", path.display());
            }
            if !outcome.summary.is_empty() {
                println!("Summary: {}", outcome.summary);
            }
        }
        Some(Commands::ExportAll {
            dry_run,
            skip_existing,
            project,
            since,
            before,
            list,
            central,
            source,
            format,
            verbose,
        }) => {
            let filter = BatchFilter { source, project, since, before };
            let options = BatchOptions {
                dry_run,
                skip_existing,
                list_only: list,
                central,
                verbose,
                format,
            };
            run_batch(&filter, &options, &config)?;
        }
        Some(Commands::Stats { session, latest, source }) => {
            let resolved = resolve_session(session.as_deref(), latest, source.as_deref())?;
            show_stats(&resolved, &config)?;
        }
        None => {
            println!("Use --help for usage information");
        }
    }

    Ok(())
}

fn apply_theme(config: ExportConfig, theme: Option<String>) -> ExportConfig {
    match theme {
        Some(theme) => ExportConfig { theme, ..config },
        None => config,
    }
}

/// Turn `--session`/`--latest`/`--source` into a concrete session source.
fn resolve_session(
    session: Option<&str>,
    latest: bool,
    source: Option<&str>,
) -> Result<SessionSource> {
    if let Some(query) = session {
        let as_path = Path::new(query);
        if as_path.is_file() {
            let format = match source {
                Some(name) => {
                    format_by_name(name).with_context(|| format!("Unknown source: {name}"))?
                }
                None => detect_format(as_path)?,
            };
            return Ok(SessionSource::from_path(as_path, format));
        }
        return find_session_by_id(query, source)
            .with_context(|| format!("No session found matching '{query}'"));
    }

    if latest {
        return find_latest_session(source).context("No sessions found");
    }

    bail!("Specify a session with --session <id-or-path> or --latest")
}

fn show_stats(source: &SessionSource, config: &ExportConfig) -> Result<()> {
    let session = parse_transcript(&source.transcript_path, source.format, config)?;
    let stats = &session.stats;
    let summary = generate_summary(&session.turns, &source.project_name());

    println!("Session Statistics");
    println!("==================");
    println!("Source:     {} ({})", source.transcript_path.display(), source.format.name());
    if let Some(session_id) = &session.meta.session_id {
        println!("Session ID: {session_id}");
    } else if !source.session_id.is_empty() {
        println!("Session ID: {}", source.session_id);
    }
    if let Some(cwd) = &session.meta.cwd {
        println!("Project:    {}", format_path_with_tilde(cwd));
    }
    println!("Summary:    {summary}");
    println!();
    println!("Turns:      {} user / {} assistant", stats.user_turns, stats.assistant_turns);
    println!("Duration:   {}", format_duration(stats.duration_seconds()));
    println!("Tool calls: {}", stats.total_tool_calls());
    for (name, count) in stats.top_tools(5) {
        println!("  {name}: {count}");
    }
    println!(
        "Tokens:     {} in / {} out / {} cache-read / {} cache-create",
        format_token_count(stats.tokens.input_tokens),
        format_token_count(stats.tokens.output_tokens),
        format_token_count(stats.tokens.cache_read_tokens),
        format_token_count(stats.tokens.cache_creation_tokens),
    );

    Ok(())
}
