//! Export layer integration tests: output naming, re-export
//! deduplication, the sessions index, and the raw-transcript copy.

mod common;

use ai_session_exporter::config::ExportConfig;
use ai_session_exporter::export::discovery::SessionSource;
use ai_session_exporter::export::{ExportOptions, OutputFormat, export_session};
use ai_session_exporter::parsers::ClaudeCode;
use common::HistoryTreeBuilder;

fn export_opts(output: &std::path::Path) -> ExportOptions {
    ExportOptions { format: OutputFormat::Both, output_override: Some(output.to_path_buf()) }
}

#[test]
fn test_export_writes_html_markdown_jsonl_and_index() {
    let tree = HistoryTreeBuilder::new();
    let transcript = tree.with_file("abc12345-def.jsonl", &common::sample_claude_transcript());
    let output_dir = tree.home().join("out");

    let source = SessionSource::from_path(&transcript, &ClaudeCode);
    let outcome =
        export_session(&source, &ExportConfig::default(), &export_opts(&output_dir)).unwrap();

    assert_eq!(outcome.summary, "Fixing Bug Login");
    assert_eq!(outcome.written.len(), 3);

    let html = output_dir.join("abc12345_fixing-bug-login.html");
    assert!(html.is_file(), "missing {}", html.display());
    assert!(output_dir.join("abc12345_fixing-bug-login.jsonl").is_file());
    assert!(output_dir.join("abc12345_fixing-bug-login.md").is_file());

    let index = std::fs::read_to_string(output_dir.join("sessions_index.md")).unwrap();
    assert!(index.contains("`abc12345`"));
    assert!(index.contains("Fixing Bug Login"));
    assert!(index.contains("[abc12345_fixing-bug-login.html](./abc12345_fixing-bug-login.html)"));

    // The copied transcript is byte-identical to the source.
    let copied = std::fs::read_to_string(output_dir.join("abc12345_fixing-bug-login.jsonl")).unwrap();
    assert_eq!(copied, common::sample_claude_transcript());
}

#[test]
fn test_reexport_reuses_filename_and_created_date() {
    let tree = HistoryTreeBuilder::new();
    let transcript = tree.with_file("abc12345-def.jsonl", &common::sample_claude_transcript());
    let output_dir = tree.home().join("out");
    let source = SessionSource::from_path(&transcript, &ClaudeCode);
    let config = ExportConfig::default();

    export_session(&source, &config, &export_opts(&output_dir)).unwrap();
    let html = output_dir.join("abc12345_fixing-bug-login.html");
    let first = std::fs::read_to_string(&html).unwrap();

    // Simulate a user rename that keeps the short-id prefix.
    let renamed = output_dir.join("abc12345_my-own-name.html");
    std::fs::rename(&html, &renamed).unwrap();

    export_session(&source, &config, &export_opts(&output_dir)).unwrap();

    // The renamed file is updated in place; no second export appears.
    assert!(renamed.is_file());
    assert!(!html.exists());
    let html_count = std::fs::read_dir(&output_dir)
        .unwrap()
        .filter(|e| {
            e.as_ref().unwrap().path().extension().is_some_and(|ext| ext == "html")
        })
        .count();
    assert_eq!(html_count, 1);

    // The original created date is carried forward.
    let created_marker = first
        .lines()
        .find(|l| l.contains("Created (UTC)"))
        .expect("created line in first export")
        .trim()
        .to_string();
    let second = std::fs::read_to_string(&renamed).unwrap();
    assert!(second.contains(&created_marker), "created date changed across re-export");
}

#[test]
fn test_same_summary_different_sessions_get_suffixed_names() {
    let tree = HistoryTreeBuilder::new();
    let output_dir = tree.home().join("out");
    let config = ExportConfig::default();

    let first = tree.with_file("aaaa1111-x.jsonl", &common::sample_claude_transcript());
    let second = tree.with_file("aaaa1111-y.jsonl", &common::sample_claude_transcript());

    let source_a = SessionSource::from_path(&first, &ClaudeCode);
    export_session(&source_a, &config, &export_opts(&output_dir)).unwrap();

    let mut source_b = SessionSource::from_path(&second, &ClaudeCode);
    source_b.session_id = "bbbb2222-y".to_string();
    export_session(&source_b, &config, &export_opts(&output_dir)).unwrap();

    assert!(output_dir.join("aaaa1111_fixing-bug-login.html").is_file());
    assert!(output_dir.join("bbbb2222_fixing-bug-login.html").is_file());
}

#[test]
fn test_index_accumulates_across_sessions() {
    let tree = HistoryTreeBuilder::new();
    let output_dir = tree.home().join("out");
    let config = ExportConfig::default();

    let first = tree.with_file("aaaa1111-x.jsonl", &common::sample_claude_transcript());
    let second = tree.with_file("bbbb2222-y.jsonl", &common::sample_openclaw_transcript());

    export_session(&SessionSource::from_path(&first, &ClaudeCode), &config, &export_opts(&output_dir))
        .unwrap();
    export_session(
        &SessionSource::from_path(&second, &ai_session_exporter::parsers::OpenClaw),
        &config,
        &export_opts(&output_dir),
    )
    .unwrap();

    let index = std::fs::read_to_string(output_dir.join("sessions_index.md")).unwrap();
    assert!(index.contains("`aaaa1111`"));
    assert!(index.contains("`bbbb2222`"));
    assert_eq!(index.lines().filter(|l| l.starts_with("| 2")).count(), 2);
}

#[test]
fn test_export_missing_transcript_fails_with_context() {
    let source = SessionSource::from_path(
        std::path::Path::new("/nonexistent/transcript.jsonl"),
        &ClaudeCode,
    );
    let result = export_session(
        &source,
        &ExportConfig::default(),
        &export_opts(std::path::Path::new("/tmp/never-used")),
    );

    let err = result.unwrap_err().to_string();
    assert!(err.contains("Failed to open transcript"), "got: {err}");
}

#[test]
fn test_generate_summary_disabled_uses_session_slug() {
    let tree = HistoryTreeBuilder::new();
    let transcript = tree.with_file("abc12345-def.jsonl", &common::sample_claude_transcript());
    let output_dir = tree.home().join("out");

    let config = ExportConfig { generate_summary: false, ..Default::default() };
    let source = SessionSource::from_path(&transcript, &ClaudeCode);
    let outcome = export_session(&source, &config, &export_opts(&output_dir)).unwrap();

    assert!(outcome.summary.is_empty());
    assert!(output_dir.join("abc12345_session.html").is_file());
}
