//! Export configuration.
//!
//! Defaults merge with an optional JSON config file into one
//! [`ExportConfig`] value built once per run and passed by reference into
//! every component that needs it; there is no process-wide mutable state.
//! A missing config file means defaults; a broken one warns on stderr and
//! falls back to defaults. Unknown keys (including `_comment`-style keys)
//! are ignored.

use std::collections::HashMap;
use std::fs;

use serde::Deserialize;

use crate::parsers::TranscriptFormat;
use crate::reconstruct::{OrphanPolicy, ReconstructOptions};
use crate::utils::get_config_path;

/// How to treat tool results whose call id matches no known invocation.
///
/// `default` keeps each producer's historical behavior; the other values
/// force one policy for every format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrphanResults {
    #[default]
    Default,
    Discard,
    Attach,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    // Display names
    pub user_name: String,
    pub assistant_name: String,

    // Emojis
    pub user_emoji: String,
    pub assistant_emoji: String,

    /// Theme name, or "auto" to adapt to the system preference.
    pub theme: String,
    /// Per-variable color overrides applied on top of any theme.
    pub custom_colors: HashMap<String, String>,

    // Typography
    pub font_size: String,
    pub line_height: String,
    pub letter_spacing: String,
    pub max_width: String,
    pub padding: String,

    /// When set, all exports go under this directory, one subdirectory per
    /// project; otherwise each project gets `output_dir` relative to it.
    pub central_export_location: Option<String>,
    pub output_dir: String,

    /// Title format; `{project_name}` and `{summary}` are replaced.
    pub title_format: String,

    pub include_thinking: bool,
    pub generate_summary: bool,

    // Header visibility
    pub show_session_id: bool,
    pub show_project_path: bool,
    pub show_timestamp: bool,
    pub show_summary: bool,
    pub show_statistics: bool,

    // Truncation limits (characters)
    pub max_tool_result_length: usize,
    pub max_tool_input_length: usize,

    // chrono strftime formats
    pub date_format: String,
    pub time_format: String,

    pub orphan_results: OrphanResults,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            user_name: "You".to_string(),
            assistant_name: "Assistant".to_string(),
            user_emoji: "\u{1F464}".to_string(),
            assistant_emoji: "\u{1F916}".to_string(),
            theme: "auto".to_string(),
            custom_colors: HashMap::new(),
            font_size: "16px".to_string(),
            line_height: "1.75".to_string(),
            letter_spacing: "0.01em".to_string(),
            max_width: "920px".to_string(),
            padding: "24px".to_string(),
            central_export_location: None,
            output_dir: "artifacts/conversations".to_string(),
            title_format: "{project_name} Conversations".to_string(),
            include_thinking: false,
            generate_summary: true,
            show_session_id: true,
            show_project_path: true,
            show_timestamp: true,
            show_summary: true,
            show_statistics: true,
            max_tool_result_length: 1000,
            max_tool_input_length: 500,
            date_format: "%Y-%m-%d %H:%M:%S".to_string(),
            time_format: "%H:%M:%S".to_string(),
            orphan_results: OrphanResults::Default,
        }
    }
}

impl ExportConfig {
    /// Load the config file merged over defaults.
    ///
    /// Any failure (missing file, unreadable, malformed JSON) degrades to
    /// defaults; malformed content additionally warns on stderr.
    pub fn load() -> Self {
        let Ok(path) = get_config_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Warning: could not parse config {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("Warning: could not read config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Reconstruction options for one producer format, applying the
    /// configured orphan-result policy over the format's default.
    pub fn reconstruct_options(&self, format: &dyn TranscriptFormat) -> ReconstructOptions {
        let orphan_policy = match self.orphan_results {
            OrphanResults::Default => format.default_orphan_policy(),
            OrphanResults::Discard => OrphanPolicy::Discard,
            OrphanResults::Attach => OrphanPolicy::AttachToNearest,
        };
        ReconstructOptions {
            tool_attachment: format.tool_attachment(),
            orphan_policy,
            include_thinking: self.include_thinking,
        }
    }
}
