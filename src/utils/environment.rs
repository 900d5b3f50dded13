use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// Environment variable overriding the config file location.
pub const CONFIG_PATH_ENV: &str = "AI_SESSION_EXPORTER_CONFIG";

/// Get the user's home directory.
///
/// `HOME` wins when set (tests rely on overriding it); otherwise the
/// platform lookup is used.
pub fn get_home_dir() -> Result<PathBuf> {
    env::var("HOME")
        .map(PathBuf::from)
        .ok()
        .or_else(dirs::home_dir)
        .context("Could not determine home directory")
}

/// Get the Claude Code data directory (~/.claude)
pub fn get_claude_dir() -> Result<PathBuf> {
    Ok(get_home_dir()?.join(".claude"))
}

/// Get the Codex CLI data directory (~/.codex)
pub fn get_codex_dir() -> Result<PathBuf> {
    Ok(get_home_dir()?.join(".codex"))
}

/// Get the OpenClaw data directory (~/.openclaw)
pub fn get_openclaw_dir() -> Result<PathBuf> {
    Ok(get_home_dir()?.join(".openclaw"))
}

/// Get the exporter config file path.
///
/// `AI_SESSION_EXPORTER_CONFIG` overrides the default
/// `~/.config/ai-session-exporter/config.json`.
pub fn get_config_path() -> Result<PathBuf> {
    if let Ok(path) = env::var(CONFIG_PATH_ENV)
        && !path.is_empty()
    {
        return Ok(PathBuf::from(path));
    }
    Ok(get_home_dir()?.join(".config").join("ai-session-exporter").join("config.json"))
}
