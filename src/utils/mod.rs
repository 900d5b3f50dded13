pub mod environment;
pub mod paths;

pub use environment::{
    get_claude_dir, get_codex_dir, get_config_path, get_home_dir, get_openclaw_dir,
};
pub use paths::{
    decode_project_dir, format_path_with_tilde, open_transcript, validate_decoded_path,
    validate_path_not_symlink,
};
