use std::collections::HashMap;

/// One theme's CSS custom-property values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemeColors {
    pub bg_color: &'static str,
    pub card_bg: &'static str,
    pub user_bg: &'static str,
    pub assistant_bg: &'static str,
    pub text_color: &'static str,
    pub text_muted: &'static str,
    pub accent: &'static str,
    pub accent_soft: &'static str,
    pub border_color: &'static str,
    pub code_bg: &'static str,
    pub tool_bg: &'static str,
}

/// Named themes selectable via config or `--theme`.
pub const THEMES: &[(&str, ThemeColors)] = &[
    (
        "dark",
        ThemeColors {
            bg_color: "#1e1e2e",
            card_bg: "#1a1a2e",
            user_bg: "#1a365d",
            assistant_bg: "#1e1e2e",
            text_color: "#f0f0f0",
            text_muted: "#b8b8c8",
            accent: "#f06292",
            accent_soft: "#7c6bba",
            border_color: "#3a3a5a",
            code_bg: "#141422",
            tool_bg: "#1a2535",
        },
    ),
    (
        "light",
        ThemeColors {
            bg_color: "#fafafa",
            card_bg: "#ffffff",
            user_bg: "#e8f4fc",
            assistant_bg: "#ffffff",
            text_color: "#2d2d2d",
            text_muted: "#5a5a6a",
            accent: "#2563eb",
            accent_soft: "#7c3aed",
            border_color: "#e2e2e8",
            code_bg: "#f4f4f8",
            tool_bg: "#f8f8fc",
        },
    ),
    (
        "solarized-dark",
        ThemeColors {
            bg_color: "#002b36",
            card_bg: "#073642",
            user_bg: "#094552",
            assistant_bg: "#073642",
            text_color: "#839496",
            text_muted: "#657b83",
            accent: "#cb4b16",
            accent_soft: "#6c71c4",
            border_color: "#586e75",
            code_bg: "#002b36",
            tool_bg: "#073642",
        },
    ),
    (
        "solarized-light",
        ThemeColors {
            bg_color: "#fdf6e3",
            card_bg: "#eee8d5",
            user_bg: "#e4ddc8",
            assistant_bg: "#eee8d5",
            text_color: "#657b83",
            text_muted: "#93a1a1",
            accent: "#cb4b16",
            accent_soft: "#6c71c4",
            border_color: "#93a1a1",
            code_bg: "#fdf6e3",
            tool_bg: "#eee8d5",
        },
    ),
    (
        "monokai",
        ThemeColors {
            bg_color: "#272822",
            card_bg: "#2d2e27",
            user_bg: "#3e3d32",
            assistant_bg: "#2d2e27",
            text_color: "#f8f8f2",
            text_muted: "#b9b9b0",
            accent: "#a6e22e",
            accent_soft: "#66d9ef",
            border_color: "#49483e",
            code_bg: "#1e1f1c",
            tool_bg: "#2a2b24",
        },
    ),
    (
        "github-dark",
        ThemeColors {
            bg_color: "#0d1117",
            card_bg: "#161b22",
            user_bg: "#1f2937",
            assistant_bg: "#161b22",
            text_color: "#c9d1d9",
            text_muted: "#8b949e",
            accent: "#58a6ff",
            accent_soft: "#79c0ff",
            border_color: "#30363d",
            code_bg: "#0d1117",
            tool_bg: "#0f1520",
        },
    ),
    (
        "github-light",
        ThemeColors {
            bg_color: "#ffffff",
            card_bg: "#f6f8fa",
            user_bg: "#e7f3ff",
            assistant_bg: "#f6f8fa",
            text_color: "#24292f",
            text_muted: "#57606a",
            accent: "#0969da",
            accent_soft: "#218bff",
            border_color: "#d0d7de",
            code_bg: "#f6f8fa",
            tool_bg: "#f0f3f6",
        },
    ),
    (
        "dracula",
        ThemeColors {
            bg_color: "#282a36",
            card_bg: "#2f313d",
            user_bg: "#3b3d49",
            assistant_bg: "#2f313d",
            text_color: "#f8f8f2",
            text_muted: "#bd93f9",
            accent: "#ff79c6",
            accent_soft: "#8be9fd",
            border_color: "#44475a",
            code_bg: "#21222c",
            tool_bg: "#2b2d38",
        },
    ),
    (
        "nord",
        ThemeColors {
            bg_color: "#2e3440",
            card_bg: "#3b4252",
            user_bg: "#434c5e",
            assistant_bg: "#3b4252",
            text_color: "#eceff4",
            text_muted: "#d8dee9",
            accent: "#88c0d0",
            accent_soft: "#81a1c1",
            border_color: "#4c566a",
            code_bg: "#2e3440",
            tool_bg: "#3b4252",
        },
    ),
];

/// Look up a theme by name, falling back to `dark` for unknown names.
pub fn theme(name: &str) -> &'static ThemeColors {
    THEMES
        .iter()
        .find(|(theme_name, _)| *theme_name == name)
        .map(|(_, colors)| colors)
        .unwrap_or(&THEMES[0].1)
}

/// Render a theme as CSS custom-property declarations, applying per-key
/// overrides from `custom_colors` config.
pub fn css_variables(colors: &ThemeColors, overrides: &HashMap<String, String>) -> String {
    let pairs: [(&str, &str, &str); 11] = [
        ("--bg-color", "bg_color", colors.bg_color),
        ("--card-bg", "card_bg", colors.card_bg),
        ("--user-bg", "user_bg", colors.user_bg),
        ("--assistant-bg", "assistant_bg", colors.assistant_bg),
        ("--text-color", "text_color", colors.text_color),
        ("--text-muted", "text_muted", colors.text_muted),
        ("--accent", "accent", colors.accent),
        ("--accent-soft", "accent_soft", colors.accent_soft),
        ("--border-color", "border_color", colors.border_color),
        ("--code-bg", "code_bg", colors.code_bg),
        ("--tool-bg", "tool_bg", colors.tool_bg),
    ];

    let mut out = String::new();
    for (css_var, config_key, default_value) in pairs {
        let value = overrides.get(config_key).map(String::as_str).unwrap_or(default_value);
        out.push_str(&format!("            {css_var}: {value};\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_lookup() {
        assert_eq!(theme("nord").bg_color, "#2e3440");
        assert_eq!(theme("github-light").accent, "#0969da");
    }

    #[test]
    fn test_unknown_theme_falls_back_to_dark() {
        assert_eq!(theme("no-such-theme"), theme("dark"));
    }

    #[test]
    fn test_css_variables_applies_overrides() {
        let mut overrides = HashMap::new();
        overrides.insert("accent".to_string(), "#ff0000".to_string());

        let css = css_variables(theme("dark"), &overrides);
        assert!(css.contains("--accent: #ff0000;"));
        assert!(css.contains("--bg-color: #1e1e2e;"));
    }
}
