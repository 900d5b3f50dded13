//! Self-contained HTML reports: one file carrying its own CSS (theme
//! variables), a dark/light toggle script and the full conversation with
//! collapsible tool sections and statistics.

use std::sync::OnceLock;

use regex::Regex;

use crate::config::ExportConfig;
use crate::models::{Role, Session, SessionStats, ToolCall, ToolInput, Turn};
use crate::render::theme::{ThemeColors, css_variables, theme};
use crate::render::{escape_html, format_datetime, format_duration, format_token_count};

/// Page-level strings the renderer cannot derive from the session alone.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub project_name: String,
    pub project_dir: String,
    pub session_id: String,
    /// Formatted creation timestamp (carried over on re-export).
    pub created: String,
    /// Formatted "last updated" timestamp (now, at export time).
    pub updated: String,
}

/// Render a session to a complete HTML document.
pub fn render_html(
    session: &Session,
    summary: &str,
    page: &PageContext,
    config: &ExportConfig,
) -> String {
    let title = config
        .title_format
        .replace("{project_name}", &page.project_name)
        .replace("{summary}", summary);
    let short_id = short_id(&page.session_id);

    let mut content = String::new();
    for turn in &session.turns {
        // Defensive rendering guard; reconstruction already drops these.
        if turn.is_empty() {
            continue;
        }
        content.push_str(&render_turn(turn, session, config));
    }

    let mut meta_items: Vec<String> = Vec::new();
    if config.show_summary {
        meta_items
            .push(format!("<p><strong>Summary:</strong> {}</p>", escape_html(summary)));
    }
    if config.show_session_id {
        meta_items.push(format!(
            "<p><strong>Session ID:</strong> <code>{}</code></p>",
            escape_html(&page.session_id)
        ));
    }
    if config.show_project_path {
        meta_items.push(format!(
            "<p><strong>Project:</strong> <code>{}</code></p>",
            escape_html(&page.project_dir)
        ));
    }
    if config.show_timestamp {
        meta_items.push(format!("<p><strong>Created (UTC):</strong> {}</p>", page.created));
        meta_items.push(format!("<p><strong>Last Updated (UTC):</strong> {}</p>", page.updated));
    }
    meta_items.push(format!(
        "<p class=\"tip\"><em>Tip: You can rename this file (keep the <code>{}_</code> \
         prefix) and it will be preserved on re-export.</em></p>",
        escape_html(short_id)
    ));
    meta_items.push(render_stats_section(&session.stats, config));

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>
{css}
    </style>
</head>
<body>
    <button id="theme-toggle" class="theme-toggle">&#127769; Dark</button>

    <header>
        <h1>&#128172; {title}</h1>
        <div class="meta">
            {meta}
        </div>
    </header>

    <main>
{content}
    </main>
{js}
</body>
</html>
"#,
        title = escape_html(&title),
        css = build_css(config),
        meta = meta_items.join("\n            "),
        content = content,
        js = theme_toggle_js(),
    )
}

fn short_id(session_id: &str) -> &str {
    if session_id.len() > 8 { &session_id[..8] } else { session_id }
}

fn render_turn(turn: &Turn, session: &Session, config: &ExportConfig) -> String {
    let (role_class, header_class, role_label) = match turn.role {
        Role::User => (
            "user",
            "user-role",
            format!("{} {}", config.user_emoji, escape_html(&config.user_name)),
        ),
        Role::Assistant => (
            "assistant",
            "assistant-role",
            format!("{} {}", config.assistant_emoji, escape_html(&config.assistant_name)),
        ),
    };

    let timestamp = turn
        .timestamp
        .map(|ts| format_datetime(&ts, &config.time_format))
        .unwrap_or_default();

    // Per-turn token badge, assistant turns only.
    let mut turn_stats = String::new();
    if turn.role == Role::Assistant
        && config.show_statistics
        && let Some(usage) = &turn.usage
        && usage.total() > 0
    {
        turn_stats = format!(
            "<span class=\"msg-stats\">&#8595;{} &#8593;{}</span>",
            format_token_count(usage.input_tokens),
            format_token_count(usage.output_tokens)
        );
    }

    format!(
        r#"        <div class="message {role_class}">
            <div class="message-header">
                <span class="role {header_class}">{role_label}</span>
                <span class="header-right">
                    {turn_stats}
                    <span class="timestamp">{timestamp}</span>
                </span>
            </div>
{tools}
            <div class="message-content content">
                {content}
            </div>
        </div>
"#,
        tools = render_tools_section(turn, session, config),
        content = render_markdownish(&turn.text),
    )
}

fn render_tools_section(turn: &Turn, session: &Session, config: &ExportConfig) -> String {
    if turn.tool_ids.is_empty() {
        return String::new();
    }

    let mut items = String::new();
    let mut count = 0usize;
    for id in &turn.tool_ids {
        let Some(call) = session.tool_call(id) else {
            continue;
        };
        count += 1;
        items.push_str(&render_tool_item(call, config));
    }
    if count == 0 {
        return String::new();
    }

    format!(
        r#"            <details class="tools-container">
                <summary>&#128736;&#65039; Tools used ({count})</summary>
                <div class="tools-list">
{items}
                </div>
            </details>
"#
    )
}

fn render_tool_item(call: &ToolCall, config: &ExportConfig) -> String {
    let desc = tool_description(&call.name, &call.input);
    let result_html = match &call.result {
        Some(result) => format_tool_result(result, config),
        None => "<p><em>No result captured</em></p>".to_string(),
    };

    format!(
        r#"                <details class="tool-item">
                    <summary>
                        <span class="tool-icon">&#128295;</span>
                        <span class="tool-name">{name}</span>
                        <span class="tool-desc">&mdash; {desc}</span>
                    </summary>
                    <div class="tool-content">
                        <h4>Input</h4>
                        {input}
                        <h4>Result</h4>
                        {result}
                    </div>
                </details>
"#,
        name = escape_html(&call.name),
        desc = escape_html(&desc),
        input = format_tool_input(&call.name, &call.input, config),
        result = result_html,
    )
}

/// One-line description of a tool call for the collapsed summary row.
fn tool_description(name: &str, input: &ToolInput) -> String {
    let json = match input {
        ToolInput::Json(value) => value,
        ToolInput::Command(cmd) => return truncate_chars(cmd, 50),
    };
    let field = |key: &str| json.get(key).and_then(|v| v.as_str()).unwrap_or("");

    match name {
        "Bash" => {
            let desc = field("description");
            if !desc.is_empty() { desc.to_string() } else { truncate_chars(field("command"), 50) }
        }
        "Read" | "Write" | "Edit" => {
            let file = std::path::Path::new(field("file_path"))
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "file".to_string());
            format!("{name} {file}")
        }
        "Glob" => format!("Find: {}", field("pattern")),
        "Grep" => format!("Search: {}", field("pattern")),
        "Task" => {
            let desc = field("description");
            if desc.is_empty() { "Run subagent".to_string() } else { desc.to_string() }
        }
        "WebSearch" => format!("Search: {}", truncate_chars(field("query"), 30)),
        "WebFetch" => format!("Fetch: {}", truncate_chars(field("url"), 35)),
        _ => name.to_string(),
    }
}

fn format_tool_input(name: &str, input: &ToolInput, config: &ExportConfig) -> String {
    match input {
        ToolInput::Json(json) => {
            let field = |key: &str| json.get(key).and_then(|v| v.as_str()).unwrap_or("");
            match name {
                "Bash" => {
                    format!("<pre><code>{}</code></pre>", escape_html(field("command")))
                }
                "Read" | "Write" | "Edit" => format!(
                    "<p><strong>File:</strong> <code>{}</code></p>",
                    escape_html(field("file_path"))
                ),
                _ => {
                    let mut formatted = serde_json::to_string_pretty(json)
                        .unwrap_or_else(|_| json.to_string());
                    if formatted.chars().count() > config.max_tool_input_length {
                        formatted = truncate_chars(&formatted, config.max_tool_input_length);
                        formatted.push_str("\n...");
                    }
                    format!("<pre><code>{}</code></pre>", escape_html(&formatted))
                }
            }
        }
        ToolInput::Command(cmd) => {
            let mut content = cmd.clone();
            if content.chars().count() > config.max_tool_input_length {
                content = truncate_chars(&content, config.max_tool_input_length);
                content.push_str("...");
            }
            format!("<pre><code>{}</code></pre>", escape_html(&content))
        }
    }
}

fn format_tool_result(result: &str, config: &ExportConfig) -> String {
    let mut content = result.to_string();
    if content.chars().count() > config.max_tool_result_length {
        content = truncate_chars(&content, config.max_tool_result_length);
        content.push_str("\n... (truncated)");
    }
    format!("<pre><code>{}</code></pre>", escape_html(&content))
}

/// Character-safe prefix truncation (transcripts are arbitrary UTF-8).
fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        text.chars().take(max).collect()
    }
}

fn markdownish_res() -> &'static [(Regex, &'static str); 5] {
    static RES: OnceLock<[(Regex, &'static str); 5]> = OnceLock::new();
    RES.get_or_init(|| {
        [
            (
                Regex::new(r"(?s)```(\w*)\n(.*?)```").expect("valid fence regex"),
                "<pre><code>$2</code></pre>",
            ),
            (Regex::new(r"`([^`]+)`").expect("valid inline-code regex"), "<code>$1</code>"),
            (Regex::new(r"(?m)^### (.+)$").expect("valid h3 regex"), "<h3>$1</h3>"),
            (Regex::new(r"(?m)^## (.+)$").expect("valid h2 regex"), "<h2>$1</h2>"),
            (Regex::new(r"\*\*(.+?)\*\*").expect("valid bold regex"), "<strong>$1</strong>"),
        ]
    })
}

/// Light Markdown-ish formatting over escaped text: fenced code, inline
/// code, `##`/`###` headings, bold, and paragraph breaks on blank lines.
fn render_markdownish(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }
    let mut html = escape_html(text);
    for (re, replacement) in markdownish_res() {
        html = re.replace_all(&html, *replacement).into_owned();
    }
    let html = html.replace("\n\n", "</p><p>");
    format!("<p>{html}</p>")
}

fn render_stats_section(stats: &SessionStats, config: &ExportConfig) -> String {
    if !config.show_statistics {
        return String::new();
    }

    let duration = format_duration(stats.duration_seconds());
    let total_tokens = format_token_count(stats.tokens.total());
    let total_tool_calls = stats.total_tool_calls();

    let top_tools = stats.top_tools(5);
    let tools_html = if top_tools.is_empty() {
        String::new()
    } else {
        let mut items: Vec<String> =
            top_tools.iter().map(|(name, count)| format!("{} ({})", escape_html(name), count)).collect();
        if stats.tool_counts.len() > 5 {
            items.push(format!("+{} more", stats.tool_counts.len() - 5));
        }
        format!(
            "<span class=\"stat-item\"><span class=\"stat-label\">Tools:</span> {}</span>",
            items.join(", ")
        )
    };

    format!(
        r#"<p class="stats-quick">
                <strong>&#128202; Stats:</strong>
                <span class="stat-pill">{duration}</span>
                <span class="stat-pill">{turns} msgs</span>
                <span class="stat-pill">{tool_calls} tools</span>
                <span class="stat-pill">{total_tokens} tokens</span>
            </p>
            <div class="stats-section">
                <details class="stats-container">
                    <summary>View detailed statistics</summary>
                    <div class="stats-content">
                        <div class="stats-row">
                            <span class="stat-item"><span class="stat-label">Duration:</span> {duration}</span>
                            <span class="stat-item"><span class="stat-label">Messages:</span> {user_turns} user / {assistant_turns} assistant</span>
                            <span class="stat-item"><span class="stat-label">Tool Calls:</span> {tool_calls}</span>
                        </div>
                        <div class="stats-row">
                            <span class="stat-item"><span class="stat-label">Input Tokens:</span> {input}</span>
                            <span class="stat-item"><span class="stat-label">Output Tokens:</span> {output}</span>
                            <span class="stat-item"><span class="stat-label">Cache Read:</span> {cache_read}</span>
                            <span class="stat-item"><span class="stat-label">Total:</span> {total_tokens}</span>
                        </div>
                        <div class="stats-row">
                            {tools_html}
                        </div>
                    </div>
                </details>
            </div>"#,
        turns = stats.total_turns(),
        tool_calls = total_tool_calls,
        user_turns = stats.user_turns,
        assistant_turns = stats.assistant_turns,
        input = format_token_count(stats.tokens.input_tokens),
        output = format_token_count(stats.tokens.output_tokens),
        cache_read = format_token_count(stats.tokens.cache_read_tokens),
    )
}

fn build_css(config: &ExportConfig) -> String {
    let vars = if config.theme == "auto" {
        format!(
            r#"        /* Auto theme - adapts to system preference */
        :root {{
{light}        }}

        @media (prefers-color-scheme: dark) {{
            :root {{
{dark}            }}
        }}"#,
            light = css_variables(theme("light"), &config.custom_colors),
            dark = css_variables(theme("dark"), &config.custom_colors),
        )
    } else {
        format!(
            ":root {{\n{}        }}",
            css_variables(theme(&config.theme), &config.custom_colors)
        )
    };

    format!(
        r#"{vars}

        * {{ box-sizing: border-box; }}

        body {{
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Oxygen, Ubuntu, sans-serif;
            background-color: var(--bg-color);
            color: var(--text-color);
            font-size: {font_size};
            line-height: {line_height};
            letter-spacing: {letter_spacing};
            margin: 0 auto;
            padding: {padding};
            max-width: {max_width};
        }}

        header {{
            background: var(--card-bg);
            padding: 20px;
            border-radius: 10px;
            margin-bottom: 30px;
            border: 1px solid var(--border-color);
        }}
        header h1 {{ margin: 0 0 10px 0; color: var(--accent); }}
        header .meta {{ color: var(--text-muted); font-size: 0.9em; }}
        header .meta code {{
            background: var(--code-bg);
            padding: 2px 6px;
            border-radius: 4px;
            font-size: 0.92em;
        }}
        header .meta .tip {{
            margin-top: 10px;
            padding: 8px 12px;
            background: var(--code-bg);
            border-radius: 6px;
            font-size: 0.92em;
            opacity: 0.8;
        }}

        .message {{
            margin-bottom: 20px;
            padding: 15px 20px;
            border-radius: 10px;
            border: 1px solid var(--border-color);
        }}
        .message.user {{ background: var(--user-bg); border-left: 4px solid var(--accent); }}
        .message.assistant {{ background: var(--assistant-bg); border-left: 4px solid var(--accent-soft); }}

        .message-header {{
            display: flex;
            justify-content: space-between;
            align-items: center;
            margin-bottom: 10px;
            padding-bottom: 8px;
            border-bottom: 1px solid var(--border-color);
        }}
        .message-header .role {{ font-weight: 600; font-size: 0.9em; letter-spacing: 0.5px; }}
        .message-header .role.user-role {{ color: var(--accent); }}
        .message-header .role.assistant-role {{ color: var(--accent-soft); }}
        .message-header .header-right {{ display: flex; align-items: center; gap: 12px; }}
        .message-header .timestamp {{ color: var(--text-muted); font-size: 0.88em; }}
        .message-header .msg-stats {{
            font-size: 0.8em;
            color: var(--text-muted);
            background: var(--code-bg);
            padding: 2px 8px;
            border-radius: 10px;
            font-family: 'SF Mono', 'Fira Code', monospace;
        }}

        .message-content {{ white-space: pre-wrap; word-wrap: break-word; }}
        .message-content p {{ margin: 0 0 10px 0; }}
        .message-content p:last-child {{ margin-bottom: 0; }}

        details.tools-container {{
            background: var(--tool-bg);
            border: 1px solid var(--border-color);
            border-radius: 8px;
            margin: 10px 0;
            overflow: hidden;
        }}
        details.tools-container > summary {{
            padding: 10px 15px;
            cursor: pointer;
            font-size: 0.9em;
            color: var(--text-muted);
            font-weight: 500;
        }}
        details.tools-container > summary::marker {{ color: var(--accent); }}
        .tools-list {{ padding: 10px 15px; border-top: 1px solid var(--border-color); }}

        .tool-item {{
            background: var(--code-bg);
            border: 1px solid var(--border-color);
            border-radius: 6px;
            margin-bottom: 8px;
        }}
        .tool-item:last-child {{ margin-bottom: 0; }}
        .tool-item summary {{
            padding: 8px 12px;
            cursor: pointer;
            font-size: 0.92em;
            color: var(--text-muted);
            display: flex;
            align-items: center;
            gap: 8px;
        }}
        .tool-item summary .tool-name {{ color: #4ec9b0; font-weight: 500; }}
        .tool-item summary .tool-desc {{ color: var(--text-muted); font-size: 0.9em; }}
        .tool-content {{
            padding: 12px;
            border-top: 1px solid var(--border-color);
            font-size: 0.88em;
        }}
        .tool-content h4 {{
            margin: 0 0 6px 0;
            color: var(--text-muted);
            font-size: 0.92em;
            text-transform: uppercase;
        }}
        .tool-content pre {{
            background: var(--bg-color);
            padding: 10px;
            border-radius: 4px;
            overflow-x: auto;
            margin: 6px 0;
            font-size: 0.9em;
        }}

        code {{
            background: var(--code-bg);
            padding: 2px 6px;
            border-radius: 4px;
            font-family: 'SF Mono', 'Fira Code', 'Consolas', monospace;
            font-size: 0.9em;
        }}
        pre {{
            background: var(--code-bg);
            padding: 15px;
            border-radius: 8px;
            overflow-x: auto;
        }}
        pre code {{ background: none; padding: 0; }}
        h1, h2, h3, h4 {{ color: var(--text-color); }}
        .content h2 {{ border-bottom: 1px solid var(--border-color); padding-bottom: 5px; }}
        a {{ color: var(--accent); }}
        .content blockquote {{
            border-left: 3px solid var(--accent-soft);
            margin: 10px 0;
            padding-left: 15px;
            color: var(--text-muted);
        }}

        .stats-quick {{
            margin: 12px 0 5px 0;
            display: flex;
            flex-wrap: wrap;
            align-items: center;
            gap: 8px;
        }}
        .stat-pill {{
            background: var(--code-bg);
            padding: 3px 10px;
            border-radius: 12px;
            font-size: 0.85em;
            color: var(--text-color);
            border: 1px solid var(--border-color);
        }}
        .stats-section {{ margin-top: 10px; }}
        .stats-container {{
            background: var(--tool-bg);
            border: 1px solid var(--border-color);
            border-radius: 8px;
            overflow: hidden;
        }}
        .stats-container > summary {{
            padding: 10px 15px;
            cursor: pointer;
            font-size: 0.95em;
            color: var(--text-muted);
            font-weight: 500;
        }}
        .stats-container > summary::marker {{ color: var(--accent); }}
        .stats-content {{ padding: 12px 15px; border-top: 1px solid var(--border-color); }}
        .stats-row {{ display: flex; flex-wrap: wrap; gap: 15px 25px; margin-bottom: 8px; }}
        .stats-row:last-child {{ margin-bottom: 0; }}
        .stat-item {{ font-size: 0.9em; }}
        .stat-label {{ color: var(--text-muted); font-weight: 500; }}

        .theme-toggle {{
            position: fixed;
            top: 15px;
            right: 15px;
            background: var(--card-bg);
            border: 1px solid var(--border-color);
            border-radius: 20px;
            padding: 8px 14px;
            cursor: pointer;
            font-size: 0.85em;
            color: var(--text-muted);
            z-index: 100;
        }}
        .theme-toggle:hover {{ background: var(--tool-bg); border-color: var(--accent); }}

        @media print {{
            body {{ background: white !important; color: black !important; max-width: 100%; padding: 0; }}
            .theme-toggle, .stats-section, .stats-quick, details.tools-container,
            .msg-stats, .tip {{ display: none !important; }}
            .message {{ background: white !important; border: 1px solid #ddd !important; page-break-inside: avoid; }}
        }}

        @media (max-width: 600px) {{
            body {{ padding: 10px; }}
            .message {{ padding: 12px 15px; }}
            .stats-row {{ flex-direction: column; gap: 8px; }}
        }}"#,
        font_size = config.font_size,
        line_height = config.line_height,
        letter_spacing = config.letter_spacing,
        padding = config.padding,
        max_width = config.max_width,
    )
}

/// JS object literal mapping CSS variables to one theme's colors.
fn js_color_object(colors: &ThemeColors) -> String {
    format!(
        "{{\n                '--bg-color': '{}',\n                '--card-bg': '{}',\n                \
         '--user-bg': '{}',\n                '--assistant-bg': '{}',\n                \
         '--text-color': '{}',\n                '--text-muted': '{}',\n                \
         '--accent': '{}',\n                '--accent-soft': '{}',\n                \
         '--border-color': '{}',\n                '--code-bg': '{}',\n                \
         '--tool-bg': '{}'\n            }}",
        colors.bg_color,
        colors.card_bg,
        colors.user_bg,
        colors.assistant_bg,
        colors.text_color,
        colors.text_muted,
        colors.accent,
        colors.accent_soft,
        colors.border_color,
        colors.code_bg,
        colors.tool_bg,
    )
}

fn theme_toggle_js() -> String {
    format!(
        r#"    <script>
    (function() {{
        const STORAGE_KEY = 'session-export-theme';
        const root = document.documentElement;

        const themes = {{
            dark: {dark},
            light: {light}
        }};

        function getPreferredTheme() {{
            const stored = localStorage.getItem(STORAGE_KEY);
            if (stored) return stored;
            return window.matchMedia('(prefers-color-scheme: dark)').matches ? 'dark' : 'light';
        }}

        function applyTheme(name) {{
            const colors = themes[name];
            for (const [prop, value] of Object.entries(colors)) {{
                root.style.setProperty(prop, value);
            }}
            const btn = document.getElementById('theme-toggle');
            if (btn) {{
                btn.innerHTML = name === 'dark' ? '☀️ Light' : '🌙 Dark';
            }}
        }}

        function toggleTheme() {{
            const current = localStorage.getItem(STORAGE_KEY) || getPreferredTheme();
            const next = current === 'dark' ? 'light' : 'dark';
            localStorage.setItem(STORAGE_KEY, next);
            applyTheme(next);
        }}

        document.addEventListener('DOMContentLoaded', function() {{
            applyTheme(getPreferredTheme());
            const btn = document.getElementById('theme-toggle');
            if (btn) {{
                btn.addEventListener('click', toggleTheme);
            }}
        }});

        window.matchMedia('(prefers-color-scheme: dark)').addEventListener('change', function(e) {{
            if (!localStorage.getItem(STORAGE_KEY)) {{
                applyTheme(e.matches ? 'dark' : 'light');
            }}
        }});
    }})();
    </script>"#,
        dark = js_color_object(theme("dark")),
        light = js_color_object(theme("light")),
    )
}
