use crate::ui::theme::{Appearance, Theme};
use std::sync::OnceLock;
use syntect::easy::HighlightLines;
use syntect::highlighting::ThemeSet;
use syntect::parsing::SyntaxSet;
use syntect::util::{as_24_bit_terminal_escaped, LinesWithEndings};

static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
static THEME_SET: OnceLock<ThemeSet> = OnceLock::new();

fn normalize_lang_hint(s: &str) -> String {
    let t = s.trim().to_ascii_lowercase();
    match t.as_str() {
        "py" | "python" => "python".into(),
        "bash" | "sh" | "zsh" | "shell" => "bash".into(),
        "js" | "javascript" | "jsx" => "javascript".into(),
        "ts" | "tsx" | "typescript" => "typescript".into(),
        "json" => "json".into(),
        "toml" => "toml".into(),
        "yaml" | "yml" => "yaml".into(),
        "rust" | "rs" => "rust".into(),
        "go" => "go".into(),
        "c" | "h" => "c".into(),
        "cpp" | "cc" | "cxx" | "hpp" | "hxx" => "cpp".into(),
        "java" => "java".into(),
        "html" => "html".into(),
        "css" => "css".into(),
        "sql" => "sql".into(),
        other => other.into(),
    }
}

pub(crate) fn pick_syntect_theme_name(theme: &Theme) -> &'static str {
    match theme.appearance {
        Appearance::Light => "InspiredGitHub",
        Appearance::Dark | Appearance::Plain => "base16-ocean.dark",
    }
}

/// Highlight a code block as 24-bit ANSI text, one output line per input line.
///
/// Returns `None` for plain themes or when syntect cannot highlight the input,
/// in which case callers print the code unstyled.
pub fn highlight_code_block(lang_hint: &str, code: &str, theme: &Theme) -> Option<String> {
    if theme.is_plain() {
        return None;
    }

    let ps = SYNTAX_SET.get_or_init(SyntaxSet::load_defaults_newlines);
    let ts = THEME_SET.get_or_init(ThemeSet::load_defaults);

    let theme_name = pick_syntect_theme_name(theme);
    let fallback_names = ["base16-ocean.dark", "Solarized (light)"];
    let syn_theme = ts.themes.get(theme_name).or_else(|| {
        fallback_names
            .iter()
            .find_map(|name| ts.themes.get(*name))
    })?;

    let lang_norm = normalize_lang_hint(lang_hint);
    let syntax = ps
        .find_syntax_by_token(&lang_norm)
        .unwrap_or_else(|| ps.find_syntax_plain_text());

    let mut h = HighlightLines::new(syntax, syn_theme);
    let mut out = String::with_capacity(code.len() * 2);
    for line in LinesWithEndings::from(code) {
        let ranges = h.highlight_line(line, ps).ok()?;
        let escaped = as_24_bit_terminal_escaped(&ranges[..], false);
        out.push_str(escaped.trim_end_matches('\n'));
        out.push_str("\x1b[0m");
        if line.ends_with('\n') {
            out.push('\n');
        }
    }
    Some(out)
}
