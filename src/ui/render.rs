//! Transcript rendering for the line-oriented chat loop.

use crate::core::message::Message;
use crate::ui::markdown::{split_segments, Segment};
use crate::ui::theme::Theme;
use crate::utils::syntax::highlight_code_block;

pub const USER_PREFIX: &str = "You: ";

/// Render a whole message as terminal text, without a trailing newline.
///
/// User messages are shown verbatim after a prefix. Assistant messages have
/// fenced code blocks drawn between fence lines and, when `syntax` is set,
/// highlighted for the theme.
pub fn render_message(message: &Message, theme: &Theme, syntax: bool) -> String {
    if message.is_user() {
        return format!(
            "{}{}",
            theme.paint(theme.user_prefix_style, USER_PREFIX),
            theme.paint(theme.user_text_style, &message.content)
        );
    }

    let mut blocks = Vec::new();
    for segment in split_segments(&message.content) {
        match segment {
            Segment::Text(text) => {
                blocks.push(theme.paint(theme.assistant_text_style, &text));
            }
            Segment::Code { language, code } => {
                blocks.push(render_code_block(&language, &code, theme, syntax));
            }
        }
    }
    blocks.join("\n\n")
}

fn render_code_block(language: &str, code: &str, theme: &Theme, syntax: bool) -> String {
    let opening = theme.paint(theme.fence_style, &format!("```{language}"));
    let closing = theme.paint(theme.fence_style, "```");
    let body = if syntax {
        highlight_code_block(language, code, theme).unwrap_or_else(|| code.to_string())
    } else {
        code.to_string()
    };
    if body.is_empty() {
        format!("{opening}\n{closing}")
    } else {
        format!("{opening}\n{body}\n{closing}")
    }
}

/// One-line status notice such as command feedback.
pub fn render_notice(text: &str, theme: &Theme) -> String {
    theme.paint(theme.notice_style, text)
}

pub fn render_error(text: &str, theme: &Theme) -> String {
    theme.paint(theme.error_style, text)
}
