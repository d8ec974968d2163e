//! Splits message text into prose and fenced code blocks.
//!
//! Prose is kept verbatim. Only fenced blocks become [`Segment::Code`];
//! indented blocks stay in the surrounding text.

mod code;

use code::{detab, language_hint_from_codeblock_kind};
use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Code { language: String, code: String },
}

struct OpenBlock {
    language: String,
    end: usize,
    code: String,
}

pub fn split_segments(content: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut cursor = 0;
    let mut open: Option<OpenBlock> = None;

    for (event, range) in Parser::new_ext(content, Options::empty()).into_offset_iter() {
        match event {
            Event::Start(Tag::CodeBlock(kind)) if open.is_none() => {
                let Some(language) = language_hint_from_codeblock_kind(&kind) else {
                    continue;
                };
                push_text(&mut segments, &content[cursor..range.start]);
                open = Some(OpenBlock {
                    language,
                    end: range.end,
                    code: String::new(),
                });
            }
            Event::Text(text) => {
                if let Some(block) = open.as_mut() {
                    block.code.push_str(&text);
                }
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some(block) = open.take() {
                    let code = block.code.trim_end_matches('\n');
                    segments.push(Segment::Code {
                        language: block.language,
                        code: code.lines().map(detab).collect::<Vec<_>>().join("\n"),
                    });
                    cursor = block.end;
                }
            }
            _ => {}
        }
    }

    if cursor < content.len() {
        push_text(&mut segments, &content[cursor..]);
    }
    segments
}

fn push_text(segments: &mut Vec<Segment>, text: &str) {
    if !text.trim().is_empty() {
        segments.push(Segment::Text(text.trim_matches('\n').to_string()));
    }
}
