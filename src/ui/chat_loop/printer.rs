use crate::ui::theme::Theme;
use crate::utils::syntax::highlight_code_block;
use std::io::{self, Write};

struct CodeBuffer {
    marker: char,
    language: String,
    lines: Vec<String>,
}

/// Writes an assistant reply as it streams in.
///
/// Prose goes out as soon as it arrives. A line that could open a code fence
/// is held until it is complete, and a fenced block is held until its closing
/// fence so the block can be highlighted as a whole.
pub struct StreamPrinter<'t> {
    theme: &'t Theme,
    syntax: bool,
    line: String,
    flushed: usize,
    code: Option<CodeBuffer>,
    wrote_any: bool,
}

impl<'t> StreamPrinter<'t> {
    pub fn new(theme: &'t Theme, syntax: bool) -> Self {
        Self {
            theme,
            syntax,
            line: String::new(),
            flushed: 0,
            code: None,
            wrote_any: false,
        }
    }

    pub fn wrote_any(&self) -> bool {
        self.wrote_any
    }

    pub fn push<W: Write>(&mut self, fragment: &str, out: &mut W) -> io::Result<()> {
        let mut rest = fragment;
        while let Some(pos) = rest.find('\n') {
            self.line.push_str(&rest[..pos]);
            self.complete_line(out)?;
            rest = &rest[pos + 1..];
        }
        self.line.push_str(rest);
        self.flush_partial(out)?;
        out.flush()
    }

    /// Emit whatever is still held and end the reply with a newline.
    pub fn finish<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        if !self.line.is_empty() {
            if self.code.is_some() {
                let line = std::mem::take(&mut self.line);
                if let Some(code) = self.code.as_mut() {
                    code.lines.push(line);
                }
            } else {
                let tail = self.line[self.flushed..].to_string();
                self.write_prose(&tail, out)?;
                self.line.clear();
                self.flushed = 0;
            }
        }
        if let Some(code) = self.code.take() {
            self.write_code(&code, out)?;
        }
        if self.wrote_any {
            writeln!(out)?;
        }
        out.flush()
    }

    fn flush_partial<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        if self.code.is_some() || self.line.len() == self.flushed {
            return Ok(());
        }
        if self.flushed == 0 && could_open_fence(&self.line) {
            return Ok(());
        }
        let pending = self.line[self.flushed..].to_string();
        self.write_prose(&pending, out)?;
        self.flushed = self.line.len();
        Ok(())
    }

    fn complete_line<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        let line = std::mem::take(&mut self.line);
        let flushed = std::mem::take(&mut self.flushed);

        if let Some(code) = self.code.as_mut() {
            if closes_fence(&line, code.marker) {
                if let Some(code) = self.code.take() {
                    self.write_code(&code, out)?;
                    writeln!(out)?;
                    let fence = self.theme.paint(self.theme.fence_style, "```");
                    writeln!(out, "{fence}")?;
                }
            } else {
                code.lines.push(line);
            }
            return Ok(());
        }

        if flushed == 0 {
            if let Some((marker, language)) = opens_fence(&line) {
                let fence = self
                    .theme
                    .paint(self.theme.fence_style, &format!("```{language}"));
                writeln!(out, "{fence}")?;
                self.wrote_any = true;
                self.code = Some(CodeBuffer {
                    marker,
                    language,
                    lines: Vec::new(),
                });
                return Ok(());
            }
        }

        self.write_prose(&line[flushed..], out)?;
        writeln!(out)?;
        self.wrote_any = true;
        Ok(())
    }

    fn write_prose<W: Write>(&mut self, text: &str, out: &mut W) -> io::Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        self.wrote_any = true;
        write!(
            out,
            "{}",
            self.theme.paint(self.theme.assistant_text_style, text)
        )
    }

    fn write_code<W: Write>(&mut self, code: &CodeBuffer, out: &mut W) -> io::Result<()> {
        if code.lines.is_empty() {
            return Ok(());
        }
        self.wrote_any = true;
        let body = code.lines.join("\n");
        let rendered = if self.syntax {
            highlight_code_block(&code.language, &body, self.theme).unwrap_or(body)
        } else {
            body
        };
        write!(out, "{rendered}")
    }
}

fn fence_body(line: &str) -> Option<(char, &str)> {
    let indent = line.len() - line.trim_start_matches(' ').len();
    if indent > 3 {
        return None;
    }
    let rest = &line[indent..];
    let marker = rest.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let run = rest.len() - rest.trim_start_matches(marker).len();
    (run >= 3).then(|| (marker, &rest[run..]))
}

fn opens_fence(line: &str) -> Option<(char, String)> {
    let (marker, info) = fence_body(line)?;
    if marker == '`' && info.contains('`') {
        return None;
    }
    let language = info.split_whitespace().next().unwrap_or("").to_string();
    Some((marker, language))
}

fn closes_fence(line: &str, marker: char) -> bool {
    fence_body(line).is_some_and(|(m, rest)| m == marker && rest.trim().is_empty())
}

/// True while the line so far might still turn out to be a fence opener.
fn could_open_fence(line: &str) -> bool {
    let trimmed = line.trim_start_matches(' ');
    if line.len() - trimmed.len() > 3 {
        return false;
    }
    match trimmed.chars().next() {
        None => true,
        Some(c @ ('`' | '~')) => {
            let run = trimmed.len() - trimmed.trim_start_matches(c).len();
            run == trimmed.len() || run >= 3
        }
        Some(_) => false,
    }
}
