//! Minimal inline markup for chat messages.
//!
//! Only three inline forms are recognised: `**bold**`, `*italic*` and
//! `` `code` ``. Newlines become line breaks. Emphasis never spans a line
//! break, and user text is never passed through as markup: every segment is
//! escaped when it is turned into HTML.

use regex::Regex;
use std::sync::OnceLock;

fn inline_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // Alternation order matters: at the same start position bold wins over italic.
    // Emphasis content may not start with `*`, so runs like `****` stay literal.
    PATTERN.get_or_init(|| {
        Regex::new(r"\*\*([^*\n][^\n]*?)\*\*|\*([^*\n][^\n]*?)\*|`(.+?)`")
            .expect("inline markup pattern is valid")
    })
}

/// One piece of rendered message content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Bold(String),
    Italic(String),
    Code(String),
    LineBreak,
}

/// Message content split into display segments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RichText {
    segments: Vec<Segment>,
}

impl RichText {
    /// Parse inline markup.
    pub fn parse(text: &str) -> Self {
        let mut segments = Vec::new();

        for (i, line) in text.split('\n').enumerate() {
            if i > 0 {
                segments.push(Segment::LineBreak);
            }
            let line = line.strip_suffix('\r').unwrap_or(line);

            let mut last = 0;
            for caps in inline_pattern().captures_iter(line) {
                let Some(whole) = caps.get(0) else { continue };
                if whole.start() > last {
                    segments.push(Segment::Text(line[last..whole.start()].to_string()));
                }

                let segment = if let Some(m) = caps.get(1) {
                    Segment::Bold(m.as_str().to_string())
                } else if let Some(m) = caps.get(2) {
                    Segment::Italic(m.as_str().to_string())
                } else if let Some(m) = caps.get(3) {
                    Segment::Code(m.as_str().to_string())
                } else {
                    Segment::Text(whole.as_str().to_string())
                };
                segments.push(segment);
                last = whole.end();
            }

            if last < line.len() {
                segments.push(Segment::Text(line[last..].to_string()));
            }
        }

        Self { segments }
    }

    /// Text with line breaks only; `*` and backticks are left alone.
    pub fn plain(text: &str) -> Self {
        let mut segments = Vec::new();
        for (i, line) in text.split('\n').enumerate() {
            if i > 0 {
                segments.push(Segment::LineBreak);
            }
            let line = line.strip_suffix('\r').unwrap_or(line);
            if !line.is_empty() {
                segments.push(Segment::Text(line.to_string()));
            }
        }
        Self { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Split into lines of inline segments, dropping the `LineBreak` markers.
    pub fn lines(&self) -> Vec<Vec<&Segment>> {
        let mut lines = vec![Vec::new()];
        for segment in &self.segments {
            match segment {
                Segment::LineBreak => lines.push(Vec::new()),
                other => {
                    if let Some(current) = lines.last_mut() {
                        current.push(other);
                    }
                }
            }
        }
        lines
    }

    /// Escaped HTML rendering.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(t) => out.push_str(&escape_html(t)),
                Segment::Bold(t) => {
                    out.push_str("<strong>");
                    out.push_str(&escape_html(t));
                    out.push_str("</strong>");
                }
                Segment::Italic(t) => {
                    out.push_str("<em>");
                    out.push_str(&escape_html(t));
                    out.push_str("</em>");
                }
                Segment::Code(t) => {
                    out.push_str("<code>");
                    out.push_str(&escape_html(t));
                    out.push_str("</code>");
                }
                Segment::LineBreak => out.push_str("<br>"),
            }
        }
        out
    }

    /// The visible characters, with markup delimiters removed.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(t) | Segment::Bold(t) | Segment::Italic(t) | Segment::Code(t) => {
                    out.push_str(t)
                }
                Segment::LineBreak => out.push('\n'),
            }
        }
        out
    }
}

/// Escape the five HTML-significant characters.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}
