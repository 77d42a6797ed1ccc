//! Splitting generated text into claim-sized units.
//!
//! When the text contains list items (`1.`, `2)`, `-`, `*`, `•`), each item
//! is one unit and surrounding prose is dropped. Otherwise each blank-line
//! separated paragraph is a unit. Markdown headings are skipped and
//! emphasis markers are removed.

use once_cell::sync::Lazy;
use regex::Regex;

use super::claim::TextSpan;

static LIST_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:\d+[.)]|[-*•+])\s+").unwrap());

static HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*#{1,6}(?:\s|$)").unwrap());

static EMPHASIS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*|__").unwrap());

/// A unit of source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Cleaned text: markers and emphasis removed, lines joined by spaces.
    pub text: String,
    /// Byte range of the unit's content in the source.
    pub span: TextSpan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    Blank,
    Heading,
    Item,
    Prose,
}

struct Line<'a> {
    kind: LineKind,
    /// Content after any list marker.
    content: &'a str,
    /// Byte offset of `content` in the source.
    start: usize,
}

fn classify(source: &str) -> Vec<Line<'_>> {
    let mut lines = Vec::new();
    let mut offset = 0;

    for raw in source.split_inclusive('\n') {
        let line = raw.trim_end_matches(['\n', '\r']);
        let line_start = offset;
        offset += raw.len();

        let (kind, content, start) = if line.trim().is_empty() {
            (LineKind::Blank, "", line_start)
        } else if HEADING.is_match(line) {
            (LineKind::Heading, "", line_start)
        } else if let Some(marker) = LIST_MARKER.find(line) {
            (LineKind::Item, &line[marker.end()..], line_start + marker.end())
        } else {
            let trimmed = line.trim_start();
            let lead = line.len() - trimmed.len();
            (LineKind::Prose, trimmed, line_start + lead)
        };

        lines.push(Line {
            kind,
            content,
            start,
        });
    }

    lines
}

/// Accumulates consecutive lines into one segment.
#[derive(Default)]
struct Builder {
    parts: Vec<String>,
    start: usize,
    end: usize,
}

impl Builder {
    fn push(&mut self, line: &Line<'_>) {
        let content = line.content.trim_end();
        if self.parts.is_empty() {
            self.start = line.start;
        }
        self.end = line.start + content.len();
        self.parts.push(content.trim().to_string());
    }

    fn finish(&mut self, out: &mut Vec<Segment>) {
        if self.parts.is_empty() {
            return;
        }
        let joined = self.parts.join(" ");
        let text = EMPHASIS.replace_all(&joined, "").trim().to_string();
        if !text.is_empty() {
            out.push(Segment {
                text,
                span: TextSpan {
                    start: self.start,
                    end: self.end,
                },
            });
        }
        self.parts.clear();
    }
}

/// Split `source` into ordered segments.
pub fn segment(source: &str) -> Vec<Segment> {
    let lines = classify(source);
    let list_mode = lines.iter().any(|l| l.kind == LineKind::Item);

    let mut out = Vec::new();
    let mut current = Builder::default();
    // In list mode, prose only continues an item that is still open.
    let mut in_item = false;

    for line in &lines {
        match line.kind {
            LineKind::Blank | LineKind::Heading => {
                current.finish(&mut out);
                in_item = false;
            }
            LineKind::Item => {
                current.finish(&mut out);
                current.push(line);
                in_item = true;
            }
            LineKind::Prose => {
                if !list_mode || in_item {
                    current.push(line);
                }
            }
        }
    }
    current.finish(&mut out);

    out
}
