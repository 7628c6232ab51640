//! Markdown block segmentation.
//!
//! Splits raw chapter text into content segments (body lines and headers)
//! joined by soft breaks, hard breaks, or paragraph breaks. A blank line —
//! two consecutive line separators — ends a paragraph; a separator pair
//! with only whitespace between them does not end the paragraph, the
//! whitespace-only line is simply dropped. A line ending in two or more
//! spaces is a hard break with the trailing spaces removed. A header line
//! (1–6 leading `#` followed by whitespace) always forms its own block
//! with forced breaks on both sides.
//!
//! All ranges are character offsets into the source [`Document`]. Segments
//! report the separator characters they consume (`joiner_raw`) so the
//! styled-run builder can keep its run sequence gapless.

extern crate alloc;

use alloc::vec::Vec;
use core::ops::Range;

use crate::document::Document;

/// Content classification of one segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SegmentKind {
    /// A body text line.
    Body {
        /// Line ended in two or more trailing spaces.
        hard_break: bool,
    },
    /// A header line with its level (1–6).
    Header {
        /// Header level derived from the number of leading `#` characters.
        level: u8,
    },
}

/// How a segment joins the segment that follows it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Joiner {
    /// Final segment of the document.
    None,
    /// Single separator inside one paragraph: lines join with one space.
    Soft,
    /// Forced line break (hard break or header boundary).
    Hard,
    /// Blank line: paragraph boundary.
    Paragraph,
}

/// One content segment with its source ranges.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segment {
    /// Content classification.
    pub kind: SegmentKind,
    /// Raw range of the whole physical line.
    pub raw: Range<usize>,
    /// Range of the visible text (header prefix and trailing hard-break
    /// spaces excluded).
    pub text: Range<usize>,
    /// Join rule toward the next segment.
    pub joiner: Joiner,
    /// Raw range of separator characters consumed after the line.
    pub joiner_raw: Range<usize>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum LineClass {
    /// Zero characters: a paragraph-breaking blank line.
    Blank,
    /// Non-empty but all whitespace: dropped without breaking the paragraph.
    WhitespaceOnly,
    Header { level: u8, text: Range<usize> },
    Body { hard_break: bool, text: Range<usize> },
}

#[derive(Clone, Debug)]
struct RawLine {
    raw: Range<usize>,
    class: LineClass,
}

impl RawLine {
    fn is_content(&self) -> bool {
        matches!(
            self.class,
            LineClass::Header { .. } | LineClass::Body { .. }
        )
    }
}

/// Segment a document into content segments with join rules.
pub fn segment_document(doc: &Document) -> Vec<Segment> {
    let lines = classify_lines(doc);
    let mut segments = Vec::with_capacity(lines.len());

    let mut i = 0;
    while i < lines.len() {
        let (kind, text, hard_break) = match &lines[i].class {
            LineClass::Blank | LineClass::WhitespaceOnly => {
                i += 1;
                continue;
            }
            LineClass::Header { level, text } => {
                (SegmentKind::Header { level: *level }, text.clone(), false)
            }
            LineClass::Body { hard_break, text } => (
                SegmentKind::Body {
                    hard_break: *hard_break,
                },
                text.clone(),
                *hard_break,
            ),
        };
        let raw = lines[i].raw.clone();

        let mut j = i + 1;
        let mut saw_blank = false;
        while j < lines.len() && !lines[j].is_content() {
            saw_blank |= lines[j].class == LineClass::Blank;
            j += 1;
        }
        let next = lines.get(j);

        let joiner = match next {
            None => Joiner::None,
            Some(_) if saw_blank => Joiner::Paragraph,
            Some(next_line) => {
                let header_boundary = matches!(kind, SegmentKind::Header { .. })
                    || matches!(next_line.class, LineClass::Header { .. });
                if header_boundary || hard_break {
                    Joiner::Hard
                } else {
                    Joiner::Soft
                }
            }
        };
        let joiner_raw = raw.end..next.map_or(doc.len(), |n| n.raw.start);

        segments.push(Segment {
            kind,
            raw,
            text,
            joiner,
            joiner_raw,
        });
        i = j;
    }

    segments
}

fn classify_lines(doc: &Document) -> Vec<RawLine> {
    let mut lines = Vec::with_capacity(16);
    let mut line_start = 0usize;
    let mut chars = doc.text().chars().enumerate().peekable();

    while let Some((idx, ch)) = chars.next() {
        match ch {
            '\n' => {
                lines.push(raw_line(doc, line_start..idx));
                line_start = idx + 1;
            }
            '\r' => {
                if matches!(chars.peek(), Some((_, '\n'))) {
                    chars.next();
                    lines.push(raw_line(doc, line_start..idx));
                    line_start = idx + 2;
                } else {
                    lines.push(raw_line(doc, line_start..idx));
                    line_start = idx + 1;
                }
            }
            _ => {}
        }
    }
    if line_start < doc.len() {
        lines.push(raw_line(doc, line_start..doc.len()));
    }

    lines
}

fn raw_line(doc: &Document, raw: Range<usize>) -> RawLine {
    let class = classify(doc.slice(raw.clone()), raw.start);
    RawLine { raw, class }
}

fn classify(line: &str, start: usize) -> LineClass {
    if line.is_empty() {
        return LineClass::Blank;
    }
    let char_count = line.chars().count();
    if line.chars().all(char::is_whitespace) {
        return LineClass::WhitespaceOnly;
    }

    let hashes = line.chars().take_while(|c| *c == '#').count();
    if (1..=6).contains(&hashes)
        && line
            .chars()
            .nth(hashes)
            .is_some_and(char::is_whitespace)
    {
        let leading_ws = line
            .chars()
            .skip(hashes)
            .take_while(|c| c.is_whitespace())
            .count();
        let trailing_ws = line
            .chars()
            .rev()
            .take_while(|c| c.is_whitespace())
            .count();
        let text_start = start + hashes + leading_ws;
        let text_end = (start + char_count - trailing_ws).max(text_start);
        return LineClass::Header {
            level: hashes as u8,
            text: text_start..text_end,
        };
    }

    let trailing_spaces = line.chars().rev().take_while(|c| *c == ' ').count();
    if trailing_spaces >= 2 {
        LineClass::Body {
            hard_break: true,
            text: start..start + char_count - trailing_spaces,
        }
    } else {
        LineClass::Body {
            hard_break: false,
            text: start..start + char_count,
        }
    }
}
