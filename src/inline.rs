//! Inline emphasis parsing for a single line.
//!
//! Recognizes `*`/`_` italic, `**`/`__` bold, and `***` bold-italic
//! delimiter runs, strips the markup, and tags each resulting span with
//! bold/italic flags for the caller to layer onto its base attributes.
//! Literal whitespace is preserved. Any unbalanced or oversized delimiter
//! run is a parse failure, and the whole line is returned verbatim as one
//! unstyled span — this parser never errors.

extern crate alloc;

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::ops::Range;

use smallvec::{smallvec, SmallVec};

/// One styled slice of a line.
///
/// `raw` is the character sub-range of the input line this span accounts
/// for, including any delimiter characters stripped from it; `text` holds
/// the visible characters only.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlineSpan {
    /// Visible text with markup stripped.
    pub text: String,
    /// Character range of the input line covered by this span.
    pub raw: Range<usize>,
    /// Bold flag.
    pub bold: bool,
    /// Italic flag.
    pub italic: bool,
}

/// Per-line span buffer; most lines carry a handful of spans at most.
pub type InlineSpans = SmallVec<[InlineSpan; 4]>;

/// Parse emphasis markup in one line into styled spans.
pub fn style_line(line: &str) -> InlineSpans {
    let chars: Vec<char> = line.chars().collect();
    match parse_spans(&chars) {
        Some(spans) => spans,
        None => smallvec![InlineSpan {
            text: line.to_string(),
            raw: 0..chars.len(),
            bold: false,
            italic: false,
        }],
    }
}

fn parse_spans(chars: &[char]) -> Option<InlineSpans> {
    let mut spans = InlineSpans::new();
    let mut stack: Vec<(char, usize)> = Vec::new();
    let mut bold = 0usize;
    let mut italic = 0usize;
    let mut buf = String::new();
    let mut span_start = 0usize;
    let mut i = 0usize;

    while i < chars.len() {
        let c = chars[i];
        if c != '*' && c != '_' {
            buf.push(c);
            i += 1;
            continue;
        }

        let run_len = chars[i..].iter().take_while(|&&d| d == c).count();
        if run_len > 3 {
            return None;
        }

        if stack.last() == Some(&(c, run_len)) {
            // Closing run: the delimiters belong to the span they close.
            let end = i + run_len;
            flush(&mut spans, &mut buf, &mut span_start, end, bold, italic);
            stack.pop();
            apply(run_len, &mut bold, &mut italic, false);
            i = end;
        } else {
            // Opening run: the delimiters belong to the span they open.
            flush(&mut spans, &mut buf, &mut span_start, i, bold, italic);
            stack.push((c, run_len));
            apply(run_len, &mut bold, &mut italic, true);
            i += run_len;
        }
    }

    if !stack.is_empty() {
        return None;
    }
    flush(
        &mut spans,
        &mut buf,
        &mut span_start,
        chars.len(),
        bold,
        italic,
    );
    Some(spans)
}

fn apply(run_len: usize, bold: &mut usize, italic: &mut usize, open: bool) {
    let (add_bold, add_italic) = match run_len {
        1 => (0, 1),
        2 => (1, 0),
        _ => (1, 1),
    };
    if open {
        *bold += add_bold;
        *italic += add_italic;
    } else {
        *bold = bold.saturating_sub(add_bold);
        *italic = italic.saturating_sub(add_italic);
    }
}

fn flush(
    spans: &mut InlineSpans,
    buf: &mut String,
    span_start: &mut usize,
    end: usize,
    bold: usize,
    italic: usize,
) {
    if buf.is_empty() && *span_start >= end {
        return;
    }
    spans.push(InlineSpan {
        text: core::mem::take(buf),
        raw: *span_start..end,
        bold: bold > 0,
        italic: italic > 0,
    });
    *span_start = end;
}
