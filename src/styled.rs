//! Document-wide styled run sequence.
//!
//! [`StyledDocument::build`] drives block segmentation and inline styling
//! into one ordered run sequence whose raw ranges are non-overlapping,
//! sorted, and cover exactly `[0, document.len())`. A run's rendered text
//! may be shorter than its raw range (markup stripped) or synthesized
//! (`" "` for a soft break, `"\n"` for a forced break); separator and
//! prefix characters are folded into adjacent runs to keep coverage
//! gapless.
//!
//! Slicing styled content back out of a raw range is best-effort: a
//! partial overlap into a run whose stripping destroyed the 1:1
//! character mapping yields an empty string for that portion.

extern crate alloc;

use alloc::string::String;
use alloc::vec::Vec;
use core::ops::Range;

use crate::config::{FontFamily, PaginationConfig};
use crate::document::Document;
use crate::inline::style_line;
use crate::segment::{segment_document, Joiner, Segment, SegmentKind};

/// Font-size multipliers for header levels 1–6.
pub const HEADER_SIZE_FACTORS: [f32; 6] = [1.75, 1.5, 1.25, 1.15, 1.1, 1.05];

/// Foreground paint for a run, resolved by the rendering backend.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Foreground {
    /// Surface default text paint.
    #[default]
    Default,
    /// Explicit RGB paint.
    Rgb(u8, u8, u8),
}

/// Resolved attributes for one styled run.
#[derive(Clone, Debug, PartialEq)]
pub struct TextAttributes {
    /// Requested font family.
    pub family: FontFamily,
    /// Font size in points.
    pub size: f32,
    /// Bold flag.
    pub bold: bool,
    /// Italic flag.
    pub italic: bool,
    /// Foreground paint.
    pub foreground: Foreground,
    /// Extra spacing between lines.
    pub line_spacing: f32,
    /// Spacing before the paragraph this run opens.
    pub paragraph_spacing_before: f32,
    /// Spacing after the paragraph this run closes.
    pub paragraph_spacing_after: f32,
}

/// One attributed slice of the document.
#[derive(Clone, Debug, PartialEq)]
pub struct StyleRun {
    /// First character offset covered by this run.
    pub start: usize,
    /// One past the last character offset covered by this run.
    pub end: usize,
    /// Rendered text for this range; may differ in length from the raw
    /// range when markup was stripped or a joiner was synthesized.
    pub text: String,
    /// Resolved attributes.
    pub attrs: TextAttributes,
}

impl StyleRun {
    /// Covered raw range.
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Raw length in characters.
    pub fn raw_len(&self) -> usize {
        self.end - self.start
    }

    /// True when rendered text and raw range have the same character
    /// length, so character positions map 1:1 and the run can be sliced
    /// exactly.
    pub fn is_exact(&self) -> bool {
        self.text.chars().count() == self.raw_len()
    }
}

/// Ordered, gapless styled-run sequence for one document.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StyledDocument {
    runs: Vec<StyleRun>,
    document_len: usize,
}

impl StyledDocument {
    /// Build the run sequence for `doc` under `config`.
    pub fn build(doc: &Document, config: &PaginationConfig) -> Self {
        Builder::new(doc, config.clamped()).run()
    }

    /// Runs in ascending `start` order.
    pub fn runs(&self) -> &[StyleRun] {
        &self.runs
    }

    /// Length of the underlying document in characters.
    pub fn document_len(&self) -> usize {
        self.document_len
    }

    /// True when the underlying document is empty.
    pub fn is_empty(&self) -> bool {
        self.document_len == 0
    }

    /// Concatenated rendered text of all runs.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        for run in &self.runs {
            out.push_str(&run.text);
        }
        out
    }

    /// Styled runs restricted to a raw character range.
    ///
    /// Runs fully inside the range are returned whole. A partial overlap
    /// is sliced exactly when the run maps 1:1 ([`StyleRun::is_exact`]);
    /// otherwise the clipped run carries an empty string for that portion
    /// — the documented best-effort mapping gap, not an error.
    pub fn clip_runs(&self, range: Range<usize>) -> Vec<StyleRun> {
        let mut out = Vec::with_capacity(4);
        for run in &self.runs {
            if run.end <= range.start {
                continue;
            }
            if run.start >= range.end {
                break;
            }
            let start = run.start.max(range.start);
            let end = run.end.min(range.end);
            if start == run.start && end == run.end {
                out.push(run.clone());
            } else if run.is_exact() {
                let text: String = run
                    .text
                    .chars()
                    .skip(start - run.start)
                    .take(end - start)
                    .collect();
                out.push(StyleRun {
                    start,
                    end,
                    text,
                    attrs: run.attrs.clone(),
                });
            } else {
                out.push(StyleRun {
                    start,
                    end,
                    text: String::new(),
                    attrs: run.attrs.clone(),
                });
            }
        }
        out
    }
}

/// Resolved attributes for a header of `level` (1–6) under `config`.
pub fn header_attributes(config: &PaginationConfig, level: u8) -> TextAttributes {
    let factor_index = usize::from(level.clamp(1, 6)) - 1;
    TextAttributes {
        family: config.font_family.clone(),
        size: config.font_size * HEADER_SIZE_FACTORS[factor_index],
        bold: true,
        italic: false,
        foreground: Foreground::Default,
        line_spacing: config.line_spacing,
        paragraph_spacing_before: config.paragraph_spacing,
        paragraph_spacing_after: config.paragraph_spacing * 0.5,
    }
}

/// Resolved attributes for body text under `config`.
pub fn body_attributes(config: &PaginationConfig) -> TextAttributes {
    TextAttributes {
        family: config.font_family.clone(),
        size: config.font_size,
        bold: false,
        italic: false,
        foreground: Foreground::Default,
        line_spacing: config.line_spacing,
        paragraph_spacing_before: 0.0,
        paragraph_spacing_after: config.paragraph_spacing,
    }
}

struct Builder<'a> {
    doc: &'a Document,
    body: TextAttributes,
    config: PaginationConfig,
    runs: Vec<StyleRun>,
    cursor: usize,
}

impl<'a> Builder<'a> {
    fn new(doc: &'a Document, config: PaginationConfig) -> Self {
        Self {
            doc,
            body: body_attributes(&config),
            config,
            runs: Vec::with_capacity(16),
            cursor: 0,
        }
    }

    fn run(mut self) -> StyledDocument {
        let segments = segment_document(self.doc);
        for segment in &segments {
            self.push_segment(segment);
        }

        // Anything left uncovered (whitespace-only documents, trailing
        // separators after an empty final block) becomes a textless run.
        if self.cursor < self.doc.len() {
            self.push_run(self.doc.len(), String::new(), self.body.clone());
        }

        StyledDocument {
            runs: self.runs,
            document_len: self.doc.len(),
        }
    }

    fn push_segment(&mut self, segment: &Segment) {
        let base = match segment.kind {
            SegmentKind::Header { level } => header_attributes(&self.config, level),
            SegmentKind::Body { .. } => self.body.clone(),
        };

        let line = self.doc.slice(segment.text.clone());
        for span in style_line(line) {
            let attrs = TextAttributes {
                bold: base.bold || span.bold,
                italic: base.italic || span.italic,
                ..base.clone()
            };
            let end = segment.text.start + span.raw.end;
            self.push_run(end, span.text, attrs);
        }

        let joiner_text = match segment.joiner {
            Joiner::None => "",
            Joiner::Soft => " ",
            Joiner::Hard | Joiner::Paragraph => "\n",
        };
        if segment.joiner_raw.end > self.cursor {
            self.push_run(segment.joiner_raw.end, String::from(joiner_text), self.body.clone());
        }
    }

    /// Append a run covering `cursor..end`, merging into the previous run
    /// when attributes match and both sides keep an exact 1:1 mapping.
    fn push_run(&mut self, end: usize, text: String, attrs: TextAttributes) {
        debug_assert!(end >= self.cursor);
        if end <= self.cursor {
            return;
        }
        let start = self.cursor;
        self.cursor = end;

        let candidate = StyleRun {
            start,
            end,
            text,
            attrs,
        };
        if let Some(last) = self.runs.last_mut() {
            if last.end == candidate.start
                && last.attrs == candidate.attrs
                && last.is_exact()
                && candidate.is_exact()
            {
                last.text.push_str(&candidate.text);
                last.end = candidate.end;
                return;
            }
        }
        self.runs.push(candidate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn styled(text: &str) -> StyledDocument {
        StyledDocument::build(&Document::new(text), &PaginationConfig::default())
    }

    fn assert_coverage(doc: &StyledDocument) {
        let runs = doc.runs();
        if doc.document_len() == 0 {
            assert!(runs.is_empty());
            return;
        }
        assert_eq!(runs[0].start, 0);
        for pair in runs.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
            assert!(pair[0].start < pair[0].end || !pair[0].text.is_empty());
        }
        assert_eq!(runs[runs.len() - 1].end, doc.document_len());
    }

    #[test]
    fn empty_document_has_no_runs() {
        let doc = styled("");
        assert!(doc.runs().is_empty());
        assert!(doc.is_empty());
    }

    #[test]
    fn runs_cover_document_exactly() {
        let samples = [
            "plain text",
            "one\ntwo\n\nthree",
            "# Head\nbody **bold** tail",
            "Hello  \nWorld\n",
            "\n\nleading blanks",
            "trailing blanks\n\n\n",
            "   \n  ",
        ];
        for sample in samples {
            let doc = styled(sample);
            assert_coverage(&doc);
        }
    }

    #[test]
    fn soft_break_renders_as_single_space() {
        let doc = styled("one\ntwo");
        assert_eq!(doc.plain_text(), "one two");
    }

    #[test]
    fn hard_break_renders_as_line_break() {
        let doc = styled("Hello  \nWorld");
        assert_eq!(doc.plain_text(), "Hello\nWorld");
    }

    #[test]
    fn paragraph_break_renders_as_line_break() {
        let doc = styled("one\n\ntwo");
        assert_eq!(doc.plain_text(), "one\ntwo");
    }

    #[test]
    fn header_gets_size_factor_bold_and_spacing() {
        let doc = styled("### Title");
        let run = &doc.runs()[0];
        assert_eq!(run.text, "Title");
        assert!(run.attrs.bold);
        assert_eq!(run.attrs.size, 18.0 * 1.25);
        assert_eq!(run.attrs.paragraph_spacing_before, 12.0);
        assert_eq!(run.attrs.paragraph_spacing_after, 6.0);
    }

    #[test]
    fn header_is_isolated_from_surrounding_lines() {
        let doc = styled("Intro line\n### Title\nBody line");
        assert_eq!(doc.plain_text(), "Intro line\nTitle\nBody line");
    }

    #[test]
    fn inline_emphasis_layers_onto_base_attributes() {
        let doc = styled("a **b** c");
        let flags: Vec<(bool, bool)> = doc
            .runs()
            .iter()
            .map(|r| (r.attrs.bold, r.attrs.italic))
            .collect();
        assert_eq!(flags, [(false, false), (true, false), (false, false)]);
        assert_eq!(doc.plain_text(), "a b c");
    }

    #[test]
    fn emphasis_inside_header_keeps_header_bold() {
        let doc = styled("# a *b*");
        assert!(doc.runs().iter().all(|r| r.attrs.bold));
        assert!(doc.runs().iter().any(|r| r.attrs.italic));
    }

    #[test]
    fn clip_runs_slices_exact_runs() {
        let doc = styled("one two three");
        let clipped = doc.clip_runs(4..7);
        assert_eq!(clipped.len(), 1);
        assert_eq!(clipped[0].text, "two");
        assert_eq!(clipped[0].range(), 4..7);
    }

    #[test]
    fn clip_runs_yields_empty_text_inside_stripped_runs() {
        // "**bold**": run covers 0..8 but renders 4 characters.
        let doc = styled("**bold**");
        let clipped = doc.clip_runs(3..8);
        assert_eq!(clipped.len(), 1);
        assert_eq!(clipped[0].text, "");
        assert_eq!(clipped[0].range(), 3..8);
    }

    #[test]
    fn clip_runs_keeps_whole_runs_intact() {
        let doc = styled("**bold**");
        let clipped = doc.clip_runs(0..8);
        assert_eq!(clipped.len(), 1);
        assert_eq!(clipped[0].text, "bold");
    }

    #[test]
    fn adjacent_exact_runs_merge() {
        // Line + soft joiner + line all carry body attributes and stay 1:1.
        let doc = styled("one\ntwo");
        assert_eq!(doc.runs().len(), 1);
        assert_eq!(doc.runs()[0].range(), 0..7);
        assert!(doc.runs()[0].is_exact());
    }

    #[test]
    fn whitespace_only_document_is_covered_by_textless_run() {
        let doc = styled("   \n  ");
        assert_eq!(doc.runs().len(), 1);
        assert_eq!(doc.runs()[0].range(), 0..6);
        assert_eq!(doc.runs()[0].text, "");
    }
}
