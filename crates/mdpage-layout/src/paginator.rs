//! Viewport-aware line-breaking pagination.
//!
//! The paginator walks the styled-run suffix of a document through an
//! injected [`TextMeasurer`] and cuts viewport-sized pages, preferring a
//! clean boundary when one exists in the tail of the tentative range.
//! Fit counts are styled-character counts applied to raw offsets 1:1; the
//! emitted page sequence is always contiguous over the raw document
//! regardless of that approximation.

use core::ops::Range;
use std::sync::Arc;

use mdpage::{Document, PaginationConfig, StyleRun, StyledDocument, TextAttributes};

/// Content rectangles with a side below this are unusable for layout.
pub const MIN_CONTENT_EXTENT: f32 = 16.0;

/// Hard cap on pages emitted by one pass.
pub const MAX_PAGES: usize = 10_000;

/// Percentage of a tentative page range scanned backward for a clean break.
const BREAK_SCAN_PERCENT: usize = 15;

/// Sentence terminators recognized by the clean-break search.
const SENTENCE_TERMINATORS: [char; 3] = ['.', '!', '?'];

/// Viewport of the content area, net of system chrome.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Viewport {
    /// Content width.
    pub width: f32,
    /// Content height.
    pub height: f32,
}

impl Viewport {
    /// Build a viewport.
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Measurement constraint rectangle handed to a [`TextMeasurer`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    /// Usable width.
    pub width: f32,
    /// Usable height.
    pub height: f32,
}

/// Borrowed styled text handed to a measurer.
#[derive(Clone, Copy, Debug)]
pub struct MeasureSpan<'a> {
    /// Rendered text.
    pub text: &'a str,
    /// Resolved attributes for `text`.
    pub attrs: &'a TextAttributes,
}

/// Platform text-measurement capability.
///
/// Implemented once per rendering backend and injected into the
/// paginator, keeping the breaking algorithm engine-agnostic and
/// unit-testable with a deterministic fake.
pub trait TextMeasurer: Send + Sync {
    /// Count how many characters of `spans` fit inside `bounds` under
    /// word-wrap, without hyphenation.
    fn fit_characters(&self, spans: &[MeasureSpan<'_>], bounds: Bounds) -> usize;
}

/// One viewport-sized chunk of the document.
#[derive(Clone, Debug, PartialEq)]
pub struct Page {
    /// Sequential id, starting at 0.
    pub id: usize,
    /// Source character range.
    pub range: Range<usize>,
    /// Styled content restricted to `range`.
    pub content: Vec<StyleRun>,
    /// Raw text slice for `range`.
    pub raw: String,
}

impl Page {
    /// Range length in characters.
    pub fn len(&self) -> usize {
        self.range.end - self.range.start
    }

    /// True for a zero-length range.
    pub fn is_empty(&self) -> bool {
        self.range.start >= self.range.end
    }

    /// True when `offset` falls inside this page's range.
    pub fn contains(&self, offset: usize) -> bool {
        self.range.start <= offset && offset < self.range.end
    }
}

/// Line-breaking paginator over an injected measurement capability.
#[derive(Clone)]
pub struct Paginator {
    measurer: Arc<dyn TextMeasurer>,
}

impl core::fmt::Debug for Paginator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Paginator").finish_non_exhaustive()
    }
}

impl Paginator {
    /// Build a paginator around a measurement backend.
    pub fn new(measurer: Arc<dyn TextMeasurer>) -> Self {
        Self { measurer }
    }

    /// Break `doc` into pages for `viewport` under `config`.
    ///
    /// An empty document yields zero pages. A degenerate viewport yields
    /// one page spanning the whole document. Otherwise pages are emitted
    /// in increasing id and offset order, contiguous from offset 0 to the
    /// document length, capped at [`MAX_PAGES`].
    pub fn paginate(
        &self,
        doc: &Document,
        styled: &StyledDocument,
        viewport: Viewport,
        config: &PaginationConfig,
    ) -> Vec<Page> {
        if doc.is_empty() {
            return Vec::new();
        }

        let config = config.clamped();
        let bounds = Bounds {
            width: viewport.width - 2.0 * config.horizontal_padding,
            height: viewport.height - 2.0 * config.vertical_padding,
        };
        if bounds.width < MIN_CONTENT_EXTENT || bounds.height < MIN_CONTENT_EXTENT {
            log::debug!(
                "degenerate content rect {:.1}x{:.1}, emitting whole document as one page",
                bounds.width,
                bounds.height
            );
            return vec![make_page(0, 0..doc.len(), styled, doc)];
        }

        let mut pages: Vec<Page> = Vec::with_capacity(8);
        let mut loc = 0usize;
        while loc < doc.len() {
            if pages.len() >= MAX_PAGES {
                log::warn!("page cap of {} reached at offset {}", MAX_PAGES, loc);
                break;
            }

            let spans = suffix_spans(styled, loc);
            if spans.is_empty() {
                // Only unrendered characters remain (trailing separators,
                // stripped markup). Fold them into the last page so the
                // emitted ranges still cover the whole document.
                match pages.pop() {
                    Some(last) => {
                        let id = last.id;
                        let start = last.range.start;
                        pages.push(make_page(id, start..doc.len(), styled, doc));
                    }
                    None => pages.push(make_page(0, 0..doc.len(), styled, doc)),
                }
                break;
            }
            let fit = self.measurer.fit_characters(&spans, bounds);
            if fit == 0 {
                log::warn!("measurer fit zero characters at offset {}, stopping pass", loc);
                break;
            }

            let tentative_end = loc.saturating_add(fit);
            let end = if tentative_end >= doc.len() {
                doc.len()
            } else {
                clean_break(doc, loc, tentative_end)
            };
            pages.push(make_page(pages.len(), loc..end, styled, doc));
            loc = end;
        }
        pages
    }
}

fn make_page(id: usize, range: Range<usize>, styled: &StyledDocument, doc: &Document) -> Page {
    Page {
        id,
        range: range.clone(),
        content: styled.clip_runs(range.clone()),
        raw: doc.slice(range).into(),
    }
}

/// Styled suffix of the document starting at raw offset `loc`.
///
/// A run the offset lands inside contributes its remaining text only when
/// it maps 1:1; a partially consumed stripped run contributes nothing.
fn suffix_spans(styled: &StyledDocument, loc: usize) -> Vec<MeasureSpan<'_>> {
    let mut spans = Vec::with_capacity(8);
    for run in styled.runs() {
        if run.end <= loc {
            continue;
        }
        if run.start >= loc {
            if !run.text.is_empty() {
                spans.push(MeasureSpan {
                    text: &run.text,
                    attrs: &run.attrs,
                });
            }
        } else if run.is_exact() {
            let rest = &run.text[byte_offset_for_char(&run.text, loc - run.start)..];
            if !rest.is_empty() {
                spans.push(MeasureSpan {
                    text: rest,
                    attrs: &run.attrs,
                });
            }
        }
    }
    spans
}

fn byte_offset_for_char(text: &str, char_index: usize) -> usize {
    text.char_indices()
        .nth(char_index)
        .map_or(text.len(), |(byte, _)| byte)
}

/// Search the tail of `[start, tentative_end)` for a clean break.
///
/// Only the last [`BREAK_SCAN_PERCENT`] of the range by character count is
/// scanned, in priority order: line/paragraph boundary, sentence
/// terminator plus up to one trailing character, whitespace boundary.
/// Without a match the tentative end stands, even mid-word.
fn clean_break(doc: &Document, start: usize, tentative_end: usize) -> usize {
    let span = tentative_end - start;
    let window_len = (span * BREAK_SCAN_PERCENT / 100).max(1);
    let window_start = tentative_end - window_len;
    let window: Vec<char> = doc.slice(window_start..tentative_end).chars().collect();

    let boundary_after = |idx: usize| window_start + idx + 1;

    // Line or paragraph boundary.
    for idx in (0..window.len()).rev() {
        let c = window[idx];
        let lone_carriage_return = c == '\r' && window.get(idx + 1) != Some(&'\n');
        if c == '\n' || lone_carriage_return {
            return boundary_after(idx);
        }
    }

    // Sentence terminator, plus up to one trailing closer.
    for idx in (0..window.len()).rev() {
        if SENTENCE_TERMINATORS.contains(&window[idx]) {
            let mut boundary = boundary_after(idx);
            if boundary < tentative_end
                && doc.char_at(boundary).is_some_and(is_sentence_trailer)
            {
                boundary += 1;
            }
            return boundary;
        }
    }

    // Whitespace boundary.
    for idx in (0..window.len()).rev() {
        if window[idx].is_whitespace() {
            return boundary_after(idx);
        }
    }

    tentative_end
}

fn is_sentence_trailer(c: char) -> bool {
    c.is_whitespace() || matches!(c, '"' | '\'' | ')' | ']' | '}' | '\u{BB}' | '\u{201D}' | '\u{2019}')
}
