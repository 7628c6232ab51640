//! Character-grid text measurement backend for `mdpage-layout`.
//!
//! Models every glyph as a fixed-advance cell derived from the run's font
//! size and simulates greedy word-wrap over the constraint rectangle.
//! The simulation is fully deterministic, which makes this backend both
//! the terminal-surface measurer and the reference fake for pagination
//! tests. Font family names are ignored: a character grid has exactly one
//! face, so unknown families degrade to it at the requested size, and
//! bold/italic runs share the regular advance.

#![cfg_attr(
    not(test),
    deny(
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::panic_in_result_fn,
        clippy::todo,
        clippy::unimplemented
    )
)]

use mdpage::TextAttributes;
use mdpage_layout::{Bounds, MeasureSpan, TextMeasurer};

/// Default glyph advance as a fraction of the font size.
pub const DEFAULT_ADVANCE_RATIO: f32 = 0.6;

/// Fixed-advance character-grid measurer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MonospaceMeasurer {
    advance_ratio: f32,
}

impl Default for MonospaceMeasurer {
    fn default() -> Self {
        Self {
            advance_ratio: DEFAULT_ADVANCE_RATIO,
        }
    }
}

impl MonospaceMeasurer {
    /// Measurer with the default advance ratio.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the glyph advance ratio.
    ///
    /// Non-positive ratios are clamped to a minimal usable cell.
    pub fn with_advance_ratio(mut self, ratio: f32) -> Self {
        self.advance_ratio = ratio.max(0.05);
        self
    }

    fn advance(&self, attrs: &TextAttributes) -> f32 {
        attrs.size * self.advance_ratio
    }

    fn cell_height(attrs: &TextAttributes) -> f32 {
        attrs.size + attrs.line_spacing
    }
}

impl TextMeasurer for MonospaceMeasurer {
    fn fit_characters(&self, spans: &[MeasureSpan<'_>], bounds: Bounds) -> usize {
        let max_width = bounds.width.max(0.0);
        let max_height = bounds.height.max(0.0);

        let mut sim = WrapSimulation {
            max_width,
            max_height,
            consumed_total: 0,
            y: 0.0,
            x: 0.0,
            line_chars: 0,
            line_height: 0.0,
            gap_before_next_line: 0.0,
        };

        let mut chars = spans
            .iter()
            .flat_map(|span| span.text.chars().map(move |c| (c, span.attrs)))
            .peekable();

        while let Some((c, attrs)) = chars.next() {
            let placed = if c == '\n' {
                sim.line_chars += 1;
                sim.line_height = sim.line_height.max(Self::cell_height(attrs));
                let closed = sim.close_line();
                if closed {
                    sim.gap_before_next_line = attrs.paragraph_spacing_after.max(0.0);
                }
                closed
            } else if c.is_whitespace() {
                sim.place_space(self.advance(attrs), Self::cell_height(attrs))
            } else {
                // Collect the whole word so wrapping decisions see its width.
                let mut word_chars = 1usize;
                let mut word_width = self.advance(attrs);
                let mut word_height = Self::cell_height(attrs);
                let mut word_gap_before = attrs.paragraph_spacing_before.max(0.0);
                let mut cell = self.advance(attrs);
                while let Some((next, next_attrs)) = chars.peek().copied() {
                    if next == '\n' || next.is_whitespace() {
                        break;
                    }
                    chars.next();
                    word_chars += 1;
                    word_width += self.advance(next_attrs);
                    word_height = word_height.max(Self::cell_height(next_attrs));
                    word_gap_before = word_gap_before.max(next_attrs.paragraph_spacing_before);
                    cell = cell.max(self.advance(next_attrs));
                }
                sim.place_word(word_chars, word_width, word_height, word_gap_before, cell)
            };
            if !placed {
                return sim.consumed_total;
            }
        }

        sim.close_line();
        sim.consumed_total
    }
}

struct WrapSimulation {
    max_width: f32,
    max_height: f32,
    /// Characters confirmed on fully fitting lines.
    consumed_total: usize,
    y: f32,
    x: f32,
    line_chars: usize,
    line_height: f32,
    /// Paragraph gap owed before the next opened line.
    gap_before_next_line: f32,
}

impl WrapSimulation {
    /// Commit the current line. Returns false when it no longer fits
    /// vertically, in which case its characters stay unconsumed.
    fn close_line(&mut self) -> bool {
        let y_after = self.y + self.gap_before_next_line + self.line_height;
        if self.line_height > 0.0 && y_after > self.max_height {
            return false;
        }
        self.y = y_after;
        self.consumed_total += self.line_chars;
        self.x = 0.0;
        self.line_chars = 0;
        self.line_height = 0.0;
        self.gap_before_next_line = 0.0;
        true
    }

    fn place_space(&mut self, advance: f32, height: f32) -> bool {
        self.line_chars += 1;
        self.line_height = self.line_height.max(height);
        if self.x + advance > self.max_width {
            // The space ends the line and is swallowed at the boundary.
            self.close_line()
        } else {
            self.x += advance;
            true
        }
    }

    fn place_word(
        &mut self,
        chars: usize,
        width: f32,
        height: f32,
        gap_before: f32,
        cell: f32,
    ) -> bool {
        if self.x == 0.0 && self.line_chars == 0 && gap_before > 0.0 {
            // Block opener (header spacing) on a fresh line.
            self.gap_before_next_line = self.gap_before_next_line.max(gap_before);
        }

        if self.x > 0.0 && self.x + width > self.max_width {
            if !self.close_line() {
                return false;
            }
        }

        if width > self.max_width {
            // A word wider than the line wraps character by character.
            for _ in 0..chars {
                if self.x > 0.0 && self.x + cell > self.max_width {
                    if !self.close_line() {
                        return false;
                    }
                }
                self.x += cell;
                self.line_chars += 1;
                self.line_height = self.line_height.max(height);
            }
            return true;
        }

        self.x += width;
        self.line_chars += chars;
        self.line_height = self.line_height.max(height);
        true
    }
}
