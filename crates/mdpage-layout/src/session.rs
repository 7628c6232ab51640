//! Pagination-pass orchestration for one reading surface.
//!
//! A [`ReaderSession`] owns the document, the active typography config,
//! the viewport, the page sequence, and the position tracker. Every
//! trigger runs a full synchronous pass that atomically replaces the page
//! sequence; a guard flag suppresses re-entrant triggers while a pass and
//! its position restoration are in progress. Viewport updates below the
//! tolerance thresholds are ignored so transient chrome adjustments do not
//! thrash repagination.

use std::sync::Arc;

use mdpage::{Document, PaginationConfig, StyledDocument};

use crate::paginator::{Page, Paginator, TextMeasurer, Viewport};
use crate::position::{DiscardPositions, PositionStore, PositionTracker};

/// Viewport width/height deltas at or below this are ignored.
pub const SIZE_CHANGE_TOLERANCE: f32 = 10.0;

/// Horizontal inset deltas at or below this are ignored.
pub const INSET_CHANGE_TOLERANCE: f32 = 20.0;

/// Host callbacks observing pagination and navigation.
///
/// Page numbers reported through this trait are 1-indexed.
pub trait HostDelegate {
    /// Page count of the freshly completed pass.
    fn set_page_count(&mut self, _count: usize) {}

    /// Currently displayed page (1-indexed).
    fn set_current_page(&mut self, _page_number: usize) {}

    /// The end of the document was reached while navigating forward.
    fn reading_completed(&mut self) {}
}

/// Reading direction for two-page spreads.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReadingDirection {
    /// Lower page id on the left.
    #[default]
    LeftToRight,
    /// Lower page id on the right.
    RightToLeft,
}

/// Two-page presentation of a pair of consecutive pages.
///
/// Pairing is presentation composition only: it never alters page
/// identity or ranges, and navigation moves both slots together.
#[derive(Clone, Copy, Debug)]
pub struct Spread<'a> {
    /// Page shown in the left slot.
    pub left: Option<&'a Page>,
    /// Page shown in the right slot.
    pub right: Option<&'a Page>,
}

/// Spread containing `index`, paired as `(2n, 2n + 1)`.
pub fn spread_at(pages: &[Page], index: usize, direction: ReadingDirection) -> Spread<'_> {
    let base = index & !1;
    let first = pages.get(base);
    let second = pages.get(base + 1);
    match direction {
        ReadingDirection::LeftToRight => Spread {
            left: first,
            right: second,
        },
        ReadingDirection::RightToLeft => Spread {
            left: second,
            right: first,
        },
    }
}

/// Owner of all mutable pagination state for one document.
pub struct ReaderSession {
    document: Document,
    document_key: String,
    config: PaginationConfig,
    viewport: Viewport,
    horizontal_inset: f32,
    direction: ReadingDirection,
    paginator: Paginator,
    store: Arc<dyn PositionStore>,
    tracker: PositionTracker,
    pages: Vec<Page>,
    current_page: usize,
    starting_page: Option<usize>,
    in_flight: bool,
}

impl ReaderSession {
    /// Build a session for `document` with no persisted positions.
    pub fn new(
        document: Document,
        document_key: impl Into<String>,
        config: PaginationConfig,
        viewport: Viewport,
        measurer: Arc<dyn TextMeasurer>,
    ) -> Self {
        Self {
            document,
            document_key: document_key.into(),
            config,
            viewport,
            horizontal_inset: 0.0,
            direction: ReadingDirection::default(),
            paginator: Paginator::new(measurer),
            store: Arc::new(DiscardPositions),
            tracker: PositionTracker::new(),
            pages: Vec::new(),
            current_page: 0,
            starting_page: None,
            in_flight: false,
        }
    }

    /// Install a position store and restore the tracked offset from it.
    pub fn with_position_store(mut self, store: Arc<dyn PositionStore>) -> Self {
        self.tracker = PositionTracker::restored(&*store, &self.document_key);
        self.store = store;
        self
    }

    /// Supply a 1-indexed starting page number from reading history.
    ///
    /// Consumed by the first pass, and only when no persisted offset was
    /// restored.
    pub fn with_starting_page(mut self, page_number: usize) -> Self {
        self.starting_page = Some(page_number);
        self
    }

    /// Set the reading direction used for spread pairing.
    pub fn with_reading_direction(mut self, direction: ReadingDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Current page sequence.
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Page count of the last pass.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Index of the currently displayed page.
    pub fn current_page_index(&self) -> usize {
        self.current_page
    }

    /// Currently displayed page, if any.
    pub fn current_page(&self) -> Option<&Page> {
        self.pages.get(self.current_page)
    }

    /// Spread containing the current page.
    pub fn current_spread(&self) -> Spread<'_> {
        spread_at(&self.pages, self.current_page, self.direction)
    }

    /// Active typography configuration.
    pub fn config(&self) -> &PaginationConfig {
        &self.config
    }

    /// Run a full pagination pass and restore the reading position.
    ///
    /// The page sequence is replaced atomically as observed by callers;
    /// re-entrant triggers while a pass is in flight are suppressed.
    pub fn paginate(&mut self, delegate: &mut dyn HostDelegate) {
        if self.in_flight {
            log::debug!("pagination pass already in flight, suppressing trigger");
            return;
        }
        self.in_flight = true;

        let styled = StyledDocument::build(&self.document, &self.config);
        let viewport = Viewport::new(
            self.viewport.width - self.horizontal_inset,
            self.viewport.height,
        );
        self.pages = self
            .paginator
            .paginate(&self.document, &styled, viewport, &self.config);
        log::debug!(
            "pagination pass complete: {} pages for {} chars",
            self.pages.len(),
            self.document.len()
        );

        delegate.set_page_count(self.pages.len());
        let target = self.tracker.select_page(&self.pages, self.starting_page.take());
        self.current_page = target;
        if !self.pages.is_empty() {
            self.tracker
                .commit_page(&self.pages, target, &*self.store, &self.document_key);
            delegate.set_current_page(target + 1);
        }

        self.in_flight = false;
    }

    /// Report a viewport size change.
    ///
    /// Deltas at or below [`SIZE_CHANGE_TOLERANCE`] on both axes are
    /// ignored; the stored viewport keeps the last paginated size so small
    /// adjustments cannot accumulate into silent drift.
    pub fn viewport_changed(&mut self, viewport: Viewport, delegate: &mut dyn HostDelegate) {
        let dw = (viewport.width - self.viewport.width).abs();
        let dh = (viewport.height - self.viewport.height).abs();
        if dw <= SIZE_CHANGE_TOLERANCE && dh <= SIZE_CHANGE_TOLERANCE {
            log::debug!("viewport change {:.1}x{:.1} within tolerance, ignoring", dw, dh);
            return;
        }
        self.viewport = viewport;
        self.paginate(delegate);
    }

    /// Report a left/right inset change from surrounding chrome.
    pub fn horizontal_inset_changed(&mut self, inset: f32, delegate: &mut dyn HostDelegate) {
        if (inset - self.horizontal_inset).abs() <= INSET_CHANGE_TOLERANCE {
            return;
        }
        self.horizontal_inset = inset;
        self.paginate(delegate);
    }

    /// Apply a style configuration change.
    pub fn config_changed(&mut self, config: PaginationConfig, delegate: &mut dyn HostDelegate) {
        if config == self.config {
            return;
        }
        self.config = config;
        self.paginate(delegate);
    }

    /// Advance one page; signals completion at the end of the document.
    pub fn next_page(&mut self, delegate: &mut dyn HostDelegate) -> bool {
        self.advance_by(1, delegate)
    }

    /// Go back one page.
    pub fn previous_page(&mut self, delegate: &mut dyn HostDelegate) -> bool {
        self.retreat_by(1, delegate)
    }

    /// Advance one spread (both slots move together).
    pub fn next_spread(&mut self, delegate: &mut dyn HostDelegate) -> bool {
        self.advance_by(2, delegate)
    }

    /// Go back one spread.
    pub fn previous_spread(&mut self, delegate: &mut dyn HostDelegate) -> bool {
        self.retreat_by(2, delegate)
    }

    /// Jump to an arbitrary page index.
    pub fn jump_to(&mut self, index: usize, delegate: &mut dyn HostDelegate) -> bool {
        if index >= self.pages.len() {
            return false;
        }
        self.land_on(index, delegate);
        true
    }

    fn advance_by(&mut self, step: usize, delegate: &mut dyn HostDelegate) -> bool {
        let next = self.current_page.saturating_add(step);
        if next < self.pages.len() {
            self.land_on(next, delegate);
            true
        } else {
            delegate.reading_completed();
            false
        }
    }

    fn retreat_by(&mut self, step: usize, delegate: &mut dyn HostDelegate) -> bool {
        if self.current_page == 0 || self.pages.is_empty() {
            return false;
        }
        self.land_on(self.current_page.saturating_sub(step), delegate);
        true
    }

    fn land_on(&mut self, index: usize, delegate: &mut dyn HostDelegate) {
        self.current_page = index;
        self.tracker
            .commit_page(&self.pages, index, &*self.store, &self.document_key);
        delegate.set_current_page(index + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paginator::{Bounds, MeasureSpan};
    use crate::position::MemoryPositionStore;

    /// Deterministic fake measurer: fixed characters per page.
    struct FixedFit(usize);

    impl TextMeasurer for FixedFit {
        fn fit_characters(&self, spans: &[MeasureSpan<'_>], _bounds: Bounds) -> usize {
            let available: usize = spans.iter().map(|s| s.text.chars().count()).sum();
            self.0.min(available)
        }
    }

    #[derive(Debug, Default, PartialEq)]
    struct RecordingDelegate {
        page_counts: Vec<usize>,
        current_pages: Vec<usize>,
        completed: usize,
    }

    impl HostDelegate for RecordingDelegate {
        fn set_page_count(&mut self, count: usize) {
            self.page_counts.push(count);
        }

        fn set_current_page(&mut self, page_number: usize) {
            self.current_pages.push(page_number);
        }

        fn reading_completed(&mut self) {
            self.completed += 1;
        }
    }

    fn session_for(text: &str, fit: usize) -> ReaderSession {
        ReaderSession::new(
            Document::new(text),
            "test-doc",
            PaginationConfig::default(),
            Viewport::new(400.0, 600.0),
            Arc::new(FixedFit(fit)),
        )
    }

    fn long_text() -> String {
        "lorem ipsum dolor sit amet ".repeat(20)
    }

    #[test]
    fn pass_reports_count_and_first_page() {
        let mut session = session_for(&long_text(), 60);
        let mut delegate = RecordingDelegate::default();
        session.paginate(&mut delegate);
        assert!(session.page_count() > 1);
        assert_eq!(delegate.page_counts, vec![session.page_count()]);
        assert_eq!(delegate.current_pages, vec![1]);
    }

    #[test]
    fn starting_page_is_honored_once() {
        let mut session = session_for(&long_text(), 60).with_starting_page(3);
        let mut delegate = RecordingDelegate::default();
        session.paginate(&mut delegate);
        assert_eq!(session.current_page_index(), 2);
        let anchor = session.current_page().map(|p| p.range.start).unwrap();

        // The starting page is consumed; later passes follow the offset.
        session.config_changed(
            PaginationConfig {
                font_size: 24.0,
                ..PaginationConfig::default()
            },
            &mut delegate,
        );
        let page = session.current_page().expect("page after repagination");
        assert!(page.range.start <= anchor && anchor < page.range.end);
    }

    #[test]
    fn offset_survives_config_change() {
        let mut session = session_for(&long_text(), 60);
        let mut delegate = RecordingDelegate::default();
        session.paginate(&mut delegate);
        session.next_page(&mut delegate);
        session.next_page(&mut delegate);
        let anchor = session.current_page().map(|p| p.range.start).unwrap();

        session.config_changed(
            PaginationConfig {
                font_size: 26.0,
                ..PaginationConfig::default()
            },
            &mut delegate,
        );
        let page = session.current_page().expect("page after repagination");
        assert!(page.range.start <= anchor && anchor < page.range.end);
    }

    #[test]
    fn viewport_change_within_tolerance_is_ignored() {
        let mut session = session_for(&long_text(), 60);
        let mut delegate = RecordingDelegate::default();
        session.paginate(&mut delegate);
        session.viewport_changed(Viewport::new(406.0, 594.0), &mut delegate);
        assert_eq!(delegate.page_counts.len(), 1);

        session.viewport_changed(Viewport::new(300.0, 594.0), &mut delegate);
        assert_eq!(delegate.page_counts.len(), 2);
    }

    #[test]
    fn inset_change_within_tolerance_is_ignored() {
        let mut session = session_for(&long_text(), 60);
        let mut delegate = RecordingDelegate::default();
        session.paginate(&mut delegate);
        session.horizontal_inset_changed(12.0, &mut delegate);
        assert_eq!(delegate.page_counts.len(), 1);

        session.horizontal_inset_changed(48.0, &mut delegate);
        assert_eq!(delegate.page_counts.len(), 2);
    }

    #[test]
    fn unchanged_config_does_not_repaginate() {
        let mut session = session_for(&long_text(), 60);
        let mut delegate = RecordingDelegate::default();
        session.paginate(&mut delegate);
        session.config_changed(PaginationConfig::default(), &mut delegate);
        assert_eq!(delegate.page_counts.len(), 1);
    }

    #[test]
    fn forward_navigation_signals_completion_at_end() {
        let mut session = session_for("tiny", 100);
        let mut delegate = RecordingDelegate::default();
        session.paginate(&mut delegate);
        assert_eq!(session.page_count(), 1);
        assert!(!session.next_page(&mut delegate));
        assert_eq!(delegate.completed, 1);
    }

    #[test]
    fn position_restores_across_sessions_via_store() {
        let store: Arc<MemoryPositionStore> = Arc::new(MemoryPositionStore::new());
        let text = long_text();

        let mut first = session_for(&text, 60).with_position_store(store.clone());
        let mut delegate = RecordingDelegate::default();
        first.paginate(&mut delegate);
        first.next_page(&mut delegate);
        let anchor = first.current_page().map(|p| p.range.start).unwrap();

        let mut second = session_for(&text, 60).with_position_store(store);
        second.paginate(&mut delegate);
        let page = second.current_page().expect("restored page");
        assert!(page.range.start <= anchor && anchor < page.range.end);
    }

    #[test]
    fn spread_navigation_moves_by_two() {
        let mut session = session_for(&long_text(), 40);
        let mut delegate = RecordingDelegate::default();
        session.paginate(&mut delegate);
        assert!(session.page_count() > 4);

        session.next_spread(&mut delegate);
        assert_eq!(session.current_page_index(), 2);
        session.previous_spread(&mut delegate);
        assert_eq!(session.current_page_index(), 0);
    }

    #[test]
    fn spreads_pair_by_reading_direction() {
        let mut session = session_for(&long_text(), 40);
        let mut delegate = RecordingDelegate::default();
        session.paginate(&mut delegate);

        let ltr = spread_at(session.pages(), 3, ReadingDirection::LeftToRight);
        assert_eq!(ltr.left.map(|p| p.id), Some(2));
        assert_eq!(ltr.right.map(|p| p.id), Some(3));

        let rtl = spread_at(session.pages(), 3, ReadingDirection::RightToLeft);
        assert_eq!(rtl.left.map(|p| p.id), Some(3));
        assert_eq!(rtl.right.map(|p| p.id), Some(2));
    }

    #[test]
    fn spread_at_end_has_single_occupied_slot() {
        let pages = {
            let mut session = session_for(&long_text(), 40);
            let mut delegate = RecordingDelegate::default();
            session.paginate(&mut delegate);
            session.pages().to_vec()
        };
        if pages.len() % 2 == 1 {
            let spread = spread_at(&pages, pages.len() - 1, ReadingDirection::LeftToRight);
            assert!(spread.left.is_some());
            assert!(spread.right.is_none());
        }
    }
}
