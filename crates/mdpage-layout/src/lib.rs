//! Pagination engine, position tracking, and session orchestration for `mdpage`.

#![cfg_attr(
    not(test),
    deny(
        clippy::disallowed_methods,
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::panic_in_result_fn,
        clippy::todo,
        clippy::unimplemented
    )
)]

mod paginator;
mod position;
mod session;

pub use paginator::{
    Bounds, MeasureSpan, Page, Paginator, TextMeasurer, Viewport, MAX_PAGES, MIN_CONTENT_EXTENT,
};
pub use position::{
    DiscardPositions, FilePositionStore, MemoryPositionStore, PositionStore, PositionTracker,
};
pub use session::{
    spread_at, HostDelegate, ReaderSession, ReadingDirection, Spread, INSET_CHANGE_TOLERANCE,
    SIZE_CHANGE_TOLERANCE,
};
