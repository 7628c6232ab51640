//! Markdown styled-text model and pagination core for reader surfaces.
//!
//! This crate owns the document side of the pipeline: raw chapter text is
//! segmented into blocks ([`segment`]), inline emphasis is parsed per line
//! ([`inline`]), and the results are assembled into a document-wide,
//! gapless [`StyleRun`] sequence ([`styled`]) addressed by character
//! offsets into one immutable [`Document`]. Viewport-aware page breaking
//! and position tracking live in the `mdpage-layout` crate; measurement
//! backends provide the `TextMeasurer` capability it consumes.
//!
//! With the `std` feature (default) the crate also provides chapter
//! content loading, including extraction from compressed bundles
//! ([`bundle`], [`loader`]). The `async` feature adds async loading via
//! `tokio`.

#![cfg_attr(not(feature = "std"), no_std)]
#![cfg_attr(docsrs, feature(doc_cfg))]
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

extern crate alloc;

pub mod config;
pub mod document;
pub mod inline;
pub mod segment;
pub mod styled;

#[cfg(feature = "std")]
pub mod bundle;
#[cfg(feature = "std")]
pub mod loader;

pub use config::{resolved_config, FontFamily, MemorySettings, PaginationConfig, SettingsStore};
pub use document::Document;
pub use inline::{style_line, InlineSpan, InlineSpans};
pub use segment::{segment_document, Joiner, Segment, SegmentKind};
pub use styled::{
    body_attributes, header_attributes, Foreground, StyleRun, StyledDocument, TextAttributes,
    HEADER_SIZE_FACTORS,
};

#[cfg(feature = "std")]
pub use bundle::{BundleError, BundleLimits, ContentBundle, EntryRecord};
#[cfg(feature = "std")]
pub use loader::{load_chapter, prefetch_chapter, try_load_chapter, ChapterSource};
