//! Chapter content loading.
//!
//! Chapter text arrives either inline or as an entry inside a compressed
//! bundle on disk. Loading is the one potentially failing operation in
//! front of a pagination pass, and every failure degrades to absence: the
//! caller shows an empty state, never an error. Prefetching neighboring
//! chapters is fire-and-forget and can never affect the current pass.

extern crate alloc;

use alloc::string::String;

use std::path::PathBuf;

use crate::bundle::{BundleError, ContentBundle};

/// Where a chapter's text comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChapterSource {
    /// Chapter text supplied directly by the host.
    Inline(String),
    /// UTF-8 entry inside a compressed bundle on disk.
    Bundled {
        /// Bundle file path.
        bundle: PathBuf,
        /// Entry name inside the bundle.
        entry: String,
    },
}

impl ChapterSource {
    /// Inline chapter text.
    pub fn inline(text: impl Into<String>) -> Self {
        Self::Inline(text.into())
    }

    /// Chapter stored inside a bundle.
    pub fn bundled(bundle: impl Into<PathBuf>, entry: impl Into<String>) -> Self {
        Self::Bundled {
            bundle: bundle.into(),
            entry: entry.into(),
        }
    }
}

/// Load chapter text, reporting the failure cause.
pub fn try_load_chapter(source: &ChapterSource) -> Result<String, BundleError> {
    match source {
        ChapterSource::Inline(text) => Ok(text.clone()),
        ChapterSource::Bundled { bundle, entry } => {
            ContentBundle::open(bundle)?.read_text_entry(entry)
        }
    }
}

/// Load chapter text, degrading every failure to absence.
pub fn load_chapter(source: &ChapterSource) -> Option<String> {
    match try_load_chapter(source) {
        Ok(text) => Some(text),
        Err(err) => {
            log::warn!("chapter load failed, treating as absent: {}", err);
            None
        }
    }
}

/// Warm up a chapter likely to be read next.
///
/// Failures are logged and otherwise ignored; the currently displayed
/// pagination is never affected.
pub fn prefetch_chapter(source: &ChapterSource) {
    if let Err(err) = try_load_chapter(source) {
        log::debug!("chapter prefetch failed (ignored): {}", err);
    }
}

/// Load chapter text asynchronously, reporting the failure cause.
#[cfg(feature = "async")]
pub async fn try_load_chapter_async(source: &ChapterSource) -> Result<String, BundleError> {
    match source {
        ChapterSource::Inline(text) => Ok(text.clone()),
        ChapterSource::Bundled { bundle, entry } => {
            let bytes = tokio::fs::read(bundle).await?;
            ContentBundle::new(std::io::Cursor::new(bytes))?.read_text_entry(entry)
        }
    }
}

/// Load chapter text asynchronously, degrading every failure to absence.
#[cfg(feature = "async")]
pub async fn load_chapter_async(source: &ChapterSource) -> Option<String> {
    match try_load_chapter_async(source).await {
        Ok(text) => Some(text),
        Err(err) => {
            log::warn!("chapter load failed, treating as absent: {}", err);
            None
        }
    }
}

/// Asynchronous fire-and-forget chapter warmup.
#[cfg(feature = "async")]
pub async fn prefetch_chapter_async(source: &ChapterSource) {
    if let Err(err) = try_load_chapter_async(source).await {
        log::debug!("chapter prefetch failed (ignored): {}", err);
    }
}
