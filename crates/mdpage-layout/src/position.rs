//! Reading-position tracking and persistence.
//!
//! The tracker owns one character offset per open document — the only
//! core state that outlives a pagination pass. After each pass it selects
//! the page containing the tracked offset (or an externally supplied
//! starting page number on a first open), and every navigation commit
//! re-anchors the offset to the landed page's start and persists it
//! through a [`PositionStore`] keyed by document identity.

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::paginator::Page;

/// Storage hooks for persisted reading positions.
///
/// Both operations default to no-ops so hosts without persistence can
/// pass a unit implementation.
pub trait PositionStore: Send + Sync {
    /// Load the persisted offset for `key`, if any.
    fn load_offset(&self, _key: &str) -> Option<usize> {
        None
    }

    /// Persist `offset` for `key`.
    fn store_offset(&self, _key: &str, _offset: usize) {}
}

/// Position store that remembers nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct DiscardPositions;

impl PositionStore for DiscardPositions {}

/// In-memory position store for hosts and tests.
#[derive(Debug, Default)]
pub struct MemoryPositionStore {
    offsets: Mutex<HashMap<String, usize>>,
}

impl MemoryPositionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl PositionStore for MemoryPositionStore {
    fn load_offset(&self, key: &str) -> Option<usize> {
        self.offsets.lock().ok()?.get(key).copied()
    }

    fn store_offset(&self, key: &str, offset: usize) {
        if let Ok(mut offsets) = self.offsets.lock() {
            offsets.insert(key.to_string(), offset);
        }
    }
}

const POSITION_SCHEMA_VERSION: u8 = 1;
const DEFAULT_MAX_POSITION_FILE_BYTES: usize = 4 * 1024;
static POSITION_WRITE_NONCE: AtomicUsize = AtomicUsize::new(0);

/// Persisted position payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct PersistedPosition {
    version: u8,
    offset: u64,
}

/// File-backed position store.
///
/// Position paths are deterministic by document key:
/// `<root>/<sanitized-key>-<fnv64-hex>.json`. Payloads use a JSON envelope
/// with a schema version and a size cap on both reads and writes. When
/// I/O, decode, or size checks fail, operations return `None`/no-op
/// instead of bubbling errors.
#[derive(Clone, Debug)]
pub struct FilePositionStore {
    root: PathBuf,
    max_file_bytes: usize,
}

impl FilePositionStore {
    /// Create a store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_file_bytes: DEFAULT_MAX_POSITION_FILE_BYTES,
        }
    }

    /// Set the maximum allowed position file size in bytes.
    ///
    /// Values of `0` are treated as `1` to keep the cap explicit.
    pub fn with_max_file_bytes(mut self, max_file_bytes: usize) -> Self {
        self.max_file_bytes = max_file_bytes.max(1);
        self
    }

    /// Root directory for position files.
    pub fn store_root(&self) -> &Path {
        &self.root
    }

    /// Deterministic position path for a document key.
    pub fn position_path(&self, key: &str) -> PathBuf {
        let mut stem = String::with_capacity(64);
        for c in key.chars().take(40) {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                stem.push(c);
            } else {
                stem.push('-');
            }
        }
        if stem.is_empty() {
            stem.push_str("doc");
        }
        self.root
            .join(format!("{}-{:016x}.json", stem, fnv64(key.as_bytes())))
    }
}

impl PositionStore for FilePositionStore {
    fn load_offset(&self, key: &str) -> Option<usize> {
        let path = self.position_path(key);
        let max_file_bytes = self.max_file_bytes as u64;
        if fs::metadata(&path).ok()?.len() > max_file_bytes {
            return None;
        }

        let file = fs::File::open(path).ok()?;
        let mut payload = Vec::with_capacity(64);
        file.take(max_file_bytes.saturating_add(1))
            .read_to_end(&mut payload)
            .ok()?;
        if payload.len() > self.max_file_bytes {
            return None;
        }
        let persisted: PersistedPosition = serde_json::from_slice(&payload).ok()?;
        if persisted.version != POSITION_SCHEMA_VERSION {
            return None;
        }
        usize::try_from(persisted.offset).ok()
    }

    fn store_offset(&self, key: &str, offset: usize) {
        let final_path = self.position_path(key);
        let Some(parent) = final_path.parent() else {
            return;
        };
        if fs::create_dir_all(parent).is_err() {
            return;
        }

        let nonce = POSITION_WRITE_NONCE.fetch_add(1, Ordering::Relaxed);
        let temp_path = parent.join(format!(
            ".position.tmp-{}-{}",
            std::process::id(),
            nonce
        ));
        let persisted = PersistedPosition {
            version: POSITION_SCHEMA_VERSION,
            offset: offset as u64,
        };
        let Ok(payload) = serde_json::to_vec(&persisted) else {
            return;
        };
        if payload.len() > self.max_file_bytes {
            return;
        }

        let wrote = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_path)
            .and_then(|mut file| file.write_all(&payload));
        if wrote.is_err() {
            let _ = fs::remove_file(&temp_path);
            return;
        }
        if fs::rename(&temp_path, &final_path).is_err() {
            let _ = fs::remove_file(&temp_path);
        }
    }
}

fn fnv64(payload: &[u8]) -> u64 {
    let mut hash = 0xcbf29ce484222325u64;
    for b in payload {
        hash ^= u64::from(*b);
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

/// Tracked reading position for one open document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PositionTracker {
    offset: Option<usize>,
}

impl PositionTracker {
    /// Tracker with no stored position.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracker restored from a position store.
    pub fn restored(store: &dyn PositionStore, key: &str) -> Self {
        Self {
            offset: store.load_offset(key),
        }
    }

    /// Currently tracked offset, if any.
    pub fn offset(&self) -> Option<usize> {
        self.offset
    }

    /// Select the target page after a completed pagination pass.
    ///
    /// With no tracked offset and an externally supplied 1-indexed
    /// starting page number (a first open driven by reading history), the
    /// target is `min(starting_page - 1, page_count - 1)`. Otherwise the
    /// target is the last page whose range starts at or before the
    /// tracked offset, defaulting to page 0.
    pub fn select_page(&self, pages: &[Page], starting_page: Option<usize>) -> usize {
        if pages.is_empty() {
            return 0;
        }
        match (self.offset, starting_page) {
            (None, Some(page_number)) => page_number.saturating_sub(1).min(pages.len() - 1),
            (Some(offset), _) => pages
                .iter()
                .rposition(|p| p.range.start <= offset)
                .unwrap_or(0),
            (None, None) => 0,
        }
    }

    /// Anchor the tracked offset to the landed page and persist it.
    pub fn commit_page(
        &mut self,
        pages: &[Page],
        index: usize,
        store: &dyn PositionStore,
        key: &str,
    ) {
        let Some(page) = pages.get(index) else {
            return;
        };
        self.offset = Some(page.range.start);
        store.store_offset(key, page.range.start);
    }
}
