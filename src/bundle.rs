//! Compressed chapter bundles.
//!
//! Minimal reader for the stored/DEFLATE subset of the zip container
//! format used to ship chapter text. The central directory is parsed once
//! into a fixed-capacity cache; entry payloads are read on demand,
//! inflated with `miniz_oxide`, and verified against the recorded CRC32.
//!
//! Failures here are typed so callers can log them, but the chapter
//! loading layer converts every one of them into "no text".

extern crate alloc;

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use std::io::{Read, Seek, SeekFrom};

use miniz_oxide::inflate::decompress_to_vec_with_limit;

/// Maximum central-directory entries cached per bundle.
const MAX_ENTRIES: usize = 256;

/// Bytes scanned backward from end-of-file for the EOCD record.
const EOCD_SCAN_BYTES: u64 = 4096;

/// Maximum central-directory bytes read while caching entries.
const MAX_DIRECTORY_BYTES: usize = 256 * 1024;

const SIG_LOCAL_HEADER: u32 = 0x0403_4b50;
const SIG_DIRECTORY_ENTRY: u32 = 0x0201_4b50;
const SIG_END_OF_DIRECTORY: u32 = 0x0605_4b50;

const METHOD_STORED: u16 = 0;
const METHOD_DEFLATED: u16 = 8;

const EOCD_MIN_BYTES: usize = 22;
const DIRECTORY_ENTRY_FIXED_BYTES: usize = 46;
const LOCAL_HEADER_FIXED_BYTES: usize = 30;

/// Errors raised while opening a bundle or extracting an entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BundleError {
    /// Container structure was not recognizable.
    InvalidFormat(&'static str),
    /// Entry uses a compression method other than stored/DEFLATE.
    UnsupportedCompression(u16),
    /// Named entry is not present in the directory cache.
    EntryNotFound,
    /// Entry payload exceeds the configured size cap.
    EntryTooLarge {
        /// Declared payload size.
        actual: usize,
        /// Configured cap.
        limit: usize,
    },
    /// Inflated payload failed CRC32 verification.
    ChecksumMismatch,
    /// DEFLATE stream could not be decoded.
    Decompress,
    /// Entry payload is not valid UTF-8 text.
    NotText,
    /// Underlying I/O failure.
    Io(std::io::ErrorKind),
}

impl fmt::Display for BundleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFormat(what) => write!(f, "invalid bundle format: {}", what),
            Self::UnsupportedCompression(method) => {
                write!(f, "unsupported compression method {}", method)
            }
            Self::EntryNotFound => write!(f, "entry not found"),
            Self::EntryTooLarge { actual, limit } => {
                write!(f, "entry too large: {} bytes (limit {})", actual, limit)
            }
            Self::ChecksumMismatch => write!(f, "entry checksum mismatch"),
            Self::Decompress => write!(f, "entry decompression failed"),
            Self::NotText => write!(f, "entry is not UTF-8 text"),
            Self::Io(kind) => write!(f, "bundle I/O error: {:?}", kind),
        }
    }
}

impl std::error::Error for BundleError {}

impl From<std::io::Error> for BundleError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.kind())
    }
}

/// Hard size limits applied while reading bundle entries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BundleLimits {
    /// Maximum bytes for one inflated entry payload.
    pub max_entry_bytes: usize,
    /// Maximum UTF-8 byte length for an entry name.
    pub max_name_bytes: usize,
}

impl Default for BundleLimits {
    fn default() -> Self {
        Self {
            max_entry_bytes: 4 * 1024 * 1024,
            max_name_bytes: 512,
        }
    }
}

/// Cached central-directory record for one entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntryRecord {
    /// Entry name as stored in the directory.
    pub name: String,
    /// Compression method (stored or DEFLATE).
    pub method: u16,
    /// Compressed payload size in bytes.
    pub compressed_size: u32,
    /// Inflated payload size in bytes.
    pub uncompressed_size: u32,
    /// CRC32 of the inflated payload.
    pub crc32: u32,
    local_header_offset: u32,
}

/// Chapter bundle reader over any seekable byte source.
#[derive(Debug)]
pub struct ContentBundle<F: Read + Seek> {
    file: F,
    entries: heapless::Vec<EntryRecord, MAX_ENTRIES>,
    limits: BundleLimits,
}

impl ContentBundle<std::fs::File> {
    /// Open a bundle file from disk.
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self, BundleError> {
        Self::new(std::fs::File::open(path)?)
    }
}

impl<F: Read + Seek> ContentBundle<F> {
    /// Parse the central directory of `file` with default limits.
    pub fn new(file: F) -> Result<Self, BundleError> {
        Self::with_limits(file, BundleLimits::default())
    }

    /// Parse the central directory of `file` with explicit limits.
    pub fn with_limits(mut file: F, limits: BundleLimits) -> Result<Self, BundleError> {
        let (directory_offset, declared_entries) = find_end_of_directory(&mut file)?;

        file.seek(SeekFrom::Start(directory_offset))?;
        let mut directory = Vec::with_capacity(1024);
        file.by_ref()
            .take(MAX_DIRECTORY_BYTES as u64)
            .read_to_end(&mut directory)?;

        let mut entries: heapless::Vec<EntryRecord, MAX_ENTRIES> = heapless::Vec::new();
        let mut offset = 0usize;
        for _ in 0..declared_entries {
            let Some((record, next_offset)) = parse_directory_entry(&directory, offset, &limits)?
            else {
                break;
            };
            offset = next_offset;
            let Some(record) = record else {
                continue;
            };
            if entries.push(record).is_err() {
                log::warn!(
                    "bundle directory cache full at {} entries ({} declared)",
                    MAX_ENTRIES,
                    declared_entries
                );
                break;
            }
        }
        log::debug!(
            "bundle directory parsed: {} of {} entries cached",
            entries.len(),
            declared_entries
        );

        Ok(Self {
            file,
            entries,
            limits,
        })
    }

    /// Number of cached entries.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Names of all cached entries.
    pub fn entry_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    /// Directory record for `name`, if cached.
    pub fn entry(&self, name: &str) -> Option<&EntryRecord> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Read and inflate one entry payload.
    pub fn read_entry(&mut self, name: &str) -> Result<Vec<u8>, BundleError> {
        let record = self.entry(name).cloned().ok_or(BundleError::EntryNotFound)?;
        let inflated_size = record.uncompressed_size as usize;
        if inflated_size > self.limits.max_entry_bytes {
            return Err(BundleError::EntryTooLarge {
                actual: inflated_size,
                limit: self.limits.max_entry_bytes,
            });
        }

        let data_offset = self.locate_entry_data(&record)?;
        self.file.seek(SeekFrom::Start(data_offset))?;
        let mut compressed = Vec::with_capacity(record.compressed_size as usize);
        self.file
            .by_ref()
            .take(u64::from(record.compressed_size))
            .read_to_end(&mut compressed)?;
        if compressed.len() != record.compressed_size as usize {
            return Err(BundleError::InvalidFormat("truncated entry payload"));
        }

        let payload = match record.method {
            METHOD_STORED => compressed,
            METHOD_DEFLATED => decompress_to_vec_with_limit(&compressed, inflated_size)
                .map_err(|_| BundleError::Decompress)?,
            other => return Err(BundleError::UnsupportedCompression(other)),
        };
        if payload.len() != inflated_size {
            return Err(BundleError::InvalidFormat("inflated size mismatch"));
        }
        if crc32fast::hash(&payload) != record.crc32 {
            return Err(BundleError::ChecksumMismatch);
        }
        Ok(payload)
    }

    /// Read one entry payload as UTF-8 text.
    pub fn read_text_entry(&mut self, name: &str) -> Result<String, BundleError> {
        String::from_utf8(self.read_entry(name)?).map_err(|_| BundleError::NotText)
    }

    /// Resolve the payload offset behind an entry's local header.
    fn locate_entry_data(&mut self, record: &EntryRecord) -> Result<u64, BundleError> {
        let header_offset = u64::from(record.local_header_offset);
        self.file.seek(SeekFrom::Start(header_offset))?;
        let mut header = [0u8; LOCAL_HEADER_FIXED_BYTES];
        self.file.read_exact(&mut header)?;
        if u32_le(&header, 0) != Some(SIG_LOCAL_HEADER) {
            return Err(BundleError::InvalidFormat("bad local header signature"));
        }
        let name_len = u16_le(&header, 26).unwrap_or(0) as u64;
        let extra_len = u16_le(&header, 28).unwrap_or(0) as u64;
        Ok(header_offset + LOCAL_HEADER_FIXED_BYTES as u64 + name_len + extra_len)
    }
}

/// Locate the end-of-directory record and return the directory offset and
/// declared entry count.
fn find_end_of_directory<F: Read + Seek>(file: &mut F) -> Result<(u64, u16), BundleError> {
    let file_size = file.seek(SeekFrom::End(0))?;
    if file_size < EOCD_MIN_BYTES as u64 {
        return Err(BundleError::InvalidFormat("file too small"));
    }

    let scan_len = file_size.min(EOCD_SCAN_BYTES);
    file.seek(SeekFrom::Start(file_size - scan_len))?;
    let mut window = Vec::with_capacity(scan_len as usize);
    file.by_ref().take(scan_len).read_to_end(&mut window)?;

    for i in (0..=window.len().saturating_sub(EOCD_MIN_BYTES)).rev() {
        if u32_le(&window, i) == Some(SIG_END_OF_DIRECTORY) {
            let declared_entries = u16_le(&window, i + 10)
                .ok_or(BundleError::InvalidFormat("truncated directory record"))?;
            let directory_offset = u32_le(&window, i + 16)
                .ok_or(BundleError::InvalidFormat("truncated directory record"))?;
            return Ok((u64::from(directory_offset), declared_entries));
        }
    }
    Err(BundleError::InvalidFormat("missing end-of-directory record"))
}

type ParsedEntry = Option<(Option<EntryRecord>, usize)>;

/// Parse one central-directory record at `offset`.
///
/// Returns the record (or `None` for an entry that is skipped but
/// structurally valid) and the offset of the next record. A `None` outer
/// value means the directory ended early.
fn parse_directory_entry(
    directory: &[u8],
    offset: usize,
    limits: &BundleLimits,
) -> Result<ParsedEntry, BundleError> {
    if offset + DIRECTORY_ENTRY_FIXED_BYTES > directory.len() {
        return Ok(None);
    }
    if u32_le(directory, offset) != Some(SIG_DIRECTORY_ENTRY) {
        return Err(BundleError::InvalidFormat("bad directory entry signature"));
    }

    let read16 = |rel: usize| u16_le(directory, offset + rel).unwrap_or(0);
    let read32 = |rel: usize| u32_le(directory, offset + rel).unwrap_or(0);

    let method = read16(10);
    let crc32 = read32(16);
    let compressed_size = read32(20);
    let uncompressed_size = read32(24);
    let name_len = read16(28) as usize;
    let extra_len = read16(30) as usize;
    let comment_len = read16(32) as usize;
    let local_header_offset = read32(42);

    let name_start = offset + DIRECTORY_ENTRY_FIXED_BYTES;
    let next_offset = name_start + name_len + extra_len + comment_len;
    if next_offset > directory.len() {
        return Ok(None);
    }

    let record = if name_len == 0 || name_len > limits.max_name_bytes {
        log::warn!("skipping bundle entry with name length {}", name_len);
        None
    } else {
        match core::str::from_utf8(&directory[name_start..name_start + name_len]) {
            Ok(name) => Some(EntryRecord {
                name: String::from(name),
                method,
                compressed_size,
                uncompressed_size,
                crc32,
                local_header_offset,
            }),
            Err(_) => {
                log::warn!("skipping bundle entry with non-UTF-8 name");
                None
            }
        }
    };
    Ok(Some((record, next_offset)))
}

fn u16_le(buf: &[u8], offset: usize) -> Option<u16> {
    let bytes: [u8; 2] = buf.get(offset..offset + 2)?.try_into().ok()?;
    Some(u16::from_le_bytes(bytes))
}

fn u32_le(buf: &[u8], offset: usize) -> Option<u32> {
    let bytes: [u8; 4] = buf.get(offset..offset + 4)?.try_into().ok()?;
    Some(u32::from_le_bytes(bytes))
}
