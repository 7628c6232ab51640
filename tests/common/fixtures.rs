use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

static FIXTURE_NONCE: AtomicUsize = AtomicUsize::new(0);

/// Unique temp path for one test fixture file.
pub fn temp_fixture_path(tag: &str) -> PathBuf {
    let nonce = FIXTURE_NONCE.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!(
        "mdpage-fixture-{}-{}-{}.zip",
        tag,
        std::process::id(),
        nonce
    ))
}

/// Build an in-memory chapter bundle with stored (uncompressed) entries.
pub fn stored_bundle(entries: &[(&str, &[u8])]) -> Vec<u8> {
    const SIG_LOCAL_HEADER: u32 = 0x0403_4b50;
    const SIG_DIRECTORY_ENTRY: u32 = 0x0201_4b50;
    const SIG_END_OF_DIRECTORY: u32 = 0x0605_4b50;

    fn push_u16(out: &mut Vec<u8>, value: u16) {
        out.extend_from_slice(&value.to_le_bytes());
    }
    fn push_u32(out: &mut Vec<u8>, value: u32) {
        out.extend_from_slice(&value.to_le_bytes());
    }

    let mut out = Vec::new();
    let mut directory = Vec::new();

    for (name, raw) in entries {
        let local_offset = out.len() as u32;
        let crc = crc32_of(raw);

        push_u32(&mut out, SIG_LOCAL_HEADER);
        push_u16(&mut out, 20);
        push_u16(&mut out, 0);
        push_u16(&mut out, 0); // stored
        push_u32(&mut out, 0);
        push_u32(&mut out, crc);
        push_u32(&mut out, raw.len() as u32);
        push_u32(&mut out, raw.len() as u32);
        push_u16(&mut out, name.len() as u16);
        push_u16(&mut out, 0);
        out.extend_from_slice(name.as_bytes());
        out.extend_from_slice(raw);

        push_u32(&mut directory, SIG_DIRECTORY_ENTRY);
        push_u16(&mut directory, 20);
        push_u16(&mut directory, 20);
        push_u16(&mut directory, 0);
        push_u16(&mut directory, 0); // stored
        push_u32(&mut directory, 0);
        push_u32(&mut directory, crc);
        push_u32(&mut directory, raw.len() as u32);
        push_u32(&mut directory, raw.len() as u32);
        push_u16(&mut directory, name.len() as u16);
        push_u16(&mut directory, 0);
        push_u16(&mut directory, 0);
        push_u16(&mut directory, 0);
        push_u16(&mut directory, 0);
        push_u32(&mut directory, 0);
        push_u32(&mut directory, local_offset);
        directory.extend_from_slice(name.as_bytes());
    }

    let directory_offset = out.len() as u32;
    let directory_size = directory.len() as u32;
    out.extend_from_slice(&directory);

    push_u32(&mut out, SIG_END_OF_DIRECTORY);
    push_u16(&mut out, 0);
    push_u16(&mut out, 0);
    push_u16(&mut out, entries.len() as u16);
    push_u16(&mut out, entries.len() as u16);
    push_u32(&mut out, directory_size);
    push_u32(&mut out, directory_offset);
    push_u16(&mut out, 0);

    out
}

fn crc32_of(payload: &[u8]) -> u32 {
    crc32fast::hash(payload)
}

/// Synthetic markdown chapter with headers, emphasis, and a hard break.
pub fn sample_chapter(paragraphs: usize) -> String {
    let mut text = String::from("# Chapter One\n\n");
    for index in 0..paragraphs {
        if index == paragraphs / 2 {
            text.push_str("## Midpoint\n\n");
        }
        text.push_str("The reader settles in as paragraph ");
        text.push_str(&index.to_string());
        text.push_str(" unfolds across the page. It carries *just enough* prose ");
        text.push_str("to wrap over **several lines** of the content grid, and it ");
        text.push_str("ends with a complete sentence.\n\n");
    }
    text.push_str("Closing line with a held break  \nand its continuation.\n");
    text
}
