use std::alloc::{GlobalAlloc, Layout, System};
use std::hint::black_box;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use mdpage::{Document, PaginationConfig, StyledDocument};
use mdpage_layout::{Paginator, Viewport};
use mdpage_monospace::MonospaceMeasurer;

const VIEWPORT: Viewport = Viewport {
    width: 400.0,
    height: 700.0,
};

struct TrackingAllocator;

static CURRENT_ALLOC_BYTES: AtomicUsize = AtomicUsize::new(0);
static PEAK_ALLOC_BYTES: AtomicUsize = AtomicUsize::new(0);

#[global_allocator]
static GLOBAL_ALLOCATOR: TrackingAllocator = TrackingAllocator;

fn track_alloc(size: usize) {
    let current = CURRENT_ALLOC_BYTES.fetch_add(size, Ordering::Relaxed) + size;
    PEAK_ALLOC_BYTES.fetch_max(current, Ordering::Relaxed);
}

fn track_dealloc(size: usize) {
    CURRENT_ALLOC_BYTES.fetch_sub(size, Ordering::Relaxed);
}

unsafe impl GlobalAlloc for TrackingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { System.alloc(layout) };
        if !ptr.is_null() {
            track_alloc(layout.size());
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) };
        track_dealloc(layout.size());
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = unsafe { System.realloc(ptr, layout, new_size) };
        if !new_ptr.is_null() {
            track_dealloc(layout.size());
            track_alloc(new_size);
        }
        new_ptr
    }
}

#[derive(Clone, Debug)]
struct CaseResult {
    fixture: &'static str,
    case: &'static str,
    iterations: usize,
    min_ns: u128,
    median_ns: u128,
    max_ns: u128,
    median_peak_heap_bytes: usize,
}

fn synthetic_chapter(paragraphs: usize) -> String {
    let mut text = String::from("# Synthetic Chapter\n\n");
    for index in 0..paragraphs {
        if index % 12 == 11 {
            text.push_str("## Section Marker\n\n");
        }
        text.push_str("Paragraph ");
        text.push_str(&index.to_string());
        text.push_str(" walks through *measured* prose with a few **strong** ");
        text.push_str("claims, wraps across the grid, and closes cleanly. ");
        text.push_str("A second sentence pads the block before it ends.\n\n");
    }
    text
}

fn run_case<F>(
    fixture: &'static str,
    case: &'static str,
    warmup_iters: usize,
    measure_iters: usize,
    mut op: F,
) -> CaseResult
where
    F: FnMut() -> usize,
{
    for _ in 0..warmup_iters {
        black_box(op());
    }

    let mut time_samples = Vec::with_capacity(measure_iters);
    let mut mem_samples = Vec::with_capacity(measure_iters);
    for _ in 0..measure_iters {
        let baseline = CURRENT_ALLOC_BYTES.load(Ordering::Relaxed);
        PEAK_ALLOC_BYTES.store(baseline, Ordering::Relaxed);
        let start = Instant::now();
        black_box(op());
        time_samples.push(start.elapsed().as_nanos());
        mem_samples.push(
            PEAK_ALLOC_BYTES
                .load(Ordering::Relaxed)
                .saturating_sub(baseline),
        );
    }

    time_samples.sort_unstable();
    mem_samples.sort_unstable();

    CaseResult {
        fixture,
        case,
        iterations: measure_iters,
        min_ns: time_samples[0],
        median_ns: time_samples[time_samples.len() / 2],
        max_ns: time_samples[time_samples.len() - 1],
        median_peak_heap_bytes: mem_samples[mem_samples.len() / 2],
    }
}

fn main() {
    let quick = std::env::args().any(|arg| arg == "--quick");
    let warmup_iters = if quick { 1 } else { 3 };
    let measure_iters = if quick { 5 } else { 20 };

    println!("# mdpage benchmark");
    println!(
        "# mode={} warmup_iters={} measure_iters={}",
        if quick { "quick" } else { "full" },
        warmup_iters,
        measure_iters
    );
    println!("fixture,case,iterations,min_ns,median_ns,max_ns,median_peak_heap_bytes");

    let fixtures: &[(&'static str, usize)] =
        &[("chapter-short", 12), ("chapter-medium", 80), ("chapter-long", 400)];

    let mut results = Vec::new();
    for (fixture_key, paragraphs) in fixtures {
        let text = synthetic_chapter(*paragraphs);
        let config = PaginationConfig::default();
        let large_config = PaginationConfig {
            font_size: 28.0,
            ..PaginationConfig::default()
        };
        let paginator = Paginator::new(Arc::new(MonospaceMeasurer::new()));

        results.push(run_case(
            fixture_key,
            "build_styled_document",
            warmup_iters,
            measure_iters,
            || {
                let doc = Document::new(text.as_str());
                StyledDocument::build(&doc, &config).runs().len()
            },
        ));

        let doc = Document::new(text.as_str());
        let styled = StyledDocument::build(&doc, &config);
        results.push(run_case(
            fixture_key,
            "paginate_default_font",
            warmup_iters,
            measure_iters,
            || paginator.paginate(&doc, &styled, VIEWPORT, &config).len(),
        ));

        let styled_large = StyledDocument::build(&doc, &large_config);
        results.push(run_case(
            fixture_key,
            "paginate_large_font",
            warmup_iters,
            measure_iters,
            || {
                paginator
                    .paginate(&doc, &styled_large, VIEWPORT, &large_config)
                    .len()
            },
        ));

        results.push(run_case(
            fixture_key,
            "full_text_to_pages",
            warmup_iters,
            measure_iters,
            || {
                let doc = Document::new(text.as_str());
                let styled = StyledDocument::build(&doc, &config);
                paginator.paginate(&doc, &styled, VIEWPORT, &config).len()
            },
        ));
    }

    for result in &results {
        println!(
            "{},{},{},{},{},{},{}",
            result.fixture,
            result.case,
            result.iterations,
            result.min_ns,
            result.median_ns,
            result.max_ns,
            result.median_peak_heap_bytes
        );
    }
}
