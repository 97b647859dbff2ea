//! Progress-callback trait for per-file and per-page run events.
//!
//! Inject an [`Arc<dyn PipelineProgress>`] via
//! [`crate::config::PipelineConfigBuilder::progress_callback`] to receive
//! events as the orchestrator walks the directory. The CLI uses this to draw
//! its console progress lines; library callers can forward events wherever
//! they like.
//!
//! # Example
//!
//! ```rust
//! use pdf_table_extractor::{PipelineProgress, PipelineConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     tables: AtomicUsize,
//! }
//!
//! impl PipelineProgress for CountingCallback {
//!     fn on_page_extracted(&self, filename: &str, page: usize, tables: usize) {
//!         self.tables.fetch_add(tables, Ordering::SeqCst);
//!         eprintln!("{filename} p{page}: {tables} tables");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { tables: AtomicUsize::new(0) });
//!
//! let config = PipelineConfig::builder()
//!     .progress_callback(counter as Arc<dyn PipelineProgress>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the orchestrator as it processes files and pages.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Events arrive strictly in order; the run is
/// sequential.
pub trait PipelineProgress: Send + Sync {
    /// Called once after the directory listing, before any file is read.
    fn on_run_start(&self, total_files: usize) {
        let _ = total_files;
    }

    /// Called when a file's processing begins.
    fn on_file_start(&self, filename: &str, index: usize, total_files: usize) {
        let _ = (filename, index, total_files);
    }

    /// Called when a file is skipped because the registry already holds its hash.
    fn on_file_skipped(&self, filename: &str) {
        let _ = filename;
    }

    /// Called after the page filter ran for a file.
    fn on_pages_filtered(&self, filename: &str, total_pages: usize, candidates: usize) {
        let _ = (filename, total_pages, candidates);
    }

    /// Called after a candidate page returned a parseable table list.
    fn on_page_extracted(&self, filename: &str, page: usize, tables: usize) {
        let _ = (filename, page, tables);
    }

    /// Called when a page's response could not be parsed (page yields zero tables).
    fn on_page_parse_failed(&self, filename: &str, page: usize, error: &str) {
        let _ = (filename, page, error);
    }

    /// Called once a file's tables are persisted and the file is registered.
    fn on_file_complete(&self, filename: &str, tables: usize) {
        let _ = (filename, tables);
    }

    /// Called once after every file has been attempted.
    fn on_run_complete(&self, processed_files: usize, tables: usize) {
        let _ = (processed_files, tables);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl PipelineProgress for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::PipelineConfig`].
pub type ProgressCallback = Arc<dyn PipelineProgress>;
