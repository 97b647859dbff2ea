//! Error types for the pdf-table-extractor library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ExtractorError`] is **fatal**: the run cannot proceed (unreadable
//!   directory, corrupt PDF, oversized page payload, database failure).
//!   Returned as `Err(ExtractorError)` from [`crate::orchestrator::Orchestrator::run`].
//!
//! * [`ParseFailure`] is **recoverable**: the extraction service answered
//!   with something that is not a JSON table list. The page contributes zero
//!   tables, the failure is logged and reported through
//!   [`crate::progress::PipelineProgress`], and the run continues.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf-table-extractor library.
#[derive(Debug, Error)]
pub enum ExtractorError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The target directory does not exist or cannot be listed.
    #[error("Cannot read directory '{path}': {source}")]
    DirectoryUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A PDF in the target directory could not be read.
    #[error("Cannot read PDF '{path}': {source}")]
    FileUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file carries a `.pdf` name but not the PDF magic bytes.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// pdfium-render returned an error for a specific page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH or place libpdfium next to the executable."
    )]
    PdfiumBindingFailed(String),

    // ── Encoding errors ───────────────────────────────────────────────────
    /// The page could not be brought under the service payload ceiling,
    /// even at the lowest permitted quality.
    #[error(
        "Page {page} of '{filename}' exceeds the {budget}-byte payload budget \
(smallest attempt: {smallest} bytes at quality {floor})"
    )]
    SizeBudgetExceeded {
        filename: String,
        page: usize,
        budget: usize,
        smallest: usize,
        floor: u8,
    },

    /// The JPEG encoder itself failed.
    #[error("Image encoding failed for page {page}: {source}")]
    ImageEncoding {
        page: usize,
        #[source]
        source: image::ImageError,
    },

    // ── Extraction service errors ─────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The extraction service call itself failed (transport or API error).
    #[error("Extraction service failed on page {page} of '{filename}': {message}")]
    ServiceFailed {
        filename: String,
        page: usize,
        message: String,
    },

    // ── Storage errors ────────────────────────────────────────────────────
    /// Any SQLite error from the table store or the processed-file registry.
    #[error("Storage failure: {0}")]
    Storage(#[from] rusqlite::Error),

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create, clear, or write an output file or directory.
    #[error("Failed to write '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not encode the chart or a debug page image.
    #[error("Failed to save image '{path}': {source}")]
    ImageWriteFailed {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// The extraction service response could not be read as a table list.
///
/// Never fatal: the page yields zero tables.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Page {page} of '{filename}': response is not a JSON table list: {detail}")]
pub struct ParseFailure {
    pub filename: String,
    pub page: usize,
    pub detail: String,
}

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, ExtractorError>;
