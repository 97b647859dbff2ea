//! # pdf-table-extractor
//!
//! Find the tables in a directory of PDFs with a Vision Language Model and
//! store them in SQLite.
//!
//! ## Pipeline Overview
//!
//! ```text
//! dir/*.pdf
//!  │
//!  ├─ 1. Hash     MD5 of the file bytes; skip (filename, hash) pairs already stored
//!  ├─ 2. Render   rasterise every page via pdfium
//!  ├─ 3. Filter   keep pages whose OCR text contains "Table"
//!  ├─ 4. Encode   downscale to ≤1600 px, JPEG under 5 MiB (quality 85 → 20)
//!  ├─ 5. Extract  one VLM call per candidate page → JSON table list
//!  ├─ 6. Shape    headers/data → columns/rows
//!  └─ 7. Persist  tables + registry record in one SQLite transaction
//! ```
//!
//! A bar chart of row counts per stored table is written after each run.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf_table_extractor::{extract_directory, PipelineConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from ANTHROPIC_API_KEY / OPENAI_API_KEY / …
//!     let config = PipelineConfig::default();
//!     let summary = extract_directory("./reports", &config).await?;
//!     eprintln!("{} tables from {} files",
//!         summary.tables_persisted,
//!         summary.files_processed);
//!     Ok(())
//! }
//! ```
//!
//! ## Idempotency
//!
//! A file is registered only in the same transaction that stores its tables,
//! so re-running over an unchanged directory does no work and writes nothing.
//! Editing a PDF changes its hash and makes it eligible again.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod extract;
pub mod model;
pub mod orchestrator;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod report;
pub mod store;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{PipelineConfig, PipelineConfigBuilder};
pub use error::{ExtractorError, ParseFailure};
pub use extract::{extract_directory, extract_directory_sync, resolve_provider};
pub use model::{Document, ExtractedTable, Page, RawTable, Table};
pub use orchestrator::{CandidateFinder, Orchestrator, RunSummary};
pub use pipeline::encode::{EncodedPayload, PayloadEncoder};
pub use pipeline::filter::{OcrEngine, PageFilter, TesseractOcr};
pub use pipeline::harmonize::harmonize;
pub use pipeline::llm::{ExtractionClient, ExtractionService, PageExtraction, ServiceError};
pub use pipeline::render::{PageRenderer, PdfiumRenderer};
pub use progress::{NoopProgressCallback, PipelineProgress, ProgressCallback};
pub use store::Store;
