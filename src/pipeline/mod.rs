//! Pipeline stages for PDF table extraction.
//!
//! Each submodule implements exactly one transformation step. The
//! orchestrator in [`crate::orchestrator`] chains them per file.
//!
//! ## Data Flow
//!
//! ```text
//! render ──▶ filter ──▶ encode ──▶ llm ──▶ harmonize
//! (pdfium)   (OCR)      (JPEG)     (VLM)   (rename)
//! ```
//!
//! 1. [`render`]: rasterise every page of the PDF
//! 2. [`filter`]: keep pages whose OCR text contains the table keyword
//! 3. [`encode`]: downscale and JPEG-encode under the 5 MiB ceiling
//! 4. [`llm`]: one service call per candidate page; parse JSON tables
//! 5. [`harmonize`]: map service fields onto the stored table shape

pub mod encode;
pub mod filter;
pub mod harmonize;
pub mod llm;
pub mod render;
