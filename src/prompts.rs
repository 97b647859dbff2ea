//! Extraction instruction sent alongside every page image.
//!
//! Callers can override it via [`crate::config::PipelineConfig::prompt`];
//! the constant here is used only when no override is provided. Whatever the
//! wording, the response is parsed as a JSON array of
//! `{"title", "headers", "data"}` objects.

/// Default instruction for extracting tables from a page image.
pub const DEFAULT_EXTRACTION_PROMPT: &str = r#"Extract any tables from this image as structured JSON data. If no tables are found, return an empty list.

Return a JSON array where each element describes one table:

[
  {
    "title": "caption or heading of the table, or an empty string",
    "headers": ["column 1", "column 2"],
    "data": [["row 1 cell 1", "row 1 cell 2"], ["row 2 cell 1", "row 2 cell 2"]]
  }
]

Rules:
- Every row in "data" must have one entry per header.
- Keep cell text exactly as printed; do not compute or reformat values.
- Output ONLY the JSON array, with no commentary and no Markdown fences."#;
