//! Candidate-page selection: keep pages whose OCR text mentions a table.
//!
//! The heuristic favours precision: a page is kept only if the recognised
//! text contains the literal keyword (default `"Table"`, case-sensitive).
//! Tables without such a caption are missed; a false positive costs one extra
//! extraction call.

use crate::model::Page;
use image::{DynamicImage, ImageFormat};
use std::process::Command;
use tracing::{debug, warn};

/// Best-effort text recognition over a page image.
///
/// Implementations never fail: an engine that cannot read the page returns
/// an empty string, which simply never matches the keyword.
pub trait OcrEngine {
    fn recognize(&self, image: &DynamicImage) -> String;
}

/// Runs the `tesseract` command-line tool on a temporary PNG.
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    command: String,
    language: String,
}

impl TesseractOcr {
    pub fn new(command: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            language: language.into(),
        }
    }

    fn run(&self, image: &DynamicImage) -> Result<String, String> {
        let tmp = tempfile::Builder::new()
            .prefix("ocr-page-")
            .suffix(".png")
            .tempfile()
            .map_err(|e| format!("tempfile: {e}"))?;
        image
            .save_with_format(tmp.path(), ImageFormat::Png)
            .map_err(|e| format!("write page image: {e}"))?;

        let output = Command::new(&self.command)
            .arg(tmp.path())
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .output()
            .map_err(|e| format!("spawn {}: {e}", self.command))?;

        if !output.status.success() {
            return Err(format!(
                "{} exited with {}: {}",
                self.command,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for TesseractOcr {
    fn default() -> Self {
        Self::new("tesseract", "eng")
    }
}

impl OcrEngine for TesseractOcr {
    fn recognize(&self, image: &DynamicImage) -> String {
        match self.run(image) {
            Ok(text) => text,
            Err(e) => {
                warn!("OCR failed, treating page as text-less: {}", e);
                String::new()
            }
        }
    }
}

/// Keyword filter over OCR text.
pub struct PageFilter<'a> {
    ocr: &'a dyn OcrEngine,
    keyword: &'a str,
}

impl<'a> PageFilter<'a> {
    pub fn new(ocr: &'a dyn OcrEngine, keyword: &'a str) -> Self {
        Self { ocr, keyword }
    }

    /// Order-preserving subset of `pages` whose OCR text contains the keyword.
    pub fn select(&self, pages: Vec<Page>) -> Vec<Page> {
        pages
            .into_iter()
            .filter(|page| {
                let text = self.ocr.recognize(&page.image);
                let keep = text.contains(self.keyword);
                debug!(
                    "Page {}: {} OCR chars, candidate={}",
                    page.number,
                    text.len(),
                    keep
                );
                keep
            })
            .collect()
    }
}
