//! PDF rasterisation: render every page of a PDF to a [`Page`] via pdfium.
//!
//! The orchestrator only sees the [`PageRenderer`] trait, so tests can hand
//! it pre-built images instead of binding a native pdfium library.
//!
//! Output size is bounded in pixels (`max_rendered_pixels` on the longest
//! edge), not DPI, whatever the physical page size.

use crate::error::ExtractorError;
use crate::model::Page;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// Turns a PDF on disk into its ordered page images.
pub trait PageRenderer {
    /// Render every page in document order. Page numbers are 1-based.
    fn render(&self, pdf_path: &Path) -> Result<Vec<Page>, ExtractorError>;
}

/// pdfium-backed renderer.
pub struct PdfiumRenderer {
    pdfium: Pdfium,
    max_pixels: u32,
}

impl PdfiumRenderer {
    /// Bind to a pdfium library.
    ///
    /// Resolution order: `PDFIUM_LIB_PATH` (path to the library file), then
    /// a library next to the working directory, then the system library.
    pub fn new(max_pixels: u32) -> Result<Self, ExtractorError> {
        let bindings = match std::env::var("PDFIUM_LIB_PATH") {
            Ok(path) if !path.is_empty() => Pdfium::bind_to_library(&path),
            _ => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
                .or_else(|_| Pdfium::bind_to_system_library()),
        }
        .map_err(|e| ExtractorError::PdfiumBindingFailed(format!("{:?}", e)))?;

        Ok(Self {
            pdfium: Pdfium::new(bindings),
            max_pixels,
        })
    }
}

impl PageRenderer for PdfiumRenderer {
    fn render(&self, pdf_path: &Path) -> Result<Vec<Page>, ExtractorError> {
        let document = self
            .pdfium
            .load_pdf_from_file(pdf_path, None)
            .map_err(|e| ExtractorError::CorruptPdf {
                path: pdf_path.to_path_buf(),
                detail: format!("{:?}", e),
            })?;

        let pages = document.pages();
        info!("PDF loaded: {} pages", pages.len());

        let render_config = PdfRenderConfig::new()
            .set_target_width(self.max_pixels as i32)
            .set_maximum_height(self.max_pixels as i32);

        let mut results = Vec::with_capacity(pages.len() as usize);

        for (idx, page) in pages.iter().enumerate() {
            let number = idx + 1;
            let bitmap = page.render_with_config(&render_config).map_err(|e| {
                ExtractorError::RasterisationFailed {
                    page: number,
                    detail: format!("{:?}", e),
                }
            })?;

            let image = bitmap.as_image();
            debug!(
                "Rendered page {} → {}x{} px",
                number,
                image.width(),
                image.height()
            );

            results.push(Page { number, image });
        }

        Ok(results)
    }
}
