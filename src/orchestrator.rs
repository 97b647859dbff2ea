//! Per-file driver: hash → registry check → render → filter → encode →
//! extract → harmonise → persist + register.
//!
//! Files are handled one at a time, pages one at a time, in directory
//! (sorted filename) and page order. Everything a file produces is held in
//! memory until its last candidate page is extracted, then written together
//! with the registry record in a single transaction. A crash mid-file
//! therefore leaves the file unregistered and it is retried next run.

use crate::error::ExtractorError;
use crate::model::{Document, Page};
use crate::pipeline::encode::PayloadEncoder;
use crate::pipeline::filter::{OcrEngine, PageFilter};
use crate::pipeline::harmonize::harmonize_all;
use crate::pipeline::llm::{ExtractionClient, ExtractionService, PageExtraction};
use crate::pipeline::render::PageRenderer;
use crate::progress::{PipelineProgress, ProgressCallback};
use crate::store::Store;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Counters for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// PDF files found in the directory.
    pub files_seen: usize,
    /// Files whose tables were persisted and that are now registered.
    pub files_processed: usize,
    /// Files skipped because the registry already held their hash.
    pub files_skipped: usize,
    pub pages_rendered: usize,
    pub candidate_pages: usize,
    /// Tables written to the database.
    pub tables_persisted: usize,
    /// Pages whose response was not a JSON table list.
    pub parse_failures: usize,
    /// Page images written in debug mode.
    pub debug_pages_written: usize,
}

/// `*.pdf` files (case-insensitive) directly inside `dir`, sorted by name.
pub fn list_pdfs(dir: &Path) -> Result<Vec<PathBuf>, ExtractorError> {
    let unreadable = |source| ExtractorError::DirectoryUnreadable {
        path: dir.to_path_buf(),
        source,
    };
    let mut pdfs = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(unreadable)? {
        let path = entry.map_err(unreadable)?.path();
        let is_pdf = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if is_pdf && path.is_file() {
            pdfs.push(path);
        }
    }
    pdfs.sort();
    Ok(pdfs)
}

/// Read `path`, check the PDF magic bytes and hash its contents.
pub fn read_document(path: &Path) -> Result<Document, ExtractorError> {
    let bytes = std::fs::read(path).map_err(|source| ExtractorError::FileUnreadable {
        path: path.to_path_buf(),
        source,
    })?;
    if !bytes.starts_with(b"%PDF") {
        let mut magic = [0u8; 4];
        let n = bytes.len().min(4);
        magic[..n].copy_from_slice(&bytes[..n]);
        return Err(ExtractorError::NotAPdf {
            path: path.to_path_buf(),
            magic,
        });
    }
    Ok(Document::from_bytes(path, &bytes))
}

/// Render + OCR filter: the part of the pipeline shared by normal and debug
/// runs.
pub struct CandidateFinder<R, O> {
    renderer: R,
    ocr: O,
    keyword: String,
}

impl<R: PageRenderer, O: OcrEngine> CandidateFinder<R, O> {
    pub fn new(renderer: R, ocr: O, keyword: impl Into<String>) -> Self {
        Self {
            renderer,
            ocr,
            keyword: keyword.into(),
        }
    }

    /// Render `document` and keep its candidate pages.
    /// Returns the total page count alongside the candidates.
    pub fn candidates(&self, document: &Document) -> Result<(usize, Vec<Page>), ExtractorError> {
        let pages = self.renderer.render(&document.path)?;
        let total = pages.len();
        let candidates = PageFilter::new(&self.ocr, &self.keyword).select(pages);
        info!(
            "{}: {}/{} pages are table candidates",
            document.filename,
            candidates.len(),
            total
        );
        Ok((total, candidates))
    }

    /// Debug run: write every candidate page of every PDF in `dir` as PNG
    /// into a freshly recreated `out_dir`. Touches neither the database nor
    /// the extraction service.
    pub fn dump_candidates(&self, dir: &Path, out_dir: &Path) -> Result<RunSummary, ExtractorError> {
        let files = list_pdfs(dir)?;
        ensure_distinct_output(dir, out_dir)?;
        recreate_dir(out_dir)?;

        let mut summary = RunSummary {
            files_seen: files.len(),
            ..Default::default()
        };

        for path in &files {
            let document = read_document(path)?;
            let (total, candidates) = self.candidates(&document)?;
            summary.pages_rendered += total;
            summary.candidate_pages += candidates.len();

            let stem = Path::new(&document.filename)
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| document.filename.clone());

            for page in &candidates {
                let target = out_dir.join(format!("{}_page_{}.png", stem, page.number));
                page.image
                    .save_with_format(&target, image::ImageFormat::Png)
                    .map_err(|source| ExtractorError::ImageWriteFailed {
                        path: target.clone(),
                        source,
                    })?;
                debug!("Saved {}", target.display());
                summary.debug_pages_written += 1;
            }
        }

        info!(
            "Debug run: wrote {} candidate pages to {}",
            summary.debug_pages_written,
            out_dir.display()
        );
        Ok(summary)
    }
}

/// Refuse a debug output directory that is the input directory itself,
/// since it is wiped before writing.
fn ensure_distinct_output(dir: &Path, out_dir: &Path) -> Result<(), ExtractorError> {
    let Ok(out) = out_dir.canonicalize() else {
        // Not created yet, so it cannot hold the input.
        return Ok(());
    };
    if dir.canonicalize().is_ok_and(|input| input == out) {
        return Err(ExtractorError::InvalidConfig(format!(
            "debug directory {} is the input directory",
            out_dir.display()
        )));
    }
    Ok(())
}

fn recreate_dir(dir: &Path) -> Result<(), ExtractorError> {
    let failed = |source| ExtractorError::OutputWriteFailed {
        path: dir.to_path_buf(),
        source,
    };
    if dir.exists() {
        std::fs::remove_dir_all(dir).map_err(failed)?;
    }
    std::fs::create_dir_all(dir).map_err(failed)
}

/// Drives the full pipeline over a directory.
pub struct Orchestrator<R, O, S> {
    finder: CandidateFinder<R, O>,
    client: ExtractionClient<S>,
    encoder: PayloadEncoder,
    progress: Option<ProgressCallback>,
}

impl<R, O, S> Orchestrator<R, O, S>
where
    R: PageRenderer,
    O: OcrEngine,
    S: ExtractionService,
{
    pub fn new(finder: CandidateFinder<R, O>, client: ExtractionClient<S>) -> Self {
        Self {
            finder,
            client,
            encoder: PayloadEncoder::default(),
            progress: None,
        }
    }

    /// Replace the default 5 MiB encoder.
    pub fn with_encoder(mut self, encoder: PayloadEncoder) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn with_progress(mut self, progress: Option<ProgressCallback>) -> Self {
        self.progress = progress;
        self
    }

    fn notify(&self, event: impl FnOnce(&dyn PipelineProgress)) {
        if let Some(ref cb) = self.progress {
            event(cb.as_ref());
        }
    }

    /// Process every PDF in `dir` that the registry has not seen with its
    /// current content.
    ///
    /// # Errors
    /// Any fatal error aborts the run at the file where it happened. Files
    /// completed before that point stay persisted and registered.
    pub async fn run(&self, dir: &Path, store: &mut Store) -> Result<RunSummary, ExtractorError> {
        let files = list_pdfs(dir)?;
        info!("Found {} PDF files in {}", files.len(), dir.display());
        self.notify(|cb| cb.on_run_start(files.len()));

        let mut summary = RunSummary {
            files_seen: files.len(),
            ..Default::default()
        };

        for (i, path) in files.iter().enumerate() {
            let document = read_document(path)?;
            self.notify(|cb| cb.on_file_start(&document.filename, i + 1, files.len()));

            if store.is_processed(&document.filename, &document.hash)? {
                info!("Skipping {} (already processed)", document.filename);
                summary.files_skipped += 1;
                self.notify(|cb| cb.on_file_skipped(&document.filename));
                continue;
            }

            info!("Processing {}", path.display());
            let persisted = self.process_file(&document, store, &mut summary).await?;
            summary.files_processed += 1;
            summary.tables_persisted += persisted;
            self.notify(|cb| cb.on_file_complete(&document.filename, persisted));
        }

        info!("Total tables extracted: {}", summary.tables_persisted);
        self.notify(|cb| cb.on_run_complete(summary.files_processed, summary.tables_persisted));
        Ok(summary)
    }

    async fn process_file(
        &self,
        document: &Document,
        store: &mut Store,
        summary: &mut RunSummary,
    ) -> Result<usize, ExtractorError> {
        let (total, candidates) = self.finder.candidates(document)?;
        summary.pages_rendered += total;
        summary.candidate_pages += candidates.len();
        self.notify(|cb| cb.on_pages_filtered(&document.filename, total, candidates.len()));

        let mut extracted = Vec::new();
        for page in &candidates {
            let payload = self
                .encoder
                .encode(&page.image, &document.filename, page.number)?;

            match self
                .client
                .extract(&payload, &document.filename, page.number)
                .await?
            {
                PageExtraction::Tables(tables) => {
                    self.notify(|cb| {
                        cb.on_page_extracted(&document.filename, page.number, tables.len())
                    });
                    extracted.extend(tables);
                }
                PageExtraction::Unparseable(failure) => {
                    summary.parse_failures += 1;
                    self.notify(|cb| {
                        cb.on_page_parse_failed(
                            &document.filename,
                            page.number,
                            &failure.to_string(),
                        )
                    });
                }
            }
        }
        drop(candidates);

        info!(
            "Extracted {} tables from {}",
            extracted.len(),
            document.filename
        );
        let tables = harmonize_all(extracted);
        store.persist_file(document, &tables)?;
        Ok(tables.len())
    }
}
