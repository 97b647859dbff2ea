//! Integration tests for the directory pipeline.
//!
//! Rendering, OCR and the extraction service are replaced by stubs so these
//! run without pdfium, tesseract or network access. Every page a stub
//! renderer produces is blank; its width encodes the page number so the stub
//! OCR engine can answer per page without shared state.

use image::DynamicImage;
use pdf_table_extractor::{
    CandidateFinder, EncodedPayload, ExtractionClient, ExtractionService, ExtractorError,
    OcrEngine, Orchestrator, Page, PageRenderer, PayloadEncoder, PipelineProgress, ServiceError,
    Store,
};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

// ── Stubs ────────────────────────────────────────────────────────────────────

const PAGE_BASE_WIDTH: u32 = 100;

/// Renders `pages` blank pages for any file.
struct BlankRenderer {
    pages: usize,
}

impl PageRenderer for BlankRenderer {
    fn render(&self, _pdf_path: &Path) -> Result<Vec<Page>, ExtractorError> {
        Ok((1..=self.pages)
            .map(|number| Page {
                number,
                image: DynamicImage::new_rgb8(PAGE_BASE_WIDTH + number as u32, 80),
            })
            .collect())
    }
}

/// Page 1 reads "Summary", page 2 mentions a table, anything else is empty.
struct ReportOcr;

impl OcrEngine for ReportOcr {
    fn recognize(&self, image: &DynamicImage) -> String {
        match image.width() - PAGE_BASE_WIDTH {
            1 => "Summary\nRevenue grew in every quarter.".to_string(),
            2 => "Table 1 Results by region".to_string(),
            _ => String::new(),
        }
    }
}

/// Returns a fixed response and counts how often it was asked.
struct CannedService {
    response: Result<String, ServiceError>,
    calls: Arc<AtomicUsize>,
}

impl CannedService {
    fn ok(response: &str) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let service = Self {
            response: Ok(response.to_string()),
            calls: Arc::clone(&calls),
        };
        (service, calls)
    }

    fn failing(message: &str) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let service = Self {
            response: Err(ServiceError(message.to_string())),
            calls: Arc::clone(&calls),
        };
        (service, calls)
    }
}

impl ExtractionService for CannedService {
    async fn respond(&self, _payload: &EncodedPayload, _prompt: &str) -> Result<String, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response.clone()
    }
}

#[derive(Default)]
struct RecordingProgress {
    events: Mutex<Vec<String>>,
}

impl RecordingProgress {
    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }

    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl PipelineProgress for RecordingProgress {
    fn on_run_start(&self, total_files: usize) {
        self.push(format!("start {total_files}"));
    }
    fn on_file_skipped(&self, filename: &str) {
        self.push(format!("skip {filename}"));
    }
    fn on_pages_filtered(&self, filename: &str, total_pages: usize, candidates: usize) {
        self.push(format!("filter {filename} {candidates}/{total_pages}"));
    }
    fn on_page_extracted(&self, filename: &str, page: usize, tables: usize) {
        self.push(format!("page {filename} {page} {tables}"));
    }
    fn on_page_parse_failed(&self, filename: &str, page: usize, _error: &str) {
        self.push(format!("unparseable {filename} {page}"));
    }
    fn on_file_complete(&self, filename: &str, tables: usize) {
        self.push(format!("done {filename} {tables}"));
    }
    fn on_run_complete(&self, processed_files: usize, tables: usize) {
        self.push(format!("end {processed_files} {tables}"));
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

const RESULTS_TABLE: &str = r#"[{"title": "Results", "headers": ["Region", "Revenue"], "data": [["North", 120], ["South", 95.5]]}]"#;

fn pdf_dir(files: &[(&str, &[u8])]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (name, bytes) in files {
        std::fs::write(dir.path().join(name), bytes).unwrap();
    }
    dir
}

fn orchestrator(
    service: CannedService,
) -> Orchestrator<BlankRenderer, ReportOcr, CannedService> {
    Orchestrator::new(
        CandidateFinder::new(BlankRenderer { pages: 2 }, ReportOcr, "Table"),
        ExtractionClient::new(service, "Extract the tables."),
    )
}

fn count(store: &Store, sql: &str) -> i64 {
    store.connection().query_row(sql, [], |row| row.get(0)).unwrap()
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn only_the_table_page_is_extracted_and_stored() {
    let dir = pdf_dir(&[("report.pdf", b"%PDF-1.7 report")]);
    let (service, calls) = CannedService::ok(RESULTS_TABLE);
    let mut store = Store::open_in_memory().unwrap();

    let summary = orchestrator(service).run(dir.path(), &mut store).await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(summary.files_processed, 1);
    assert_eq!(summary.pages_rendered, 2);
    assert_eq!(summary.candidate_pages, 1);
    assert_eq!(summary.tables_persisted, 1);

    let tables = store.load_tables("report.pdf").unwrap();
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].page_number, 2);
    assert_eq!(tables[0].title, "Results");
    assert_eq!(tables[0].columns, vec!["Region", "Revenue"]);
    assert_eq!(
        tables[0].rows,
        vec![vec!["North", "120"], vec!["South", "95.5"]]
    );
    assert_eq!(count(&store, r#"SELECT COUNT(*) FROM "columns""#), 2);
    assert_eq!(count(&store, r#"SELECT COUNT(*) FROM "rows""#), 2);
    assert_eq!(count(&store, "SELECT COUNT(*) FROM cell_values"), 4);
}

#[tokio::test]
async fn second_run_over_unchanged_directory_does_nothing() {
    let dir = pdf_dir(&[("report.pdf", b"%PDF-1.7 report")]);
    let mut store = Store::open_in_memory().unwrap();

    let (service, _) = CannedService::ok(RESULTS_TABLE);
    orchestrator(service).run(dir.path(), &mut store).await.unwrap();

    let (service, calls) = CannedService::ok(RESULTS_TABLE);
    let summary = orchestrator(service).run(dir.path(), &mut store).await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(summary.files_skipped, 1);
    assert_eq!(summary.files_processed, 0);
    assert_eq!(count(&store, "SELECT COUNT(*) FROM tables"), 1);
    assert_eq!(count(&store, "SELECT COUNT(*) FROM processed_files"), 1);
}

#[tokio::test]
async fn modified_file_is_processed_again() {
    let dir = pdf_dir(&[("report.pdf", b"%PDF-1.7 first edition")]);
    let mut store = Store::open_in_memory().unwrap();

    let (service, _) = CannedService::ok(RESULTS_TABLE);
    orchestrator(service).run(dir.path(), &mut store).await.unwrap();

    std::fs::write(dir.path().join("report.pdf"), b"%PDF-1.7 second edition").unwrap();
    let (service, calls) = CannedService::ok(RESULTS_TABLE);
    let summary = orchestrator(service).run(dir.path(), &mut store).await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(summary.files_processed, 1);
    assert_eq!(count(&store, "SELECT COUNT(*) FROM tables"), 2);
    assert_eq!(count(&store, "SELECT COUNT(*) FROM processed_files"), 2);
}

#[tokio::test]
async fn unparseable_response_still_registers_the_file() {
    let dir = pdf_dir(&[("report.pdf", b"%PDF-1.7 report")]);
    let (service, calls) = CannedService::ok("I could not find any tables, sorry.");
    let mut store = Store::open_in_memory().unwrap();

    let summary = orchestrator(service).run(dir.path(), &mut store).await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(summary.parse_failures, 1);
    assert_eq!(summary.tables_persisted, 0);
    assert_eq!(count(&store, "SELECT COUNT(*) FROM tables"), 0);
    assert!(store
        .is_processed("report.pdf", &pdf_table_extractor::model::content_hash(b"%PDF-1.7 report"))
        .unwrap());
}

#[tokio::test]
async fn fenced_response_is_accepted() {
    let dir = pdf_dir(&[("report.pdf", b"%PDF-1.7 report")]);
    let fenced = format!("```json\n{RESULTS_TABLE}\n```\n");
    let (service, _) = CannedService::ok(&fenced);
    let mut store = Store::open_in_memory().unwrap();

    let summary = orchestrator(service).run(dir.path(), &mut store).await.unwrap();

    assert_eq!(summary.parse_failures, 0);
    assert_eq!(summary.tables_persisted, 1);
}

#[tokio::test]
async fn single_table_object_is_stored() {
    let dir = pdf_dir(&[("report.pdf", b"%PDF-1.7 report")]);
    let (service, _) =
        CannedService::ok(r#"{"title": "Headcount", "headers": [], "data": [["Ops", 12]]}"#);
    let mut store = Store::open_in_memory().unwrap();

    let summary = orchestrator(service).run(dir.path(), &mut store).await.unwrap();

    assert_eq!(summary.parse_failures, 0);
    assert_eq!(summary.tables_persisted, 1);
    let tables = store.load_tables("report.pdf").unwrap();
    assert_eq!(tables[0].title, "Headcount");
    assert_eq!(tables[0].columns, vec!["column_1", "column_2"]);
    assert_eq!(tables[0].rows, vec![vec!["Ops", "12"]]);
}

#[tokio::test]
async fn service_failure_aborts_without_registering() {
    let dir = pdf_dir(&[("report.pdf", b"%PDF-1.7 report")]);
    let (service, _) = CannedService::failing("quota exceeded");
    let mut store = Store::open_in_memory().unwrap();

    let err = orchestrator(service)
        .run(dir.path(), &mut store)
        .await
        .unwrap_err();

    match err {
        ExtractorError::ServiceFailed { filename, page, .. } => {
            assert_eq!(filename, "report.pdf");
            assert_eq!(page, 2);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(count(&store, "SELECT COUNT(*) FROM processed_files"), 0);
    assert_eq!(count(&store, "SELECT COUNT(*) FROM tables"), 0);
}

#[tokio::test]
async fn oversized_page_aborts_before_the_service_is_called() {
    let dir = pdf_dir(&[("report.pdf", b"%PDF-1.7 report")]);
    let (service, calls) = CannedService::ok(RESULTS_TABLE);
    let mut store = Store::open_in_memory().unwrap();

    let err = orchestrator(service)
        .with_encoder(PayloadEncoder::with_budget(16))
        .run(dir.path(), &mut store)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ExtractorError::SizeBudgetExceeded { page: 2, .. }
    ));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(count(&store, "SELECT COUNT(*) FROM processed_files"), 0);
}

#[tokio::test]
async fn files_are_processed_in_name_order_with_progress_events() {
    let dir = pdf_dir(&[
        ("b.pdf", b"%PDF-1.7 bravo"),
        ("a.pdf", b"%PDF-1.7 alpha"),
        ("notes.txt", b"not a pdf"),
    ]);
    let (service, calls) = CannedService::ok(RESULTS_TABLE);
    let progress = Arc::new(RecordingProgress::default());
    let mut store = Store::open_in_memory().unwrap();

    let summary = orchestrator(service)
        .with_progress(Some(progress.clone() as Arc<dyn PipelineProgress>))
        .run(dir.path(), &mut store)
        .await
        .unwrap();

    assert_eq!(summary.files_seen, 2);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(
        progress.events(),
        vec![
            "start 2",
            "filter a.pdf 1/2",
            "page a.pdf 2 1",
            "done a.pdf 1",
            "filter b.pdf 1/2",
            "page b.pdf 2 1",
            "done b.pdf 1",
            "end 2 2",
        ]
    );

    let counts = store.table_row_counts().unwrap();
    let files: Vec<&str> = counts.iter().map(|c| c.filename.as_str()).collect();
    assert_eq!(files, vec!["a.pdf", "b.pdf"]);
}

#[tokio::test]
async fn non_pdf_content_aborts_the_run() {
    let dir = pdf_dir(&[("broken.pdf", b"<html>oops</html>")]);
    let (service, calls) = CannedService::ok(RESULTS_TABLE);
    let mut store = Store::open_in_memory().unwrap();

    let err = orchestrator(service)
        .run(dir.path(), &mut store)
        .await
        .unwrap_err();

    assert!(matches!(err, ExtractorError::NotAPdf { .. }));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn debug_dump_writes_only_candidate_pages() {
    let dir = pdf_dir(&[("report.pdf", b"%PDF-1.7 report")]);
    let out = TempDir::new().unwrap();
    let debug_dir = out.path().join("debug_pages");
    std::fs::create_dir_all(&debug_dir).unwrap();
    std::fs::write(debug_dir.join("stale.png"), b"old").unwrap();

    let finder = CandidateFinder::new(BlankRenderer { pages: 3 }, ReportOcr, "Table");
    let summary = finder.dump_candidates(dir.path(), &debug_dir).unwrap();

    assert_eq!(summary.pages_rendered, 3);
    assert_eq!(summary.debug_pages_written, 1);
    let mut names: Vec<String> = std::fs::read_dir(&debug_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names, vec!["report_page_2.png"]);

    let img = image::open(debug_dir.join("report_page_2.png")).unwrap();
    assert_eq!(img.width(), PAGE_BASE_WIDTH + 2);
}

#[test]
fn keyword_match_is_case_sensitive() {
    let dir = pdf_dir(&[("report.pdf", b"%PDF-1.7 report")]);
    let out = TempDir::new().unwrap();

    let finder = CandidateFinder::new(BlankRenderer { pages: 2 }, ReportOcr, "table");
    let summary = finder.dump_candidates(dir.path(), out.path()).unwrap();

    assert_eq!(summary.candidate_pages, 0);
    assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 0);
}
