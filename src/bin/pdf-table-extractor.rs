//! CLI binary for pdf-table-extractor.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `PipelineConfig` and prints progress and a run summary.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf_table_extractor::{
    extract_directory, PipelineConfig, PipelineProgress, ProgressCallback, RunSummary,
};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress: one bar over files, one log line per file and page.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Scanning");
        bar.set_message("Listing PDFs…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }
}

impl PipelineProgress for CliProgressCallback {
    fn on_run_start(&self, total_files: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} files  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_length(total_files as u64);
        self.bar.set_style(style);
        self.bar.set_prefix("Extracting");
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Found {total_files} PDF files"))
        ));
    }

    fn on_file_start(&self, filename: &str, _index: usize, _total_files: usize) {
        self.bar.set_message(filename.to_string());
    }

    fn on_file_skipped(&self, filename: &str) {
        self.bar
            .println(format!("  {} {}  {}", dim("–"), filename, dim("already processed")));
        self.bar.inc(1);
    }

    fn on_pages_filtered(&self, filename: &str, total_pages: usize, candidates: usize) {
        self.bar.println(format!(
            "  {} {}  {}",
            cyan("·"),
            filename,
            dim(&format!("{candidates}/{total_pages} candidate pages")),
        ));
    }

    fn on_page_extracted(&self, _filename: &str, page: usize, tables: usize) {
        self.bar.println(format!(
            "    {} page {:>3}  {}",
            green("✓"),
            page,
            dim(&format!("{tables} tables")),
        ));
    }

    fn on_page_parse_failed(&self, _filename: &str, page: usize, error: &str) {
        let msg = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };
        self.bar
            .println(format!("    {} page {:>3}  {}", red("✗"), page, red(&msg)));
    }

    fn on_file_complete(&self, filename: &str, tables: usize) {
        self.bar.println(format!(
            "  {} {}  {}",
            green("✔"),
            filename,
            dim(&format!("{tables} tables stored")),
        ));
        self.bar.inc(1);
    }

    fn on_run_complete(&self, _processed_files: usize, _tables: usize) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Extract tables from every PDF in ./reports into extracted_data.db
  pdf-table-extractor ./reports

  # Only show which pages would be sent (writes PNGs to ./debug_pages)
  pdf-table-extractor --debug ./reports

  # Use a specific model and database
  pdf-table-extractor --provider openai --model gpt-4.1 --db tables.db ./reports

ENVIRONMENT VARIABLES:
  ANTHROPIC_API_KEY       Anthropic API key (preferred when set)
  OPENAI_API_KEY          OpenAI API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (anthropic, openai, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  PDFIUM_LIB_PATH         Path to the libpdfium shared library

REQUIREMENTS:
  tesseract must be on PATH (or set --tesseract) for page filtering.
"#;

/// Extract tables from a directory of PDFs into SQLite using a Vision LLM.
#[derive(Parser, Debug)]
#[command(
    name = "pdf-table-extractor",
    version,
    about = "Extract tables from PDF files into SQLite using Vision LLMs",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Directory containing PDF files.
    directory: PathBuf,

    /// Dump candidate pages as PNG instead of extracting.
    #[arg(long, env = "PDF_TABLES_DEBUG")]
    debug: bool,

    /// Output directory for --debug (recreated on every run).
    #[arg(long, env = "PDF_TABLES_DEBUG_DIR", default_value = "debug_pages")]
    debug_dir: PathBuf,

    /// SQLite database path.
    #[arg(long, env = "PDF_TABLES_DB", default_value = "extracted_data.db")]
    db: PathBuf,

    /// Row-count chart output path.
    #[arg(long, env = "PDF_TABLES_CHART", default_value = "data_visualization.png")]
    chart: PathBuf,

    /// LLM model ID.
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: anthropic, openai, gemini, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_LLM_PROVIDER")]
    provider: Option<String>,

    /// Max LLM output tokens per page.
    #[arg(long, env = "PDF_TABLES_MAX_TOKENS", default_value_t = 1000)]
    max_tokens: usize,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "PDF_TABLES_TEMPERATURE", default_value_t = 0.0)]
    temperature: f32,

    /// Case-sensitive keyword a page's OCR text must contain.
    #[arg(long, env = "PDF_TABLES_KEYWORD", default_value = "Table")]
    keyword: String,

    /// Path to a text file containing a custom extraction instruction.
    #[arg(long, env = "PDF_TABLES_PROMPT")]
    prompt_file: Option<PathBuf>,

    /// Tesseract executable.
    #[arg(long, env = "PDF_TABLES_TESSERACT", default_value = "tesseract")]
    tesseract: String,

    /// Tesseract language code.
    #[arg(long, env = "PDF_TABLES_OCR_LANG", default_value = "eng")]
    ocr_lang: String,

    /// Print the run summary as JSON.
    #[arg(long)]
    json: bool,

    /// Disable progress output.
    #[arg(long, env = "PDF_TABLES_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF_TABLES_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF_TABLES_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress lines replace INFO logs unless --verbose is given.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.debug;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn PipelineProgress>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb).await?;

    let summary = extract_directory(&cli.directory, &config)
        .await
        .with_context(|| format!("Run over {} failed", cli.directory.display()))?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?
        );
    } else if !cli.quiet {
        print_summary(&cli, &summary);
    }

    Ok(())
}

fn print_summary(cli: &Cli, summary: &RunSummary) {
    if cli.debug {
        eprintln!(
            "{} {} candidate pages of {} written to {}",
            green("✔"),
            bold(&summary.debug_pages_written.to_string()),
            summary.pages_rendered,
            bold(&cli.debug_dir.display().to_string()),
        );
        return;
    }

    eprintln!(
        "{}  {}/{} files processed, {} skipped",
        if summary.parse_failures == 0 {
            green("✔")
        } else {
            cyan("⚠")
        },
        summary.files_processed,
        summary.files_seen,
        summary.files_skipped,
    );
    eprintln!(
        "   Total tables extracted: {}",
        bold(&summary.tables_persisted.to_string())
    );
    eprintln!(
        "   {} candidate pages of {} rendered  /  {} unparseable responses",
        dim(&summary.candidate_pages.to_string()),
        dim(&summary.pages_rendered.to_string()),
        dim(&summary.parse_failures.to_string()),
    );
    eprintln!(
        "   {} → {}",
        bold(&cli.db.display().to_string()),
        bold(&cli.chart.display().to_string())
    );
}

/// Map CLI args to `PipelineConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<PipelineConfig> {
    let mut builder = PipelineConfig::builder()
        .db_path(&cli.db)
        .chart_path(&cli.chart)
        .debug(cli.debug)
        .debug_dir(&cli.debug_dir)
        .table_keyword(&cli.keyword)
        .max_tokens(cli.max_tokens)
        .temperature(cli.temperature)
        .tesseract_cmd(&cli.tesseract)
        .ocr_language(&cli.ocr_lang);

    if let Some(ref path) = cli.prompt_file {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read prompt from {:?}", path))?;
        builder = builder.prompt(prompt);
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
