//! Top-level entry points: wire the production collaborators together and
//! run one directory.
//!
//! ```text
//! extract_directory(dir, config)
//!  ├─ debug:  render → filter → dump PNGs            (no DB, no LLM)
//!  └─ normal: open DB → resolve provider → Orchestrator::run → chart → close DB
//! ```

use crate::config::PipelineConfig;
use crate::error::ExtractorError;
use crate::orchestrator::{CandidateFinder, Orchestrator, RunSummary};
use crate::pipeline::filter::TesseractOcr;
use crate::pipeline::llm::{ExtractionClient, LlmExtractionService};
use crate::pipeline::render::PdfiumRenderer;
use crate::prompts::DEFAULT_EXTRACTION_PROMPT;
use crate::report;
use crate::store::Store;
use edgequake_llm::{LLMProvider, ProviderFactory};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Run the pipeline over every PDF in `dir`.
///
/// In debug mode candidate pages are written to `config.debug_dir` and
/// nothing else happens. Otherwise tables are extracted and persisted to
/// `config.db_path`, and a row-count chart is written to `config.chart_path`.
///
/// # Errors
/// Returns the first fatal error; see [`ExtractorError`].
pub async fn extract_directory(
    dir: impl AsRef<Path>,
    config: &PipelineConfig,
) -> Result<RunSummary, ExtractorError> {
    let dir = dir.as_ref();
    let start = Instant::now();
    info!("Starting run over {}", dir.display());

    let finder = CandidateFinder::new(
        PdfiumRenderer::new(config.max_rendered_pixels)?,
        TesseractOcr::new(&config.tesseract_cmd, &config.ocr_language),
        config.table_keyword.clone(),
    );

    if config.debug {
        return finder.dump_candidates(dir, &config.debug_dir);
    }

    let provider = resolve_provider(config)?;
    let service = LlmExtractionService::new(provider, config.temperature, config.max_tokens);
    let prompt = config
        .prompt
        .clone()
        .unwrap_or_else(|| DEFAULT_EXTRACTION_PROMPT.to_string());

    let orchestrator = Orchestrator::new(finder, ExtractionClient::new(service, prompt))
        .with_progress(config.progress_callback.clone());

    let mut store = Store::open(&config.db_path)?;
    let summary = orchestrator.run(dir, &mut store).await?;
    report::write_row_count_chart(&store, &config.chart_path)?;
    store.close()?;

    info!(
        "Run complete: {}/{} files processed, {} tables, {}ms",
        summary.files_processed,
        summary.files_seen,
        summary.tables_persisted,
        start.elapsed().as_millis()
    );
    Ok(summary)
}

/// Synchronous wrapper around [`extract_directory`].
///
/// Creates a temporary tokio runtime internally.
pub fn extract_directory_sync(
    dir: impl AsRef<Path>,
    config: &PipelineConfig,
) -> Result<RunSummary, ExtractorError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ExtractorError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(extract_directory(dir, config))
}

// ── Provider resolution ──────────────────────────────────────────────────

fn create_vision_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, ExtractorError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        ExtractorError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific:
///
/// 1. **Pre-built provider** (`config.provider`), used as-is.
/// 2. **Named provider** (`config.provider_name`) with the configured model.
/// 3. **Environment pair** `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`.
/// 4. **Anthropic key** present → anthropic with the configured model.
/// 5. **Full auto-detection** via `ProviderFactory::from_env`.
///
/// Called once per run; the resulting provider serves every page.
pub fn resolve_provider(config: &PipelineConfig) -> Result<Arc<dyn LLMProvider>, ExtractorError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        return create_vision_provider(name, config.model_or_default());
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_vision_provider(&prov, &model);
        }
    }

    if std::env::var("ANTHROPIC_API_KEY").is_ok_and(|k| !k.is_empty()) {
        return create_vision_provider("anthropic", config.model_or_default());
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| ExtractorError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set ANTHROPIC_API_KEY, OPENAI_API_KEY, or pass --provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}
