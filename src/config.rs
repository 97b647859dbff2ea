//! Configuration for a table-extraction run.
//!
//! All run behaviour is controlled through [`PipelineConfig`], built via its
//! [`PipelineConfigBuilder`]. The payload budget constants live in
//! [`crate::pipeline::encode`] and are deliberately not configurable.

use crate::error::ExtractorError;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Default SQLite database path, relative to the working directory.
pub const DEFAULT_DB_PATH: &str = "extracted_data.db";

/// Default chart output path.
pub const DEFAULT_CHART_PATH: &str = "data_visualization.png";

/// Default directory for debug page dumps.
pub const DEFAULT_DEBUG_DIR: &str = "debug_pages";

/// Default vision model.
pub const DEFAULT_MODEL: &str = "claude-3-opus-20240229";

/// Configuration for a table-extraction run.
///
/// # Example
/// ```rust
/// use pdf_table_extractor::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .db_path("tables.db")
///     .debug(true)
///     .build()
///     .unwrap();
/// assert!(config.debug);
/// ```
#[derive(Clone)]
pub struct PipelineConfig {
    /// SQLite database holding tables and the processed-file registry.
    pub db_path: PathBuf,

    /// Where the row-count chart is written after a normal run.
    pub chart_path: PathBuf,

    /// Debug mode: dump candidate pages to `debug_dir`, skip extraction
    /// and persistence. Default: false.
    pub debug: bool,

    /// Directory recreated on every debug run.
    pub debug_dir: PathBuf,

    /// Longest edge of a rendered page in pixels. Default: 2000.
    ///
    /// The encoder downscales to 1600 px anyway; rendering a little larger
    /// gives the resampling filter something to work with and helps OCR.
    pub max_rendered_pixels: u32,

    /// Case-sensitive keyword a page's OCR text must contain. Default: "Table".
    pub table_keyword: String,

    /// LLM model identifier. If None, uses [`DEFAULT_MODEL`].
    pub model: Option<String>,

    /// LLM provider name (e.g. "anthropic", "openai", "ollama").
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature. Default: 0.0.
    pub temperature: f32,

    /// Maximum tokens the model may generate per page. Default: 1000.
    pub max_tokens: usize,

    /// Custom extraction instruction. If None, uses the built-in prompt.
    pub prompt: Option<String>,

    /// Tesseract executable. Default: "tesseract".
    pub tesseract_cmd: String,

    /// Tesseract language code. Default: "eng".
    pub ocr_language: String,

    /// Optional progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            chart_path: PathBuf::from(DEFAULT_CHART_PATH),
            debug: false,
            debug_dir: PathBuf::from(DEFAULT_DEBUG_DIR),
            max_rendered_pixels: 2000,
            table_keyword: "Table".to_string(),
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.0,
            max_tokens: 1000,
            prompt: None,
            tesseract_cmd: "tesseract".to_string(),
            ocr_language: "eng".to_string(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("db_path", &self.db_path)
            .field("chart_path", &self.chart_path)
            .field("debug", &self.debug)
            .field("debug_dir", &self.debug_dir)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("table_keyword", &self.table_keyword)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("tesseract_cmd", &self.tesseract_cmd)
            .field("ocr_language", &self.ocr_language)
            .finish()
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }

    /// Model name used when none was configured.
    pub fn model_or_default(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }
}

/// Builder for [`PipelineConfig`].
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.db_path = path.into();
        self
    }

    pub fn chart_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.chart_path = path.into();
        self
    }

    pub fn debug(mut self, v: bool) -> Self {
        self.config.debug = v;
        self
    }

    pub fn debug_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.debug_dir = path.into();
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn table_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.config.table_keyword = keyword.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.prompt = Some(prompt.into());
        self
    }

    pub fn tesseract_cmd(mut self, cmd: impl Into<String>) -> Self {
        self.config.tesseract_cmd = cmd.into();
        self
    }

    pub fn ocr_language(mut self, lang: impl Into<String>) -> Self {
        self.config.ocr_language = lang.into();
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, ExtractorError> {
        let c = &self.config;
        if c.table_keyword.is_empty() {
            return Err(ExtractorError::InvalidConfig(
                "table keyword must not be empty".into(),
            ));
        }
        if c.max_tokens == 0 {
            return Err(ExtractorError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if c.debug_dir.as_os_str().is_empty() {
            return Err(ExtractorError::InvalidConfig(
                "debug directory must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}
