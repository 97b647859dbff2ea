//! Extraction service adapter: page payload + instruction → parsed table list.
//!
//! The service is reached through the [`ExtractionService`] trait so the
//! orchestrator never depends on a concrete provider; production runs use
//! [`LlmExtractionService`] over an `edgequake-llm` provider, tests use stubs.
//!
//! ## Failure policy
//!
//! * The call itself failing (network, auth, quota) is fatal for the run:
//!   [`ExtractorError::ServiceFailed`]. The file is not registered, so the
//!   next run retries it.
//! * A response that is not a JSON table list is *not* fatal: the page
//!   yields [`PageExtraction::Unparseable`] and the run moves on.
//!
//! There is no retry or backoff at either level.

use crate::error::{ExtractorError, ParseFailure};
use crate::model::{ExtractedTable, RawTable};
use crate::pipeline::encode::EncodedPayload;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, warn};

/// A failed round-trip to the extraction service.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct ServiceError(pub String);

/// One image + instruction in, free text out.
pub trait ExtractionService {
    fn respond(
        &self,
        payload: &EncodedPayload,
        prompt: &str,
    ) -> impl Future<Output = Result<String, ServiceError>>;
}

/// [`ExtractionService`] backed by a vision-capable LLM provider.
///
/// The provider is built once per process and shared by every page.
pub struct LlmExtractionService {
    provider: Arc<dyn LLMProvider>,
    options: CompletionOptions,
}

impl LlmExtractionService {
    pub fn new(provider: Arc<dyn LLMProvider>, temperature: f32, max_tokens: usize) -> Self {
        Self {
            provider,
            options: CompletionOptions {
                temperature: Some(temperature),
                max_tokens: Some(max_tokens),
                ..Default::default()
            },
        }
    }
}

impl ExtractionService for LlmExtractionService {
    async fn respond(&self, payload: &EncodedPayload, prompt: &str) -> Result<String, ServiceError> {
        let messages = vec![ChatMessage::user_with_images(
            prompt,
            vec![payload.to_image_data()],
        )];

        let start = Instant::now();
        let response = self
            .provider
            .chat(&messages, Some(&self.options))
            .await
            .map_err(|e| ServiceError(e.to_string()))?;

        debug!(
            "{} input tokens, {} output tokens, {:?}",
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );
        Ok(response.content)
    }
}

/// Outcome of extracting one candidate page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageExtraction {
    /// The response parsed; tables are stamped with filename and page.
    Tables(Vec<ExtractedTable>),
    /// The response was not a JSON table list; the page contributes nothing.
    Unparseable(ParseFailure),
}

/// Sends pages to an [`ExtractionService`] and parses what comes back.
pub struct ExtractionClient<S> {
    service: S,
    prompt: String,
}

impl<S: ExtractionService> ExtractionClient<S> {
    pub fn new(service: S, prompt: impl Into<String>) -> Self {
        Self {
            service,
            prompt: prompt.into(),
        }
    }

    /// Extract the tables on page `page` of `filename`.
    pub async fn extract(
        &self,
        payload: &EncodedPayload,
        filename: &str,
        page: usize,
    ) -> Result<PageExtraction, ExtractorError> {
        let text = self
            .service
            .respond(payload, &self.prompt)
            .await
            .map_err(|e| ExtractorError::ServiceFailed {
                filename: filename.to_string(),
                page,
                message: e.0,
            })?;

        debug!("Raw response for {} page {}: {}", filename, page, text);

        match parse_tables(&text) {
            Ok(tables) => Ok(PageExtraction::Tables(
                tables
                    .into_iter()
                    .map(|raw| ExtractedTable {
                        filename: filename.to_string(),
                        page_number: page,
                        raw,
                    })
                    .collect(),
            )),
            Err(e) => {
                let failure = ParseFailure {
                    filename: filename.to_string(),
                    page,
                    detail: e.to_string(),
                };
                warn!("{}", failure);
                Ok(PageExtraction::Unparseable(failure))
            }
        }
    }
}

static RE_JSON_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:json|JSON)?\s*\n(.*?)\n?```$").unwrap());

#[derive(Deserialize)]
#[serde(untagged)]
enum ResponseShape {
    List(Vec<RawTable>),
    Wrapped { tables: Vec<RawTable> },
    Single(RawTable),
}

/// Parse a service response into raw tables.
///
/// Accepts a JSON array of tables, an object with a `tables` array, or a
/// single table object, optionally wrapped in a Markdown code fence. Any other
/// JSON object is taken as a table with its missing fields left empty.
pub fn parse_tables(response: &str) -> Result<Vec<RawTable>, serde_json::Error> {
    let trimmed = response.trim();
    let body = match RE_JSON_FENCE.captures(trimmed) {
        Some(caps) => caps.get(1).map_or("", |m| m.as_str()),
        None => trimmed,
    };
    let shape: ResponseShape = serde_json::from_str(body)?;
    Ok(match shape {
        ResponseShape::List(tables) => tables,
        ResponseShape::Wrapped { tables } => tables,
        ResponseShape::Single(table) => vec![table],
    })
}
