use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use super::ollama::OllamaClient;
use super::parser::{parse_field_values, sanitize_llm_output};
use super::prompt::{build_prompt, SYSTEM_PROMPT};
use super::{LlmClient, LlmError};
use crate::config::LlmSettings;
use crate::pipeline::batch_extraction::{ExtractionRequest, Extractor, ExtractorError, FieldValues};

/// Extractor backed by a prompted LLM.
///
/// One instance is shared by every organ module of a run; `max_in_flight`
/// caps the requests it has outstanding at once.
pub struct LlmExtractor {
    client: Arc<dyn LlmClient>,
    model: String,
    in_flight: Semaphore,
}

impl std::fmt::Debug for LlmExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmExtractor")
            .field("model", &self.model)
            .field("in_flight", &self.in_flight)
            .finish_non_exhaustive()
    }
}

impl LlmExtractor {
    pub fn new(client: Arc<dyn LlmClient>, model: &str, max_in_flight: usize) -> Self {
        Self {
            client,
            model: model.to_string(),
            in_flight: Semaphore::new(max_in_flight.max(1)),
        }
    }

    /// Ollama-backed extractor from run settings.
    pub fn from_settings(settings: &LlmSettings) -> Result<Self, LlmError> {
        let client = OllamaClient::new(&settings.base_url, settings.timeout_secs)?
            .with_temperature(settings.temperature);
        Ok(Self::new(Arc::new(client), &settings.model, settings.max_in_flight))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Fail fast when the backend is unreachable or lacks the model.
    pub async fn check_model(&self) -> Result<bool, LlmError> {
        self.client.is_model_available(&self.model).await
    }
}

#[async_trait]
impl Extractor for LlmExtractor {
    async fn extract(&self, request: &ExtractionRequest<'_>) -> Result<FieldValues, ExtractorError> {
        let _permit = self
            .in_flight
            .acquire()
            .await
            .map_err(|_| ExtractorError::Cancelled)?;

        let prompt = build_prompt(request);
        let raw = self.client.generate(&self.model, &prompt, SYSTEM_PROMPT).await?;
        let cleaned = sanitize_llm_output(&raw);

        tracing::debug!(
            organ = request.organ,
            stage = request.stage.as_str(),
            abnormality = request.abnormality.map(|d| d.name).unwrap_or("-"),
            response_len = cleaned.len(),
            "LLM answer received"
        );

        parse_field_values(&cleaned, request.fields)
    }
}
