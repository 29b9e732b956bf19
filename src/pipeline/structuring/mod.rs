//! LLM-backed Extractor.
//!
//! `LlmExtractor` turns an `ExtractionRequest` into a prompt, sends it
//! through an `LlmClient` and reads the target fields back out of the
//! JSON object in the response.

pub mod extractor;
pub mod ollama;
pub mod parser;
pub mod prompt;

pub use extractor::LlmExtractor;
pub use ollama::{MockLlmClient, OllamaClient};
pub use parser::{extract_json_block, parse_field_values, sanitize_llm_output};
pub use prompt::{build_prompt, SYSTEM_PROMPT};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    #[error("Ollama is not running at {0}")]
    Connection(String),

    #[error("Ollama returned error (status {status}): {body}")]
    Status { status: u16, body: String },

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Malformed LLM response: {0}")]
    MalformedResponse(String),
}

/// Text generation backend.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn generate(&self, model: &str, prompt: &str, system: &str) -> Result<String, LlmError>;

    async fn list_models(&self) -> Result<Vec<String>, LlmError>;

    async fn is_model_available(&self, model: &str) -> Result<bool, LlmError> {
        let models = self.list_models().await?;
        Ok(models.iter().any(|m| m.starts_with(model)))
    }
}
