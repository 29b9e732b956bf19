//! The Extractor capability consumed by the cascade.
//!
//! Anything that can answer "given this text, fill these fields" plugs in
//! here: a prompted LLM, a rule engine, a scripted test double.

use async_trait::async_trait;

use super::error::ExtractorError;
use super::types::{ExtractionRequest, FieldValues};

#[async_trait]
pub trait Extractor: Send + Sync {
    /// Fill the request's target fields from its text.
    ///
    /// Implementations may return extra fields; the caller only reads the
    /// ones it declared.
    async fn extract(&self, request: &ExtractionRequest<'_>) -> Result<FieldValues, ExtractorError>;
}
