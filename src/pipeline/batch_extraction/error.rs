//! Error types for the extraction pipeline.
//!
//! `ExtractorError` is field-level and never escapes a cascade on its own;
//! `ConfigurationError` fails a batch before any Extractor call;
//! `PipelineError` is what a batch run returns.

use thiserror::Error;

use crate::models::{ReportId, Stage};
use crate::pipeline::structuring::LlmError;
use crate::table::TableError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractorError {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("JSON parsing error: {0}")]
    JsonParsing(String),

    #[error("Missing field '{0}' in extractor output")]
    MissingField(String),

    #[error("Invalid value for field '{field}': {value}")]
    InvalidField { field: String, value: String },

    #[error("Ambiguous {stage} answer: {detail}")]
    Ambiguous { stage: Stage, detail: String },

    #[error("Extractor backend error: {0}")]
    Backend(String),

    #[error("Extraction cancelled")]
    Cancelled,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("Duplicate report id '{id}' in {organ} batch")]
    DuplicateReportId { organ: String, id: ReportId },

    #[error("Inconsistent definition {organ}/{abnormality}: {reason}")]
    InconsistentDefinition {
        organ: String,
        abnormality: String,
        reason: String,
    },

    #[error("Column '{column}' is produced twice in {organ} schema")]
    DuplicateColumn { organ: String, column: String },

    #[error("Invalid setting {setting}: {reason}")]
    InvalidSetting { setting: String, reason: String },
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Table error: {0}")]
    Table(#[from] TableError),

    #[error("Extraction failed for {organ} report {report_id} ({target}, {stage}): {error}")]
    Extraction {
        organ: String,
        report_id: ReportId,
        target: String,
        stage: Stage,
        error: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Batch cancelled")]
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_id_message_names_organ() {
        let err = ConfigurationError::DuplicateReportId {
            organ: "lung".into(),
            id: ReportId::from("7"),
        };
        assert_eq!(err.to_string(), "Duplicate report id '7' in lung batch");
    }

    #[test]
    fn llm_errors_convert_into_extractor_errors() {
        let err: ExtractorError = LlmError::Connection("http://localhost:11434".into()).into();
        assert!(matches!(err, ExtractorError::Llm(_)));
    }

    #[test]
    fn strict_failure_carries_context() {
        let err = PipelineError::Extraction {
            organ: "abdomen".into(),
            report_id: ReportId::from("3"),
            target: "Kidney_Cyst".into(),
            stage: Stage::Count,
            error: ExtractorError::MissingField("single".into()).to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("abdomen"));
        assert!(msg.contains("Kidney_Cyst"));
        assert!(msg.contains("count"));
    }
}
