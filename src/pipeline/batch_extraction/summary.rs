//! `run_summary.json`: what a batch run did, for auditing a table set.

use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::error::PipelineError;
use super::runner::{BatchOutcome, OrganRunSummary};
use crate::config::{PipelineConfig, APP_VERSION, RUN_SUMMARY_FILE};

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub version: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Extractor backend, e.g. the LLM model name.
    pub extractor: String,
    pub settings: PipelineConfig,
    pub organs: Vec<OrganRunSummary>,
    pub total_extractor_calls: usize,
    pub total_failures: usize,
}

impl RunSummary {
    pub fn start(extractor: &str, settings: &PipelineConfig) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            version: APP_VERSION.to_string(),
            started_at: Utc::now(),
            finished_at: None,
            extractor: extractor.to_string(),
            settings: settings.clone(),
            organs: Vec::new(),
            total_extractor_calls: 0,
            total_failures: 0,
        }
    }

    pub fn finish(&mut self, outcomes: &[BatchOutcome]) {
        self.organs = outcomes.iter().map(BatchOutcome::summary).collect();
        self.total_extractor_calls = self.organs.iter().map(|o| o.extractor_calls).sum();
        self.total_failures = self.organs.iter().map(|o| o.failures).sum();
        self.finished_at = Some(Utc::now());
    }

    /// Write `run_summary.json` into `dir` through a sibling temp file.
    pub fn persist(&self, dir: &Path) -> Result<(), PipelineError> {
        std::fs::create_dir_all(dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(tmp.as_file_mut(), self)?;
        tmp.as_file_mut().write_all(b"\n")?;
        tmp.persist(dir.join(RUN_SUMMARY_FILE)).map_err(|e| e.error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Organ;
    use crate::schema::OrganSchema;
    use crate::table::WideTable;

    fn outcome(organ: Organ, calls: usize) -> BatchOutcome {
        BatchOutcome {
            table: WideTable::new(&OrganSchema::builtin(organ), Vec::new()),
            failures: Vec::new(),
            calls,
            duration_ms: 5,
        }
    }

    #[test]
    fn finish_totals_organs() {
        let mut summary = RunSummary::start("medgemma:27b", &PipelineConfig::default());
        summary.finish(&[outcome(Organ::Lung, 10), outcome(Organ::Abdomen, 4)]);

        assert_eq!(summary.organs.len(), 2);
        assert_eq!(summary.total_extractor_calls, 14);
        assert_eq!(summary.total_failures, 0);
        assert!(summary.finished_at.unwrap() >= summary.started_at);
    }

    #[test]
    fn persist_writes_summary_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut summary = RunSummary::start("scripted", &PipelineConfig::default());
        summary.finish(&[outcome(Organ::Lung, 3)]);

        summary.persist(dir.path()).unwrap();

        let raw = std::fs::read_to_string(dir.path().join(RUN_SUMMARY_FILE)).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["run_id"], summary.run_id.to_string());
        assert_eq!(json["organs"][0]["organ"], "lung");
        assert_eq!(json["settings"]["failure_policy"], "zero_fill");
    }
}
