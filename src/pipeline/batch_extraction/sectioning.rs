//! Format step: route each raw report into per-organ sub-texts.
//!
//! Uses the same Extractor capability as the cascade, one `section`
//! question per (report, organ). A failed question leaves that organ's
//! text empty, so its module sees no findings for the report.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures_util::stream::{self, StreamExt, TryStreamExt};

use super::error::PipelineError;
use super::runner::check_unique_ids;
use super::traits::Extractor;
use super::types::{ExtractionRequest, FailureRecord, StageFailure, TargetField};
use crate::config::PipelineConfig;
use crate::models::{FailurePolicy, Organ, Report, Stage};
use crate::table::SectionedReport;

pub const SECTION_FIELD: &str = "sentences";

const FORMAT_STEP: &str = "format";

#[derive(Debug, Clone)]
pub struct SectionOutcome {
    /// Ascending by id.
    pub rows: Vec<SectionedReport>,
    pub failures: Vec<FailureRecord>,
    pub calls: usize,
}

pub struct Sectioner<'a> {
    extractor: &'a dyn Extractor,
    config: &'a PipelineConfig,
}

impl<'a> Sectioner<'a> {
    pub fn new(extractor: &'a dyn Extractor, config: &'a PipelineConfig) -> Self {
        Self { extractor, config }
    }

    pub async fn run(&self, reports: &[Report]) -> Result<SectionOutcome, PipelineError> {
        self.config.validate()?;
        check_unique_ids(FORMAT_STEP, reports)?;

        let total = reports.len();
        let strict = self.config.failure_policy == FailurePolicy::Strict;
        let completed = AtomicUsize::new(0);
        let completed = &completed;
        let progress_every = self.config.progress_every;

        tracing::info!(reports = total, "Starting report sectioning");

        let sectioned: Vec<(SectionedReport, Vec<FailureRecord>)> = stream::iter(reports)
            .map(move |report| async move {
                let (row, failures) = self.section_report(report).await;
                if strict {
                    if let Some(first) = failures.first() {
                        return Err(PipelineError::Extraction {
                            organ: first.scope.clone().unwrap_or_default(),
                            report_id: first.id.clone(),
                            target: FORMAT_STEP.to_string(),
                            stage: Stage::Section,
                            error: first.error.clone(),
                        });
                    }
                }
                let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                if progress_every > 0 && (done % progress_every == 0 || done == total) {
                    tracing::info!(progress = format!("{done}/{total}"), "Sectioning progress");
                }
                Ok((row, failures))
            })
            .buffer_unordered(self.config.report_concurrency)
            .try_collect()
            .await?;

        let mut rows = Vec::with_capacity(sectioned.len());
        let mut failures = Vec::new();
        for (row, row_failures) in sectioned {
            rows.push(row);
            failures.extend(row_failures);
        }
        rows.sort_by(|a, b| a.id.cmp(&b.id));
        failures.sort_by(|a, b| a.id.cmp(&b.id));

        tracing::info!(
            reports = total,
            failures = failures.len(),
            "Report sectioning complete"
        );

        Ok(SectionOutcome {
            rows,
            failures,
            calls: total * Organ::all().len(),
        })
    }

    async fn section_report(&self, report: &Report) -> (SectionedReport, Vec<FailureRecord>) {
        let mut sections = BTreeMap::new();
        let mut failures = Vec::new();

        for organ in Organ::all() {
            let fields = [TargetField::text(
                SECTION_FIELD,
                format!(
                    "sentences of the report describing the {}, copied verbatim; empty if none. {}",
                    organ.label(),
                    organ.section_guidance()
                ),
            )];
            let request = ExtractionRequest {
                organ: organ.as_str(),
                organ_label: organ.label(),
                abnormality: None,
                stage: Stage::Section,
                scope: None,
                text: &report.text,
                fields: &fields,
            };

            let answer = self
                .extractor
                .extract(&request)
                .await
                .and_then(|values| values.text(SECTION_FIELD));

            match answer {
                Ok(text) => {
                    sections.insert(*organ, text);
                }
                Err(error) => {
                    tracing::warn!(
                        organ = organ.as_str(),
                        report_id = %report.id,
                        error = %error,
                        "Sectioning failed, organ text left empty"
                    );
                    let failure = StageFailure {
                        stage: Stage::Section,
                        scope: Some(organ.as_str().to_string()),
                        error,
                    };
                    failures.push(FailureRecord::new(&report.id, None, &failure));
                    sections.insert(*organ, String::new());
                }
            }
        }

        let row = SectionedReport {
            id: report.id.clone(),
            original: report.text.clone(),
            sections,
        };
        (row, failures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::batch_extraction::error::{ConfigurationError, ExtractorError};
    use crate::pipeline::batch_extraction::testing::ScriptedExtractor;
    use crate::pipeline::batch_extraction::types::FieldValues;

    fn router() -> ScriptedExtractor {
        ScriptedExtractor::new(|req| {
            let picked: Vec<&str> = req
                .text
                .split_inclusive('.')
                .map(str::trim)
                .filter(|s| match req.organ {
                    "lung" => s.contains("lung"),
                    "abdomen" => s.contains("liver") || s.contains("kidney"),
                    _ => false,
                })
                .collect();
            Ok(FieldValues::new().with_text(SECTION_FIELD, picked.join(" ")))
        })
    }

    #[tokio::test]
    async fn routes_sentences_per_organ() {
        let extractor = router();
        let config = PipelineConfig::default();
        let outcome = Sectioner::new(&extractor, &config)
            .run(&[Report::new("1", "Clear lungs. Small liver cyst.")])
            .await
            .unwrap();

        let row = &outcome.rows[0];
        assert_eq!(row.section(Organ::Lung), "Clear lungs.");
        assert_eq!(row.section(Organ::Abdomen), "Small liver cyst.");
        assert_eq!(row.section(Organ::Mediastinum), "");
        assert_eq!(row.original, "Clear lungs. Small liver cyst.");
        assert_eq!(extractor.call_count(), 6);
        assert_eq!(outcome.calls, 6);
    }

    #[tokio::test]
    async fn output_is_sorted_by_id() {
        let extractor = router();
        let config = PipelineConfig::default();
        let outcome = Sectioner::new(&extractor, &config)
            .run(&[Report::new("3", "a"), Report::new("1", "b"), Report::new("2", "c")])
            .await
            .unwrap();
        let ids: Vec<&str> = outcome.rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[tokio::test]
    async fn failed_section_is_empty_and_audited() {
        let extractor = ScriptedExtractor::new(|req| {
            if req.organ == "heart_and_vessel" {
                return Err(ExtractorError::JsonParsing("truncated".into()));
            }
            Ok(FieldValues::new().with_text(SECTION_FIELD, req.text))
        });
        let config = PipelineConfig::default();
        let outcome = Sectioner::new(&extractor, &config)
            .run(&[Report::new("1", "Cardiomegaly.")])
            .await
            .unwrap();

        assert_eq!(outcome.rows[0].section(Organ::HeartAndVessel), "");
        assert_eq!(outcome.rows[0].section(Organ::Lung), "Cardiomegaly.");
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].scope.as_deref(), Some("heart_and_vessel"));
        assert_eq!(outcome.failures[0].stage, Stage::Section);
    }

    #[tokio::test]
    async fn duplicate_ids_are_rejected() {
        let extractor = router();
        let config = PipelineConfig::default();
        let err = Sectioner::new(&extractor, &config)
            .run(&[Report::new("1", "a"), Report::new("1", "b")])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Configuration(ConfigurationError::DuplicateReportId { .. })
        ));
        assert_eq!(extractor.call_count(), 0);
    }
}
