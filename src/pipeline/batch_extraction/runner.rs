//! Aggregator: runs an organ module over a report batch.
//!
//! Reports are processed concurrently (bounded by `report_concurrency`),
//! rows are collected as they complete and sorted by id once at the end.
//! Nothing is written until every organ of a batch succeeded.

use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use futures_util::stream::{self, StreamExt, TryStreamExt};
use serde::Serialize;
use tokio::sync::Semaphore;

use super::error::{ConfigurationError, PipelineError};
use super::organ_module::{OrganModule, RowOutcome};
use super::traits::Extractor;
use super::types::FailureRecord;
use crate::config::{self, PipelineConfig};
use crate::models::{FailurePolicy, Report};
use crate::table::WideTable;

/// Result of one organ over one batch.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub table: WideTable,
    pub failures: Vec<FailureRecord>,
    pub calls: usize,
    pub duration_ms: u64,
}

impl BatchOutcome {
    pub fn summary(&self) -> OrganRunSummary {
        OrganRunSummary {
            organ: self.table.organ().to_string(),
            reports: self.table.len(),
            extractor_calls: self.calls,
            failures: self.failures.len(),
            duration_ms: self.duration_ms,
        }
    }
}

/// Per-organ entry of the run summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrganRunSummary {
    pub organ: String,
    pub reports: usize,
    pub extractor_calls: usize,
    pub failures: usize,
    pub duration_ms: u64,
}

/// One organ module and the reports it should process.
pub struct OrganJob {
    pub module: OrganModule,
    pub reports: Vec<Report>,
}

pub struct Aggregator<'a> {
    extractor: &'a dyn Extractor,
    config: &'a PipelineConfig,
}

impl<'a> Aggregator<'a> {
    pub fn new(extractor: &'a dyn Extractor, config: &'a PipelineConfig) -> Self {
        Self { extractor, config }
    }

    /// Build the WideTable of one organ.
    ///
    /// Configuration problems (invalid settings, inconsistent schema,
    /// duplicate ids) fail before the first Extractor call.
    pub async fn run(
        &self,
        module: &OrganModule,
        reports: &[Report],
    ) -> Result<BatchOutcome, PipelineError> {
        self.config.validate()?;
        module.schema().validate()?;
        check_unique_ids(module.name(), reports)?;

        let start = Instant::now();
        let total = reports.len();
        let organ = module.name();
        let strict = self.config.failure_policy == FailurePolicy::Strict;
        let progress_every = self.config.progress_every;

        tracing::info!(organ, reports = total, "Starting organ batch");

        let fanout = Semaphore::new(self.config.fanout_concurrency);
        let completed = AtomicUsize::new(0);
        let fanout = &fanout;
        let completed = &completed;
        let extractor = self.extractor;

        let outcomes: Vec<RowOutcome> = stream::iter(reports)
            .map(move |report| async move {
                let outcome = module.process(report, extractor, fanout).await;

                if strict {
                    if let Some(first) = outcome.failures.first() {
                        return Err(strict_error(organ, first));
                    }
                }

                let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                if progress_every > 0 && (done % progress_every == 0 || done == total) {
                    tracing::info!(organ, progress = format!("{done}/{total}"), "Organ batch progress");
                }
                Ok(outcome)
            })
            .buffer_unordered(self.config.report_concurrency)
            .try_collect()
            .await?;

        let mut rows = Vec::with_capacity(outcomes.len());
        let mut failures = Vec::new();
        let mut calls = 0;
        for outcome in outcomes {
            rows.push(outcome.row);
            failures.extend(outcome.failures);
            calls += outcome.calls;
        }
        failures.sort_by(|a, b| a.id.cmp(&b.id));

        let table = WideTable::new(module.schema(), rows);
        let duration_ms = start.elapsed().as_millis() as u64;

        if failures.is_empty() {
            tracing::info!(organ, reports = total, calls, duration_ms, "Organ batch complete");
        } else {
            tracing::warn!(
                organ,
                reports = total,
                calls,
                failures = failures.len(),
                duration_ms,
                "Organ batch complete with extraction failures (written as 0)"
            );
        }

        Ok(BatchOutcome {
            table,
            failures,
            calls,
            duration_ms,
        })
    }

    /// Run several organ modules concurrently. The first error aborts all.
    pub async fn run_all(&self, jobs: &[OrganJob]) -> Result<Vec<BatchOutcome>, PipelineError> {
        futures_util::future::try_join_all(jobs.iter().map(|job| self.run(&job.module, &job.reports)))
            .await
    }
}

/// Fail fast on a repeated report id.
pub fn check_unique_ids(organ: &str, reports: &[Report]) -> Result<(), ConfigurationError> {
    let mut seen = HashSet::with_capacity(reports.len());
    for report in reports {
        if !seen.insert(&report.id) {
            return Err(ConfigurationError::DuplicateReportId {
                organ: organ.to_string(),
                id: report.id.clone(),
            });
        }
    }
    Ok(())
}

fn strict_error(organ: &str, failure: &FailureRecord) -> PipelineError {
    PipelineError::Extraction {
        organ: organ.to_string(),
        report_id: failure.id.clone(),
        target: failure
            .abnormality
            .clone()
            .unwrap_or_else(|| organ.to_string()),
        stage: failure.stage,
        error: failure.error.clone(),
    }
}

/// Write every organ table (and its failure audit) into `output_dir`.
///
/// Files are first staged in a temporary directory inside `output_dir`
/// and moved into place only once all of them were written. If a move
/// fails, the files already moved are rolled back so `output_dir` holds
/// the previous run's outputs only.
pub fn persist_batch(outcomes: &[BatchOutcome], output_dir: &Path) -> Result<(), PipelineError> {
    std::fs::create_dir_all(output_dir)?;
    let staging = tempfile::Builder::new()
        .prefix(".radstruct-staging-")
        .tempdir_in(output_dir)?;

    let mut staged = Vec::new();
    let mut stale = Vec::new();
    for outcome in outcomes {
        let organ = outcome.table.organ();
        let table_name = config::prediction_file(organ);
        outcome.table.persist(&staging.path().join(&table_name))?;
        staged.push(table_name);

        let failures_name = config::failures_file(organ);
        if outcome.failures.is_empty() {
            stale.push(output_dir.join(failures_name));
        } else {
            let json = serde_json::to_vec_pretty(&outcome.failures)?;
            std::fs::write(staging.path().join(&failures_name), json)?;
            staged.push(failures_name);
        }
    }

    if let Err(error) = swap_into_place(staging.path(), output_dir, &staged) {
        tracing::error!(
            error = %error,
            output_dir = %output_dir.display(),
            "Batch outputs not written, previous outputs kept"
        );
        return Err(error.into());
    }
    // An audit from an earlier run must not outlive a clean rerun.
    for path in stale.iter().filter(|p| p.exists()) {
        std::fs::remove_file(path)?;
    }
    tracing::info!(
        files = staged.len(),
        output_dir = %output_dir.display(),
        "Batch outputs written"
    );
    Ok(())
}

/// Move staged files over their targets, parking the previous versions
/// in the staging directory until every move succeeded.
fn swap_into_place(staging: &Path, output_dir: &Path, names: &[String]) -> std::io::Result<()> {
    let previous = staging.join("previous");
    std::fs::create_dir(&previous)?;

    let mut placed: Vec<&str> = Vec::new();
    for name in names {
        if let Err(error) = place(staging, &previous, output_dir, name) {
            restore(&previous, output_dir, &placed, name);
            return Err(error);
        }
        placed.push(name);
    }
    Ok(())
}

fn place(staging: &Path, previous: &Path, output_dir: &Path, name: &str) -> std::io::Result<()> {
    let target = output_dir.join(name);
    if target.is_dir() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            format!("{} is a directory", target.display()),
        ));
    }
    if target.exists() {
        std::fs::rename(&target, previous.join(name))?;
    }
    std::fs::rename(staging.join(name), &target)
}

/// Undo `placed` and the half-done `failed` move.
fn restore(previous: &Path, output_dir: &Path, placed: &[&str], failed: &str) {
    for name in placed.iter().copied().chain(std::iter::once(failed)) {
        let parked = previous.join(name);
        let target = output_dir.join(name);
        let result = if parked.exists() {
            std::fs::rename(&parked, &target)
        } else if name != failed && target.exists() {
            std::fs::remove_file(&target)
        } else {
            Ok(())
        };
        match result {
            Ok(()) => tracing::warn!(file = name, "Previous output kept"),
            Err(error) => {
                tracing::error!(file = name, error = %error, "Could not restore previous output")
            }
        }
    }
}
