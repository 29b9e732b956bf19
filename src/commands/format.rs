use std::path::Path;

use crate::cli::FormatArgs;
use crate::config::{failures_file, PipelineConfig};
use crate::pipeline::batch_extraction::{Extractor, PipelineError, SectionOutcome, Sectioner};
use crate::table::{read_reports, write_sectioned};

use super::CommandError;

pub async fn execute(args: &FormatArgs, extractor: &dyn Extractor) -> Result<SectionOutcome, CommandError> {
    format_reports(
        &args.input,
        &args.text_column,
        &args.output,
        extractor,
        &args.batch.config(),
    )
    .await
}

/// Section `input` and write the sectioned table to `output`, with a
/// `format_failures.json` audit beside it when some sections failed.
pub async fn format_reports(
    input: &Path,
    text_column: &str,
    output: &Path,
    extractor: &dyn Extractor,
    config: &PipelineConfig,
) -> Result<SectionOutcome, CommandError> {
    let reports = read_reports(input, text_column)?;
    tracing::info!(input = %input.display(), reports = reports.len(), "Reports loaded");

    let outcome = Sectioner::new(extractor, config).run(&reports).await?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(PipelineError::from)?;
    }
    write_sectioned(output, &outcome.rows)?;

    let audit = output.with_file_name(failures_file("format"));
    if outcome.failures.is_empty() {
        if audit.exists() {
            std::fs::remove_file(&audit).map_err(PipelineError::from)?;
        }
    } else {
        let json = serde_json::to_vec_pretty(&outcome.failures).map_err(PipelineError::from)?;
        std::fs::write(&audit, json).map_err(PipelineError::from)?;
    }

    tracing::info!(
        output = %output.display(),
        reports = outcome.rows.len(),
        calls = outcome.calls,
        failures = outcome.failures.len(),
        "Sectioned table written"
    );
    Ok(outcome)
}
