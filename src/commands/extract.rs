use std::path::Path;

use crate::cli::{selected_organs, ExtractArgs};
use crate::config::PipelineConfig;
use crate::models::Organ;
use crate::pipeline::batch_extraction::{
    persist_batch, Aggregator, Extractor, OrganJob, OrganModule, RunSummary,
};
use crate::table::read_organ_reports;

use super::CommandError;

pub async fn execute(
    args: &ExtractArgs,
    extractor: &dyn Extractor,
    extractor_name: &str,
) -> Result<RunSummary, CommandError> {
    extract_tables(
        &args.input,
        &args.output_dir,
        &selected_organs(&args.organs),
        extractor,
        extractor_name,
        &args.batch.config(),
    )
    .await
}

/// Run the selected organ modules over `input` and write their tables,
/// failure audits and `run_summary.json` into `output_dir`.
pub async fn extract_tables(
    input: &Path,
    output_dir: &Path,
    organs: &[Organ],
    extractor: &dyn Extractor,
    extractor_name: &str,
    config: &PipelineConfig,
) -> Result<RunSummary, CommandError> {
    let mut jobs = Vec::with_capacity(organs.len());
    for organ in organs {
        let module = OrganModule::builtin(*organ);
        let reports = read_organ_reports(input, module.schema())?;
        jobs.push(OrganJob { module, reports });
    }

    let mut summary = RunSummary::start(extractor_name, config);
    tracing::info!(
        run_id = %summary.run_id,
        organs = jobs.len(),
        input = %input.display(),
        "Starting extraction"
    );

    let outcomes = Aggregator::new(extractor, config).run_all(&jobs).await?;
    persist_batch(&outcomes, output_dir)?;

    summary.finish(&outcomes);
    summary.persist(output_dir)?;
    tracing::info!(
        run_id = %summary.run_id,
        calls = summary.total_extractor_calls,
        failures = summary.total_failures,
        "Extraction complete"
    );
    Ok(summary)
}
