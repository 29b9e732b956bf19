use std::path::Path;

use crate::cli::{selected_organs, EvaluateArgs};
use crate::evaluation::{evaluate_dirs, MetricReport};
use crate::models::Organ;

use super::CommandError;

pub fn execute(args: &EvaluateArgs) -> Result<MetricReport, CommandError> {
    evaluate_to(
        &selected_organs(&args.organs),
        &args.prediction_dir,
        &args.ground_truth_dir,
        &args.output,
    )
}

/// Score, write the MetricReport, then fail if any organ could not be
/// scored. The report is written either way.
pub fn evaluate_to(
    organs: &[Organ],
    prediction_dir: &Path,
    ground_truth_dir: &Path,
    output: &Path,
) -> Result<MetricReport, CommandError> {
    let report = evaluate_dirs(organs, prediction_dir, ground_truth_dir);
    report.persist(output)?;
    tracing::info!(output = %output.display(), "Metric report written");

    let failed = report.failed_organs();
    if !failed.is_empty() {
        return Err(CommandError::EvaluationFailed(
            failed.into_iter().map(str::to_string).collect(),
        ));
    }
    Ok(report)
}
