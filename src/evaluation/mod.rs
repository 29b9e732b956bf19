//! Scoring of predicted WideTables against ground truth.
//!
//! ```text
//! ScoreTable × ScoreTable → align() → AlignedPair → OrganScore → MetricReport
//! ```
//!
//! Every organ is aligned and scored on its own. A structural problem in
//! one organ's tables marks that organ as failed in the report and leaves
//! the others untouched.

pub mod aligner;
pub mod error;
pub mod metrics;
pub mod report;

pub use aligner::{align, parse_cell, AlignedPair};
pub use error::{EvaluationError, SchemaViolation, TableSide};
pub use metrics::ConfusionCounts;
pub use report::{ColumnScore, MetricReport, OrganEntry, OrganScore};

use std::path::{Path, PathBuf};

use crate::config::{ground_truth_file, prediction_file};
use crate::models::Organ;
use crate::table::ScoreTable;

/// Align and score one organ's tables.
pub fn evaluate_organ(
    organ: &str,
    report_column: &str,
    prediction: &ScoreTable,
    ground_truth: &ScoreTable,
) -> Result<OrganScore, EvaluationError> {
    let pair = align(prediction, ground_truth, report_column).map_err(|violation| {
        EvaluationError::Schema {
            organ: organ.to_string(),
            violation,
        }
    })?;
    Ok(OrganScore::from_pair(&pair))
}

/// Ground-truth table of an organ: `{organ}_gt.csv`, else `{organ}.csv`.
pub fn ground_truth_path(dir: &Path, organ: &str) -> Option<PathBuf> {
    [ground_truth_file(organ), prediction_file(organ)]
        .into_iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

/// Read both tables of an organ from disk.
pub fn load_tables(
    organ: Organ,
    prediction_dir: &Path,
    ground_truth_dir: &Path,
) -> Result<(ScoreTable, ScoreTable), EvaluationError> {
    let name = organ.as_str();

    let prediction_path = prediction_dir.join(prediction_file(name));
    if !prediction_path.is_file() {
        return Err(EvaluationError::MissingTable {
            organ: name.to_string(),
            side: TableSide::Prediction,
            path: prediction_path,
        });
    }
    let gt_path =
        ground_truth_path(ground_truth_dir, name).ok_or_else(|| EvaluationError::MissingTable {
            organ: name.to_string(),
            side: TableSide::GroundTruth,
            path: ground_truth_dir.join(ground_truth_file(name)),
        })?;

    let read = |path: &Path| {
        ScoreTable::read_csv(path).map_err(|source| EvaluationError::Table {
            organ: name.to_string(),
            source,
        })
    };
    Ok((read(&prediction_path)?, read(&gt_path)?))
}

/// Evaluate every organ found in the two directories.
pub fn evaluate_dirs(organs: &[Organ], prediction_dir: &Path, ground_truth_dir: &Path) -> MetricReport {
    let mut report = MetricReport::new();

    for organ in organs {
        let name = organ.as_str();
        let outcome = load_tables(*organ, prediction_dir, ground_truth_dir).and_then(|(pred, gt)| {
            evaluate_organ(name, &organ.report_column(), &pred, &gt)
        });

        match &outcome {
            Ok(score) => tracing::info!(
                organ = name,
                rows = score.rows,
                columns = score.columns.len(),
                f1 = score.f1(),
                "Organ evaluated"
            ),
            Err(e) => tracing::error!(organ = name, error = %e, "Organ evaluation failed"),
        }
        report.push(name, outcome);
    }

    tracing::info!(
        organ_average = ?report.organ_average(),
        total = ?report.total(),
        failed = report.failed_organs().len(),
        "Evaluation complete"
    );
    report
}
