use std::path::PathBuf;

use thiserror::Error;

use crate::models::ReportId;
use crate::table::TableError;

/// Which of the two compared tables a problem was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableSide {
    Prediction,
    GroundTruth,
}

impl TableSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Prediction => "prediction",
            Self::GroundTruth => "ground truth",
        }
    }
}

impl std::fmt::Display for TableSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structural disagreement between a prediction and a ground-truth table.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaViolation {
    #[error("Row count mismatch: prediction has {prediction} rows, ground truth has {ground_truth}")]
    RowCountMismatch { prediction: usize, ground_truth: usize },

    #[error("Duplicate id '{id}' in {side} table")]
    DuplicateId { side: TableSide, id: ReportId },

    #[error("Duplicate column '{column}' in {side} table")]
    DuplicateColumn { side: TableSide, column: String },

    #[error("No common ids between prediction and ground truth")]
    NoCommonIds,

    #[error(
        "Column mismatch: missing in prediction {missing_in_prediction:?}, \
         missing in ground truth {missing_in_ground_truth:?}"
    )]
    ColumnMismatch {
        missing_in_prediction: Vec<String>,
        missing_in_ground_truth: Vec<String>,
    },

    #[error("No scoreable columns")]
    NoScoreableColumns,

    #[error("Non-numeric cell '{value}' in {side} table, id {id}, column {column}")]
    NonNumericCell {
        side: TableSide,
        id: ReportId,
        column: String,
        value: String,
    },

    #[error("Non-binary cell '{value}' in {side} table, id {id}, column {column}")]
    NonBinaryCell {
        side: TableSide,
        id: ReportId,
        column: String,
        value: String,
    },
}

/// Evaluation failure of one organ. Never aborts the other organs.
#[derive(Error, Debug)]
pub enum EvaluationError {
    #[error("{organ}: {side} table not found at {path}")]
    MissingTable {
        organ: String,
        side: TableSide,
        path: PathBuf,
    },

    #[error("{organ}: {source}")]
    Table {
        organ: String,
        #[source]
        source: TableError,
    },

    #[error("{organ}: {violation}")]
    Schema {
        organ: String,
        violation: SchemaViolation,
    },
}

impl EvaluationError {
    pub fn organ(&self) -> &str {
        match self {
            Self::MissingTable { organ, .. } | Self::Table { organ, .. } | Self::Schema { organ, .. } => {
                organ
            }
        }
    }
}
