//! Schema Aligner: validate that a prediction and a ground-truth table
//! describe the same schema, then line them up row by row.
//!
//! Checks run in a fixed order and the first failure wins:
//! duplicate ids, row counts, id intersection, duplicate columns, column
//! sets, cell values.

use std::collections::{BTreeMap, BTreeSet};

use super::error::{SchemaViolation, TableSide};
use super::metrics::ConfusionCounts;
use crate::models::ReportId;
use crate::table::ScoreTable;

/// Prediction and ground truth as equal-shape 0/1 matrices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignedPair {
    /// Scored columns, in prediction header order.
    columns: Vec<String>,
    /// Common ids, ascending.
    ids: Vec<ReportId>,
    /// Row-major, `ids.len()` rows of `columns.len()` cells.
    prediction: Vec<Vec<u8>>,
    ground_truth: Vec<Vec<u8>>,
}

impl AlignedPair {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn ids(&self) -> &[ReportId] {
        &self.ids
    }

    pub fn prediction_row(&self, index: usize) -> &[u8] {
        &self.prediction[index]
    }

    pub fn ground_truth_row(&self, index: usize) -> &[u8] {
        &self.ground_truth[index]
    }

    /// Confusion counts of one column over every aligned row.
    pub fn confusion(&self, column: usize) -> ConfusionCounts {
        ConfusionCounts::from_pairs(
            self.prediction
                .iter()
                .zip(&self.ground_truth)
                .map(|(p, g)| (p[column], g[column])),
        )
    }
}

/// Align two tables of one organ. `report_column` is the carried-through
/// free-text column, excluded from scoring along with `id`.
pub fn align(
    prediction: &ScoreTable,
    ground_truth: &ScoreTable,
    report_column: &str,
) -> Result<AlignedPair, SchemaViolation> {
    let pred_index = index_ids(prediction, TableSide::Prediction)?;
    let gt_index = index_ids(ground_truth, TableSide::GroundTruth)?;

    if prediction.len() != ground_truth.len() {
        return Err(SchemaViolation::RowCountMismatch {
            prediction: prediction.len(),
            ground_truth: ground_truth.len(),
        });
    }

    let ids: Vec<ReportId> = pred_index
        .keys()
        .filter(|id| gt_index.contains_key(*id))
        .cloned()
        .collect();
    if ids.is_empty() {
        return Err(SchemaViolation::NoCommonIds);
    }

    let pred_columns = scored_columns(prediction, report_column);
    let gt_columns = scored_columns(ground_truth, report_column);
    let pred_set = column_set(&pred_columns, TableSide::Prediction)?;
    let gt_set = column_set(&gt_columns, TableSide::GroundTruth)?;
    if pred_set != gt_set {
        return Err(SchemaViolation::ColumnMismatch {
            missing_in_prediction: gt_set.difference(&pred_set).map(|c| c.to_string()).collect(),
            missing_in_ground_truth: pred_set.difference(&gt_set).map(|c| c.to_string()).collect(),
        });
    }
    if pred_columns.is_empty() {
        return Err(SchemaViolation::NoScoreableColumns);
    }

    // Ground-truth position of each scored column, in prediction order.
    let gt_positions: BTreeMap<&str, usize> = gt_columns.iter().map(|(i, c)| (*c, *i)).collect();
    let layout: Vec<(usize, usize)> = pred_columns
        .iter()
        .filter_map(|(pi, c)| gt_positions.get(c).map(|gi| (*pi, *gi)))
        .collect();

    let mut pred_rows = Vec::with_capacity(ids.len());
    let mut gt_rows = Vec::with_capacity(ids.len());
    for id in &ids {
        let pred_raw = prediction.row(pred_index[id]);
        let gt_raw = ground_truth.row(gt_index[id]);
        let mut pred_row = Vec::with_capacity(layout.len());
        let mut gt_row = Vec::with_capacity(layout.len());
        for (pi, gi) in &layout {
            let column = &prediction.columns()[*pi];
            pred_row.push(read_cell(pred_raw, *pi, TableSide::Prediction, id, column)?);
            gt_row.push(read_cell(gt_raw, *gi, TableSide::GroundTruth, id, column)?);
        }
        pred_rows.push(pred_row);
        gt_rows.push(gt_row);
    }

    Ok(AlignedPair {
        columns: pred_columns.iter().map(|(_, c)| c.to_string()).collect(),
        ids,
        prediction: pred_rows,
        ground_truth: gt_rows,
    })
}

/// Parse one cell as 0/1. Empty and `nan` cells are missing and read as 0.
pub fn parse_cell(raw: &str) -> Result<u8, CellProblem> {
    let value = raw.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("nan") {
        return Ok(0);
    }
    if value.eq_ignore_ascii_case("true") {
        return Ok(1);
    }
    if value.eq_ignore_ascii_case("false") {
        return Ok(0);
    }
    match value.parse::<f64>() {
        Ok(v) if v.is_nan() => Ok(0),
        Ok(v) if v == 0.0 => Ok(0),
        Ok(v) if v == 1.0 => Ok(1),
        Ok(_) => Err(CellProblem::NonBinary),
        Err(_) => Err(CellProblem::NonNumeric),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellProblem {
    NonNumeric,
    NonBinary,
}

fn index_ids(table: &ScoreTable, side: TableSide) -> Result<BTreeMap<ReportId, usize>, SchemaViolation> {
    let mut index = BTreeMap::new();
    for (row, id) in table.ids().iter().enumerate() {
        if index.insert(id.clone(), row).is_some() {
            return Err(SchemaViolation::DuplicateId {
                side,
                id: id.clone(),
            });
        }
    }
    Ok(index)
}

fn scored_columns<'t>(table: &'t ScoreTable, report_column: &str) -> Vec<(usize, &'t str)> {
    table
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, c)| c.as_str() != report_column)
        .map(|(i, c)| (i, c.as_str()))
        .collect()
}

/// Distinct scored column names. A repeated header would be scored twice.
fn column_set<'t>(
    columns: &[(usize, &'t str)],
    side: TableSide,
) -> Result<BTreeSet<&'t str>, SchemaViolation> {
    let mut set = BTreeSet::new();
    for (_, column) in columns {
        if !set.insert(*column) {
            return Err(SchemaViolation::DuplicateColumn {
                side,
                column: column.to_string(),
            });
        }
    }
    Ok(set)
}

fn read_cell(
    row: &[String],
    position: usize,
    side: TableSide,
    id: &ReportId,
    column: &str,
) -> Result<u8, SchemaViolation> {
    let raw = row.get(position).map(String::as_str).unwrap_or_default();
    parse_cell(raw).map_err(|problem| {
        let (side, id, column, value) = (side, id.clone(), column.to_string(), raw.to_string());
        match problem {
            CellProblem::NonNumeric => SchemaViolation::NonNumericCell { side, id, column, value },
            CellProblem::NonBinary => SchemaViolation::NonBinaryCell { side, id, column, value },
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    const REPORT: &str = "lung_report";

    fn table(csv: &str) -> ScoreTable {
        ScoreTable::from_reader(csv.as_bytes(), Path::new("t.csv")).unwrap()
    }

    #[test]
    fn aligns_rows_by_id_and_columns_by_name() {
        let pred = table("id,lung_report,A,B\n2,x,1,0\n1,y,0,1\n");
        let gt = table("id,B,A,lung_report\n1,1,1,y\n2,0,1,x\n");

        let pair = align(&pred, &gt, REPORT).unwrap();

        assert_eq!(pair.columns(), &["A".to_string(), "B".to_string()]);
        assert_eq!(pair.ids(), &[ReportId::from("1"), ReportId::from("2")]);
        assert_eq!(pair.prediction_row(0), &[0, 1]);
        assert_eq!(pair.ground_truth_row(0), &[1, 1]);
        assert_eq!(pair.prediction_row(1), &[1, 0]);
        assert_eq!(pair.ground_truth_row(1), &[1, 0]);
    }

    #[test]
    fn repeated_header_is_a_violation() {
        let pred = table("id,a,a,b\n1,1,1,0\n");
        let gt = table("id,a,b\n1,1,0\n");
        assert_eq!(
            align(&pred, &gt, REPORT).unwrap_err(),
            SchemaViolation::DuplicateColumn {
                side: TableSide::Prediction,
                column: "a".into(),
            }
        );
        assert_eq!(
            align(&gt, &pred, REPORT).unwrap_err(),
            SchemaViolation::DuplicateColumn {
                side: TableSide::GroundTruth,
                column: "a".into(),
            }
        );
    }

    #[test]
    fn missing_column_is_a_violation() {
        let pred = table("id,A\n1,1\n");
        let gt = table("id,A,B\n1,1,0\n");
        let err = align(&pred, &gt, REPORT).unwrap_err();
        assert_eq!(
            err,
            SchemaViolation::ColumnMismatch {
                missing_in_prediction: vec!["B".into()],
                missing_in_ground_truth: vec![],
            }
        );
    }

    #[test]
    fn row_count_is_checked_before_intersecting() {
        let pred = table("id,A\n1,1\n2,0\n");
        let gt = table("id,A\n1,1\n");
        let err = align(&pred, &gt, REPORT).unwrap_err();
        assert_eq!(
            err,
            SchemaViolation::RowCountMismatch {
                prediction: 2,
                ground_truth: 1
            }
        );
    }

    #[test]
    fn disjoint_ids_are_a_violation() {
        let pred = table("id,A\n1,1\n");
        let gt = table("id,A\n2,1\n");
        assert_eq!(align(&pred, &gt, REPORT).unwrap_err(), SchemaViolation::NoCommonIds);
    }

    #[test]
    fn duplicate_ids_are_a_violation() {
        let pred = table("id,A\n1,1\n1,0\n");
        let gt = table("id,A\n1,1\n2,0\n");
        let err = align(&pred, &gt, REPORT).unwrap_err();
        assert!(matches!(
            err,
            SchemaViolation::DuplicateId {
                side: TableSide::Prediction,
                ..
            }
        ));
    }

    #[test]
    fn report_column_alone_is_not_scoreable() {
        let pred = table("id,lung_report\n1,x\n");
        let gt = table("id,lung_report\n1,x\n");
        assert_eq!(
            align(&pred, &gt, REPORT).unwrap_err(),
            SchemaViolation::NoScoreableColumns
        );
    }

    #[test]
    fn missing_cells_read_as_zero() {
        let pred = table("id,A,B\n1,,nan\n");
        let gt = table("id,A,B\n1,1.0,true\n");
        let pair = align(&pred, &gt, REPORT).unwrap();
        assert_eq!(pair.prediction_row(0), &[0, 0]);
        assert_eq!(pair.ground_truth_row(0), &[1, 1]);
    }

    #[test]
    fn text_cell_is_non_numeric() {
        let pred = table("id,A\n1,yes\n");
        let gt = table("id,A\n1,1\n");
        assert!(matches!(
            align(&pred, &gt, REPORT).unwrap_err(),
            SchemaViolation::NonNumericCell { .. }
        ));
    }

    #[test]
    fn out_of_range_cell_is_non_binary() {
        let pred = table("id,A\n1,1\n");
        let gt = table("id,A\n1,2\n");
        let err = align(&pred, &gt, REPORT).unwrap_err();
        assert_eq!(
            err,
            SchemaViolation::NonBinaryCell {
                side: TableSide::GroundTruth,
                id: ReportId::from("1"),
                column: "A".into(),
                value: "2".into(),
            }
        );
    }

    #[test]
    fn swapped_alignment_transposes_confusion() {
        let a = table("id,A,B\n1,1,0\n2,1,1\n3,0,0\n");
        let b = table("id,B,A\n3,1,0\n2,1,0\n1,0,1\n");

        let ab = align(&a, &b, REPORT).unwrap();
        let ba = align(&b, &a, REPORT).unwrap();

        let ab_cols: BTreeSet<&String> = ab.columns().iter().collect();
        let ba_cols: BTreeSet<&String> = ba.columns().iter().collect();
        assert_eq!(ab_cols, ba_cols);
        assert_eq!(ab.ids(), ba.ids());

        for (i, column) in ab.columns().iter().enumerate() {
            let j = ba.columns().iter().position(|c| c == column).unwrap();
            assert_eq!(ab.confusion(i), ba.confusion(j).transpose());
        }
    }
}
