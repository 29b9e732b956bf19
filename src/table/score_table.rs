//! Raw cell view of a WideTable, as read back for scoring.
//!
//! Cells stay text here; interpreting them as 0/1 is the aligner's job so
//! that a malformed ground-truth cell surfaces as a schema violation.

use std::io::Read;
use std::path::Path;

use super::error::TableError;
use super::wide_table::WideTable;
use crate::models::ReportId;
use crate::schema::ID_COLUMN;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreTable {
    /// Every column except `id`, in file order.
    columns: Vec<String>,
    ids: Vec<ReportId>,
    /// One entry per id, aligned with `columns`.
    cells: Vec<Vec<String>>,
}

impl ScoreTable {
    pub fn new(columns: Vec<String>, rows: Vec<(ReportId, Vec<String>)>) -> Self {
        let (ids, cells) = rows.into_iter().unzip();
        Self { columns, ids, cells }
    }

    pub fn read_csv(path: &Path) -> Result<Self, TableError> {
        let file = std::fs::File::open(path).map_err(|e| TableError::io(path, e))?;
        Self::from_reader(file, path)
    }

    pub fn from_reader<R: Read>(reader: R, source: &Path) -> Result<Self, TableError> {
        let mut csv = csv::Reader::from_reader(reader);
        let headers = csv.headers().map_err(|e| TableError::csv(source, e))?.clone();

        let id_idx = headers
            .iter()
            .position(|h| h.trim() == ID_COLUMN)
            .ok_or_else(|| TableError::MissingColumn {
                path: source.to_path_buf(),
                column: ID_COLUMN.to_string(),
            })?;

        let columns = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != id_idx)
            .map(|(_, h)| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for record in csv.records() {
            let record = record.map_err(|e| TableError::csv(source, e))?;
            let id = ReportId::new(record.get(id_idx).unwrap_or_default());
            let cells = record
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != id_idx)
                .map(|(_, v)| v.to_string())
                .collect();
            rows.push((id, cells));
        }
        Ok(Self::new(columns, rows))
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn ids(&self) -> &[ReportId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn row(&self, index: usize) -> &[String] {
        &self.cells[index]
    }
}

impl From<&WideTable> for ScoreTable {
    fn from(table: &WideTable) -> Self {
        let columns = table.header()[1..].to_vec();
        let rows = table
            .rows()
            .iter()
            .map(|row| {
                let mut cells = Vec::with_capacity(columns.len());
                cells.push(row.text.clone());
                cells.extend(row.cells.iter().map(|c| c.to_string()));
                (row.id.clone(), cells)
            })
            .collect();
        Self::new(columns, rows)
    }
}
