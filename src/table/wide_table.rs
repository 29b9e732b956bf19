//! One organ's structured output: one 0/1 row per report.

use std::io::Write;
use std::path::Path;

use super::error::TableError;
use crate::models::ReportId;
use crate::schema::OrganSchema;

/// One report's flattened cascade outcomes. `cells` follow the schema
/// column order and hold only 0 or 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRow {
    pub id: ReportId,
    pub text: String,
    pub cells: Vec<u8>,
}

impl ResultRow {
    pub fn positives(&self) -> usize {
        self.cells.iter().filter(|c| **c == 1).count()
    }
}

/// Fixed-header table, rows ascending by id. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WideTable {
    organ: String,
    header: Vec<String>,
    rows: Vec<ResultRow>,
}

impl WideTable {
    /// Build from rows in any order; rows are sorted by id here, once.
    pub fn new(schema: &OrganSchema, mut rows: Vec<ResultRow>) -> Self {
        rows.sort_by(|a, b| a.id.cmp(&b.id));
        Self {
            organ: schema.name().to_string(),
            header: schema.header(),
            rows,
        }
    }

    pub fn organ(&self) -> &str {
        &self.organ
    }

    /// `id`, report column, then scored columns.
    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn report_column(&self) -> &str {
        &self.header[1]
    }

    /// Scored columns only.
    pub fn columns(&self) -> &[String] {
        &self.header[2..]
    }

    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Value of `column` in the row of `id`.
    pub fn cell(&self, id: &ReportId, column: &str) -> Option<u8> {
        let col = self.columns().iter().position(|c| c == column)?;
        let row = self.rows.iter().find(|r| &r.id == id)?;
        row.cells.get(col).copied()
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut out = csv::Writer::from_writer(writer);
        out.write_record(&self.header)?;
        for row in &self.rows {
            let mut record = Vec::with_capacity(self.header.len());
            record.push(row.id.to_string());
            record.push(row.text.clone());
            record.extend(row.cells.iter().map(|c| c.to_string()));
            out.write_record(&record)?;
        }
        out.flush()?;
        Ok(())
    }

    pub fn to_csv_bytes(&self) -> Result<Vec<u8>, csv::Error> {
        let mut buf = Vec::new();
        self.write_csv(&mut buf)?;
        Ok(buf)
    }

    pub fn persist(&self, path: &Path) -> Result<(), TableError> {
        super::persist_csv(path, |file| self.write_csv(file))
    }
}
