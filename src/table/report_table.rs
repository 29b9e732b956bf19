//! Report tables: raw `(id, text)` input and the sectioned per-organ table.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use super::error::TableError;
use crate::models::{Organ, Report, ReportId};
use crate::schema::{OrganSchema, ID_COLUMN};

/// Default free-text column of a raw report table.
pub const RAW_TEXT_COLUMN: &str = "report";

/// Column carrying the unsplit report in the sectioned table.
pub const ORIGINAL_REPORT_COLUMN: &str = "original_report";

/// One report routed into per-organ sub-texts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionedReport {
    pub id: ReportId,
    pub original: String,
    pub sections: BTreeMap<Organ, String>,
}

impl SectionedReport {
    pub fn section(&self, organ: Organ) -> &str {
        self.sections.get(&organ).map(String::as_str).unwrap_or("")
    }
}

/// Read `(id, text_column)` pairs from a CSV file.
pub fn read_reports(path: &Path, text_column: &str) -> Result<Vec<Report>, TableError> {
    let file = std::fs::File::open(path).map_err(|e| TableError::io(path, e))?;
    read_reports_from(file, path, &[text_column])
}

/// Read the text an organ module works on: its `{organ}_report` column,
/// or the whole `report` column when the table was never sectioned.
pub fn read_organ_reports(path: &Path, schema: &OrganSchema) -> Result<Vec<Report>, TableError> {
    let file = std::fs::File::open(path).map_err(|e| TableError::io(path, e))?;
    read_reports_from(file, path, &[schema.report_column(), RAW_TEXT_COLUMN])
}

/// Read ids and the first of `text_columns` present in the header.
pub fn read_reports_from<R: Read>(
    reader: R,
    source: &Path,
    text_columns: &[&str],
) -> Result<Vec<Report>, TableError> {
    let mut csv = csv::Reader::from_reader(reader);
    let headers = csv.headers().map_err(|e| TableError::csv(source, e))?.clone();

    let id_idx = column_index(&headers, ID_COLUMN).ok_or_else(|| TableError::MissingColumn {
        path: source.to_path_buf(),
        column: ID_COLUMN.to_string(),
    })?;
    let text_idx = text_columns
        .iter()
        .find_map(|c| column_index(&headers, c))
        .ok_or_else(|| TableError::MissingColumn {
            path: source.to_path_buf(),
            column: text_columns.first().copied().unwrap_or(RAW_TEXT_COLUMN).to_string(),
        })?;

    let mut reports = Vec::new();
    for record in csv.records() {
        let record = record.map_err(|e| TableError::csv(source, e))?;
        let id = record.get(id_idx).unwrap_or_default();
        let text = record.get(text_idx).unwrap_or_default();
        reports.push(Report::new(id, text));
    }
    Ok(reports)
}

/// Write the sectioned table: `id, original_report, {organ}_report...`.
pub fn write_sectioned(path: &Path, rows: &[SectionedReport]) -> Result<(), TableError> {
    super::persist_csv(path, |file| {
        let mut out = csv::Writer::from_writer(file);
        let mut header = vec![ID_COLUMN.to_string(), ORIGINAL_REPORT_COLUMN.to_string()];
        header.extend(Organ::all().iter().map(|o| o.report_column()));
        out.write_record(&header)?;

        for row in rows {
            let mut record = vec![row.id.to_string(), row.original.clone()];
            record.extend(Organ::all().iter().map(|o| row.section(*o).to_string()));
            out.write_record(&record)?;
        }
        out.flush()?;
        Ok(())
    })
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim() == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_id_and_text_columns() {
        let data = "id,report,extra\n1,No nodules.,x\n2,\"Mass, right.\",y\n";
        let reports = read_reports_from(data.as_bytes(), Path::new("in.csv"), &["report"]).unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[1].id, ReportId::from("2"));
        assert_eq!(reports[1].text, "Mass, right.");
    }

    #[test]
    fn organ_column_wins_over_full_report() {
        let data = "id,report,lung_report\n1,everything,lung only\n";
        let reports =
            read_reports_from(data.as_bytes(), Path::new("f.csv"), &["lung_report", "report"]).unwrap();
        assert_eq!(reports[0].text, "lung only");
    }

    #[test]
    fn falls_back_to_full_report() {
        let data = "id,report\n1,everything\n";
        let reports =
            read_reports_from(data.as_bytes(), Path::new("f.csv"), &["lung_report", "report"]).unwrap();
        assert_eq!(reports[0].text, "everything");
    }

    #[test]
    fn missing_id_column_is_reported() {
        let data = "key,report\n1,x\n";
        let err = read_reports_from(data.as_bytes(), Path::new("f.csv"), &["report"]).unwrap_err();
        assert!(matches!(err, TableError::MissingColumn { ref column, .. } if column == "id"));
    }

    #[test]
    fn sectioned_table_roundtrips_through_organ_reader() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("format.csv");
        let mut sections = BTreeMap::new();
        sections.insert(Organ::Abdomen, "Liver cyst.".to_string());
        let rows = vec![SectionedReport {
            id: ReportId::from("4"),
            original: "Lungs clear. Liver cyst.".into(),
            sections,
        }];
        write_sectioned(&path, &rows).unwrap();

        let abdomen = read_organ_reports(&path, &OrganSchema::builtin(Organ::Abdomen)).unwrap();
        assert_eq!(abdomen[0].text, "Liver cyst.");
        let lung = read_organ_reports(&path, &OrganSchema::builtin(Organ::Lung)).unwrap();
        assert_eq!(lung[0].text, "");
    }
}
