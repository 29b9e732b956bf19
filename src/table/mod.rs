//! Tabular persistence: report input, sectioned reports, WideTables and
//! the raw tables the evaluator scores.

pub mod error;
pub mod report_table;
pub mod score_table;
pub mod wide_table;

pub use error::TableError;
pub use report_table::*;
pub use score_table::ScoreTable;
pub use wide_table::{ResultRow, WideTable};

use std::fs::File;
use std::path::Path;

/// Write a CSV to `path` through a sibling temp file, so readers never see
/// a half-written table.
pub(crate) fn persist_csv<F>(path: &Path, write: F) -> Result<(), TableError>
where
    F: FnOnce(&mut File) -> Result<(), csv::Error>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| TableError::io(dir, e))?;
    write(tmp.as_file_mut()).map_err(|e| TableError::csv(path, e))?;
    tmp.persist(path).map_err(|e| TableError::Persist {
        path: path.to_path_buf(),
        reason: e.error.to_string(),
    })?;
    Ok(())
}
