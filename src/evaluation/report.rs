//! MetricReport: per-column, per-organ, organ-average and pooled F1.

use std::io::Write;
use std::path::Path;

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use super::aligner::AlignedPair;
use super::error::EvaluationError;
use super::metrics::ConfusionCounts;
use crate::pipeline::batch_extraction::PipelineError;

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnScore {
    pub column: String,
    pub counts: ConfusionCounts,
    pub f1: f64,
}

/// Scores of one successfully aligned organ.
#[derive(Debug, Clone, PartialEq)]
pub struct OrganScore {
    pub rows: usize,
    pub columns: Vec<ColumnScore>,
}

impl OrganScore {
    pub fn from_pair(pair: &AlignedPair) -> Self {
        let columns = pair
            .columns()
            .iter()
            .enumerate()
            .map(|(i, column)| {
                let counts = pair.confusion(i);
                ColumnScore {
                    column: column.clone(),
                    counts,
                    f1: counts.f1(),
                }
            })
            .collect();
        Self {
            rows: pair.ids().len(),
            columns,
        }
    }

    /// Mean of the column F1 scores.
    pub fn f1(&self) -> f64 {
        if self.columns.is_empty() {
            return 0.0;
        }
        self.columns.iter().map(|c| c.f1).sum::<f64>() / self.columns.len() as f64
    }

    /// Every cell of the organ as one confusion count.
    pub fn pooled(&self) -> ConfusionCounts {
        let mut pooled = ConfusionCounts::default();
        for column in &self.columns {
            pooled += column.counts;
        }
        pooled
    }

    pub fn column(&self, name: &str) -> Option<&ColumnScore> {
        self.columns.iter().find(|c| c.column == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrganEntry {
    pub organ: String,
    /// Error message when the organ could not be scored.
    pub outcome: Result<OrganScore, String>,
}

/// Evaluation result over every requested organ, in request order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricReport {
    entries: Vec<OrganEntry>,
}

impl MetricReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, organ: &str, outcome: Result<OrganScore, EvaluationError>) {
        self.entries.push(OrganEntry {
            organ: organ.to_string(),
            outcome: outcome.map_err(|e| e.to_string()),
        });
    }

    pub fn entries(&self) -> &[OrganEntry] {
        &self.entries
    }

    pub fn organ(&self, organ: &str) -> Option<&OrganEntry> {
        self.entries.iter().find(|e| e.organ == organ)
    }

    /// Per-organ F1, `None` when the organ failed or was not evaluated.
    pub fn organ_f1(&self, organ: &str) -> Option<f64> {
        self.organ(organ)
            .and_then(|e| e.outcome.as_ref().ok())
            .map(OrganScore::f1)
    }

    pub fn failed_organs(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.outcome.is_err())
            .map(|e| e.organ.as_str())
            .collect()
    }

    fn scored(&self) -> impl Iterator<Item = &OrganScore> {
        self.entries.iter().filter_map(|e| e.outcome.as_ref().ok())
    }

    /// Macro: mean of organ F1 over organs that produced a score.
    pub fn organ_average(&self) -> Option<f64> {
        let scores: Vec<f64> = self.scored().map(OrganScore::f1).collect();
        if scores.is_empty() {
            return None;
        }
        Some(scores.iter().sum::<f64>() / scores.len() as f64)
    }

    /// Confusion counts over every scored cell of every organ.
    pub fn pooled(&self) -> ConfusionCounts {
        let mut pooled = ConfusionCounts::default();
        for score in self.scored() {
            pooled += score.pooled();
        }
        pooled
    }

    /// Micro: one F1 over the pooled counts.
    pub fn total(&self) -> Option<f64> {
        let pooled = self.pooled();
        if pooled.total() == 0 {
            return None;
        }
        Some(pooled.f1())
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write the report as JSON through a sibling temp file.
    pub fn persist(&self, path: &Path) -> Result<(), PipelineError> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(tmp.as_file_mut(), self)?;
        tmp.as_file_mut().write_all(b"\n")?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }
}

struct OrganJson<'a>(&'a OrganEntry);

impl Serialize for OrganJson<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.0.outcome {
            Ok(score) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("f1_score", &score.f1())?;
                map.serialize_entry("columns", &ColumnsJson(&score.columns))?;
                map.end()
            }
            Err(error) => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("f1_score", &Option::<f64>::None)?;
                map.serialize_entry("columns", &ColumnsJson(&[]))?;
                map.serialize_entry("error", error)?;
                map.end()
            }
        }
    }
}

struct ColumnsJson<'a>(&'a [ColumnScore]);

impl Serialize for ColumnsJson<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for column in self.0 {
            map.serialize_entry(&column.column, &column.f1)?;
        }
        map.end()
    }
}

struct ScoreJson(Option<f64>);

impl Serialize for ScoreJson {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("f1_score", &self.0)?;
        map.end()
    }
}

impl Serialize for MetricReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len() + 2))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.organ, &OrganJson(entry))?;
        }
        map.serialize_entry("organ_average", &ScoreJson(self.organ_average()))?;
        map.serialize_entry("Total", &ScoreJson(self.total()))?;
        map.end()
    }
}
