//! Report identity and text.
//!
//! A `ReportId` is the stable key joining every table the pipeline writes
//! or reads. Ordering is part of the output contract: tables are persisted
//! ascending by id, so the order must be total and independent of input
//! order.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Identifier of a single report, kept exactly as read.
///
/// Ids that parse as integers order numerically (`2 < 10`) and come before
/// any non-numeric id; non-numeric ids order lexicographically. Two ids are
/// equal only when their raw text is equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportId(String);

impl ReportId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn numeric(&self) -> Option<i64> {
        self.0.parse::<i64>().ok()
    }
}

impl Ord for ReportId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.numeric(), other.numeric()) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for ReportId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for ReportId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ReportId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<i64> for ReportId {
    fn from(raw: i64) -> Self {
        Self(raw.to_string())
    }
}

/// One report's text as seen by a single organ module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub id: ReportId,
    pub text: String,
}

impl Report {
    pub fn new(id: impl Into<ReportId>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}
