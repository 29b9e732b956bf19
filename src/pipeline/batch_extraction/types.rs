//! Types exchanged between the cascade and its Extractor.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::error::ExtractorError;
use crate::models::{CountClass, OnsetClass, ReportId, Stage};
use crate::schema::{AbnormalityDefinition, ColumnSlot, SiteKey};

// ═══════════════════════════════════════════
// Extractor request / response
// ═══════════════════════════════════════════

/// Value shape a target field expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// 0/1 answer.
    Flag,
    /// Short free text (evidence sentence, routed section).
    Text,
}

/// One field the Extractor is asked to fill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetField {
    pub name: String,
    pub kind: FieldKind,
    pub description: String,
}

impl TargetField {
    pub fn flag(name: &str, description: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::Flag,
            description: description.into(),
        }
    }

    pub fn text(name: &str, description: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::Text,
            description: description.into(),
        }
    }
}

/// One Extractor invocation.
#[derive(Debug, Clone, Copy)]
pub struct ExtractionRequest<'a> {
    pub organ: &'a str,
    pub organ_label: &'a str,
    /// `None` for organ-level stages (sectioning).
    pub abnormality: Option<&'a AbnormalityDefinition>,
    pub stage: Stage,
    /// Narrowing of the question within the stage, e.g. the side being
    /// split into lobes or the site whose onset is asked.
    pub scope: Option<&'a str>,
    pub text: &'a str,
    pub fields: &'a [TargetField],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Flag(bool),
    Text(String),
}

/// Field name to value mapping returned by an Extractor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldValues(BTreeMap<String, FieldValue>);

impl FieldValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        self.0.insert(name.into(), value);
    }

    pub fn with_flag(mut self, name: &str, value: bool) -> Self {
        self.insert(name, FieldValue::Flag(value));
        self
    }

    pub fn with_text(mut self, name: &str, value: impl Into<String>) -> Self {
        self.insert(name, FieldValue::Text(value.into()));
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Read a 0/1 field. Text answers are accepted when they spell a flag.
    pub fn flag(&self, name: &str) -> Result<bool, ExtractorError> {
        match self.0.get(name) {
            Some(FieldValue::Flag(value)) => Ok(*value),
            Some(FieldValue::Text(raw)) => {
                parse_flag(raw).ok_or_else(|| ExtractorError::InvalidField {
                    field: name.to_string(),
                    value: raw.clone(),
                })
            }
            None => Err(ExtractorError::MissingField(name.to_string())),
        }
    }

    /// Read a text field. A missing text field reads as empty.
    pub fn text(&self, name: &str) -> Result<String, ExtractorError> {
        match self.0.get(name) {
            Some(FieldValue::Text(raw)) => Ok(raw.trim().to_string()),
            Some(FieldValue::Flag(value)) => Err(ExtractorError::InvalidField {
                field: name.to_string(),
                value: value.to_string(),
            }),
            None => Ok(String::new()),
        }
    }
}

/// Parse the textual spellings of a flag.
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

// ═══════════════════════════════════════════
// Cascade outcome
// ═══════════════════════════════════════════

/// Positively flagged sites of one finding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationFlags {
    pub sites: BTreeSet<&'static str>,
    /// Finding mentioned without a site. Independent of `sites`.
    pub unspecified: bool,
}

impl LocationFlags {
    pub fn contains(&self, site: SiteKey) -> bool {
        match site {
            SiteKey::Site(key) => self.sites.contains(key),
            SiteKey::Unspecified => self.unspecified,
        }
    }

    /// Positive site keys, explicit sites first, `unspecified` last.
    pub fn positive(&self) -> Vec<SiteKey> {
        let mut keys: Vec<SiteKey> = self.sites.iter().copied().map(SiteKey::Site).collect();
        if self.unspecified {
            keys.push(SiteKey::Unspecified);
        }
        keys
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty() && !self.unspecified
    }
}

/// A single stage that did not produce a usable answer.
#[derive(Debug, Clone, PartialEq)]
pub struct StageFailure {
    pub stage: Stage,
    pub scope: Option<String>,
    pub error: ExtractorError,
}

/// Full cascade outcome for one (report, abnormality) pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractionResult {
    pub presence: bool,
    /// Empty iff `presence` is false.
    pub evidence_text: String,
    pub location: LocationFlags,
    pub count: Option<CountClass>,
    /// Onset per positively flagged site.
    pub onsets: BTreeMap<SiteKey, OnsetClass>,
    pub failures: Vec<StageFailure>,
}

impl ExtractionResult {
    pub fn absent() -> Self {
        Self::default()
    }

    /// Whether the column behind `slot` is 1. Every dependent slot is
    /// gated on presence.
    pub fn is_set(&self, slot: &ColumnSlot) -> bool {
        if !self.presence {
            return false;
        }
        match slot {
            ColumnSlot::Presence => true,
            ColumnSlot::Location(site) => self.location.contains(*site),
            ColumnSlot::Onset(site, onset) => {
                self.location.contains(*site) && self.onsets.get(site) == Some(onset)
            }
            ColumnSlot::Count(count) => self.count == Some(*count),
        }
    }
}

/// Persisted record of one ExtractorFailure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureRecord {
    pub id: ReportId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abnormality: Option<String>,
    pub stage: Stage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    pub error: String,
}

impl FailureRecord {
    pub fn new(id: &ReportId, abnormality: Option<&str>, failure: &StageFailure) -> Self {
        Self {
            id: id.clone(),
            abnormality: abnormality.map(str::to_string),
            stage: failure.stage,
            scope: failure.scope.clone(),
            error: failure.error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_accepts_textual_spellings() {
        let values = FieldValues::new()
            .with_text("a", "1")
            .with_text("b", "No")
            .with_flag("c", true);
        assert!(values.flag("a").unwrap());
        assert!(!values.flag("b").unwrap());
        assert!(values.flag("c").unwrap());
    }

    #[test]
    fn flag_rejects_free_text() {
        let values = FieldValues::new().with_text("presence", "probably");
        let err = values.flag("presence").unwrap_err();
        assert!(matches!(err, ExtractorError::InvalidField { .. }));
    }

    #[test]
    fn missing_flag_is_an_error() {
        let err = FieldValues::new().flag("presence").unwrap_err();
        assert_eq!(err, ExtractorError::MissingField("presence".into()));
    }

    #[test]
    fn missing_text_reads_empty() {
        assert_eq!(FieldValues::new().text("evidence").unwrap(), "");
    }

    #[test]
    fn absent_result_sets_nothing() {
        let result = ExtractionResult::absent();
        assert!(!result.is_set(&ColumnSlot::Presence));
        assert!(!result.is_set(&ColumnSlot::Location(SiteKey::Unspecified)));
    }

    #[test]
    fn dependent_slots_are_gated_on_presence() {
        let mut result = ExtractionResult::absent();
        result.location.unspecified = true;
        result.count = Some(CountClass::Single);
        assert!(!result.is_set(&ColumnSlot::Count(CountClass::Single)));
        result.presence = true;
        assert!(result.is_set(&ColumnSlot::Count(CountClass::Single)));
        assert!(result.is_set(&ColumnSlot::Location(SiteKey::Unspecified)));
    }

    #[test]
    fn positive_sites_list_unspecified_last() {
        let mut flags = LocationFlags::default();
        flags.sites.insert("right");
        flags.unspecified = true;
        assert_eq!(flags.positive(), vec![SiteKey::Site("right"), SiteKey::Unspecified]);
    }
}
