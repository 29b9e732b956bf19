//! Attribute cascade: presence gates location, count and onset.
//!
//! One cascade run decides the full `ExtractionResult` of one
//! (report, abnormality) pair. Location and count are asked concurrently
//! once presence is positive; onset fans out once per positive site after
//! location has settled. Lobe splits and onset questions go through the
//! shared fan-out semaphore, so their concurrency is throttled apart from
//! the per-report concurrency of the caller.
//!
//! A failing stage is recorded on the result and leaves its columns at 0.
//! It never aborts sibling stages, other abnormalities or other reports.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures_util::future::join_all;
use tokio::sync::Semaphore;

use super::error::ExtractorError;
use super::traits::Extractor;
use super::types::*;
use crate::models::{CountClass, OnsetClass, Stage};
use crate::schema::{
    AbnormalityDefinition, LobarSide, LocationScheme, OrganSchema, Site, SiteKey, UNSPECIFIED_SITE,
};

pub const PRESENCE_FIELD: &str = "presence";
pub const EVIDENCE_FIELD: &str = "evidence";

/// Runs cascades for one organ against one Extractor.
pub struct AttributeCascade<'a> {
    extractor: &'a dyn Extractor,
    fanout: &'a Semaphore,
    organ: &'a str,
    organ_label: &'a str,
    calls: AtomicUsize,
}

impl<'a> AttributeCascade<'a> {
    pub fn new(extractor: &'a dyn Extractor, fanout: &'a Semaphore, schema: &'a OrganSchema) -> Self {
        Self {
            extractor,
            fanout,
            organ: schema.name(),
            organ_label: schema.label(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Extractor invocations made so far, failed ones included.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    pub async fn run(&self, def: &AbnormalityDefinition, text: &str) -> ExtractionResult {
        let mut result = ExtractionResult::absent();

        let fields = presence_fields(def);
        let answer = self
            .call(def, Stage::Presence, None, text, &fields)
            .await
            .and_then(|values| Ok((values.flag(PRESENCE_FIELD)?, values.text(EVIDENCE_FIELD)?)));

        let evidence = match answer {
            Ok((false, _)) => return result,
            // Nothing to point at: presence without evidence or section text.
            Ok((true, evidence)) if evidence.trim().is_empty() && text.trim().is_empty() => {
                tracing::debug!(
                    organ = self.organ,
                    abnormality = def.name,
                    "Presence on an empty section read as absent"
                );
                return result;
            }
            Ok((true, evidence)) => evidence,
            Err(error) => {
                result.failures.push(StageFailure {
                    stage: Stage::Presence,
                    scope: None,
                    error,
                });
                return result;
            }
        };

        result.presence = true;
        result.evidence_text = if evidence.trim().is_empty() {
            text.trim().to_string()
        } else {
            evidence
        };
        let evidence = result.evidence_text.as_str();

        let ((location, location_failures), (count, count_failures)) =
            tokio::join!(self.locate(def, evidence), self.count(def, evidence));

        let mut failures = location_failures;
        failures.extend(count_failures);

        let mut onsets = std::collections::BTreeMap::new();
        if def.has_onset {
            let targets = location.positive();
            let answers = join_all(targets.iter().map(|site| self.onset(def, *site, evidence))).await;
            for (site, answer) in targets.into_iter().zip(answers) {
                match answer {
                    Ok(onset) => {
                        onsets.insert(site, onset);
                    }
                    Err(error) => failures.push(StageFailure {
                        stage: Stage::Onset,
                        scope: Some(site_label(def, site)),
                        error,
                    }),
                }
            }
        }

        result.location = location;
        result.count = count;
        result.onsets = onsets;
        result.failures = failures;
        result
    }

    // ═══════════════════════════════════════════
    // Stages
    // ═══════════════════════════════════════════

    async fn locate(
        &self,
        def: &AbnormalityDefinition,
        evidence: &str,
    ) -> (LocationFlags, Vec<StageFailure>) {
        let sites = match def.location {
            LocationScheme::None => return (LocationFlags::default(), Vec::new()),
            LocationScheme::Lobar(sides) => return self.locate_lobar(def, sides, evidence).await,
            LocationScheme::BinarySides(sites) | LocationScheme::MultiSite(sites) => sites,
        };

        let fields = site_fields(def, sites, true);
        let answer = self
            .call(def, Stage::Location, None, evidence, &fields)
            .await
            .and_then(|values| read_sites(&values, sites));

        match answer {
            Ok(flags) => (flags, Vec::new()),
            Err(error) => (
                LocationFlags::default(),
                vec![StageFailure {
                    stage: Stage::Location,
                    scope: None,
                    error,
                }],
            ),
        }
    }

    /// Side first, then one lobe question per positive side.
    async fn locate_lobar(
        &self,
        def: &AbnormalityDefinition,
        sides: &'static [LobarSide],
        evidence: &str,
    ) -> (LocationFlags, Vec<StageFailure>) {
        let side_sites: Vec<Site> = sides.iter().map(|s| s.side).collect();
        let fields = site_fields(def, &side_sites, true);
        let answer = self
            .call(def, Stage::Location, None, evidence, &fields)
            .await
            .and_then(|values| read_sites(&values, &side_sites));

        let side_flags = match answer {
            Ok(flags) => flags,
            Err(error) => {
                return (
                    LocationFlags::default(),
                    vec![StageFailure {
                        stage: Stage::Location,
                        scope: None,
                        error,
                    }],
                )
            }
        };

        let positive: Vec<&LobarSide> = sides
            .iter()
            .filter(|s| side_flags.sites.contains(s.side.key))
            .collect();
        let answers = join_all(positive.iter().map(|side| self.split_side(def, side, evidence))).await;

        let mut flags = LocationFlags {
            sites: BTreeSet::new(),
            unspecified: side_flags.unspecified,
        };
        let mut failures = Vec::new();
        for (side, answer) in positive.into_iter().zip(answers) {
            match answer {
                Ok(lobes) => flags.sites.extend(lobes),
                Err(error) => failures.push(StageFailure {
                    stage: Stage::Location,
                    scope: Some(side.side.label.to_string()),
                    error,
                }),
            }
        }
        (flags, failures)
    }

    /// Lobes of one positive side. A side with no lobe named is flagged as
    /// lobe-unspecified.
    async fn split_side(
        &self,
        def: &AbnormalityDefinition,
        side: &LobarSide,
        evidence: &str,
    ) -> Result<Vec<&'static str>, ExtractorError> {
        let mut sites = side.lobes.to_vec();
        sites.push(side.unspecified);
        let fields = site_fields(def, &sites, false);

        let values = self
            .throttled_call(def, Stage::Location, Some(side.side.label), evidence, &fields)
            .await?;

        let mut positive = Vec::new();
        for site in &sites {
            if values.flag(site.key)? {
                positive.push(site.key);
            }
        }
        if positive.is_empty() {
            positive.push(side.unspecified.key);
        }
        Ok(positive)
    }

    async fn count(
        &self,
        def: &AbnormalityDefinition,
        evidence: &str,
    ) -> (Option<CountClass>, Vec<StageFailure>) {
        if !def.has_count {
            return (None, Vec::new());
        }

        let fields = vec![
            TargetField::flag(
                CountClass::Single.as_str(),
                format!("1 if exactly one {} is described", def.label),
            ),
            TargetField::flag(
                CountClass::Multiple.as_str(),
                format!(
                    "1 if more than one {} is described, including findings at different locations",
                    def.label
                ),
            ),
        ];
        let answer = self
            .call(def, Stage::Count, None, evidence, &fields)
            .await
            .and_then(|values| single_choice(&values, Stage::Count, CountClass::all(), |c| c.as_str()));

        match answer {
            Ok(count) => (Some(count), Vec::new()),
            Err(error) => (
                None,
                vec![StageFailure {
                    stage: Stage::Count,
                    scope: None,
                    error,
                }],
            ),
        }
    }

    async fn onset(
        &self,
        def: &AbnormalityDefinition,
        site: SiteKey,
        evidence: &str,
    ) -> Result<OnsetClass, ExtractorError> {
        let label = site_label(def, site);
        let fields = vec![
            TargetField::flag(
                OnsetClass::New.as_str(),
                format!("1 if the {} at the {label} is described as new or acute", def.label),
            ),
            TargetField::flag(
                OnsetClass::OldHealed.as_str(),
                format!("1 if the {} at the {label} is described as old or healed", def.label),
            ),
            TargetField::flag(
                OnsetClass::Unspecified.as_str(),
                format!("1 if the onset of the {} at the {label} is not stated", def.label),
            ),
        ];

        let values = self
            .throttled_call(def, Stage::Onset, Some(label.as_str()), evidence, &fields)
            .await?;
        single_choice(&values, Stage::Onset, OnsetClass::all(), |o| o.as_str())
    }

    // ═══════════════════════════════════════════
    // Extractor access
    // ═══════════════════════════════════════════

    async fn call(
        &self,
        def: &AbnormalityDefinition,
        stage: Stage,
        scope: Option<&str>,
        text: &str,
        fields: &[TargetField],
    ) -> Result<FieldValues, ExtractorError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let request = ExtractionRequest {
            organ: self.organ,
            organ_label: self.organ_label,
            abnormality: Some(def),
            stage,
            scope,
            text,
            fields,
        };
        self.extractor.extract(&request).await
    }

    async fn throttled_call(
        &self,
        def: &AbnormalityDefinition,
        stage: Stage,
        scope: Option<&str>,
        text: &str,
        fields: &[TargetField],
    ) -> Result<FieldValues, ExtractorError> {
        let _permit = self
            .fanout
            .acquire()
            .await
            .map_err(|_| ExtractorError::Cancelled)?;
        self.call(def, stage, scope, text, fields).await
    }
}

// ═══════════════════════════════════════════
// Field construction / reading
// ═══════════════════════════════════════════

fn presence_fields(def: &AbnormalityDefinition) -> Vec<TargetField> {
    vec![
        TargetField::flag(
            PRESENCE_FIELD,
            format!("1 if a {} is reported as present, 0 if absent or not mentioned", def.label),
        ),
        TargetField::text(
            EVIDENCE_FIELD,
            format!("the sentence(s) describing the {}, empty if absent", def.label),
        ),
    ]
}

fn site_fields(def: &AbnormalityDefinition, sites: &[Site], with_unspecified: bool) -> Vec<TargetField> {
    let mut fields: Vec<TargetField> = sites
        .iter()
        .map(|site| {
            TargetField::flag(
                site.key,
                format!("1 if the {} is located in the {}", def.label, site.label),
            )
        })
        .collect();
    if with_unspecified {
        fields.push(TargetField::flag(
            UNSPECIFIED_SITE,
            format!("1 if a {} is mentioned without a specific location", def.label),
        ));
    }
    fields
}

fn read_sites(values: &FieldValues, sites: &[Site]) -> Result<LocationFlags, ExtractorError> {
    let mut flags = LocationFlags::default();
    for site in sites {
        if values.flag(site.key)? {
            flags.sites.insert(site.key);
        }
    }
    flags.unspecified = values.flag(UNSPECIFIED_SITE)?;
    Ok(flags)
}

/// Exactly one of `options` must be flagged.
fn single_choice<T: Copy>(
    values: &FieldValues,
    stage: Stage,
    options: &[T],
    key: impl Fn(&T) -> &'static str,
) -> Result<T, ExtractorError> {
    let mut chosen = Vec::new();
    for option in options {
        if values.flag(key(option))? {
            chosen.push(*option);
        }
    }
    match chosen.as_slice() {
        [one] => Ok(*one),
        [] => Err(ExtractorError::Ambiguous {
            stage,
            detail: "no class selected".to_string(),
        }),
        many => Err(ExtractorError::Ambiguous {
            stage,
            detail: format!(
                "several classes selected: {}",
                many.iter().map(|o| key(o)).collect::<Vec<_>>().join(", ")
            ),
        }),
    }
}

fn site_label(def: &AbnormalityDefinition, site: SiteKey) -> String {
    match site {
        SiteKey::Site(key) => def
            .location
            .sites()
            .into_iter()
            .find(|s| s.key == key)
            .map(|s| s.label.to_string())
            .unwrap_or_else(|| key.to_string()),
        SiteKey::Unspecified => "unspecified location".to_string(),
    }
}
