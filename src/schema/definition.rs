//! Declarative description of one tracked finding.
//!
//! An organ's `AbnormalityDefinition` table is the single source of truth
//! for both what the cascade asks the Extractor and which columns the
//! organ's WideTable carries. Header generation and row flattening walk
//! the same `ColumnSlot` list, so the two can never disagree.

use std::collections::HashSet;

use crate::models::{CountClass, OnsetClass};
use crate::pipeline::batch_extraction::error::ConfigurationError;

/// Column / field key of the location marker independent of explicit sites.
pub const UNSPECIFIED_SITE: &str = "unspecified";

/// One anatomical site a finding can be flagged at.
///
/// `key` is both the column suffix and the Extractor field name;
/// `label` is the wording used when asking about the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Site {
    pub key: &'static str,
    pub label: &'static str,
}

impl Site {
    pub const fn new(key: &'static str, label: &'static str) -> Self {
        Self { key, label }
    }
}

/// One side of a two-level (side, then lobe) location scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LobarSide {
    /// Field asked in the side pass (`right`, `left`).
    pub side: Site,
    /// Lobes asked in the per-side pass.
    pub lobes: &'static [Site],
    /// "Side known, lobe not specified" marker, its own column.
    pub unspecified: Site,
}

/// How a finding's location is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationScheme {
    /// No location columns.
    None,
    /// Two lateral sites, both may be set at once (bilateral).
    BinarySides(&'static [Site]),
    /// Any number of named sites, any subset may be set.
    MultiSite(&'static [Site]),
    /// One side call, then one lobe call per positive side.
    Lobar(&'static [LobarSide]),
}

impl LocationScheme {
    /// Every site column of the scheme, in header order, excluding the
    /// global `unspecified` marker.
    pub fn sites(&self) -> Vec<Site> {
        match self {
            Self::None => Vec::new(),
            Self::BinarySides(sites) | Self::MultiSite(sites) => sites.to_vec(),
            Self::Lobar(sides) => sides
                .iter()
                .flat_map(|s| s.lobes.iter().copied().chain(std::iter::once(s.unspecified)))
                .collect(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::BinarySides(_) => "binary_sides",
            Self::MultiSite(_) => "multi_site",
            Self::Lobar(_) => "lobar",
        }
    }
}

/// Static description of one tracked finding within an organ.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbnormalityDefinition {
    /// Column prefix, unique within the organ (`Kidney_Cyst`).
    pub name: &'static str,
    /// Wording used in prompts (`kidney cyst`).
    pub label: &'static str,
    /// Relevant terms and exclusions for the presence stage.
    pub hint: &'static str,
    pub location: LocationScheme,
    pub has_count: bool,
    /// Onset is evaluated once per positive site, so it needs a location.
    pub has_onset: bool,
}

impl AbnormalityDefinition {
    /// Presence-only finding.
    pub const fn presence(name: &'static str, label: &'static str, hint: &'static str) -> Self {
        Self {
            name,
            label,
            hint,
            location: LocationScheme::None,
            has_count: false,
            has_onset: false,
        }
    }

    pub const fn located(mut self, location: LocationScheme) -> Self {
        self.location = location;
        self
    }

    pub const fn counted(mut self) -> Self {
        self.has_count = true;
        self
    }

    pub const fn with_onset(mut self) -> Self {
        self.has_onset = true;
        self
    }

    pub fn has_location(&self) -> bool {
        !matches!(self.location, LocationScheme::None)
    }

    /// Column slots in header order: presence, location (with onset
    /// compounds when onset-scoped), then count.
    pub fn slots(&self) -> Vec<ColumnSlot> {
        let mut slots = vec![ColumnSlot::Presence];

        if self.has_location() {
            let sites = self
                .location
                .sites()
                .into_iter()
                .map(|s| SiteKey::Site(s.key))
                .chain(std::iter::once(SiteKey::Unspecified));

            for site in sites {
                slots.push(ColumnSlot::Location(site));
                if self.has_onset {
                    for onset in OnsetClass::all() {
                        slots.push(ColumnSlot::Onset(site, *onset));
                    }
                }
            }
        }

        if self.has_count {
            for count in CountClass::all() {
                slots.push(ColumnSlot::Count(*count));
            }
        }

        slots
    }

    pub fn column_name(&self, slot: &ColumnSlot) -> String {
        match slot {
            ColumnSlot::Presence => format!("{}_presence", self.name),
            ColumnSlot::Location(site) if self.has_onset => {
                format!("{}_{}_presence", self.name, site.key())
            }
            ColumnSlot::Location(site) => format!("{}_{}", self.name, site.key()),
            ColumnSlot::Onset(site, onset) => {
                format!("{}_{}_{}", self.name, site.key(), onset.as_str())
            }
            ColumnSlot::Count(count) => format!("{}_{}", self.name, count.as_str()),
        }
    }

    pub fn columns(&self) -> Vec<String> {
        self.slots().iter().map(|s| self.column_name(s)).collect()
    }

    /// Reject stage combinations the cascade cannot honor.
    pub fn validate(&self, organ: &str) -> Result<(), ConfigurationError> {
        let inconsistent = |reason: &str| ConfigurationError::InconsistentDefinition {
            organ: organ.to_string(),
            abnormality: self.name.to_string(),
            reason: reason.to_string(),
        };

        if self.name.trim().is_empty() {
            return Err(inconsistent("name is empty"));
        }
        if self.has_onset && !self.has_location() {
            return Err(inconsistent("onset is location-scoped but no location scheme is declared"));
        }

        let sites = self.location.sites();
        match self.location {
            LocationScheme::BinarySides(s) if s.len() != 2 => {
                return Err(inconsistent("binary sides scheme needs exactly two sites"));
            }
            LocationScheme::MultiSite(s) if s.is_empty() => {
                return Err(inconsistent("multi-site scheme declares no sites"));
            }
            LocationScheme::Lobar(s) if s.is_empty() || s.iter().any(|side| side.lobes.is_empty()) => {
                return Err(inconsistent("lobar scheme needs sides with at least one lobe"));
            }
            _ => {}
        }

        let mut seen = HashSet::new();
        for site in &sites {
            if site.key == UNSPECIFIED_SITE {
                return Err(inconsistent("site key 'unspecified' is reserved"));
            }
            if !seen.insert(site.key) {
                return Err(inconsistent(&format!("site '{}' declared twice", site.key)));
            }
        }
        if let LocationScheme::Lobar(sides) = self.location {
            for side in sides {
                if side.side.key == UNSPECIFIED_SITE {
                    return Err(inconsistent("side key 'unspecified' is reserved"));
                }
            }
        }

        Ok(())
    }
}

/// Site reference inside a column slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SiteKey {
    Site(&'static str),
    Unspecified,
}

impl SiteKey {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Site(key) => key,
            Self::Unspecified => UNSPECIFIED_SITE,
        }
    }
}

/// One output column of a finding, independent of its rendered name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnSlot {
    Presence,
    Location(SiteKey),
    Onset(SiteKey, OnsetClass),
    Count(CountClass),
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIDES: &[Site] = &[Site::new("right", "right kidney"), Site::new("left", "left kidney")];
    const RIBS: &[Site] = &[Site::new("right_1", "right 1st rib"), Site::new("left_1", "left 1st rib")];

    #[test]
    fn presence_only_emits_one_column() {
        let def = AbnormalityDefinition::presence("Gallstone", "gallstone", "");
        assert_eq!(def.columns(), vec!["Gallstone_presence"]);
    }

    #[test]
    fn sides_and_count_follow_naming_scheme() {
        let def = AbnormalityDefinition::presence("Kidney_Cyst", "kidney cyst", "")
            .located(LocationScheme::BinarySides(SIDES))
            .counted();
        assert_eq!(
            def.columns(),
            vec![
                "Kidney_Cyst_presence",
                "Kidney_Cyst_right",
                "Kidney_Cyst_left",
                "Kidney_Cyst_unspecified",
                "Kidney_Cyst_single",
                "Kidney_Cyst_multiple",
            ]
        );
    }

    #[test]
    fn onset_scoped_sites_emit_compound_columns() {
        let def = AbnormalityDefinition::presence("Rib_Fracture", "rib fracture", "")
            .located(LocationScheme::MultiSite(RIBS))
            .with_onset();
        let columns = def.columns();
        assert_eq!(columns.len(), 1 + 3 * 4);
        assert_eq!(columns[1], "Rib_Fracture_right_1_presence");
        assert_eq!(columns[2], "Rib_Fracture_right_1_new");
        assert_eq!(columns[3], "Rib_Fracture_right_1_old_healed");
        assert_eq!(columns[4], "Rib_Fracture_right_1_unspecified");
        assert_eq!(columns[9], "Rib_Fracture_unspecified_presence");
        assert_eq!(columns[12], "Rib_Fracture_unspecified_unspecified");
    }

    #[test]
    fn onset_without_location_is_rejected() {
        let def = AbnormalityDefinition::presence("Rib_Fracture", "rib fracture", "").with_onset();
        let err = def.validate("osseous_structure").unwrap_err();
        assert!(matches!(err, ConfigurationError::InconsistentDefinition { .. }));
        assert!(err.to_string().contains("Rib_Fracture"));
    }

    #[test]
    fn binary_sides_need_two_sites() {
        const ONE: &[Site] = &[Site::new("right", "right")];
        let def = AbnormalityDefinition::presence("X", "x", "").located(LocationScheme::BinarySides(ONE));
        assert!(def.validate("organ").is_err());
    }

    #[test]
    fn reserved_site_key_is_rejected() {
        const BAD: &[Site] = &[Site::new("unspecified", "anywhere")];
        let def = AbnormalityDefinition::presence("X", "x", "").located(LocationScheme::MultiSite(BAD));
        assert!(def.validate("organ").is_err());
    }

    #[test]
    fn lobar_sites_include_side_unspecified_markers() {
        const LEFT: &[Site] = &[Site::new("lul", "left upper lobe")];
        const SIDES: &[LobarSide] = &[LobarSide {
            side: Site::new("left", "left lung"),
            lobes: LEFT,
            unspecified: Site::new("left_unspecified", "left lung, lobe not specified"),
        }];
        let def = AbnormalityDefinition::presence("Mass", "mass", "").located(LocationScheme::Lobar(SIDES));
        assert_eq!(
            def.columns(),
            vec!["Mass_presence", "Mass_lul", "Mass_left_unspecified", "Mass_unspecified"]
        );
        assert!(def.validate("lung").is_ok());
    }
}
