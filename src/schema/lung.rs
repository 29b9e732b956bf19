//! Lung parenchyma, small airway and pleural space.
//!
//! Column names keep the space-separated finding names of the reference
//! ground-truth tables (`Pleural Effusion_presence`).

use super::definition::{AbnormalityDefinition, LobarSide, LocationScheme, Site};

const LEFT_LOBES: &[Site] = &[
    Site::new("lul", "left upper lobe (including the lingula)"),
    Site::new("lll", "left lower lobe"),
];

const RIGHT_LOBES: &[Site] = &[
    Site::new("rul", "right upper lobe"),
    Site::new("rml", "right middle lobe"),
    Site::new("rll", "right lower lobe"),
];

const LOBES: &[LobarSide] = &[
    LobarSide {
        side: Site::new("left", "left lung"),
        lobes: LEFT_LOBES,
        unspecified: Site::new("left_unspecified", "left lung without a specified lobe"),
    },
    LobarSide {
        side: Site::new("right", "right lung"),
        lobes: RIGHT_LOBES,
        unspecified: Site::new("right_unspecified", "right lung without a specified lobe"),
    },
];

const LOBAR: LocationScheme = LocationScheme::Lobar(LOBES);

pub const DEFINITIONS: &[AbnormalityDefinition] = &[
    AbnormalityDefinition::presence(
        "Nodule",
        "nodule",
        "Relevant terms: nodule, nodules, nodular lesion. Only findings in the lung or pleural \
space. Mass and nodule are distinct entities; ignore sentences referring only to masses.",
    )
    .located(LOBAR)
    .counted(),
    AbnormalityDefinition::presence(
        "Mass",
        "mass",
        "Relevant terms: mass, masses. Mass and nodule are distinct entities; ignore sentences \
referring only to nodules.",
    )
    .located(LOBAR)
    .counted(),
    AbnormalityDefinition::presence(
        "Pleural Effusion",
        "pleural effusion",
        "Relevant terms: pleural effusion, pleural fluid, effusion in the pleural space.",
    )
    .located(LOBAR),
    AbnormalityDefinition::presence(
        "Consolidation",
        "consolidation",
        "Relevant terms: consolidation, consolidative change, air-space consolidation.",
    )
    .located(LOBAR),
    AbnormalityDefinition::presence(
        "Atelectasis",
        "atelectasis",
        "Relevant terms: atelectasis, atelectatic change, collapse, subsegmental atelectasis.",
    )
    .located(LOBAR),
    AbnormalityDefinition::presence(
        "Pneumothorax",
        "pneumothorax",
        "Relevant terms: pneumothorax, air in the pleural space.",
    )
    .located(LOBAR),
    AbnormalityDefinition::presence(
        "Ground Glass Opacity",
        "ground glass opacity",
        "Relevant terms: ground glass opacity, ground-glass opacities, ground-glass attenuation, \
GGOs, ground glass nodule (excluding subsolid nodule).",
    )
    .located(LOBAR),
    AbnormalityDefinition::presence(
        "Emphysema",
        "emphysema",
        "Relevant terms: emphysema, emphysematous change, emphysematous aeration, emphysematous \
appearance.",
    )
    .located(LOBAR),
    AbnormalityDefinition::presence(
        "Mosaic Attenuation",
        "mosaic attenuation",
        "Relevant terms: mosaic attenuation, mosaic pattern, mosaic lung pattern, mosaic density \
differences.",
    )
    .located(LOBAR),
    AbnormalityDefinition::presence(
        "Bronchiectasis",
        "bronchiectasis",
        "Relevant terms: bronchiectasis, bronchiectatic changes, bronchiectatic appearance.",
    )
    .located(LOBAR),
    AbnormalityDefinition::presence(
        "Interlobular Septal Thickening",
        "interlobular septal thickening",
        "Relevant terms: interlobular septal thickening, septal lines, interstitial thickening. \
Not all thickening is interlobular septal thickening.",
    )
    .located(LOBAR),
];
