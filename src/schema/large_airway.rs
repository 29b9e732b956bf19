//! Trachea and main bronchi.

use super::definition::{AbnormalityDefinition, LocationScheme, Site};

const BRONCHI: &[Site] = &[
    Site::new("left", "left main bronchus"),
    Site::new("right", "right main bronchus"),
];

pub const DEFINITIONS: &[AbnormalityDefinition] = &[
    AbnormalityDefinition::presence(
        "Tracheal_Stenosis",
        "tracheal stenosis",
        "Relevant terms: tracheal stenosis, tracheal narrowing, tracheal stricture.",
    ),
    AbnormalityDefinition::presence(
        "Endotracheal_Mass",
        "endotracheal mass",
        "Relevant terms: tracheal mass, tracheal lesion, tracheal tumor, tracheal nodule.",
    )
    .counted(),
    AbnormalityDefinition::presence(
        "Endobronchial_Mass",
        "endobronchial mass",
        "Relevant terms: bronchial mass, bronchial lesion, bronchial tumor, bronchial nodule. \
Masses found in different locations count as multiple.",
    )
    .located(LocationScheme::BinarySides(BRONCHI))
    .counted(),
];
