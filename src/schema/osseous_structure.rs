//! Ribs and spine.
//!
//! Rib fractures fan out: one onset question per positively flagged rib,
//! plus one for a fracture whose rib is not specified.

use super::definition::{AbnormalityDefinition, LocationScheme, Site};

const RIBS: &[Site] = &[
    Site::new("right_1", "right 1st rib"),
    Site::new("right_2", "right 2nd rib"),
    Site::new("right_3", "right 3rd rib"),
    Site::new("right_4", "right 4th rib"),
    Site::new("right_5", "right 5th rib"),
    Site::new("right_6", "right 6th rib"),
    Site::new("right_7", "right 7th rib"),
    Site::new("right_8", "right 8th rib"),
    Site::new("right_9", "right 9th rib"),
    Site::new("right_10", "right 10th rib"),
    Site::new("right_11", "right 11th rib"),
    Site::new("right_12", "right 12th rib"),
    Site::new("left_1", "left 1st rib"),
    Site::new("left_2", "left 2nd rib"),
    Site::new("left_3", "left 3rd rib"),
    Site::new("left_4", "left 4th rib"),
    Site::new("left_5", "left 5th rib"),
    Site::new("left_6", "left 6th rib"),
    Site::new("left_7", "left 7th rib"),
    Site::new("left_8", "left 8th rib"),
    Site::new("left_9", "left 9th rib"),
    Site::new("left_10", "left 10th rib"),
    Site::new("left_11", "left 11th rib"),
    Site::new("left_12", "left 12th rib"),
];

const VERTEBRAE: &[Site] = &[
    Site::new("C7", "C7 (7th cervical vertebra)"),
    Site::new("T1", "T1 (1st thoracic vertebra)"),
    Site::new("T2", "T2 (2nd thoracic vertebra)"),
    Site::new("T3", "T3 (3rd thoracic vertebra)"),
    Site::new("T4", "T4 (4th thoracic vertebra)"),
    Site::new("T5", "T5 (5th thoracic vertebra)"),
    Site::new("T6", "T6 (6th thoracic vertebra)"),
    Site::new("T7", "T7 (7th thoracic vertebra)"),
    Site::new("T8", "T8 (8th thoracic vertebra)"),
    Site::new("T9", "T9 (9th thoracic vertebra)"),
    Site::new("T10", "T10 (10th thoracic vertebra)"),
    Site::new("T11", "T11 (11th thoracic vertebra)"),
    Site::new("T12", "T12 (12th thoracic vertebra)"),
    Site::new("L1", "L1 (1st lumbar vertebra)"),
    Site::new("L2", "L2 (2nd lumbar vertebra)"),
    Site::new("L3", "L3 (3rd lumbar vertebra)"),
];

pub const DEFINITIONS: &[AbnormalityDefinition] = &[
    AbnormalityDefinition::presence(
        "Rib_Fracture",
        "rib fracture",
        "Relevant terms: rib fracture, fractured rib, healed rib fracture, callus formation of \
a rib.",
    )
    .located(LocationScheme::MultiSite(RIBS))
    .with_onset(),
    AbnormalityDefinition::presence(
        "Vertebrae_Fracture",
        "vertebrae fracture",
        "Relevant terms: vertebrae fracture, compression, height loss, wedging.",
    )
    .located(LocationScheme::MultiSite(VERTEBRAE)),
];
