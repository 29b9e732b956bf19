//! Upper abdomen as covered by a chest study.

use super::definition::{AbnormalityDefinition, LocationScheme, Site};

const KIDNEYS: &[Site] = &[
    Site::new("right", "right kidney"),
    Site::new("left", "left kidney"),
];

const ADRENALS: &[Site] = &[
    Site::new("right", "right adrenal gland"),
    Site::new("left", "left adrenal gland"),
];

pub const DEFINITIONS: &[AbnormalityDefinition] = &[
    AbnormalityDefinition::presence(
        "Kidney_Cyst",
        "kidney cyst",
        "Relevant terms: kidney cysts, renal cyst, renal cysts, simple cyst in the kidney, \
cortical cyst.",
    )
    .located(LocationScheme::BinarySides(KIDNEYS))
    .counted(),
    AbnormalityDefinition::presence(
        "Adrenal_Mass",
        "adrenal mass",
        "Relevant terms: adrenal masses, adrenal adenoma, adrenal nodule, adrenal lesion.",
    )
    .located(LocationScheme::BinarySides(ADRENALS)),
    AbnormalityDefinition::presence(
        "Liver_Cyst",
        "liver cyst",
        "Relevant terms: liver cyst, hepatic cyst, hepatic cysts, simple cyst in the liver.",
    )
    .counted(),
    AbnormalityDefinition::presence(
        "Gallstone",
        "gallstone",
        "Relevant terms: gallbladder stones, gallstones, cholelithiasis, gallbladder calculi, \
calcified densities in the gallbladder.",
    ),
    AbnormalityDefinition::presence(
        "Hiatal_Hernia",
        "hiatal hernia",
        "Relevant terms: hiatal hernia, hiatus hernia, sliding type hiatal hernia.",
    ),
    AbnormalityDefinition::presence(
        "Pneumoperitoneum",
        "pneumoperitoneum",
        "Relevant terms: pneumoperitoneum, free air in the abdomen, free intraperitoneal air, \
air under the diaphragm, subdiaphragmatic free air.",
    ),
];
