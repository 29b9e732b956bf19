//! Heart and great vessels.

use super::definition::{AbnormalityDefinition, LocationScheme, Site};

const PULMONARY_ARTERIES: &[Site] = &[
    Site::new("right", "right pulmonary artery"),
    Site::new("left", "left pulmonary artery"),
    Site::new("main", "main pulmonary trunk"),
];

pub const DEFINITIONS: &[AbnormalityDefinition] = &[
    AbnormalityDefinition::presence(
        "Aortic_Aneurysm",
        "aortic aneurysm",
        "Relevant terms: aortic aneurysm, AA, TAA, AAA.",
    ),
    AbnormalityDefinition::presence(
        "Aortic_Dilatation",
        "aortic dilatation",
        "Relevant terms: dilated aorta, aortic dilatation, aortic ectasia. Not an aneurysm.",
    ),
    AbnormalityDefinition::presence(
        "Aortic_Dissection",
        "aortic dissection",
        "Relevant terms: aortic dissection, aorta dissection, intimal flap.",
    ),
    AbnormalityDefinition::presence(
        "Pulmonary_Artery_Enlargement",
        "pulmonary artery enlargement",
        "Relevant terms: enlarged pulmonary artery, dilated pulmonary trunk.",
    ),
    AbnormalityDefinition::presence(
        "Pulmonary_Embolism",
        "pulmonary embolism",
        "Relevant terms: pulmonary thromboembolism, thromboembolism of the pulmonary artery, PE, PTE.",
    )
    .located(LocationScheme::MultiSite(PULMONARY_ARTERIES)),
    AbnormalityDefinition::presence(
        "Cardiomegaly",
        "cardiomegaly",
        "Relevant terms: cardiomegaly, enlarged heart, increased heart size.",
    ),
    AbnormalityDefinition::presence(
        "Pericardial_Effusion",
        "pericardial effusion",
        "Relevant terms: pericardial effusion, pericardial fluid.",
    ),
    AbnormalityDefinition::presence(
        "Cardiac_Mass",
        "cardiac mass",
        "Relevant terms: tumor, lesion, growth, nodule within the heart.",
    ),
    AbnormalityDefinition::presence(
        "Coronary_Artery_Wall_Calcification",
        "coronary artery wall calcification",
        "Relevant terms: coronary calcification, atherosclerotic plaques or atherosclerosis in \
the coronary artery wall.",
    ),
    AbnormalityDefinition::presence(
        "Arterial_Calcification",
        "arterial calcification",
        "Relevant terms: intimal calcification, vascular calcification, or atherosclerotic \
plaques in the aorta.",
    ),
];
