//! Mediastinal compartments, nodal stations and esophagus.

use super::definition::{AbnormalityDefinition, LocationScheme, Site};

const COMPARTMENTS: &[Site] = &[
    Site::new("anterior", "anterior mediastinum"),
    Site::new("middle", "middle mediastinum"),
    Site::new("posterior", "posterior mediastinum"),
];

const NODAL_STATIONS: &[Site] = &[
    Site::new("supraclavicular", "supraclavicular nodes"),
    Site::new("upper_paratracheal", "upper paratracheal nodes"),
    Site::new("prevascular", "prevascular nodes"),
    Site::new("prevertebral", "prevertebral (retrotracheal) nodes"),
    Site::new("lower_paratracheal", "lower paratracheal nodes"),
    Site::new("subaortic", "subaortic (aortopulmonary window) nodes"),
    Site::new("paraaortic", "paraaortic nodes"),
    Site::new("subcarinal", "subcarinal nodes"),
    Site::new("paraesophageal", "paraesophageal nodes"),
    Site::new("hilar", "hilar nodes"),
];

pub const DEFINITIONS: &[AbnormalityDefinition] = &[
    AbnormalityDefinition::presence(
        "Mediastinal_Mass",
        "mediastinal mass",
        "Relevant terms: mediastinal mass, mediastinal tumor, mediastinal lesion, thymic mass.",
    )
    .located(LocationScheme::MultiSite(COMPARTMENTS)),
    AbnormalityDefinition::presence(
        "Lymphadenopathy",
        "lymphadenopathy",
        "Relevant terms: lymphadenopathy, enlarged lymph nodes, lymph node enlargement.",
    )
    .located(LocationScheme::MultiSite(NODAL_STATIONS)),
    AbnormalityDefinition::presence(
        "Esophageal_Mass",
        "esophageal mass",
        "Relevant terms: esophageal mass, esophageal tumor, esophageal wall thickening with mass.",
    )
    .counted(),
    AbnormalityDefinition::presence(
        "Pneumomediastinum",
        "pneumomediastinum",
        "Relevant terms: pneumomediastinum, mediastinal emphysema, free air in the mediastinum.",
    ),
];
