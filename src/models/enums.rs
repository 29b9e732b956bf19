use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid {field} value: {value}")]
pub struct InvalidEnum {
    pub field: String,
    pub value: String,
}

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }

            pub fn all() -> &'static [$name] {
                &[$(Self::$variant),+]
            }
        }

        impl std::str::FromStr for $name {
            type Err = InvalidEnum;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(
    /// Anatomical systems with a built-in schema, in canonical report order.
    Organ {
        Lung => "lung",
        LargeAirway => "large_airway",
        Mediastinum => "mediastinum",
        HeartAndVessel => "heart_and_vessel",
        Abdomen => "abdomen",
        OsseousStructure => "osseous_structure",
    }
);

str_enum!(
    /// Cascade stage an Extractor call belongs to.
    Stage {
        Section => "section",
        Presence => "presence",
        Location => "location",
        Count => "count",
        Onset => "onset",
    }
);

str_enum!(
    /// Multiplicity of a finding. Single-valued per finding.
    CountClass {
        Single => "single",
        Multiple => "multiple",
    }
);

str_enum!(
    /// Temporal status of a finding at one site. Single-valued per site.
    OnsetClass {
        New => "new",
        OldHealed => "old_healed",
        Unspecified => "unspecified",
    }
);

str_enum!(
    /// What an extraction failure turns into downstream.
    FailurePolicy {
        ZeroFill => "zero_fill",
        Strict => "strict",
    }
);

impl Organ {
    /// Name of the carried-through free-text column in this organ's table.
    pub fn report_column(&self) -> String {
        format!("{}_report", self.as_str())
    }

    /// Human-readable name used in prompts.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Lung => "lung parenchyma, small airway or pleural space",
            Self::LargeAirway => "large airway",
            Self::Mediastinum => "mediastinum",
            Self::HeartAndVessel => "heart and great vessels",
            Self::Abdomen => "abdomen",
            Self::OsseousStructure => "osseous structures",
        }
    }

    /// Keyword guidance for routing report sentences to this organ.
    pub fn section_guidance(&self) -> &'static str {
        match self {
            Self::Lung => {
                "Keywords: emphysema, nodule, consolidation, parenchymal distortion, \
ground-glass opacity, mass, fibrosis, infiltrates, atelectasis, scarring, bullae, lobe, \
bronchiectasis, bronchiolitis, pleural effusion, pleural thickening, subpleural. \
Do not include trachea, bronchus or bronchi findings."
            }
            Self::LargeAirway => {
                "Large airway means trachea, bronchus, bronchi. Bronchioles, bronchiectasis, \
bronchiolitis and bronchovascular findings are not included. Positional terms such as \
paratracheal or retrotracheal are not airway findings."
            }
            Self::Mediastinum => {
                "Keywords: esophagus, paratracheal, prevascular, paraaortic, subaortic, \
subcarinal, hilar, thymus, lymph nodes."
            }
            Self::HeartAndVessel => {
                "Keywords: cardiomegaly, pericardial effusion, aortic aneurysm, pulmonary \
artery enlargement, vascular calcifications, pulmonary embolism. Do not include bone, rib \
or fracture findings."
            }
            Self::Abdomen => {
                "Keywords: liver lesion, kidney, adrenal nodule, hepatic mass, splenomegaly, \
hiatal hernia, gallbladder."
            }
            Self::OsseousStructure => {
                "Keywords: rib lesion, lytic bone lesion, osteoblastic lesion, spinal \
involvement, fractures, bony metastasis, vertebrae."
            }
        }
    }
}
