//! Organ schemas: the fixed set of tracked findings per anatomical system
//! and the WideTable header derived from them.

pub mod abdomen;
pub mod definition;
pub mod heart_and_vessel;
pub mod large_airway;
pub mod lung;
pub mod mediastinum;
pub mod osseous_structure;

pub use definition::*;

use std::collections::HashSet;

use crate::models::Organ;
use crate::pipeline::batch_extraction::error::ConfigurationError;

/// Name of the key column of every WideTable.
pub const ID_COLUMN: &str = "id";

/// Built-in definitions of an organ, in column order.
pub fn definitions(organ: Organ) -> &'static [AbnormalityDefinition] {
    match organ {
        Organ::Lung => lung::DEFINITIONS,
        Organ::LargeAirway => large_airway::DEFINITIONS,
        Organ::Mediastinum => mediastinum::DEFINITIONS,
        Organ::HeartAndVessel => heart_and_vessel::DEFINITIONS,
        Organ::Abdomen => abdomen::DEFINITIONS,
        Organ::OsseousStructure => osseous_structure::DEFINITIONS,
    }
}

/// Column schema of one organ module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganSchema {
    name: String,
    label: String,
    report_column: String,
    definitions: Vec<AbnormalityDefinition>,
}

impl OrganSchema {
    pub fn builtin(organ: Organ) -> Self {
        Self {
            name: organ.as_str().to_string(),
            label: organ.label().to_string(),
            report_column: organ.report_column(),
            definitions: definitions(organ).to_vec(),
        }
    }

    /// Schema outside the built-in set. Validated before it is returned.
    pub fn custom(
        name: &str,
        label: &str,
        definitions: Vec<AbnormalityDefinition>,
    ) -> Result<Self, ConfigurationError> {
        let schema = Self {
            name: name.to_string(),
            label: label.to_string(),
            report_column: format!("{name}_report"),
            definitions,
        };
        schema.validate()?;
        Ok(schema)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn report_column(&self) -> &str {
        &self.report_column
    }

    pub fn definitions(&self) -> &[AbnormalityDefinition] {
        &self.definitions
    }

    /// Scored columns only, in header order.
    pub fn columns(&self) -> Vec<String> {
        self.definitions.iter().flat_map(|d| d.columns()).collect()
    }

    /// Full persisted header: `id`, report column, scored columns.
    pub fn header(&self) -> Vec<String> {
        let mut header = vec![ID_COLUMN.to_string(), self.report_column.clone()];
        header.extend(self.columns());
        header
    }

    /// Check every definition and that no two produce the same column.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.definitions.is_empty() {
            return Err(ConfigurationError::InvalidSetting {
                setting: format!("{} schema", self.name),
                reason: "no abnormality definitions".to_string(),
            });
        }

        for def in &self.definitions {
            def.validate(&self.name)?;
        }

        let mut seen: HashSet<String> = HashSet::new();
        seen.insert(ID_COLUMN.to_string());
        seen.insert(self.report_column.clone());
        for column in self.columns() {
            if !seen.insert(column.clone()) {
                return Err(ConfigurationError::DuplicateColumn {
                    organ: self.name.clone(),
                    column,
                });
            }
        }
        Ok(())
    }
}
