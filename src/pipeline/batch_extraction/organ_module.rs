//! Organ module: one schema, one report in, one complete row out.

use tokio::sync::Semaphore;

use super::cascade::AttributeCascade;
use super::error::ConfigurationError;
use super::traits::Extractor;
use super::types::{ExtractionResult, FailureRecord};
use crate::models::{Organ, Report};
use crate::schema::OrganSchema;
use crate::table::ResultRow;

/// Row of one report plus what it took to produce it.
#[derive(Debug, Clone, PartialEq)]
pub struct RowOutcome {
    pub row: ResultRow,
    pub failures: Vec<FailureRecord>,
    pub calls: usize,
}

#[derive(Debug, Clone)]
pub struct OrganModule {
    schema: OrganSchema,
}

impl OrganModule {
    pub fn new(schema: OrganSchema) -> Result<Self, ConfigurationError> {
        schema.validate()?;
        Ok(Self { schema })
    }

    pub fn builtin(organ: Organ) -> Self {
        Self {
            schema: OrganSchema::builtin(organ),
        }
    }

    pub fn schema(&self) -> &OrganSchema {
        &self.schema
    }

    pub fn name(&self) -> &str {
        self.schema.name()
    }

    /// Run every abnormality's cascade over one report, in schema order.
    pub async fn process(
        &self,
        report: &Report,
        extractor: &dyn Extractor,
        fanout: &Semaphore,
    ) -> RowOutcome {
        let cascade = AttributeCascade::new(extractor, fanout, &self.schema);
        let mut results = Vec::with_capacity(self.schema.definitions().len());
        let mut failures = Vec::new();

        for def in self.schema.definitions() {
            let result = cascade.run(def, &report.text).await;
            for failure in &result.failures {
                tracing::warn!(
                    organ = self.schema.name(),
                    report_id = %report.id,
                    abnormality = def.name,
                    stage = failure.stage.as_str(),
                    scope = failure.scope.as_deref().unwrap_or(""),
                    error = %failure.error,
                    "Extraction stage failed, columns default to 0"
                );
                failures.push(FailureRecord::new(&report.id, Some(def.name), failure));
            }
            results.push(result);
        }

        RowOutcome {
            row: self.flatten(report, &results),
            failures,
            calls: cascade.calls(),
        }
    }

    /// Flatten per-abnormality results into a complete 0/1 row.
    ///
    /// `results` pairs with the schema definitions by position; a missing
    /// result flattens to all zeros.
    pub fn flatten(&self, report: &Report, results: &[ExtractionResult]) -> ResultRow {
        let absent = ExtractionResult::absent();
        let mut cells = Vec::new();
        for (i, def) in self.schema.definitions().iter().enumerate() {
            let result = results.get(i).unwrap_or(&absent);
            cells.extend(def.slots().iter().map(|slot| u8::from(result.is_set(slot))));
        }
        ResultRow {
            id: report.id.clone(),
            text: report.text.clone(),
            cells,
        }
    }
}
