//! Batch extraction pipeline
//!
//! Turns organ-specific report text into WideTables.
//!
//! ```text
//! Sectioner → OrganModule (AttributeCascade × definitions) → Aggregator → WideTable
//! ```
//!
//! Every natural-language question goes through the `Extractor` trait,
//! so the same engine runs against an LLM, a rule set or a test double.

pub mod cascade;
pub mod error;
pub mod organ_module;
pub mod runner;
pub mod sectioning;
pub mod summary;
pub mod traits;
pub mod types;

#[cfg(test)]
pub mod testing;

pub use cascade::AttributeCascade;
pub use error::{ConfigurationError, ExtractorError, PipelineError};
pub use organ_module::{OrganModule, RowOutcome};
pub use runner::{check_unique_ids, persist_batch, Aggregator, BatchOutcome, OrganJob, OrganRunSummary};
pub use sectioning::{SectionOutcome, Sectioner};
pub use summary::RunSummary;
pub use traits::Extractor;
pub use types::*;
