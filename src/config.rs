use serde::{Deserialize, Serialize};

use crate::models::FailurePolicy;
use crate::pipeline::batch_extraction::error::ConfigurationError;

/// Application-level constants
pub const APP_NAME: &str = "radstruct";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Local Ollama instance.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "medgemma:27b";
/// Generous: one report can take dozens of calls on CPU-only hosts.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

pub const DEFAULT_REPORT_CONCURRENCY: usize = 8;
pub const DEFAULT_FANOUT_CONCURRENCY: usize = 4;
pub const DEFAULT_MAX_IN_FLIGHT: usize = 8;
pub const DEFAULT_PROGRESS_EVERY: usize = 50;

/// Output file names
pub const FORMAT_FILE: &str = "format.csv";
pub const RUN_SUMMARY_FILE: &str = "run_summary.json";
pub const METRICS_FILE: &str = "metrics.json";

/// Default tracing filter when `RUST_LOG` is unset. HTTP internals stay
/// at warn.
pub fn default_log_filter() -> String {
    "warn,radstruct_lib=info,radstruct=info".to_string()
}

/// Prediction table of an organ.
pub fn prediction_file(organ: &str) -> String {
    format!("{organ}.csv")
}

/// Ground-truth table of an organ, preferred name.
pub fn ground_truth_file(organ: &str) -> String {
    format!("{organ}_gt.csv")
}

/// Failure audit written next to an organ's table.
pub fn failures_file(organ: &str) -> String {
    format!("{organ}_failures.json")
}

// ═══════════════════════════════════════════════════════════
// Runtime settings
// ═══════════════════════════════════════════════════════════

/// Batch behavior of the Aggregator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Reports processed concurrently within one organ.
    pub report_concurrency: usize,
    /// Concurrent lobe / onset questions within one organ, across reports.
    pub fanout_concurrency: usize,
    pub failure_policy: FailurePolicy,
    /// Log progress every N completed reports. 0 disables.
    pub progress_every: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            report_concurrency: DEFAULT_REPORT_CONCURRENCY,
            fanout_concurrency: DEFAULT_FANOUT_CONCURRENCY,
            failure_policy: FailurePolicy::ZeroFill,
            progress_every: DEFAULT_PROGRESS_EVERY,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        positive("report_concurrency", self.report_concurrency)?;
        positive("fanout_concurrency", self.fanout_concurrency)?;
        Ok(())
    }
}

/// Connection to the LLM backing the Extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmSettings {
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    pub temperature: f32,
    /// Global cap on concurrent requests, shared by every organ module.
    pub max_in_flight: usize,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OLLAMA_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            temperature: 0.0,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }
}

impl LlmSettings {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        positive("max_in_flight", self.max_in_flight)?;
        if self.model.trim().is_empty() {
            return Err(ConfigurationError::InvalidSetting {
                setting: "model".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigurationError::InvalidSetting {
                setting: "temperature".to_string(),
                reason: format!("{} is outside 0.0..=2.0", self.temperature),
            });
        }
        Ok(())
    }
}

fn positive(setting: &str, value: usize) -> Result<(), ConfigurationError> {
    if value == 0 {
        return Err(ConfigurationError::InvalidSetting {
            setting: setting.to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_name_is_radstruct() {
        assert_eq!(APP_NAME, "radstruct");
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }

    #[test]
    fn defaults_validate() {
        PipelineConfig::default().validate().unwrap();
        LlmSettings::default().validate().unwrap();
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let config = PipelineConfig {
            fanout_concurrency: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("fanout_concurrency"));
    }

    #[test]
    fn empty_model_is_rejected() {
        let settings = LlmSettings {
            model: " ".into(),
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn file_names_follow_organ() {
        assert_eq!(prediction_file("lung"), "lung.csv");
        assert_eq!(ground_truth_file("lung"), "lung_gt.csv");
        assert_eq!(failures_file("lung"), "lung_failures.json");
    }

    #[test]
    fn log_filter_targets_library() {
        assert!(default_log_filter().contains("radstruct_lib"));
    }
}
