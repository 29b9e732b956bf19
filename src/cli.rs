use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{
    LlmSettings, PipelineConfig, DEFAULT_FANOUT_CONCURRENCY, DEFAULT_MAX_IN_FLIGHT, DEFAULT_MODEL,
    DEFAULT_OLLAMA_URL, DEFAULT_PROGRESS_EVERY, DEFAULT_REPORT_CONCURRENCY, DEFAULT_TIMEOUT_SECS,
    FORMAT_FILE, METRICS_FILE,
};
use crate::models::{FailurePolicy, Organ};
use crate::table::RAW_TEXT_COLUMN;

#[derive(Debug, Parser)]
#[command(
    name = "radstruct",
    version,
    about = "Structure free-text chest CT reports into per-organ label tables and score them"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Route each report's sentences to the six organ sections.
    Format(FormatArgs),
    /// Build one WideTable per organ from a (sectioned) report table.
    Extract(ExtractArgs),
    /// Score prediction tables against ground truth.
    Evaluate(EvaluateArgs),
    /// format, extract and optionally evaluate in one go.
    Run(RunArgs),
}

#[derive(Debug, Clone, Args)]
pub struct LlmArgs {
    #[arg(long, env = "RADSTRUCT_OLLAMA_URL", default_value = DEFAULT_OLLAMA_URL)]
    pub ollama_url: String,

    #[arg(long, env = "RADSTRUCT_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS, help = "Per-request timeout in seconds")]
    pub timeout_secs: u64,

    #[arg(long, default_value_t = 0.0)]
    pub temperature: f32,

    #[arg(long, default_value_t = DEFAULT_MAX_IN_FLIGHT, help = "Concurrent LLM requests, all organs")]
    pub max_in_flight: usize,

    #[arg(long, default_value_t = false, help = "Do not query the model list before starting")]
    pub skip_model_check: bool,
}

impl LlmArgs {
    pub fn settings(&self) -> LlmSettings {
        LlmSettings {
            base_url: self.ollama_url.clone(),
            model: self.model.clone(),
            timeout_secs: self.timeout_secs,
            temperature: self.temperature,
            max_in_flight: self.max_in_flight,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct BatchArgs {
    #[arg(long, default_value_t = DEFAULT_REPORT_CONCURRENCY, help = "Reports processed concurrently per organ")]
    pub report_concurrency: usize,

    #[arg(long, default_value_t = DEFAULT_FANOUT_CONCURRENCY, help = "Concurrent lobe and onset questions per organ")]
    pub fanout_concurrency: usize,

    #[arg(long, default_value = "zero_fill", help = "zero_fill | strict")]
    pub failure_policy: FailurePolicy,

    #[arg(long, default_value_t = DEFAULT_PROGRESS_EVERY, help = "Log progress every N reports (0 = off)")]
    pub progress_every: usize,
}

impl BatchArgs {
    pub fn config(&self) -> PipelineConfig {
        PipelineConfig {
            report_concurrency: self.report_concurrency,
            fanout_concurrency: self.fanout_concurrency,
            failure_policy: self.failure_policy,
            progress_every: self.progress_every,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct FormatArgs {
    #[arg(long, help = "CSV with an id column and a free-text column")]
    pub input: PathBuf,

    #[arg(long, default_value = FORMAT_FILE)]
    pub output: PathBuf,

    #[arg(long, default_value = RAW_TEXT_COLUMN)]
    pub text_column: String,

    #[command(flatten)]
    pub llm: LlmArgs,

    #[command(flatten)]
    pub batch: BatchArgs,
}

#[derive(Debug, Clone, Args)]
pub struct ExtractArgs {
    #[arg(long, help = "Sectioned report table (or a raw table with a 'report' column)")]
    pub input: PathBuf,

    #[arg(long)]
    pub output_dir: PathBuf,

    #[arg(long = "organ", num_args = 1.., help = "Organs to extract (default: all)")]
    pub organs: Vec<Organ>,

    #[command(flatten)]
    pub llm: LlmArgs,

    #[command(flatten)]
    pub batch: BatchArgs,
}

#[derive(Debug, Clone, Args)]
pub struct EvaluateArgs {
    #[arg(long)]
    pub prediction_dir: PathBuf,

    #[arg(long)]
    pub ground_truth_dir: PathBuf,

    #[arg(long, default_value = METRICS_FILE)]
    pub output: PathBuf,

    #[arg(long = "organ", num_args = 1.., help = "Organs to evaluate (default: all)")]
    pub organs: Vec<Organ>,
}

#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    #[arg(long, help = "Raw report table, or a sectioned one with --skip-format")]
    pub input: PathBuf,

    #[arg(long, help = "Directory receiving format.csv")]
    pub format_dir: PathBuf,

    #[arg(long)]
    pub output_dir: PathBuf,

    #[arg(long)]
    pub ground_truth_dir: Option<PathBuf>,

    #[arg(long, help = "Metrics file (default: <output-dir>/metrics.json)")]
    pub metrics: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub skip_format: bool,

    #[arg(long, default_value = RAW_TEXT_COLUMN)]
    pub text_column: String,

    #[arg(long = "organ", num_args = 1.., help = "Organs to extract (default: all)")]
    pub organs: Vec<Organ>,

    #[command(flatten)]
    pub llm: LlmArgs,

    #[command(flatten)]
    pub batch: BatchArgs,
}

/// Selected organs in canonical order; none selected means all.
pub fn selected_organs(requested: &[Organ]) -> Vec<Organ> {
    Organ::all()
        .iter()
        .copied()
        .filter(|o| requested.is_empty() || requested.contains(o))
        .collect()
}
