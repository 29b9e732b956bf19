use crate::cli::{selected_organs, RunArgs};
use crate::config::{FORMAT_FILE, METRICS_FILE};
use crate::pipeline::batch_extraction::{Extractor, RunSummary};

use super::{evaluate, extract, format, CommandError};

/// format → extract → evaluate. Evaluation runs only with a ground-truth
/// directory.
pub async fn execute(
    args: &RunArgs,
    extractor: &dyn Extractor,
    extractor_name: &str,
) -> Result<RunSummary, CommandError> {
    let config = args.batch.config();
    let organs = selected_organs(&args.organs);

    let sectioned = if args.skip_format {
        tracing::info!(input = %args.input.display(), "Skipping format step");
        args.input.clone()
    } else {
        let output = args.format_dir.join(FORMAT_FILE);
        format::format_reports(&args.input, &args.text_column, &output, extractor, &config).await?;
        output
    };

    let summary = extract::extract_tables(
        &sectioned,
        &args.output_dir,
        &organs,
        extractor,
        extractor_name,
        &config,
    )
    .await?;

    if let Some(ground_truth_dir) = &args.ground_truth_dir {
        let metrics = args
            .metrics
            .clone()
            .unwrap_or_else(|| args.output_dir.join(METRICS_FILE));
        evaluate::evaluate_to(&organs, &args.output_dir, ground_truth_dir, &metrics)?;
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{BatchArgs, LlmArgs};
    use crate::config::{DEFAULT_FANOUT_CONCURRENCY, DEFAULT_REPORT_CONCURRENCY};
    use crate::models::{FailurePolicy, Organ};
    use crate::pipeline::batch_extraction::sectioning::SECTION_FIELD;
    use crate::pipeline::batch_extraction::testing::{answer, is_about, ScriptedExtractor};
    use crate::pipeline::batch_extraction::FieldValues;
    use crate::models::Stage;
    use std::path::Path;

    fn args(root: &Path, ground_truth: bool) -> RunArgs {
        RunArgs {
            input: root.join("reports.csv"),
            format_dir: root.join("fmt"),
            output_dir: root.join("out"),
            ground_truth_dir: ground_truth.then(|| root.join("gt")),
            metrics: None,
            skip_format: false,
            text_column: "report".into(),
            organs: vec![Organ::HeartAndVessel],
            llm: LlmArgs {
                ollama_url: "http://127.0.0.1:9".into(),
                model: "unused".into(),
                timeout_secs: 1,
                temperature: 0.0,
                max_in_flight: 1,
                skip_model_check: true,
            },
            batch: BatchArgs {
                report_concurrency: DEFAULT_REPORT_CONCURRENCY,
                fanout_concurrency: DEFAULT_FANOUT_CONCURRENCY,
                failure_policy: FailurePolicy::ZeroFill,
                progress_every: 0,
            },
        }
    }

    /// Routes everything to the heart section and finds cardiomegaly.
    fn extractor() -> ScriptedExtractor {
        ScriptedExtractor::new(|req| {
            if req.stage == Stage::Section {
                let text = if req.organ == "heart_and_vessel" { req.text } else { "" };
                return Ok(FieldValues::new().with_text(SECTION_FIELD, text));
            }
            if is_about(req, "Cardiomegaly") && req.text.contains("enlarged") {
                return Ok(answer(req, &["presence"]));
            }
            Ok(answer(req, &[]))
        })
    }

    #[tokio::test]
    async fn full_run_writes_format_tables_and_metrics() {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(
            root.path().join("reports.csv"),
            "id,report\n1,The heart is enlarged.\n2,Normal study.\n",
        )
        .unwrap();

        let extractor = extractor();
        let summary = execute(&args(root.path(), false), &extractor, "scripted").await.unwrap();

        assert_eq!(summary.organs.len(), 1);
        assert!(root.path().join("fmt").join("format.csv").is_file());
        let table = std::fs::read_to_string(root.path().join("out").join("heart_and_vessel.csv")).unwrap();
        assert!(table.starts_with("id,heart_and_vessel_report,"));
        assert!(table.contains("The heart is enlarged."));

        // Score the run against its own output.
        std::fs::create_dir_all(root.path().join("gt")).unwrap();
        std::fs::copy(
            root.path().join("out").join("heart_and_vessel.csv"),
            root.path().join("gt").join("heart_and_vessel_gt.csv"),
        )
        .unwrap();
        execute(&args(root.path(), true), &extractor, "scripted").await.unwrap();

        let metrics: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(root.path().join("out").join("metrics.json")).unwrap(),
        )
        .unwrap();
        let cardiomegaly = metrics["heart_and_vessel"]["columns"]["Cardiomegaly_presence"]
            .as_f64()
            .unwrap();
        assert_eq!(cardiomegaly, 1.0);
    }
}
