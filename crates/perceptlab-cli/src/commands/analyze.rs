//! The `perceptlab analyze` command.
//!
//! Fetches the full participant dataset (or reloads a saved report) and
//! recomputes the per-keyword group metrics.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;

use perceptlab_core::parser;
use perceptlab_core::report::{ExperimentReport, GroupContrast};
use perceptlab_core::session::{collect_records, DataOrigin};
use perceptlab_store::config::load_config_from;
use perceptlab_store::HttpSessionStore;

pub async fn execute(
    experiment_path: PathBuf,
    api_url: Option<String>,
    report_path: Option<PathBuf>,
    output: Option<PathBuf>,
    format: String,
    config_path: Option<PathBuf>,
) -> Result<()> {
    anyhow::ensure!(
        matches!(format.as_str(), "table" | "markdown" | "json"),
        "unknown format: {format} (expected table, markdown, or json)"
    );

    let config = parser::parse_experiment(&experiment_path)?;
    config.validate()?;

    let report = match report_path {
        Some(path) => {
            let mut report = ExperimentReport::load_json(&path)?;
            // Aggregation is idempotent; recomputing guards against a
            // hand-edited records section.
            report.recompute_metrics();
            report
        }
        None => {
            let mut store_config = load_config_from(config_path.as_deref())?;
            if api_url.is_some() {
                store_config.api_url = api_url;
            }
            let Some(url) = &store_config.api_url else {
                anyhow::bail!(
                    "no data source: pass --api-url, configure api_url, or pass --report"
                );
            };

            let store = HttpSessionStore::new(url.clone())
                .with_timeout(Duration::from_secs(store_config.timeout_secs));
            let (records, origin) = collect_records(&store, None).await;
            if origin == DataOrigin::LocalOnly {
                eprintln!("Notice: {url} unreachable; no records available.");
            }
            ExperimentReport::new(&config, records, origin, 0)
        }
    };

    match format.as_str() {
        "table" => super::print_report(&report),
        "markdown" => {
            println!("{}", super::metrics_markdown(&report.metrics));
            println!("{}", GroupContrast::compute(&report.metrics).to_markdown());
        }
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => unreachable!("format validated above"),
    }

    if let Some(output) = output {
        std::fs::create_dir_all(&output)?;
        let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");
        let path = output.join(format!("report-{timestamp}.json"));
        report.save_json(&path)?;
        eprintln!("Report saved to: {}", path.display());
    }

    Ok(())
}
