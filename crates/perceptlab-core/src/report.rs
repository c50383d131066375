//! Experiment report types with JSON persistence and A/B contrast.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregate::{aggregate, MetricTable};
use crate::model::{ExperimentConfig, Group, ParticipantRecord};
use crate::session::DataOrigin;

/// A complete aggregation report over a record snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// Summary of the experiment configuration.
    pub experiment: ExperimentSummary,
    /// How many participant records fed the metrics.
    pub participant_count: usize,
    /// Whether the snapshot came from the store or is local-only fallback.
    pub data_origin: DataOrigin,
    /// The raw records the metrics were computed from.
    pub records: Vec<ParticipantRecord>,
    /// The aggregated metric table.
    pub metrics: MetricTable,
    /// Wall-clock duration of the run that produced this report.
    pub duration_ms: u64,
}

/// Summary of an experiment (without the full asset lists).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentSummary {
    pub title: String,
    pub keywords: Vec<String>,
    pub asset_count: usize,
}

impl ExperimentReport {
    /// Aggregate `records` for `config` into a fresh report.
    pub fn new(
        config: &ExperimentConfig,
        records: Vec<ParticipantRecord>,
        data_origin: DataOrigin,
        duration_ms: u64,
    ) -> Self {
        let metrics = aggregate(&config.keywords, &records);
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            experiment: ExperimentSummary {
                title: config.title.clone(),
                keywords: config.keywords.clone(),
                asset_count: config.asset_count(),
            },
            participant_count: records.len(),
            data_origin,
            records,
            metrics,
            duration_ms,
        }
    }

    /// Recompute the metric table from the embedded records. The result is
    /// identical for an unchanged snapshot.
    pub fn recompute_metrics(&mut self) {
        self.metrics = aggregate(&self.experiment.keywords, &self.records);
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: ExperimentReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }
}

/// Per-keyword A-versus-B deltas derived from a metric table.
///
/// Presentation data only; no significance testing happens here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupContrast {
    pub rows: Vec<ContrastRow>,
}

/// Deltas for one keyword, each computed as group A minus group B.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContrastRow {
    pub keyword: String,
    /// Match-rate delta in percentage points. Positive favors A.
    pub match_rate_delta: f64,
    /// Fluency delta in milliseconds. Lower reaction time is better, so a
    /// negative delta favors A.
    pub fluency_delta_ms: f64,
    /// Selection-rate delta in percentage points. Positive favors A.
    pub selection_delta: f64,
}

impl GroupContrast {
    /// Derive contrasts from a metric table, one row per keyword.
    pub fn compute(table: &MetricTable) -> Self {
        let mut rows = Vec::new();
        for row in &table.rows {
            if row.group != Group::A {
                continue;
            }
            let Some(b) = table.get(&row.keyword, Group::B) else {
                continue;
            };
            rows.push(ContrastRow {
                keyword: row.keyword.clone(),
                match_rate_delta: row.match_rate - b.match_rate,
                fluency_delta_ms: row.mean_reaction_ms - b.mean_reaction_ms,
                selection_delta: row.selection_rate - b.selection_rate,
            });
        }
        Self { rows }
    }

    /// The group a keyword's match rate favors, if either.
    pub fn match_leader(&self, keyword: &str) -> Option<Group> {
        let row = self.rows.iter().find(|r| r.keyword == keyword)?;
        if row.match_rate_delta > 0.0 {
            Some(Group::A)
        } else if row.match_rate_delta < 0.0 {
            Some(Group::B)
        } else {
            None
        }
    }

    /// Format the contrast as a markdown table.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();
        md.push_str("| Keyword | Match delta (A-B) | Fluency delta (ms) | Selection delta |\n");
        md.push_str("|---------|-------------------|--------------------|-----------------|\n");
        for row in &self.rows {
            md.push_str(&format!(
                "| {} | {:+.1}% | {:+.0} | {:+.1}% |\n",
                row.keyword, row.match_rate_delta, row.fluency_delta_ms, row.selection_delta
            ));
        }
        md
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Phase1Response, Phase2Response};

    fn sample_records() -> Vec<ParticipantRecord> {
        vec![ParticipantRecord {
            participant_id: "p-1".into(),
            phase1: vec![
                Phase1Response {
                    asset_id: "a1".into(),
                    group: Group::A,
                    keyword: "Modern".into(),
                    is_match: true,
                    reaction_time_ms: 100.0,
                    timestamp_ms: 0,
                },
                Phase1Response {
                    asset_id: "b1".into(),
                    group: Group::B,
                    keyword: "Modern".into(),
                    is_match: false,
                    reaction_time_ms: 900.0,
                    timestamp_ms: 0,
                },
            ],
            phase2: vec![
                Phase2Response {
                    group: Group::A,
                    selected_keywords: vec!["Modern".into()],
                },
                Phase2Response {
                    group: Group::B,
                    selected_keywords: vec![],
                },
            ],
        }]
    }

    fn demo_report() -> ExperimentReport {
        let mut config = ExperimentConfig::demo();
        config.keywords = vec!["Modern".into(), "Friendly".into(), "Bold".into()];
        ExperimentReport::new(&config, sample_records(), DataOrigin::Fleet, 1200)
    }

    #[test]
    fn report_embeds_metric_table() {
        let report = demo_report();
        assert_eq!(report.participant_count, 1);
        assert_eq!(report.metrics.rows.len(), 6);
        let cell = report.metrics.get("Modern", Group::A).unwrap();
        assert_eq!(cell.match_rate, 100.0);
    }

    #[test]
    fn json_roundtrip() {
        let report = demo_report();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");

        report.save_json(&path).unwrap();
        let loaded = ExperimentReport::load_json(&path).unwrap();

        assert_eq!(loaded.id, report.id);
        assert_eq!(loaded.metrics, report.metrics);
        assert_eq!(loaded.records.len(), 1);
    }

    #[test]
    fn recompute_is_stable() {
        let mut report = demo_report();
        let before = report.metrics.clone();
        report.recompute_metrics();
        assert_eq!(report.metrics, before);
    }

    #[test]
    fn contrast_deltas() {
        let report = demo_report();
        let contrast = GroupContrast::compute(&report.metrics);
        assert_eq!(contrast.rows.len(), 3);

        let modern = contrast.rows.iter().find(|r| r.keyword == "Modern").unwrap();
        assert_eq!(modern.match_rate_delta, 100.0);
        assert_eq!(modern.selection_delta, 100.0);
        assert_eq!(contrast.match_leader("Modern"), Some(Group::A));
        assert_eq!(contrast.match_leader("Friendly"), None);
    }

    #[test]
    fn markdown_output() {
        let report = demo_report();
        let contrast = GroupContrast::compute(&report.metrics);
        let md = contrast.to_markdown();
        assert!(md.contains("| Keyword |"));
        assert!(md.contains("Modern"));
        assert!(md.contains("+100.0%"));
    }
}
