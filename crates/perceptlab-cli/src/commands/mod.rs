pub mod analyze;
pub mod init;
pub mod simulate;
pub mod validate;

use comfy_table::{Cell, Table};

use perceptlab_core::aggregate::MetricTable;
use perceptlab_core::report::{ExperimentReport, GroupContrast};
use perceptlab_core::session::DataOrigin;

/// Print the metric table and A/B contrast for a report.
pub(crate) fn print_report(report: &ExperimentReport) {
    if report.data_origin == DataOrigin::LocalOnly {
        eprintln!("Notice: record fetch unavailable; metrics cover locally-held data only.");
    }
    eprintln!(
        "{} participants, {} keywords",
        report.participant_count,
        report.experiment.keywords.len()
    );

    eprintln!("\n{}", metric_table(&report.metrics));

    let contrast = GroupContrast::compute(&report.metrics);
    eprintln!("\nA vs B contrast:\n{}", contrast.to_markdown());
}

pub(crate) fn metric_table(metrics: &MetricTable) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        "Keyword",
        "Group",
        "Match %",
        "Fluency (ms)",
        "Selection %",
    ]);
    for row in &metrics.rows {
        table.add_row(vec![
            Cell::new(&row.keyword),
            Cell::new(row.group),
            Cell::new(format!("{:.1}", row.match_rate)),
            Cell::new(format!("{:.0}", row.mean_reaction_ms)),
            Cell::new(format!("{:.1}", row.selection_rate)),
        ]);
    }
    table
}

/// Markdown rendering of the metric table, for `--format markdown`.
pub(crate) fn metrics_markdown(metrics: &MetricTable) -> String {
    let mut md = String::new();
    md.push_str("| Keyword | Group | Match % | Fluency (ms) | Selection % |\n");
    md.push_str("|---------|-------|---------|--------------|-------------|\n");
    for row in &metrics.rows {
        md.push_str(&format!(
            "| {} | {} | {:.1} | {:.0} | {:.1} |\n",
            row.keyword, row.group, row.match_rate, row.mean_reaction_ms, row.selection_rate
        ));
    }
    md
}
