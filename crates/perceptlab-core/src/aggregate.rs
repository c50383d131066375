//! Cross-participant aggregation.
//!
//! Pure functions over a materialized snapshot of participant records:
//! no I/O, no hidden state, and no dependence on record arrival order, so
//! a given snapshot always produces a bit-for-bit identical table.
//!
//! Every metric defines the zero-denominator case as 0.0 rather than
//! "no data", keeping the output table total for charting callers.

use serde::{Deserialize, Serialize};

use crate::model::{Group, ParticipantRecord};

/// All three metrics for one (keyword, group) cell, in percent and
/// milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordGroupMetrics {
    pub keyword: String,
    pub group: Group,
    /// Percent of Phase-1 trials in this cell judged a match.
    pub match_rate: f64,
    /// Mean reaction time over confirmed matches only, in milliseconds.
    pub mean_reaction_ms: f64,
    /// Percent of participants whose Phase-2 selection for this group
    /// included the keyword.
    pub selection_rate: f64,
}

/// The full aggregation output: one row per (keyword, group), keywords in
/// configuration order, group A before group B.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricTable {
    pub rows: Vec<KeywordGroupMetrics>,
}

impl MetricTable {
    pub fn get(&self, keyword: &str, group: Group) -> Option<&KeywordGroupMetrics> {
        self.rows
            .iter()
            .find(|r| r.keyword == keyword && r.group == group)
    }
}

/// Percent of Phase-1 responses in the (keyword, group) cell with a
/// positive match judgment. 0.0 when the cell has no responses.
pub fn match_rate(records: &[ParticipantRecord], keyword: &str, group: Group) -> f64 {
    let mut trials = 0usize;
    let mut matches = 0usize;
    for response in phase1_cell(records, keyword, group) {
        trials += 1;
        if response.is_match {
            matches += 1;
        }
    }
    if trials == 0 {
        return 0.0;
    }
    matches as f64 / trials as f64 * 100.0
}

/// Arithmetic mean of reaction times over the cell restricted to confirmed
/// matches. Fluency is defined only for positive judgments; negative-match
/// trials are excluded. 0.0 when no matches exist.
pub fn mean_reaction_time(records: &[ParticipantRecord], keyword: &str, group: Group) -> f64 {
    let mut total = 0.0f64;
    let mut count = 0usize;
    for response in phase1_cell(records, keyword, group) {
        if response.is_match {
            total += response.reaction_time_ms;
            count += 1;
        }
    }
    if count == 0 {
        return 0.0;
    }
    total / count as f64
}

/// Percent of participants who included `keyword` when describing the
/// group's entire collection, over the participants who contributed a
/// Phase-2 response for that group. Participants who abandoned before
/// Phase 2 are excluded from the denominator and skew nothing else.
pub fn selection_rate(records: &[ParticipantRecord], keyword: &str, group: Group) -> f64 {
    let mut respondents = 0usize;
    let mut selected = 0usize;
    for record in records {
        let Some(response) = record.phase2_for(group) else {
            continue;
        };
        respondents += 1;
        if response.selected_keywords.iter().any(|k| k == keyword) {
            selected += 1;
        }
    }
    if respondents == 0 {
        return 0.0;
    }
    selected as f64 / respondents as f64 * 100.0
}

/// Compute the full metric table for a record snapshot.
///
/// Recomputed on demand; never cached. An empty snapshot yields an
/// all-zero table with one row per (keyword, group) cell.
pub fn aggregate(keywords: &[String], records: &[ParticipantRecord]) -> MetricTable {
    let mut rows = Vec::with_capacity(keywords.len() * 2);
    for keyword in keywords {
        for group in Group::ALL {
            rows.push(KeywordGroupMetrics {
                keyword: keyword.clone(),
                group,
                match_rate: match_rate(records, keyword, group),
                mean_reaction_ms: mean_reaction_time(records, keyword, group),
                selection_rate: selection_rate(records, keyword, group),
            });
        }
    }
    MetricTable { rows }
}

fn phase1_cell<'a>(
    records: &'a [ParticipantRecord],
    keyword: &'a str,
    group: Group,
) -> impl Iterator<Item = &'a crate::model::Phase1Response> {
    records
        .iter()
        .flat_map(|r| r.phase1.iter())
        .filter(move |r| r.keyword == keyword && r.group == group)
}
