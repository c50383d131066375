//! Core data model types for perceptlab.
//!
//! These are the fundamental types the entire perceptlab system uses to
//! represent experiment configurations, trials, and participant responses.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Minimum number of keywords an experiment must define.
pub const MIN_KEYWORDS: usize = 3;

/// The A/B cohort a stimulus asset or response belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Group {
    A,
    B,
}

impl Group {
    /// Both groups, in the fixed presentation order A then B.
    pub const ALL: [Group; 2] = [Group::A, Group::B];
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Group::A => write!(f, "A"),
            Group::B => write!(f, "B"),
        }
    }
}

impl FromStr for Group {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" | "a" => Ok(Group::A),
            "B" | "b" => Ok(Group::B),
            other => Err(format!("unknown group: {other}")),
        }
    }
}

/// A single visual stimulus owned by an experiment configuration.
///
/// Immutable once created. `source` is a URI-shaped locator; fetching and
/// rendering the asset is the embedding application's concern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StimulusAsset {
    /// Opaque identifier, unique within the configuration.
    pub id: String,
    /// Where the asset lives (URL or path).
    pub source: String,
    /// The cohort this asset belongs to.
    pub group: Group,
}

/// A complete experiment definition: keywords plus the two asset sets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Human-readable experiment title.
    pub title: String,
    /// Semantic keywords under test. Order is stable and drives the
    /// deterministic factorial ordering before shuffling.
    pub keywords: Vec<String>,
    /// Group-A stimulus assets.
    pub assets_a: Vec<StimulusAsset>,
    /// Group-B stimulus assets.
    pub assets_b: Vec<StimulusAsset>,
}

impl ExperimentConfig {
    /// All assets in deterministic order: group A first, then group B.
    pub fn all_assets(&self) -> impl Iterator<Item = &StimulusAsset> {
        self.assets_a.iter().chain(self.assets_b.iter())
    }

    /// Total number of assets across both groups.
    pub fn asset_count(&self) -> usize {
        self.assets_a.len() + self.assets_b.len()
    }

    /// Number of Phase-1 trials a full factorial run produces.
    pub fn trial_count(&self) -> usize {
        self.asset_count() * self.keywords.len()
    }

    /// Check the configuration invariants.
    ///
    /// Rejected configurations never reach the trial generator: at least
    /// [`MIN_KEYWORDS`] unique keywords, both asset groups non-empty, every
    /// asset tagged with the group of the list it sits in, and no duplicate
    /// asset ids.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.keywords.len() < MIN_KEYWORDS {
            return Err(ConfigError::TooFewKeywords {
                got: self.keywords.len(),
                min: MIN_KEYWORDS,
            });
        }

        let mut seen = std::collections::HashSet::new();
        for kw in &self.keywords {
            if !seen.insert(kw.as_str()) {
                return Err(ConfigError::DuplicateKeyword(kw.clone()));
            }
        }

        if self.assets_a.is_empty() {
            return Err(ConfigError::EmptyAssetGroup(Group::A));
        }
        if self.assets_b.is_empty() {
            return Err(ConfigError::EmptyAssetGroup(Group::B));
        }

        for (expected, assets) in [(Group::A, &self.assets_a), (Group::B, &self.assets_b)] {
            for asset in assets {
                if asset.group != expected {
                    return Err(ConfigError::GroupMismatch {
                        asset_id: asset.id.clone(),
                        expected,
                        actual: asset.group,
                    });
                }
            }
        }

        let mut ids = std::collections::HashSet::new();
        for asset in self.all_assets() {
            if !ids.insert(asset.id.as_str()) {
                return Err(ConfigError::DuplicateAssetId(asset.id.clone()));
            }
        }

        Ok(())
    }

    /// The built-in demo experiment: corporate vs. playful placeholder sets.
    pub fn demo() -> Self {
        let asset = |id: &str, picsum: u32, group: Group| StimulusAsset {
            id: id.to_string(),
            source: format!("https://picsum.photos/id/{picsum}/400/600"),
            group,
        };

        Self {
            title: "Demo Project: Corporate vs Playful".to_string(),
            keywords: vec![
                "Professional".to_string(),
                "Trustworthy".to_string(),
                "Innovative".to_string(),
                "Friendly".to_string(),
            ],
            assets_a: vec![
                asset("a1", 1, Group::A),
                asset("a2", 20, Group::A),
                asset("a3", 48, Group::A),
            ],
            assets_b: vec![
                asset("b1", 76, Group::B),
                asset("b2", 96, Group::B),
                asset("b3", 119, Group::B),
            ],
        }
    }
}

/// One (stimulus asset, keyword) pairing shown to a participant in Phase 1.
///
/// Ephemeral: generated fresh per participant session, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trial {
    pub asset: StimulusAsset,
    pub keyword: String,
}

/// A single timed binary judgment from Phase 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phase1Response {
    /// Id of the asset that was shown.
    pub asset_id: String,
    /// The asset's cohort.
    pub group: Group,
    /// The keyword that was shown alongside the asset.
    pub keyword: String,
    /// Whether the participant judged the pair a match.
    pub is_match: bool,
    /// Latency from stimulus exposure to response, monotonic-clock based.
    pub reaction_time_ms: f64,
    /// Wall-clock epoch milliseconds, for record-keeping only.
    pub timestamp_ms: i64,
}

/// A holistic keyword selection for one group's entire collection (Phase 2).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase2Response {
    pub group: Group,
    /// Selected keywords in the order the participant picked them.
    /// Always a subset of the configuration's keywords.
    pub selected_keywords: Vec<String>,
}

/// The full set of one participant's responses across both phases.
///
/// Created at session start, appended-to at phase completion, never mutated
/// afterward. The aggregation engine only ever reads these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantRecord {
    pub participant_id: String,
    #[serde(default)]
    pub phase1: Vec<Phase1Response>,
    #[serde(default)]
    pub phase2: Vec<Phase2Response>,
}

impl ParticipantRecord {
    /// A fresh record with no responses yet.
    pub fn new(participant_id: impl Into<String>) -> Self {
        Self {
            participant_id: participant_id.into(),
            phase1: Vec::new(),
            phase2: Vec::new(),
        }
    }

    /// Whether this participant contributed a Phase-2 response for `group`.
    pub fn phase2_for(&self, group: Group) -> Option<&Phase2Response> {
        self.phase2.iter().find(|r| r.group == group)
    }
}
