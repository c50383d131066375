//! TOML experiment definition parser.
//!
//! Loads experiment configurations from TOML files and directories, and
//! flags advisory issues that validation alone does not reject.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{ExperimentConfig, Group, StimulusAsset};

/// Intermediate TOML structure for parsing experiment files.
#[derive(Debug, Deserialize)]
struct TomlExperimentFile {
    experiment: TomlExperimentHeader,
    #[serde(default)]
    assets: TomlAssets,
}

#[derive(Debug, Deserialize)]
struct TomlExperimentHeader {
    title: String,
    #[serde(default)]
    keywords: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct TomlAssets {
    #[serde(default)]
    a: Vec<TomlAsset>,
    #[serde(default)]
    b: Vec<TomlAsset>,
}

#[derive(Debug, Deserialize)]
struct TomlAsset {
    id: String,
    source: String,
}

/// Parse a single TOML file into an `ExperimentConfig`.
pub fn parse_experiment(path: &Path) -> Result<ExperimentConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read experiment file: {}", path.display()))?;

    parse_experiment_str(&content, path)
}

/// Parse a TOML string into an `ExperimentConfig` (useful for testing).
///
/// Assets take their group from the section they sit in, so a parsed
/// configuration can never carry a group mismatch. Hard invariants
/// (keyword count, non-empty groups) are checked separately via
/// [`ExperimentConfig::validate`].
pub fn parse_experiment_str(content: &str, source_path: &Path) -> Result<ExperimentConfig> {
    let parsed: TomlExperimentFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let tag = |assets: Vec<TomlAsset>, group: Group| -> Vec<StimulusAsset> {
        assets
            .into_iter()
            .map(|a| StimulusAsset {
                id: a.id,
                source: a.source,
                group,
            })
            .collect()
    };

    Ok(ExperimentConfig {
        title: parsed.experiment.title,
        keywords: parsed.experiment.keywords,
        assets_a: tag(parsed.assets.a, Group::A),
        assets_b: tag(parsed.assets.b, Group::B),
    })
}

/// Recursively load all `.toml` experiment files from a directory.
pub fn load_experiment_directory(dir: &Path) -> Result<Vec<ExperimentConfig>> {
    let mut configs = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            configs.extend(load_experiment_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_experiment(&path) {
                Ok(config) => configs.push(config),
                Err(e) => {
                    tracing::warn!("skipping {}: {}", path.display(), e);
                }
            }
        }
    }

    Ok(configs)
}

/// A warning from experiment validation. Warnings never block a run.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub message: String,
}

/// Keyword count above which participants tend to fatigue.
const KEYWORD_FATIGUE_LIMIT: usize = 5;

/// Trial count above which a Phase-1 run gets long enough to degrade
/// reaction-time quality.
const TRIAL_FATIGUE_LIMIT: usize = 60;

/// Flag advisory issues with an experiment configuration.
pub fn validate_experiment(config: &ExperimentConfig) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if config.keywords.len() > KEYWORD_FATIGUE_LIMIT {
        warnings.push(ValidationWarning {
            message: format!(
                "{} keywords configured; more than {KEYWORD_FATIGUE_LIMIT} tends to fatigue participants",
                config.keywords.len()
            ),
        });
    }

    if config.trial_count() > TRIAL_FATIGUE_LIMIT {
        warnings.push(ValidationWarning {
            message: format!(
                "full factorial produces {} trials; above {TRIAL_FATIGUE_LIMIT} reaction-time quality degrades",
                config.trial_count()
            ),
        });
    }

    let (a, b) = (config.assets_a.len(), config.assets_b.len());
    if a != 0 && b != 0 && (a >= b * 2 || b >= a * 2) {
        warnings.push(ValidationWarning {
            message: format!(
                "asset groups are unbalanced ({a} vs {b}); per-group metrics will rest on uneven trial counts"
            ),
        });
    }

    warnings
}
