//! Phase-1 trial generation.
//!
//! Builds the full factorial cross-product of stimuli and keywords, then
//! applies one unbiased Fisher-Yates shuffle so presentation order carries
//! no group or keyword-order bias. The random source is injected, so a
//! seeded generator reproduces the exact sequence.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::model::{ExperimentConfig, Trial};

/// Generate the randomized trial sequence for one participant session.
///
/// Every (asset, keyword) pair appears exactly once. The pre-shuffle order
/// is deterministic (assets A then B, keywords in configuration order), so
/// the output is a permutation of a fixed factorial set. Re-invoke per
/// participant; never reuse a sequence across sessions.
///
/// An empty asset set or keyword list yields an empty sequence; Phase 1
/// then completes immediately with zero responses.
pub fn generate(config: &ExperimentConfig, rng: &mut (impl Rng + ?Sized)) -> Vec<Trial> {
    let mut trials = Vec::with_capacity(config.trial_count());

    for asset in config.all_assets() {
        for keyword in &config.keywords {
            trials.push(Trial {
                asset: asset.clone(),
                keyword: keyword.clone(),
            });
        }
    }

    trials.shuffle(rng);
    trials
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Group, StimulusAsset};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashSet;

    fn config(assets_per_group: usize, keywords: &[&str]) -> ExperimentConfig {
        let asset = |id: String, group: Group| StimulusAsset {
            source: format!("https://example.com/{id}.png"),
            id,
            group,
        };
        ExperimentConfig {
            title: "Shuffle test".into(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            assets_a: (0..assets_per_group)
                .map(|i| asset(format!("a{i}"), Group::A))
                .collect(),
            assets_b: (0..assets_per_group)
                .map(|i| asset(format!("b{i}"), Group::B))
                .collect(),
        }
    }

    #[test]
    fn full_factorial_each_pair_once() {
        let config = config(3, &["Modern", "Friendly", "Bold", "Calm"]);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let trials = generate(&config, &mut rng);

        assert_eq!(trials.len(), 6 * 4);
        let pairs: HashSet<(String, String)> = trials
            .iter()
            .map(|t| (t.asset.id.clone(), t.keyword.clone()))
            .collect();
        assert_eq!(pairs.len(), trials.len(), "every pair must be unique");
    }

    #[test]
    fn output_is_permutation_not_resample() {
        let config = config(2, &["Modern", "Friendly", "Bold"]);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut shuffled = generate(&config, &mut rng);

        let mut factorial: Vec<Trial> = Vec::new();
        for asset in config.all_assets() {
            for keyword in &config.keywords {
                factorial.push(Trial {
                    asset: asset.clone(),
                    keyword: keyword.clone(),
                });
            }
        }

        let key = |t: &Trial| (t.asset.id.clone(), t.keyword.clone());
        shuffled.sort_by_key(key);
        factorial.sort_by_key(key);
        assert_eq!(shuffled, factorial);
    }

    #[test]
    fn same_seed_reproduces_order() {
        let config = config(3, &["Modern", "Friendly", "Bold"]);
        let a = generate(&config, &mut ChaCha8Rng::seed_from_u64(42));
        let b = generate(&config, &mut ChaCha8Rng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn different_seeds_usually_differ() {
        let config = config(3, &["Modern", "Friendly", "Bold"]);
        let a = generate(&config, &mut ChaCha8Rng::seed_from_u64(1));
        let b = generate(&config, &mut ChaCha8Rng::seed_from_u64(2));
        assert_ne!(a, b);
    }

    #[test]
    fn empty_keywords_yield_empty_sequence() {
        let config = config(3, &[]);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(generate(&config, &mut rng).is_empty());
    }

    #[test]
    fn empty_assets_yield_empty_sequence() {
        let mut config = config(0, &["Modern", "Friendly"]);
        config.assets_a.clear();
        config.assets_b.clear();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(generate(&config, &mut rng).is_empty());
    }

    /// Statistical check, not exact equality: over many seeds, a fixed
    /// trial should land in each position roughly uniformly.
    #[test]
    fn shuffle_positions_are_roughly_uniform() {
        let config = config(1, &["Modern", "Friendly"]);
        let runs = 4000;
        let slots = config.trial_count(); // 4
        let mut counts = vec![0usize; slots];

        for seed in 0..runs {
            let trials = generate(&config, &mut ChaCha8Rng::seed_from_u64(seed));
            let pos = trials
                .iter()
                .position(|t| t.asset.id == "a0" && t.keyword == "Modern")
                .unwrap();
            counts[pos] += 1;
        }

        let expected = runs as f64 / slots as f64;
        for (pos, &count) in counts.iter().enumerate() {
            let deviation = (count as f64 - expected).abs() / expected;
            assert!(
                deviation < 0.15,
                "position {pos} count {count} deviates {deviation:.2} from uniform"
            );
        }
    }
}
