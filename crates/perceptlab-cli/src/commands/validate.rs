//! The `perceptlab validate` command.

use std::path::PathBuf;

use anyhow::Result;

pub fn execute(experiment_path: PathBuf) -> Result<()> {
    let configs = if experiment_path.is_dir() {
        perceptlab_core::parser::load_experiment_directory(&experiment_path)?
    } else {
        vec![perceptlab_core::parser::parse_experiment(&experiment_path)?]
    };

    anyhow::ensure!(!configs.is_empty(), "no experiment definitions found");

    let mut total_warnings = 0;

    for config in &configs {
        println!(
            "Experiment: {} ({} keywords, {} assets, {} trials)",
            config.title,
            config.keywords.len(),
            config.asset_count(),
            config.trial_count()
        );

        config.validate()?;

        let warnings = perceptlab_core::parser::validate_experiment(config);
        for w in &warnings {
            println!("  WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All experiment definitions valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
