//! The `perceptlab init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    // Create perceptlab.toml
    if std::path::Path::new("perceptlab.toml").exists() {
        println!("perceptlab.toml already exists, skipping.");
    } else {
        std::fs::write("perceptlab.toml", SAMPLE_CONFIG)?;
        println!("Created perceptlab.toml");
    }

    // Create the demo experiment
    std::fs::create_dir_all("experiments")?;
    let demo_path = std::path::Path::new("experiments/demo.toml");
    if demo_path.exists() {
        println!("experiments/demo.toml already exists, skipping.");
    } else {
        std::fs::write(demo_path, DEMO_EXPERIMENT)?;
        println!("Created experiments/demo.toml");
    }

    println!("\nNext steps:");
    println!("  1. Edit perceptlab.toml if you run the persistence service");
    println!("  2. Run: perceptlab validate --experiment experiments/demo.toml");
    println!("  3. Run: perceptlab simulate --experiment experiments/demo.toml --participants 5");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# perceptlab configuration

# Base URL of the persistence service. Leave commented to run fully
# in-process (results then live only for the duration of the command).
# api_url = "http://localhost:3001"
# api_url = "${PERCEPTLAB_API_URL}"

timeout_secs = 10
output_dir = "./perceptlab-results"
"#;

const DEMO_EXPERIMENT: &str = r#"[experiment]
title = "Demo Project: Corporate vs Playful"
keywords = ["Professional", "Trustworthy", "Innovative", "Friendly"]

[[assets.a]]
id = "a1"
source = "https://picsum.photos/id/1/400/600"

[[assets.a]]
id = "a2"
source = "https://picsum.photos/id/20/400/600"

[[assets.a]]
id = "a3"
source = "https://picsum.photos/id/48/400/600"

[[assets.b]]
id = "b1"
source = "https://picsum.photos/id/76/400/600"

[[assets.b]]
id = "b2"
source = "https://picsum.photos/id/96/400/600"

[[assets.b]]
id = "b3"
source = "https://picsum.photos/id/119/400/600"
"#;
