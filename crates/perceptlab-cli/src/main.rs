//! perceptlab CLI — the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "perceptlab", version, about = "Two-phase perceptual A/B experiment engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run simulated participant sessions end to end
    Simulate {
        /// Path to a .toml experiment definition
        #[arg(long)]
        experiment: PathBuf,

        /// Number of simulated participants
        #[arg(long, default_value = "1")]
        participants: usize,

        /// Seed for the shuffle and the scripted responder
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Persistence service URL (defaults to an in-process store)
        #[arg(long)]
        api_url: Option<String>,

        /// Output directory for the report
        #[arg(long, default_value = "./perceptlab-results")]
        output: PathBuf,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Aggregate collected results into per-keyword group metrics
    Analyze {
        /// Path to the .toml experiment definition the data belongs to
        #[arg(long)]
        experiment: PathBuf,

        /// Persistence service URL to fetch records from
        #[arg(long)]
        api_url: Option<String>,

        /// Re-analyze a previously saved report instead of fetching
        #[arg(long)]
        report: Option<PathBuf>,

        /// Directory to save the refreshed report into
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format: table, markdown, json
        #[arg(long, default_value = "table")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate experiment definition files
    Validate {
        /// Path to an experiment file or directory
        #[arg(long)]
        experiment: PathBuf,
    },

    /// Create starter config and demo experiment
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("perceptlab=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Simulate {
            experiment,
            participants,
            seed,
            api_url,
            output,
            config,
        } => commands::simulate::execute(experiment, participants, seed, api_url, output, config)
            .await,
        Commands::Analyze {
            experiment,
            api_url,
            report,
            output,
            format,
            config,
        } => commands::analyze::execute(experiment, api_url, report, output, format, config).await,
        Commands::Validate { experiment } => commands::validate::execute(experiment),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
