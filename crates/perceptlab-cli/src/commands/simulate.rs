//! The `perceptlab simulate` command.
//!
//! Drives scripted participants through both phases headlessly, then
//! aggregates and saves a report. Useful for piloting an experiment
//! definition before sending the link to real participants.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use perceptlab_core::clock::ManualClock;
use perceptlab_core::parser;
use perceptlab_core::phase1::Phase1Controller;
use perceptlab_core::report::ExperimentReport;
use perceptlab_core::session::{collect_records, ParticipantSession};
use perceptlab_core::traits::SessionStore;
use perceptlab_store::config::load_config_from;
use perceptlab_store::HttpSessionStore;

pub async fn execute(
    experiment_path: PathBuf,
    participants: usize,
    seed: u64,
    api_url: Option<String>,
    output: PathBuf,
    config_path: Option<PathBuf>,
) -> Result<()> {
    anyhow::ensure!(participants >= 1, "participants must be at least 1");

    let config = parser::parse_experiment(&experiment_path)?;
    config.validate()?;
    for warning in parser::validate_experiment(&config) {
        eprintln!("WARNING: {}", warning.message);
    }

    let mut store_config = load_config_from(config_path.as_deref())?;
    if api_url.is_some() {
        store_config.api_url = api_url;
    }
    let store: Arc<dyn SessionStore> = match &store_config.api_url {
        Some(url) => {
            eprintln!("Persisting to {url}");
            Arc::new(
                HttpSessionStore::new(url.clone())
                    .with_timeout(Duration::from_secs(store_config.timeout_secs)),
            )
        }
        None => {
            eprintln!("No service configured; using an in-process store.");
            store_config.build_store()
        }
    };

    eprintln!(
        "Simulating {} participant(s) for \"{}\" ({} trials each, seed {seed})",
        participants,
        config.title,
        config.trial_count()
    );

    let started = Instant::now();
    let mut local_records = Vec::with_capacity(participants);

    for index in 0..participants {
        let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(index as u64));
        let mut session = ParticipantSession::begin(config.clone(), Arc::clone(&store)).await?;

        // Phase 1: seeded shuffle, think times sampled onto a manual clock.
        let trials = session.trials(&mut rng);
        let clock = ManualClock::new();
        let mut phase1 = Phase1Controller::with_clock(trials, Box::new(clock.clone()));
        phase1.start()?;
        while phase1.current_trial().is_some() {
            clock.advance(Duration::from_millis(rng.gen_range(250..900)));
            phase1.respond(rng.gen_bool(0.5));
        }
        session.complete_phase1(phase1.into_responses())?;

        // Phase 2: an independent random subset per block.
        let mut phase2 = session.phase2_controller();
        while phase2.current_block().is_some() {
            for keyword in &config.keywords {
                if rng.gen_bool(0.4) {
                    phase2.toggle_keyword(keyword);
                }
            }
            phase2.submit_block()?;
        }
        session.complete_phase2(phase2.into_responses())?;

        session.wait_for_sync().await;
        let sync = session.sync_status();
        if sync.failed > 0 {
            eprintln!(
                "  participant {}: {} of {} uploads failed (local flow unaffected)",
                index + 1,
                sync.failed,
                sync.dispatched
            );
        }
        local_records.push(session.finish());
    }

    let (records, origin) = collect_records(store.as_ref(), local_records.last()).await;
    let report = ExperimentReport::new(
        &config,
        records,
        origin,
        started.elapsed().as_millis() as u64,
    );

    super::print_report(&report);

    std::fs::create_dir_all(&output)?;
    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");
    let path = output.join(format!("report-{timestamp}.json"));
    report.save_json(&path)?;
    eprintln!("Report saved to: {}", path.display());

    Ok(())
}
