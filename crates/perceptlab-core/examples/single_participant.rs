//! Single participant example — minimal programmatic usage of the engine.
//!
//! Drives one simulated participant through both phases against a tiny
//! in-process store, then prints the aggregated metric table.
//!
//! ```bash
//! cargo run --example single_participant
//! ```

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use perceptlab_core::aggregate::aggregate;
use perceptlab_core::clock::ManualClock;
use perceptlab_core::model::{ExperimentConfig, ParticipantRecord};
use perceptlab_core::phase1::Phase1Controller;
use perceptlab_core::session::ParticipantSession;
use perceptlab_core::traits::{PhaseResults, SessionHandle, SessionStore};

/// The smallest possible store: one session, kept in memory.
#[derive(Default)]
struct ScratchStore {
    record: Mutex<Option<ParticipantRecord>>,
}

#[async_trait]
impl SessionStore for ScratchStore {
    async fn create_session(&self, _config: &ExperimentConfig) -> anyhow::Result<SessionHandle> {
        *self.record.lock().unwrap() = Some(ParticipantRecord::new("example-participant"));
        Ok(SessionHandle {
            session_id: "example-session".into(),
            participant_id: "example-participant".into(),
        })
    }

    async fn append_phase_results(
        &self,
        _session_id: &str,
        results: PhaseResults,
    ) -> anyhow::Result<()> {
        let mut guard = self.record.lock().unwrap();
        let record = guard.as_mut().expect("session exists");
        match results {
            PhaseResults::One(responses) => record.phase1 = responses,
            PhaseResults::Two(responses) => record.phase2 = responses,
        }
        Ok(())
    }

    async fn fetch_all_records(&self) -> anyhow::Result<Vec<ParticipantRecord>> {
        Ok(self.record.lock().unwrap().clone().into_iter().collect())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ExperimentConfig::demo();
    let store: Arc<dyn SessionStore> = Arc::new(ScratchStore::default());

    let mut session = ParticipantSession::begin(config.clone(), store).await?;
    println!(
        "Session {} for participant {}",
        session.handle().session_id,
        session.handle().participant_id
    );

    // Phase 1: seeded shuffle, simulated think times on a manual clock.
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let trials = session.trials(&mut rng);
    println!("Phase 1: {} trials", trials.len());

    let clock = ManualClock::new();
    let mut phase1 = Phase1Controller::with_clock(trials, Box::new(clock.clone()));
    phase1.start()?;
    while phase1.current_trial().is_some() {
        clock.advance(Duration::from_millis(rng.gen_range(250..900)));
        phase1.respond(rng.gen_bool(0.6));
    }
    session.complete_phase1(phase1.into_responses())?;

    // Phase 2: pick a random subset per block.
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
    let record = session.finish();

    let table = aggregate(&config.keywords, std::slice::from_ref(&record));
    println!("\n{:<14} {:>5} {:>10} {:>12} {:>11}", "Keyword", "Group", "Match %", "Fluency ms", "Selected %");
    for row in &table.rows {
        println!(
            "{:<14} {:>5} {:>10.1} {:>12.0} {:>11.1}",
            row.keyword, row.group.to_string(), row.match_rate, row.mean_reaction_ms, row.selection_rate
        );
    }

    Ok(())
}
