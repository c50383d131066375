//! Participant session orchestration.
//!
//! One session drives one participant through Phase 1 and Phase 2 on a
//! single logical thread of control. Persistence happens at phase
//! boundaries as background best-effort uploads: a failed write is logged
//! and counted, but the in-session flow never blocks or rolls back.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use crate::error::ExperimentError;
use crate::model::{
    ExperimentConfig, ParticipantRecord, Phase1Response, Phase2Response, Trial,
};
use crate::phase1::Phase1Controller;
use crate::phase2::Phase2Controller;
use crate::traits::{PhaseResults, SessionHandle, SessionStore};
use crate::trial;

/// Counters for the background upload concern, separate from experiment
/// state. Only ever observed, never consulted by the state machines.
#[derive(Debug, Default)]
pub struct SyncStatus {
    dispatched: AtomicU32,
    succeeded: AtomicU32,
    failed: AtomicU32,
}

/// A point-in-time snapshot of [`SyncStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncCounts {
    pub dispatched: u32,
    pub succeeded: u32,
    pub failed: u32,
}

impl SyncStatus {
    fn snapshot(&self) -> SyncCounts {
        SyncCounts {
            dispatched: self.dispatched.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Where an aggregation snapshot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataOrigin {
    /// The store's full cross-participant dataset.
    Fleet,
    /// The fetch failed; only locally-held data is included. Callers
    /// should surface a visible notice.
    LocalOnly,
}

/// Orchestrates one participant's run against a [`SessionStore`].
pub struct ParticipantSession {
    config: ExperimentConfig,
    store: Arc<dyn SessionStore>,
    handle: SessionHandle,
    record: ParticipantRecord,
    sync: Arc<SyncStatus>,
    uploads: Vec<JoinHandle<()>>,
    phase1_sealed: bool,
    phase2_sealed: bool,
}

impl std::fmt::Debug for ParticipantSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParticipantSession")
            .field("config", &self.config)
            .field("handle", &self.handle)
            .field("record", &self.record)
            .field("phase1_sealed", &self.phase1_sealed)
            .field("phase2_sealed", &self.phase2_sealed)
            .finish()
    }
}

impl ParticipantSession {
    /// Validate the configuration and register the session with the store.
    ///
    /// Configuration errors and session-creation failure both block the
    /// run; nothing else does.
    pub async fn begin(
        config: ExperimentConfig,
        store: Arc<dyn SessionStore>,
    ) -> Result<Self, ExperimentError> {
        config.validate()?;

        let handle = store
            .create_session(&config)
            .await
            .map_err(|e| ExperimentError::SessionCreation(format!("{e:#}")))?;
        tracing::info!(
            session_id = %handle.session_id,
            participant_id = %handle.participant_id,
            "session created"
        );

        let record = ParticipantRecord::new(handle.participant_id.clone());
        Ok(Self {
            config,
            store,
            handle,
            record,
            sync: Arc::new(SyncStatus::default()),
            uploads: Vec::new(),
            phase1_sealed: false,
            phase2_sealed: false,
        })
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    pub fn handle(&self) -> &SessionHandle {
        &self.handle
    }

    /// Generate a fresh randomized trial sequence for this participant.
    /// Each call reshuffles; call once per session.
    pub fn trials(&self, rng: &mut (impl Rng + ?Sized)) -> Vec<Trial> {
        trial::generate(&self.config, rng)
    }

    /// A Phase-1 controller over a fresh trial sequence, with the
    /// production clock.
    pub fn phase1_controller(&self, rng: &mut (impl Rng + ?Sized)) -> Phase1Controller {
        Phase1Controller::new(self.trials(rng))
    }

    /// A Phase-2 controller for this experiment's keywords.
    pub fn phase2_controller(&self) -> Phase2Controller {
        Phase2Controller::new(&self.config)
    }

    /// Seal Phase 1: append the responses to the local record and dispatch
    /// a background upload. The record is phase-scoped append-only, so a
    /// second seal is reported rather than overwriting.
    pub fn complete_phase1(
        &mut self,
        responses: Vec<Phase1Response>,
    ) -> Result<(), ExperimentError> {
        if self.phase1_sealed {
            return Err(ExperimentError::InvalidState {
                action: "complete phase 1",
                state: "phase 1 already sealed".to_string(),
            });
        }
        self.phase1_sealed = true;
        self.record.phase1 = responses.clone();
        self.dispatch_upload(PhaseResults::One(responses));
        Ok(())
    }

    /// Seal Phase 2, mirroring [`complete_phase1`].
    ///
    /// [`complete_phase1`]: ParticipantSession::complete_phase1
    pub fn complete_phase2(
        &mut self,
        responses: Vec<Phase2Response>,
    ) -> Result<(), ExperimentError> {
        if self.phase2_sealed {
            return Err(ExperimentError::InvalidState {
                action: "complete phase 2",
                state: "phase 2 already sealed".to_string(),
            });
        }
        self.phase2_sealed = true;
        self.record.phase2 = responses.clone();
        self.dispatch_upload(PhaseResults::Two(responses));
        Ok(())
    }

    fn dispatch_upload(&mut self, results: PhaseResults) {
        let store = Arc::clone(&self.store);
        let sync = Arc::clone(&self.sync);
        let session_id = self.handle.session_id.clone();
        let phase = results.phase_number();

        sync.dispatched.fetch_add(1, Ordering::Relaxed);
        self.uploads.push(tokio::spawn(async move {
            match store.append_phase_results(&session_id, results).await {
                Ok(()) => {
                    sync.succeeded.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => {
                    // Best-effort: the store may be missing trailing writes,
                    // the in-session flow is unaffected.
                    tracing::warn!(
                        session_id = %session_id,
                        phase,
                        "phase result upload failed: {e:#}"
                    );
                    sync.failed.fetch_add(1, Ordering::Relaxed);
                }
            }
        }));
    }

    /// Current upload counters.
    pub fn sync_status(&self) -> SyncCounts {
        self.sync.snapshot()
    }

    /// Drain in-flight uploads. For orderly shutdown only; the experiment
    /// flow never requires it.
    pub async fn wait_for_sync(&mut self) {
        for upload in self.uploads.drain(..) {
            let _ = upload.await;
        }
    }

    pub fn record(&self) -> &ParticipantRecord {
        &self.record
    }

    /// Consume the session and yield the sealed participant record.
    pub fn finish(self) -> ParticipantRecord {
        self.record
    }
}

/// Fetch the store's full record set, degrading to locally-held data when
/// the fetch fails. The caller decides how to surface [`DataOrigin::LocalOnly`].
pub async fn collect_records(
    store: &dyn SessionStore,
    local: Option<&ParticipantRecord>,
) -> (Vec<ParticipantRecord>, DataOrigin) {
    match store.fetch_all_records().await {
        Ok(records) => (records, DataOrigin::Fleet),
        Err(e) => {
            tracing::warn!("record fetch failed, aggregating local data only: {e:#}");
            let records = local.cloned().into_iter().collect();
            (records, DataOrigin::LocalOnly)
        }
    }
}
