//! In-memory session store for tests and offline simulation.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use perceptlab_core::model::{
    ExperimentConfig, ParticipantRecord, Phase1Response, Phase2Response,
};
use perceptlab_core::traits::{PhaseResults, SessionHandle, SessionStore};

use crate::error::StoreError;

struct StoredSession {
    session_id: String,
    participant_id: String,
    config: ExperimentConfig,
    phase1: Vec<Phase1Response>,
    phase2: Vec<Phase2Response>,
}

/// A process-local `SessionStore`.
///
/// Sessions live in insertion order, so fetches are deterministic. The
/// failure toggles let tests exercise every degraded path the core
/// promises to survive.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: Mutex<Vec<StoredSession>>,
    fail_create: AtomicBool,
    fail_append: AtomicBool,
    fail_fetch: AtomicBool,
    create_calls: AtomicU32,
    append_calls: AtomicU32,
    fetch_calls: AtomicU32,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `create_session` calls fail.
    pub fn set_fail_create(&self, fail: bool) {
        self.fail_create.store(fail, Ordering::Relaxed);
    }

    /// Make subsequent `append_phase_results` calls fail.
    pub fn set_fail_append(&self, fail: bool) {
        self.fail_append.store(fail, Ordering::Relaxed);
    }

    /// Make subsequent `fetch_all_records` calls fail.
    pub fn set_fail_fetch(&self, fail: bool) {
        self.fail_fetch.store(fail, Ordering::Relaxed);
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }

    /// The configuration embedded in a stored session.
    pub fn stored_config(&self, session_id: &str) -> Option<ExperimentConfig> {
        self.sessions
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.session_id == session_id)
            .map(|s| s.config.clone())
    }

    pub fn create_calls(&self) -> u32 {
        self.create_calls.load(Ordering::Relaxed)
    }

    pub fn append_calls(&self) -> u32 {
        self.append_calls.load(Ordering::Relaxed)
    }

    pub fn fetch_calls(&self) -> u32 {
        self.fetch_calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create_session(&self, config: &ExperimentConfig) -> anyhow::Result<SessionHandle> {
        self.create_calls.fetch_add(1, Ordering::Relaxed);
        if self.fail_create.load(Ordering::Relaxed) {
            anyhow::bail!("memory store: create disabled");
        }

        let session = StoredSession {
            session_id: Uuid::new_v4().to_string(),
            participant_id: Uuid::new_v4().to_string(),
            config: config.clone(),
            phase1: Vec::new(),
            phase2: Vec::new(),
        };
        let handle = SessionHandle {
            session_id: session.session_id.clone(),
            participant_id: session.participant_id.clone(),
        };
        self.sessions.lock().unwrap().push(session);
        Ok(handle)
    }

    async fn append_phase_results(
        &self,
        session_id: &str,
        results: PhaseResults,
    ) -> anyhow::Result<()> {
        self.append_calls.fetch_add(1, Ordering::Relaxed);
        if self.fail_append.load(Ordering::Relaxed) {
            anyhow::bail!("memory store: append disabled");
        }

        let mut sessions = self.sessions.lock().unwrap();
        let session = sessions
            .iter_mut()
            .find(|s| s.session_id == session_id)
            .ok_or_else(|| StoreError::SessionNotFound(session_id.to_string()))?;

        match results {
            PhaseResults::One(responses) => session.phase1.extend(responses),
            PhaseResults::Two(responses) => session.phase2.extend(responses),
        }
        Ok(())
    }

    async fn fetch_all_records(&self) -> anyhow::Result<Vec<ParticipantRecord>> {
        self.fetch_calls.fetch_add(1, Ordering::Relaxed);
        if self.fail_fetch.load(Ordering::Relaxed) {
            anyhow::bail!("memory store: fetch disabled");
        }

        let sessions = self.sessions.lock().unwrap();
        Ok(sessions
            .iter()
            .map(|s| ParticipantRecord {
                participant_id: s.participant_id.clone(),
                phase1: s.phase1.clone(),
                phase2: s.phase2.clone(),
            })
            .collect())
    }
}
