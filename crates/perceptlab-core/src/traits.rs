//! The persistence collaborator interface.
//!
//! The experiment core never talks to a database or the network directly;
//! it drives a [`SessionStore`] implemented elsewhere (HTTP client,
//! in-memory store). Persistence is best-effort at phase boundaries: the
//! in-memory flow never depends on it for correctness.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::model::{ExperimentConfig, ParticipantRecord, Phase1Response, Phase2Response};

/// One phase's completed result set, as handed to the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PhaseResults {
    One(Vec<Phase1Response>),
    Two(Vec<Phase2Response>),
}

impl PhaseResults {
    pub fn phase_number(&self) -> u8 {
        match self {
            PhaseResults::One(_) => 1,
            PhaseResults::Two(_) => 2,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            PhaseResults::One(r) => r.len(),
            PhaseResults::Two(r) => r.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Identifiers minted by the store when a participant enters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionHandle {
    pub session_id: String,
    pub participant_id: String,
}

/// Backing store for sessions and results.
///
/// `create_session` is called at most once per participant entry and its
/// failure blocks the run. `append_phase_results` is fire-and-observe:
/// the caller logs failures and continues. `fetch_all_records` feeds the
/// aggregation engine; on failure the caller degrades to locally-held data.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Register a new participant session for `config`.
    async fn create_session(&self, config: &ExperimentConfig) -> anyhow::Result<SessionHandle>;

    /// Persist one completed phase's results for `session_id`.
    async fn append_phase_results(
        &self,
        session_id: &str,
        results: PhaseResults,
    ) -> anyhow::Result<()>;

    /// Fetch every participant record the store knows about, across all
    /// sessions of the current experiment.
    async fn fetch_all_records(&self) -> anyhow::Result<Vec<ParticipantRecord>>;
}
