//! Error types for the experiment engine.
//!
//! Defined here so callers can classify failures without string matching:
//! configuration errors are rejected before a session starts, state-machine
//! misuse is reported (or ignored, for duplicate physical inputs), and
//! session-creation failure is the only store failure that halts a run.

use thiserror::Error;

use crate::model::Group;

/// A configuration that can never produce a valid experiment run.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Fewer keywords than the experiment protocol requires.
    #[error("at least {min} keywords required, got {got}")]
    TooFewKeywords { got: usize, min: usize },

    /// The same keyword appears more than once.
    #[error("duplicate keyword: {0}")]
    DuplicateKeyword(String),

    /// One of the asset groups has no stimuli.
    #[error("asset group {0} is empty")]
    EmptyAssetGroup(Group),

    /// An asset's group tag does not match the set it was listed under.
    #[error("asset '{asset_id}' is tagged group {actual} but listed under group {expected}")]
    GroupMismatch {
        asset_id: String,
        expected: Group,
        actual: Group,
    },

    /// Two assets share an id.
    #[error("duplicate asset id: {0}")]
    DuplicateAssetId(String),
}

/// Errors surfaced by the controllers and the session orchestrator.
#[derive(Debug, Error)]
pub enum ExperimentError {
    /// The configuration failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A state-machine transition was requested from the wrong state.
    #[error("cannot {action} while {state}")]
    InvalidState {
        action: &'static str,
        state: String,
    },

    /// The persistence collaborator refused to create a session.
    /// This is the only store failure that blocks a participant's flow.
    #[error("session could not be created: {0}")]
    SessionCreation(String),
}
