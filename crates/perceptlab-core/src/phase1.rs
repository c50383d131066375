//! Phase-1 controller: timed rapid-response trials.
//!
//! An explicit state machine with no hidden globals, so a sequence of
//! transitions is replayable in tests without any rendering surface.
//! Reaction time is the difference of two monotonic-clock readings taken
//! at stimulus exposure and at response.

use std::fmt;
use std::time::Duration;

use crate::clock::{Clock, MonotonicClock};
use crate::error::ExperimentError;
use crate::model::{Phase1Response, Trial};

/// Where the controller is in the trial sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase1State {
    NotStarted,
    /// Trial `i` is currently exposed, `i` in `[0, trial_count)`.
    Presenting(usize),
    Completed,
}

impl fmt::Display for Phase1State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase1State::NotStarted => write!(f, "not started"),
            Phase1State::Presenting(i) => write!(f, "presenting trial {i}"),
            Phase1State::Completed => write!(f, "completed"),
        }
    }
}

/// Outcome of feeding one response into the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase1Event {
    /// The input arrived outside `Presenting` and was dropped. This is the
    /// double-fire guard: both input channels may emit for one physical
    /// event, and the second arrival must not append a response.
    Ignored,
    /// Response recorded; the next trial is now exposed.
    Advanced { next_index: usize },
    /// Response recorded; the trial sequence is exhausted.
    Completed,
}

/// Directional key input, the keyboard response channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
}

/// A physical input from either response channel. Pointer/tap controls and
/// directional keys map onto the same respond path: left means no,
/// right means yes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Tap { is_match: bool },
    Key(Direction),
}

impl InputEvent {
    fn as_match(self) -> bool {
        match self {
            InputEvent::Tap { is_match } => is_match,
            InputEvent::Key(Direction::Left) => false,
            InputEvent::Key(Direction::Right) => true,
        }
    }
}

/// Drives one participant through a randomized trial sequence.
pub struct Phase1Controller {
    trials: Vec<Trial>,
    state: Phase1State,
    responses: Vec<Phase1Response>,
    /// Monotonic reading at the exposure of the current trial.
    exposed_at: Duration,
    clock: Box<dyn Clock>,
}

impl Phase1Controller {
    /// Build a controller over `trials` with the production clock.
    pub fn new(trials: Vec<Trial>) -> Self {
        Self::with_clock(trials, Box::new(MonotonicClock::default()))
    }

    /// Build a controller with an injected clock (tests, simulation).
    pub fn with_clock(trials: Vec<Trial>, clock: Box<dyn Clock>) -> Self {
        let capacity = trials.len();
        Self {
            trials,
            state: Phase1State::NotStarted,
            responses: Vec::with_capacity(capacity),
            exposed_at: Duration::ZERO,
            clock,
        }
    }

    /// Begin the trial sequence and arm the first exposure timestamp.
    ///
    /// With zero trials the phase completes immediately with an empty
    /// response set. Calling from any state other than `NotStarted` is
    /// reported as an error, never silently re-armed.
    pub fn start(&mut self) -> Result<(), ExperimentError> {
        if self.state != Phase1State::NotStarted {
            return Err(ExperimentError::InvalidState {
                action: "start phase 1",
                state: self.state.to_string(),
            });
        }

        if self.trials.is_empty() {
            self.state = Phase1State::Completed;
        } else {
            self.exposed_at = self.clock.elapsed();
            self.state = Phase1State::Presenting(0);
        }
        Ok(())
    }

    /// Record a binary judgment for the currently exposed trial.
    ///
    /// Only acts while `Presenting`; anything else is an ignored no-op so
    /// that duplicate inputs from the two channels cannot append a second
    /// response for the same trial.
    pub fn respond(&mut self, is_match: bool) -> Phase1Event {
        let Phase1State::Presenting(index) = self.state else {
            return Phase1Event::Ignored;
        };

        let reaction = self.clock.elapsed().saturating_sub(self.exposed_at);
        let trial = &self.trials[index];
        self.responses.push(Phase1Response {
            asset_id: trial.asset.id.clone(),
            group: trial.asset.group,
            keyword: trial.keyword.clone(),
            is_match,
            // Nanosecond division keeps whole-millisecond readings exact.
            reaction_time_ms: reaction.as_nanos() as f64 / 1_000_000.0,
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
        });

        let next = index + 1;
        if next < self.trials.len() {
            self.exposed_at = self.clock.elapsed();
            self.state = Phase1State::Presenting(next);
            Phase1Event::Advanced { next_index: next }
        } else {
            self.state = Phase1State::Completed;
            Phase1Event::Completed
        }
    }

    /// Route a physical input from either channel into [`respond`].
    ///
    /// [`respond`]: Phase1Controller::respond
    pub fn handle_input(&mut self, event: InputEvent) -> Phase1Event {
        self.respond(event.as_match())
    }

    pub fn state(&self) -> Phase1State {
        self.state
    }

    pub fn is_completed(&self) -> bool {
        self.state == Phase1State::Completed
    }

    /// The trial currently exposed, if any.
    pub fn current_trial(&self) -> Option<&Trial> {
        match self.state {
            Phase1State::Presenting(i) => self.trials.get(i),
            _ => None,
        }
    }

    /// `(answered, total)` for progress display.
    pub fn progress(&self) -> (usize, usize) {
        (self.responses.len(), self.trials.len())
    }

    /// Responses recorded so far, in presentation order.
    pub fn responses(&self) -> &[Phase1Response] {
        &self.responses
    }

    /// Consume the controller and yield the accumulated responses.
    /// At `Completed` this is exactly one response per trial.
    pub fn into_responses(self) -> Vec<Phase1Response> {
        self.responses
    }
}
