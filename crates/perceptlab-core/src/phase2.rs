//! Phase-2 controller: holistic collection review.
//!
//! Two fixed blocks, group A then group B. In each block the participant
//! toggles any subset of the configured keywords for the group's entire
//! collection, then submits. Block order is deliberately not randomized.

use std::fmt;
use std::mem;

use crate::error::ExperimentError;
use crate::model::{ExperimentConfig, Group, Phase2Response};

/// Which block the controller is collecting, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase2State {
    Block(Group),
    Completed,
}

impl fmt::Display for Phase2State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase2State::Block(group) => write!(f, "reviewing group {group}"),
            Phase2State::Completed => write!(f, "completed"),
        }
    }
}

/// Outcome of submitting the current block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase2Event {
    /// First block sealed; the given group's block is now open.
    Advanced(Group),
    /// Second block sealed; both responses are available.
    Completed,
}

/// Drives one participant through the two collection-review blocks.
pub struct Phase2Controller {
    keywords: Vec<String>,
    state: Phase2State,
    /// In-progress selection for the current block, in pick order.
    selection: Vec<String>,
    responses: Vec<Phase2Response>,
}

impl Phase2Controller {
    pub fn new(config: &ExperimentConfig) -> Self {
        Self {
            keywords: config.keywords.clone(),
            state: Phase2State::Block(Group::A),
            selection: Vec::new(),
            responses: Vec::with_capacity(2),
        }
    }

    /// Add `keyword` to the current block's selection if absent, remove it
    /// if present. Unknown keywords and calls after completion are no-ops.
    /// Returns whether the selection changed.
    pub fn toggle_keyword(&mut self, keyword: &str) -> bool {
        if self.state == Phase2State::Completed {
            return false;
        }
        if !self.keywords.iter().any(|k| k == keyword) {
            tracing::debug!("ignoring unknown keyword '{keyword}'");
            return false;
        }

        if let Some(pos) = self.selection.iter().position(|k| k == keyword) {
            self.selection.remove(pos);
        } else {
            self.selection.push(keyword.to_string());
        }
        true
    }

    /// Seal the current block: snapshot the selection, clear it, advance.
    ///
    /// The second submit completes the phase with exactly one response per
    /// group. Submitting after completion is reported, not absorbed.
    pub fn submit_block(&mut self) -> Result<Phase2Event, ExperimentError> {
        match self.state {
            Phase2State::Block(group) => {
                self.responses.push(Phase2Response {
                    group,
                    selected_keywords: mem::take(&mut self.selection),
                });
                if group == Group::A {
                    self.state = Phase2State::Block(Group::B);
                    Ok(Phase2Event::Advanced(Group::B))
                } else {
                    self.state = Phase2State::Completed;
                    Ok(Phase2Event::Completed)
                }
            }
            Phase2State::Completed => Err(ExperimentError::InvalidState {
                action: "submit block",
                state: self.state.to_string(),
            }),
        }
    }

    pub fn state(&self) -> Phase2State {
        self.state
    }

    pub fn is_completed(&self) -> bool {
        self.state == Phase2State::Completed
    }

    /// The group whose block is currently open, if any.
    pub fn current_block(&self) -> Option<Group> {
        match self.state {
            Phase2State::Block(group) => Some(group),
            Phase2State::Completed => None,
        }
    }

    /// The in-progress selection for the current block.
    pub fn selection(&self) -> &[String] {
        &self.selection
    }

    /// Responses sealed so far, A first.
    pub fn responses(&self) -> &[Phase2Response] {
        &self.responses
    }

    /// Consume the controller and yield both responses.
    /// At `Completed` this is exactly two, one per group.
    pub fn into_responses(self) -> Vec<Phase2Response> {
        self.responses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ExperimentConfig, StimulusAsset};

    fn config() -> ExperimentConfig {
        ExperimentConfig {
            title: "Review test".into(),
            keywords: vec!["Modern".into(), "Friendly".into(), "Bold".into()],
            assets_a: vec![StimulusAsset {
                id: "a1".into(),
                source: "https://example.com/a1.png".into(),
                group: Group::A,
            }],
            assets_b: vec![StimulusAsset {
                id: "b1".into(),
                source: "https://example.com/b1.png".into(),
                group: Group::B,
            }],
        }
    }

    #[test]
    fn blocks_run_a_then_b() {
        let mut ctl = Phase2Controller::new(&config());
        assert_eq!(ctl.current_block(), Some(Group::A));

        ctl.toggle_keyword("Modern");
        assert_eq!(ctl.submit_block().unwrap(), Phase2Event::Advanced(Group::B));
        assert_eq!(ctl.current_block(), Some(Group::B));

        assert_eq!(ctl.submit_block().unwrap(), Phase2Event::Completed);
        assert!(ctl.is_completed());

        let responses = ctl.into_responses();
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0].group, Group::A);
        assert_eq!(responses[0].selected_keywords, vec!["Modern".to_string()]);
        assert_eq!(responses[1].group, Group::B);
        assert!(responses[1].selected_keywords.is_empty());
    }

    #[test]
    fn toggle_adds_then_removes() {
        let mut ctl = Phase2Controller::new(&config());
        assert!(ctl.toggle_keyword("Friendly"));
        assert_eq!(ctl.selection(), ["Friendly"]);
        assert!(ctl.toggle_keyword("Friendly"));
        assert!(ctl.selection().is_empty());
    }

    #[test]
    fn toggle_preserves_pick_order() {
        let mut ctl = Phase2Controller::new(&config());
        ctl.toggle_keyword("Bold");
        ctl.toggle_keyword("Modern");
        assert_eq!(ctl.selection(), ["Bold", "Modern"]);
    }

    #[test]
    fn unknown_keyword_is_a_noop() {
        let mut ctl = Phase2Controller::new(&config());
        assert!(!ctl.toggle_keyword("Sleek"));
        assert!(ctl.selection().is_empty());
    }

    #[test]
    fn selection_clears_between_blocks() {
        let mut ctl = Phase2Controller::new(&config());
        ctl.toggle_keyword("Modern");
        ctl.submit_block().unwrap();
        assert!(ctl.selection().is_empty());
    }

    #[test]
    fn submit_after_completion_is_reported() {
        let mut ctl = Phase2Controller::new(&config());
        ctl.submit_block().unwrap();
        ctl.submit_block().unwrap();
        let err = ctl.submit_block().unwrap_err();
        assert!(matches!(err, ExperimentError::InvalidState { .. }));
        assert_eq!(ctl.responses().len(), 2);
    }

    #[test]
    fn toggle_after_completion_is_a_noop() {
        let mut ctl = Phase2Controller::new(&config());
        ctl.submit_block().unwrap();
        ctl.submit_block().unwrap();
        assert!(!ctl.toggle_keyword("Modern"));
    }

    #[test]
    fn always_exactly_two_responses_regardless_of_toggles() {
        let mut ctl = Phase2Controller::new(&config());
        for _ in 0..10 {
            ctl.toggle_keyword("Modern");
            ctl.toggle_keyword("Bold");
        }
        ctl.submit_block().unwrap();
        ctl.toggle_keyword("Friendly");
        ctl.submit_block().unwrap();

        let responses = ctl.into_responses();
        assert_eq!(responses.len(), 2);
        for response in &responses {
            for kw in &response.selected_keywords {
                assert!(config().keywords.contains(kw));
            }
        }
    }
}
