//! Stage state machine
//!
//! Initial → Revealed follows the progress scalar (reversible until latched);
//! every later transition is an explicit action. Transitions are returned as
//! values so the owner can route their side effects.

use std::fmt;

use serde::{Deserialize, Serialize};
use stagehand_core::{Error, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Initial,
    Revealed,
    Browsing,
    Reading,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Initial => "initial",
            Stage::Revealed => "revealed",
            Stage::Browsing => "browsing",
            Stage::Reading => "reading",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionCause {
    Progress,
    BrowseToggle,
    Select,
    Back,
    Reset,
    DirectEntry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StageTransition {
    pub from: Stage,
    pub to: Stage,
    pub cause: TransitionCause,
}

#[derive(Debug, Clone)]
pub struct StageMachine {
    stage: Stage,
    /// Set by the first browse action; stops progress from reverting the stage
    latched: bool,
    /// Progress seen by the previous observation
    last_progress: f64,
    reveal_threshold: f64,
    strict: bool,
}

impl StageMachine {
    pub fn new(reveal_threshold: f64, strict: bool) -> Self {
        Self {
            stage: Stage::Initial,
            latched: false,
            last_progress: 0.0,
            reveal_threshold,
            strict,
        }
    }

    #[inline]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    #[inline]
    pub fn is_latched(&self) -> bool {
        self.latched
    }

    fn move_to(&mut self, to: Stage, cause: TransitionCause) -> StageTransition {
        let transition = StageTransition {
            from: self.stage,
            to,
            cause,
        };
        self.stage = to;
        tracing::info!(from = %transition.from, to = %to, cause = ?cause, "Stage transition");
        transition
    }

    fn invalid(&self, action: &str) -> Error {
        Error::InvalidTransition {
            from: self.stage.to_string(),
            action: action.to_string(),
        }
    }

    /// Feed the rendered progress scalar. Initial → Revealed only fires while
    /// progress is rising; falling back across the threshold never reveals.
    pub fn observe_progress(&mut self, progress: f64) -> Option<StageTransition> {
        let forward = progress > self.last_progress;
        self.last_progress = progress;
        match self.stage {
            Stage::Initial if forward && progress >= self.reveal_threshold => {
                Some(self.move_to(Stage::Revealed, TransitionCause::Progress))
            }
            Stage::Revealed if !self.latched && progress < self.reveal_threshold => {
                Some(self.move_to(Stage::Initial, TransitionCause::Progress))
            }
            _ => None,
        }
    }

    /// Browse toggle: Revealed ⇄ Browsing
    pub fn toggle_browse(&mut self) -> Result<StageTransition> {
        match self.stage {
            Stage::Revealed => self.enter_browsing(),
            Stage::Browsing => Ok(self.move_to(Stage::Revealed, TransitionCause::BrowseToggle)),
            _ => Err(self.invalid("toggle browse")),
        }
    }

    /// Revealed → Browsing
    pub fn enter_browsing(&mut self) -> Result<StageTransition> {
        if self.stage != Stage::Revealed {
            return Err(self.invalid("browse"));
        }
        self.latched = true;
        Ok(self.move_to(Stage::Browsing, TransitionCause::BrowseToggle))
    }

    /// Browsing → Reading for the item under the selection
    ///
    /// Without an item this is an invariant violation: an error in strict
    /// mode, otherwise the machine stays in Browsing.
    pub fn select(&mut self, has_item: bool) -> Result<Option<StageTransition>> {
        if self.stage != Stage::Browsing {
            return Err(self.invalid("select an item"));
        }
        if !has_item {
            return self.reading_without_item();
        }
        Ok(Some(self.move_to(Stage::Reading, TransitionCause::Select)))
    }

    fn reading_without_item(&mut self) -> Result<Option<StageTransition>> {
        if self.strict {
            return Err(Error::Invariant(
                "reading requested with no selected item".to_string(),
            ));
        }
        tracing::warn!("Reading requested with no selected item, staying in browsing");
        Ok(None)
    }

    /// Reading → Browsing
    pub fn back(&mut self) -> Result<StageTransition> {
        if self.stage != Stage::Reading {
            return Err(self.invalid("go back"));
        }
        Ok(self.move_to(Stage::Browsing, TransitionCause::Back))
    }

    /// Any stage → Initial, clearing the latch
    pub fn reset(&mut self) -> Option<StageTransition> {
        self.latched = false;
        if self.stage == Stage::Initial {
            return None;
        }
        Some(self.move_to(Stage::Initial, TransitionCause::Reset))
    }

    /// Direct entry into Browsing or Reading, bypassing the progress path.
    ///
    /// Reading is entered through Browsing; both transitions are returned.
    pub fn force(&mut self, target: Stage, has_item: bool) -> Result<Vec<StageTransition>> {
        let mut transitions = Vec::new();
        match target {
            Stage::Initial => transitions.extend(self.reset()),
            Stage::Revealed => {
                if self.stage != Stage::Revealed {
                    transitions.push(self.move_to(Stage::Revealed, TransitionCause::DirectEntry));
                }
            }
            Stage::Browsing | Stage::Reading => {
                if target == Stage::Reading && !has_item && self.strict {
                    return Err(Error::Invariant(
                        "direct entry into reading with no selected item".to_string(),
                    ));
                }
                self.latched = true;
                if self.stage != Stage::Browsing {
                    transitions.push(self.move_to(Stage::Browsing, TransitionCause::DirectEntry));
                }
                if target == Stage::Reading {
                    if has_item {
                        transitions.push(self.move_to(Stage::Reading, TransitionCause::DirectEntry));
                    } else {
                        self.reading_without_item()?;
                    }
                }
            }
        }
        Ok(transitions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine() -> StageMachine {
        StageMachine::new(0.03, false)
    }

    #[test]
    fn test_reveal_is_reversible_until_latched() {
        let mut m = machine();
        assert_eq!(m.observe_progress(0.01), None);
        let t = m.observe_progress(0.05).unwrap();
        assert_eq!((t.from, t.to), (Stage::Initial, Stage::Revealed));

        let back = m.observe_progress(0.02).unwrap();
        assert_eq!(back.to, Stage::Initial);

        m.observe_progress(0.5);
        m.toggle_browse().unwrap();
        m.toggle_browse().unwrap();
        assert_eq!(m.stage(), Stage::Revealed);
        assert!(m.is_latched());
        assert_eq!(m.observe_progress(0.0), None);
        assert_eq!(m.stage(), Stage::Revealed);
    }

    #[test]
    fn test_browse_from_initial_is_rejected() {
        let mut m = machine();
        assert!(matches!(
            m.toggle_browse(),
            Err(Error::InvalidTransition { .. })
        ));
        assert_eq!(m.stage(), Stage::Initial);
        assert!(!m.is_latched());
    }

    #[test]
    fn test_reveal_needs_forward_motion() {
        let mut m = machine();
        m.observe_progress(0.8);
        m.reset();
        assert_eq!(m.stage(), Stage::Initial);

        // Still above the threshold but retreating
        assert_eq!(m.observe_progress(0.6), None);
        assert_eq!(m.observe_progress(0.6), None);
        assert_eq!(m.stage(), Stage::Initial);

        let t = m.observe_progress(0.65).unwrap();
        assert_eq!((t.from, t.to), (Stage::Initial, Stage::Revealed));
    }

    #[test]
    fn test_select_and_back() {
        let mut m = machine();
        m.observe_progress(1.0);
        m.enter_browsing().unwrap();
        let t = m.select(true).unwrap().unwrap();
        assert_eq!(t.to, Stage::Reading);
        // Progress never moves the stage out of reading
        assert_eq!(m.observe_progress(0.0), None);
        assert_eq!(m.back().unwrap().to, Stage::Browsing);
        assert!(m.back().is_err());
    }

    #[test]
    fn test_select_without_item_degrades_or_fails() {
        let mut lenient = machine();
        lenient.observe_progress(1.0);
        lenient.enter_browsing().unwrap();
        assert_eq!(lenient.select(false).unwrap(), None);
        assert_eq!(lenient.stage(), Stage::Browsing);

        let mut strict = StageMachine::new(0.03, true);
        strict.observe_progress(1.0);
        strict.enter_browsing().unwrap();
        assert!(matches!(strict.select(false), Err(Error::Invariant(_))));
        assert_eq!(strict.stage(), Stage::Browsing);
    }

    #[test]
    fn test_select_only_from_browsing() {
        let mut m = machine();
        assert!(m.select(true).is_err());
        assert_eq!(m.stage(), Stage::Initial);
    }

    #[test]
    fn test_reset_clears_latch_from_any_stage() {
        let mut m = machine();
        m.observe_progress(1.0);
        m.enter_browsing().unwrap();
        m.select(true).unwrap();
        let t = m.reset().unwrap();
        assert_eq!((t.from, t.to, t.cause), (Stage::Reading, Stage::Initial, TransitionCause::Reset));
        assert!(!m.is_latched());
        assert_eq!(m.reset(), None);
    }

    #[test]
    fn test_force_reading_passes_through_browsing() {
        let mut m = machine();
        let transitions = m.force(Stage::Reading, true).unwrap();
        let path: Vec<(Stage, Stage)> = transitions.iter().map(|t| (t.from, t.to)).collect();
        assert_eq!(
            path,
            vec![(Stage::Initial, Stage::Browsing), (Stage::Browsing, Stage::Reading)]
        );
        assert!(m.is_latched());
    }

    #[test]
    fn test_force_reading_without_item_degrades_to_browsing() {
        let mut m = machine();
        let transitions = m.force(Stage::Reading, false).unwrap();
        assert_eq!(transitions.len(), 1);
        assert_eq!(m.stage(), Stage::Browsing);
    }
}
