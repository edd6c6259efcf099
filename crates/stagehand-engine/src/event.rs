use std::str::FromStr;

use serde::{Deserialize, Serialize};
use stagehand_core::{ContentId, Error};

use crate::carousel::IndexChange;
use crate::stage::Stage;

/// Raw input from the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputEvent {
    /// Wheel movement; positive deltas scroll down
    Wheel { delta_y: f64 },
    /// A finger went down; interrupts any programmatic snap
    TouchStart { y: f64 },
    /// A completed touch gesture
    TouchSequence {
        start_y: f64,
        move_y: f64,
        end_y: f64,
        elapsed_ms: f64,
    },
}

/// Explicit user actions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    ToggleBrowse,
    /// Enter browsing at a given array position
    BrowseTo { index: usize },
    /// Read the item under the selection
    Select,
    Back,
    Reset,
    /// Pagination control
    SelectIndex { index: usize },
    /// One discrete carousel step (+1 / -1)
    Step { direction: i32 },
    /// Fetch a failed detail again
    Retry,
    /// The presentation finished the transition for this settle token
    TransitionComplete { token: u64 },
    DeepLink { route: String },
}

/// Anything the engine folds before a frame tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EngineEvent {
    Input(InputEvent),
    Action(Action),
}

impl From<InputEvent> for EngineEvent {
    fn from(event: InputEvent) -> Self {
        EngineEvent::Input(event)
    }
}

impl From<Action> for EngineEvent {
    fn from(action: Action) -> Self {
        EngineEvent::Action(action)
    }
}

/// Notifications for observers of the engine, drained by the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineNotice {
    StageChanged { from: Stage, to: Stage },
    IndexChanged(IndexChange),
    ListReady { count: usize },
    ListFailed { error: String },
    DetailReady { id: ContentId },
    DetailFailed { id: ContentId, error: String },
    ChromeVisibility { visible: bool },
}

/// Route-level entry request, `"<id>"`, `"<id>/browse"` or `"<id>/read"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeepLink {
    pub selected_id: ContentId,
    pub force_stage: Stage,
}

impl DeepLink {
    pub fn browse(id: impl Into<ContentId>) -> Self {
        Self {
            selected_id: id.into(),
            force_stage: Stage::Browsing,
        }
    }

    pub fn read(id: impl Into<ContentId>) -> Self {
        Self {
            selected_id: id.into(),
            force_stage: Stage::Reading,
        }
    }
}

impl FromStr for DeepLink {
    type Err = Error;

    fn from_str(route: &str) -> Result<Self, Self::Err> {
        let route = route.trim().trim_matches('/');
        let (id, stage) = match route.split_once('/') {
            Some((id, stage)) => (id, stage),
            None => (route, "browse"),
        };
        let id: u32 = id
            .parse()
            .map_err(|_| Error::Other(format!("invalid deep link id: {:?}", id)))?;
        let force_stage = match stage {
            "browse" => Stage::Browsing,
            "read" => Stage::Reading,
            other => return Err(Error::Other(format!("invalid deep link stage: {:?}", other))),
        };
        Ok(Self {
            selected_id: ContentId(id),
            force_stage,
        })
    }
}
