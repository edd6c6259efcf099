//! Engine coordinator
//!
//! Owns every sub-engine and the shared lock. All mutation goes through
//! `&mut self`, so a caller observing the engine between calls never sees a
//! half-applied transition.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use stagehand_core::content::{DetailState, ListState, LoadEvent, RequestOutcome};
use stagehand_core::{AppConfig, ContentId, ContentItem, ContentLoader, ContentSource, Result};

use crate::carousel::{Carousel, IndexChange, WindowSlot};
use crate::coordinator::{ChromeVisibility, LockCoordinator};
use crate::derive::{DerivationTable, DerivedParameters};
use crate::event::{Action, DeepLink, EngineEvent, EngineNotice, InputEvent};
use crate::input::{route_for, wheel_step, InputRoute};
use crate::scroll::{
    flick_direction, CarouselConfigExt, Direction, InputAccumulator, ProgressSmoother,
    SnapAnimation, StageConfigExt,
};
use crate::stage::{Stage, StageMachine, StageTransition};

/// What the reading view should show
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DetailView {
    /// Not in the reading stage
    Hidden,
    Loading { id: ContentId },
    Ready { item: ContentItem },
    Failed { id: ContentId, error: String },
}

/// Per-id load status for render outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStatus {
    Idle,
    Loading,
    Ready,
    Failed,
}

/// Everything the presentation layer needs to render one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineSnapshot {
    pub stage: Stage,
    pub accumulated: f64,
    pub progress: f64,
    pub target: f64,
    pub direction: Direction,
    pub derived: DerivedParameters,
    pub active_index: Option<usize>,
    pub active_id: Option<ContentId>,
    pub window: Vec<WindowSlot>,
    pub transition_in_flight: bool,
    pub detail: DetailView,
    pub chrome_visible: bool,
    pub locked: bool,
}

#[derive(Debug)]
pub struct Engine {
    config: Arc<AppConfig>,
    lock: LockCoordinator,
    accumulator: InputAccumulator,
    smoother: ProgressSmoother,
    snap: Option<SnapAnimation>,
    stage: StageMachine,
    carousel: Carousel,
    chrome: ChromeVisibility,
    loader: ContentLoader,
    table: DerivationTable,
    /// Direct entry waiting for the listing
    pending_link: Option<DeepLink>,
    notices: Vec<EngineNotice>,
}

impl Engine {
    pub fn new(config: Arc<AppConfig>, source: Arc<dyn ContentSource>) -> Result<Self> {
        config.validate()?;
        let lock = LockCoordinator::new();
        Ok(Self {
            accumulator: InputAccumulator::new(lock.clone()),
            smoother: ProgressSmoother::new(lock.clone()),
            snap: None,
            stage: StageMachine::new(
                config.stage.reveal_threshold,
                config.general.strict_invariants,
            ),
            carousel: Carousel::new(),
            chrome: ChromeVisibility::default(),
            loader: ContentLoader::new(source),
            table: DerivationTable::from_config(&config.derivation),
            pending_link: None,
            notices: Vec::new(),
            lock,
            config,
        })
    }

    /// Start fetching the listing. Outside a tokio runtime the fetch is
    /// reported as failed on the next frame.
    pub fn mount(&mut self) {
        if self.loader.request_list() {
            tracing::debug!("Listing requested");
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn lock(&self) -> &LockCoordinator {
        &self.lock
    }

    #[inline]
    pub fn stage(&self) -> Stage {
        self.stage.stage()
    }

    #[inline]
    pub fn progress(&self) -> f64 {
        self.smoother.progress()
    }

    #[inline]
    pub fn accumulated(&self) -> f64 {
        self.accumulator.value()
    }

    pub fn carousel(&self) -> &Carousel {
        &self.carousel
    }

    pub fn loader(&self) -> &ContentLoader {
        &self.loader
    }

    pub fn is_animating(&self) -> bool {
        self.snap.is_some()
    }

    /// Take the notices queued since the last call
    pub fn drain_notices(&mut self) -> Vec<EngineNotice> {
        std::mem::take(&mut self.notices)
    }

    /// Fold `events`, then advance one frame and report the result.
    ///
    /// Rejected actions are logged and skipped; use [`Engine::apply`] to
    /// observe the error directly.
    pub fn frame<I>(&mut self, now: Instant, events: I) -> EngineSnapshot
    where
        I: IntoIterator<Item = EngineEvent>,
    {
        for event in events {
            self.dispatch(event, now);
        }
        self.pump(now);
        self.snapshot()
    }

    pub fn dispatch(&mut self, event: EngineEvent, now: Instant) {
        match event {
            EngineEvent::Input(input) => self.handle_input(input, now),
            EngineEvent::Action(action) => {
                if let Err(e) = self.apply(action, now) {
                    tracing::warn!(error = %e, "Action rejected");
                }
            }
        }
    }

    pub fn handle_input(&mut self, event: InputEvent, now: Instant) {
        if let InputEvent::TouchStart { .. } = event {
            self.interrupt();
            return;
        }
        if self.lock.is_locked() {
            tracing::trace!(?event, "Input dropped while locked");
            return;
        }

        let route = route_for(self.stage.stage());
        match (event, route) {
            (_, InputRoute::Ignore) => {}
            (InputEvent::Wheel { delta_y }, InputRoute::Accumulate) => {
                if self.accumulator.on_wheel(delta_y, now, &self.config.input) {
                    self.smoother.set_target(self.accumulator.target());
                }
            }
            (InputEvent::Wheel { delta_y }, InputRoute::Carousel) => {
                if let Some(direction) = wheel_step(delta_y) {
                    self.step(direction, now);
                }
            }
            (
                InputEvent::TouchSequence {
                    start_y,
                    move_y,
                    end_y,
                    elapsed_ms,
                },
                InputRoute::Accumulate,
            ) => {
                let outcome = self.accumulator.on_touch_sequence(
                    start_y,
                    move_y,
                    end_y,
                    elapsed_ms,
                    &self.config.input,
                );
                if outcome.accumulated {
                    self.smoother.set_target(self.accumulator.target());
                }
            }
            (
                InputEvent::TouchSequence {
                    start_y,
                    end_y,
                    elapsed_ms,
                    ..
                },
                InputRoute::Carousel,
            ) => {
                if !(elapsed_ms > 0.0 && elapsed_ms.is_finite()) {
                    return;
                }
                let flick = flick_direction(start_y, end_y, elapsed_ms, &self.config.input);
                if let Some(direction) = flick.and_then(Direction::step) {
                    self.step(direction, now);
                }
            }
            (InputEvent::TouchStart { .. }, _) => {}
        }
    }

    /// Release the lock on behalf of a user gesture, abandoning any snap
    pub fn interrupt(&mut self) -> bool {
        let interrupted = self.lock.interrupt();
        if self.snap.take().is_some() {
            tracing::debug!(progress = self.smoother.progress(), "Snap interrupted");
        }
        interrupted
    }

    pub fn apply(&mut self, action: Action, now: Instant) -> Result<()> {
        match action {
            Action::ToggleBrowse => self.toggle_browse(now),
            Action::BrowseTo { index } => self.browse_to(Some(index), now),
            Action::Select => self.select_current(),
            Action::Back => self.back(),
            Action::Reset => {
                self.reset();
                Ok(())
            }
            Action::SelectIndex { index } => {
                self.select_index(index, now);
                Ok(())
            }
            Action::Step { direction } => {
                self.step(direction, now);
                Ok(())
            }
            Action::Retry => {
                self.retry();
                Ok(())
            }
            Action::TransitionComplete { token } => {
                self.carousel.complete_transition(token);
                Ok(())
            }
            Action::DeepLink { route } => self.direct_entry(route.parse()?),
        }
    }

    /// Revealed → Browsing, or Browsing → Revealed
    pub fn toggle_browse(&mut self, now: Instant) -> Result<()> {
        match self.stage.stage() {
            Stage::Browsing => {
                let transition = self.stage.toggle_browse()?;
                self.route_transition(transition);
                Ok(())
            }
            _ => self.browse_to(None, now),
        }
    }

    /// Enter browsing at `index` (the most recent item when `None`), snapping
    /// progress to full under the lock.
    pub fn browse_to(&mut self, index: Option<usize>, now: Instant) -> Result<()> {
        let transition = self.stage.enter_browsing()?;
        self.route_transition(transition);
        if let Some(change) = self.carousel.jump_to(index.unwrap_or(0)) {
            self.on_index_changed(change);
        }

        self.accumulator.force_target(1.0);
        let from = self.smoother.progress();
        self.smoother.set_target(1.0);
        if from < 1.0 {
            self.snap = Some(SnapAnimation::start(
                &self.lock,
                from,
                1.0,
                self.config.stage.snap_duration(),
                self.config.stage.snap_easing,
                now,
            ));
        }
        Ok(())
    }

    /// Browsing → Reading for the active item
    pub fn select_current(&mut self) -> Result<()> {
        let has_item = self.carousel.active_item().is_some();
        if let Some(transition) = self.stage.select(has_item)? {
            self.route_transition(transition);
        }
        Ok(())
    }

    /// Reading → Browsing
    pub fn back(&mut self) -> Result<()> {
        let transition = self.stage.back()?;
        self.route_transition(transition);
        Ok(())
    }

    /// Return to the initial stage: accumulated value, progress, stage, latch,
    /// carousel engagement and chrome all reset together.
    pub fn reset(&mut self) {
        self.interrupt();
        self.pending_link = None;
        self.accumulator.clear();
        self.smoother.jump(0.0);
        match self.stage.reset() {
            Some(transition) => self.route_transition(transition),
            None => self.carousel.disengage(),
        }
        if !self.chrome.is_visible() {
            self.chrome.reset();
            self.notices.push(EngineNotice::ChromeVisibility { visible: true });
        }
    }

    /// Pagination: jump straight to `index` (clamped)
    pub fn select_index(&mut self, index: usize, now: Instant) -> bool {
        match self.carousel.select_index(index, now) {
            Some(change) => {
                self.on_index_changed(change);
                true
            }
            None => false,
        }
    }

    /// One discrete carousel step, collapsed while a transition settles
    pub fn step(&mut self, direction: i32, now: Instant) -> bool {
        let settle = self.config.carousel.settle_duration();
        match self.carousel.change_index(direction, now, settle) {
            Some(change) => {
                self.on_index_changed(change);
                true
            }
            None => false,
        }
    }

    /// Retry whatever failed: the listing, or the detail being read
    pub fn retry(&mut self) -> Option<RequestOutcome> {
        if self.loader.retry_list() {
            tracing::info!("Retrying listing");
            return None;
        }
        self.retry_detail()
    }

    /// Re-request the active item's detail when reading. Only a failed
    /// detail starts a new fetch.
    pub fn retry_detail(&mut self) -> Option<RequestOutcome> {
        if self.stage.stage() != Stage::Reading {
            return None;
        }
        let id = self.carousel.active_item()?.id;
        Some(self.loader.request_detail(id))
    }

    /// Enter Browsing or Reading directly from a route. Parked until the
    /// listing arrives when called before it.
    pub fn direct_entry(&mut self, link: DeepLink) -> Result<()> {
        if self.loader.listing().is_none() {
            tracing::debug!(id = %link.selected_id, stage = %link.force_stage, "Direct entry waiting for listing");
            self.pending_link = Some(link);
            self.mount();
            return Ok(());
        }
        self.apply_link(link)
    }

    fn apply_link(&mut self, link: DeepLink) -> Result<()> {
        let index = match self.carousel.position_of(link.selected_id) {
            Some(index) => Some(index),
            None if self.carousel.is_empty() => None,
            None => {
                tracing::warn!(id = %link.selected_id, "Unknown id in direct entry, using most recent");
                Some(0)
            }
        };

        let transitions = self.stage.force(link.force_stage, index.is_some())?;

        self.interrupt();
        let engaged = matches!(self.stage.stage(), Stage::Browsing | Stage::Reading);
        if engaged {
            self.accumulator.force_target(1.0);
            self.smoother.jump(1.0);
            self.carousel.engage();
            if let Some(change) = index.and_then(|i| self.carousel.jump_to(i)) {
                self.on_index_changed(change);
            }
        }
        for transition in transitions {
            self.route_transition(transition);
        }
        Ok(())
    }

    /// Wait for the next finished fetch and apply it
    pub async fn wait_for_content(&mut self) -> bool {
        match self.loader.next_event().await {
            Some(event) => {
                self.on_load_event(event);
                true
            }
            None => false,
        }
    }

    /// Advance one frame without new input
    pub fn pump(&mut self, now: Instant) {
        for event in self.loader.drain() {
            self.on_load_event(event);
        }
        self.carousel.settle(now);
        self.advance_progress(now);

        if let Some(transition) = self.stage.observe_progress(self.smoother.progress()) {
            self.route_transition(transition);
        }

        let stage_config = &self.config.stage;
        if self.chrome.update(
            self.smoother.progress(),
            self.accumulator.direction(),
            stage_config.chrome_hide_threshold,
            stage_config.chrome_show_threshold,
        ) {
            self.notices.push(EngineNotice::ChromeVisibility {
                visible: self.chrome.is_visible(),
            });
        }
    }

    fn advance_progress(&mut self, now: Instant) {
        let sampled = self
            .snap
            .as_ref()
            .map(|snap| (snap.is_live(), snap.sample(now), snap.to()));
        match sampled {
            Some((false, _, _)) => {
                self.snap = None;
            }
            Some((true, frame, to)) => {
                self.smoother.drive(frame.value);
                if frame.finished {
                    self.smoother.jump(to);
                    self.snap = None;
                    tracing::debug!(progress = to, "Snap finished");
                }
                return;
            }
            None => {}
        }
        let smoothing = &self.config.smoothing;
        self.smoother
            .tick(smoothing.smoothing_factor, smoothing.epsilon);
    }

    fn route_transition(&mut self, transition: StageTransition) {
        self.notices.push(EngineNotice::StageChanged {
            from: transition.from,
            to: transition.to,
        });
        match transition.to {
            Stage::Browsing => self.carousel.engage(),
            Stage::Reading => {
                self.carousel.engage();
                if let Some(id) = self.carousel.active_item().map(|item| item.id) {
                    self.loader.request_detail(id);
                }
            }
            Stage::Initial | Stage::Revealed => self.carousel.disengage(),
        }
    }

    fn on_index_changed(&mut self, change: IndexChange) {
        self.notices.push(EngineNotice::IndexChanged(change));
        if self.stage.stage() == Stage::Reading || self.config.carousel.prefetch_on_index_change {
            self.loader.request_detail(change.id);
        }
    }

    fn on_load_event(&mut self, event: LoadEvent) {
        match event {
            LoadEvent::ListReady(count) => {
                let items = self.loader.listing().map(<[ContentItem]>::to_vec).unwrap_or_default();
                self.carousel.set_items(items);
                self.notices.push(EngineNotice::ListReady { count });
                if let Some(link) = self.pending_link.take() {
                    if let Err(e) = self.apply_link(link) {
                        tracing::warn!(error = %e, "Direct entry failed");
                    }
                }
            }
            LoadEvent::ListFailed(error) => {
                self.notices.push(EngineNotice::ListFailed { error });
            }
            LoadEvent::DetailReady(id) => {
                if self.is_reading(id) {
                    self.notices.push(EngineNotice::DetailReady { id });
                } else {
                    tracing::debug!(id = %id, "Cached detail for inactive item");
                }
            }
            LoadEvent::DetailFailed(id, error) => {
                if self.is_reading(id) {
                    self.notices.push(EngineNotice::DetailFailed { id, error });
                } else {
                    tracing::debug!(id = %id, error = %error, "Detail failed for inactive item");
                }
            }
        }
    }

    fn is_reading(&self, id: ContentId) -> bool {
        self.stage.stage() == Stage::Reading && self.active_id() == Some(id)
    }

    fn active_id(&self) -> Option<ContentId> {
        self.carousel.active_item().map(|item| item.id)
    }

    pub fn load_status(&self, id: ContentId) -> LoadStatus {
        match self.loader.detail_state(id) {
            None => LoadStatus::Idle,
            Some(DetailState::Pending) => LoadStatus::Loading,
            Some(DetailState::Ready(_)) => LoadStatus::Ready,
            Some(DetailState::Failed(_)) => LoadStatus::Failed,
        }
    }

    pub fn is_list_loading(&self) -> bool {
        matches!(self.loader.list_state(), ListState::Pending)
    }

    fn detail_view(&self) -> DetailView {
        if self.stage.stage() != Stage::Reading {
            return DetailView::Hidden;
        }
        let Some(id) = self.active_id() else {
            return DetailView::Hidden;
        };
        match self.loader.detail_state(id) {
            Some(DetailState::Ready(item)) => DetailView::Ready { item: item.clone() },
            Some(DetailState::Failed(error)) => DetailView::Failed {
                id,
                error: error.clone(),
            },
            Some(DetailState::Pending) | None => DetailView::Loading { id },
        }
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        let progress = self.smoother.progress();
        EngineSnapshot {
            stage: self.stage.stage(),
            accumulated: self.accumulator.value(),
            progress,
            target: self.smoother.target(),
            direction: self.accumulator.direction(),
            derived: self.table.derive_all(progress),
            active_index: self.carousel.active_index(),
            active_id: self.active_id(),
            window: self.carousel.window(),
            transition_in_flight: self.carousel.is_in_flight(),
            detail: self.detail_view(),
            chrome_visible: self.chrome.is_visible(),
            locked: self.lock.is_locked(),
        }
    }
}
