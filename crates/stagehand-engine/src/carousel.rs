//! Carousel selection index engine
//!
//! Keeps the active array position, a five-wide window around it, and a
//! settle guard that collapses a burst of directional input into one step.

use std::time::{Duration, Instant};

use serde::Serialize;
use stagehand_core::{ContentId, ContentItem};

/// Items rendered on each side of the active one
pub const WINDOW_RADIUS: usize = 2;

/// Relative position of `index` to `active`, or None when outside the window
pub fn window_position(index: usize, active: usize) -> Option<i8> {
    let offset = index as i64 - active as i64;
    if offset.unsigned_abs() as usize > WINDOW_RADIUS {
        None
    } else {
        Some(offset as i8)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowSlot {
    pub index: usize,
    pub position: i8,
    pub id: ContentId,
}

/// A committed change of the active index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexChange {
    pub from: usize,
    pub to: usize,
    pub id: ContentId,
    /// Settle token; `None` for direct selections, which arm no debounce
    pub token: Option<u64>,
}

#[derive(Debug, Clone, Copy)]
struct Settle {
    token: u64,
    until: Instant,
}

#[derive(Debug, Clone, Default)]
pub struct Carousel {
    items: Vec<ContentItem>,
    active: usize,
    engaged: bool,
    in_flight: Option<Settle>,
    next_token: u64,
}

impl Carousel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the item list, keeping the active index in range
    pub fn set_items(&mut self, items: Vec<ContentItem>) {
        self.items = items;
        self.active = self.active.min(self.items.len().saturating_sub(1));
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[ContentItem] {
        &self.items
    }

    /// Active array position; None for an empty list
    pub fn active_index(&self) -> Option<usize> {
        (!self.items.is_empty()).then_some(self.active)
    }

    pub fn active_item(&self) -> Option<&ContentItem> {
        self.items.get(self.active)
    }

    pub fn position_of(&self, id: ContentId) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }

    #[inline]
    pub fn is_engaged(&self) -> bool {
        self.engaged
    }

    pub fn engage(&mut self) {
        self.engaged = true;
    }

    pub fn disengage(&mut self) {
        self.engaged = false;
        self.in_flight = None;
    }

    #[inline]
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Step one position. Dropped while a transition is settling or at the ends.
    pub fn change_index(
        &mut self,
        direction: i32,
        now: Instant,
        settle: Duration,
    ) -> Option<IndexChange> {
        if !self.engaged || direction == 0 {
            return None;
        }
        if let Some(settle) = self.in_flight {
            if now < settle.until {
                tracing::trace!(direction, "Index step collapsed into in-flight transition");
                return None;
            }
        }
        let next = self.active as i64 + direction.signum() as i64;
        if next < 0 || next >= self.items.len() as i64 {
            return None;
        }

        self.next_token += 1;
        let token = self.next_token;
        self.in_flight = Some(Settle {
            token,
            until: now + settle,
        });
        self.commit(next as usize, Some(token))
    }

    /// Jump to a position chosen directly (pagination). Out-of-range input is
    /// clamped. Refused while a step is settling; arms no debounce itself.
    /// A guard whose deadline has passed counts as clear even before
    /// [`Carousel::settle`] runs.
    pub fn select_index(&mut self, index: usize, now: Instant) -> Option<IndexChange> {
        if !self.engaged || self.items.is_empty() {
            return None;
        }
        if let Some(settle) = self.in_flight {
            if now < settle.until {
                tracing::trace!(index, "Direct selection refused during transition");
                return None;
            }
            self.in_flight = None;
        }
        let index = index.min(self.items.len() - 1);
        if index == self.active {
            return None;
        }
        self.commit(index, None)
    }

    /// Forced placement for direct entry; clears any settle guard
    pub fn jump_to(&mut self, index: usize) -> Option<IndexChange> {
        self.in_flight = None;
        if self.items.is_empty() {
            return None;
        }
        let index = index.min(self.items.len() - 1);
        if index == self.active {
            return None;
        }
        self.commit(index, None)
    }

    fn commit(&mut self, to: usize, token: Option<u64>) -> Option<IndexChange> {
        let from = self.active;
        self.active = to;
        let id = self.items[to].id;
        tracing::debug!(from, to, id = %id, "Active index changed");
        Some(IndexChange { from, to, id, token })
    }

    /// Clear the settle guard once its deadline has passed
    pub fn settle(&mut self, now: Instant) -> bool {
        match self.in_flight {
            Some(settle) if now >= settle.until => {
                self.in_flight = None;
                true
            }
            _ => false,
        }
    }

    /// Clear the settle guard early when the presentation reports the
    /// transition for `token` finished. Stale tokens are ignored.
    pub fn complete_transition(&mut self, token: u64) -> bool {
        match self.in_flight {
            Some(settle) if settle.token == token => {
                self.in_flight = None;
                true
            }
            _ => false,
        }
    }

    /// Items within the window, each tagged with its relative position
    pub fn window(&self) -> Vec<WindowSlot> {
        if self.items.is_empty() {
            return Vec::new();
        }
        let first = self.active.saturating_sub(WINDOW_RADIUS);
        let last = (self.active + WINDOW_RADIUS).min(self.items.len() - 1);
        (first..=last)
            .filter_map(|index| {
                window_position(index, self.active).map(|position| WindowSlot {
                    index,
                    position,
                    id: self.items[index].id,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SETTLE: Duration = Duration::from_millis(700);

    fn items(count: u32) -> Vec<ContentItem> {
        (0..count)
            .map(|i| {
                let number = 100 - i;
                ContentItem {
                    id: ContentId(number),
                    number,
                    title: format!("Issue {}", number),
                    subtitle: None,
                    cover_url: None,
                    published_at: None,
                    detail: None,
                }
            })
            .collect()
    }

    fn carousel(count: u32) -> Carousel {
        let mut c = Carousel::new();
        c.set_items(items(count));
        c.engage();
        c
    }

    #[test]
    fn test_lower_bound_is_a_noop() {
        let mut c = carousel(3);
        assert_eq!(c.change_index(-1, Instant::now(), SETTLE), None);
        assert_eq!(c.active_index(), Some(0));
        assert!(!c.is_in_flight());
    }

    #[test]
    fn test_burst_collapses_to_one_step() {
        let mut c = carousel(5);
        let now = Instant::now();
        let change = c.change_index(1, now, SETTLE).unwrap();
        assert_eq!((change.from, change.to), (0, 1));
        assert!(change.token.is_some());
        for i in 1..30 {
            assert_eq!(c.change_index(1, now + Duration::from_millis(i * 10), SETTLE), None);
        }
        assert_eq!(c.active_index(), Some(1));

        assert!(!c.settle(now + Duration::from_millis(699)));
        assert!(c.settle(now + SETTLE));
        assert!(c.change_index(1, now + SETTLE, SETTLE).is_some());
        assert_eq!(c.active_index(), Some(2));
    }

    #[test]
    fn test_completion_token_clears_guard_early() {
        let mut c = carousel(5);
        let now = Instant::now();
        let first = c.change_index(1, now, SETTLE).unwrap();
        assert!(!c.complete_transition(first.token.unwrap() + 1));
        assert!(c.is_in_flight());
        assert!(c.complete_transition(first.token.unwrap()));
        let second = c.change_index(1, now, SETTLE).unwrap();
        // The old token cannot clear the new transition
        assert!(!c.complete_transition(first.token.unwrap()));
        assert!(c.complete_transition(second.token.unwrap()));
    }

    #[test]
    fn test_direct_selection_clamps_and_respects_guard() {
        let mut c = carousel(4);
        let now = Instant::now();
        let change = c.select_index(99, now).unwrap();
        assert_eq!(change.to, 3);
        assert_eq!(change.token, None);
        assert!(!c.is_in_flight());

        // Consecutive direct selections are each honoured
        assert_eq!(c.select_index(1, now).unwrap().to, 1);

        c.change_index(1, now, SETTLE);
        assert_eq!(c.select_index(0, now), None);
        assert_eq!(c.active_index(), Some(2));
    }

    #[test]
    fn test_direct_selection_after_deadline_before_settle() {
        let mut c = carousel(6);
        let start = Instant::now();
        c.change_index(1, start, SETTLE);

        // Deadline passed but settle() has not been called yet this frame
        let later = start + SETTLE + Duration::from_millis(10);
        assert!(c.is_in_flight());
        assert_eq!(c.select_index(4, later).unwrap().to, 4);
        assert!(!c.is_in_flight());
        assert!(!c.settle(later));

        // Exactly at the deadline counts as expired too
        c.change_index(-1, later, SETTLE);
        assert_eq!(c.select_index(0, later + SETTLE).unwrap().to, 0);
    }

    #[test]
    fn test_disengaged_carousel_ignores_input() {
        let mut c = carousel(4);
        c.disengage();
        assert_eq!(c.change_index(1, Instant::now(), SETTLE), None);
        assert_eq!(c.select_index(2, Instant::now()), None);
        assert_eq!(c.jump_to(2).unwrap().to, 2);
    }

    #[test]
    fn test_window_positions() {
        let mut c = carousel(10);
        c.jump_to(5);
        let window = c.window();
        let positions: Vec<i8> = window.iter().map(|s| s.position).collect();
        assert_eq!(positions, vec![-2, -1, 0, 1, 2]);
        assert_eq!(window[2].index, 5);
        assert_eq!(window[2].id, ContentId(95));

        c.jump_to(0);
        let positions: Vec<i8> = c.window().iter().map(|s| s.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);

        c.jump_to(9);
        let positions: Vec<i8> = c.window().iter().map(|s| s.position).collect();
        assert_eq!(positions, vec![-2, -1, 0]);
    }

    #[test]
    fn test_window_edge_cases() {
        assert!(Carousel::new().window().is_empty());
        let c = carousel(1);
        assert_eq!(c.window().len(), 1);
        assert_eq!(window_position(7, 4), None);
        assert_eq!(window_position(2, 4), Some(-2));
    }

    #[test]
    fn test_set_items_clamps_active() {
        let mut c = carousel(10);
        c.jump_to(8);
        c.set_items(items(3));
        assert_eq!(c.active_index(), Some(2));
        c.set_items(Vec::new());
        assert_eq!(c.active_index(), None);
    }

    proptest! {
        #[test]
        fn prop_index_stays_in_bounds(
            len in 1u32..12,
            steps in proptest::collection::vec(prop_oneof![Just(-1i32), Just(1i32)], 0..60),
        ) {
            let mut c = carousel(len);
            let start = Instant::now();
            for (i, step) in steps.into_iter().enumerate() {
                let now = start + SETTLE * i as u32;
                c.settle(now);
                c.change_index(step, now, SETTLE);
                let active = c.active_index().unwrap();
                prop_assert!(active < len as usize);
                let centered = c.window().iter().filter(|s| s.position == 0).count();
                prop_assert_eq!(centered, 1);
            }
        }
    }
}
