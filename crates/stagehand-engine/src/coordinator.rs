//! Visibility and lock coordination
//!
//! The lock is the one piece of state every stage of the pipeline may touch.
//! Holding it suspends user-driven accumulation and smoothing while a
//! programmatic snap or scroll is in flight.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::scroll::accumulator::Direction;

const UNLOCKED: u64 = 0;

#[derive(Debug, Default)]
struct LockState {
    /// Token of the current holder, or UNLOCKED
    holder: AtomicU64,
    next_token: AtomicU64,
}

/// Shared suspension flag. Clones observe and control the same lock.
#[derive(Debug, Clone, Default)]
pub struct LockCoordinator {
    state: Arc<LockState>,
}

impl LockCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_locked(&self) -> bool {
        self.state.holder.load(Ordering::Acquire) != UNLOCKED
    }

    /// Take the lock until the returned guard is dropped.
    ///
    /// The most recent acquisition wins: an older guard dropping later does
    /// not release a lock it no longer holds.
    pub fn acquire(&self) -> LockGuard {
        let token = self.state.next_token.fetch_add(1, Ordering::AcqRel) + 1;
        self.state.holder.store(token, Ordering::Release);
        tracing::trace!(token, "Lock acquired");
        LockGuard {
            coordinator: self.clone(),
            token,
        }
    }

    /// Run `action` with the lock held; released even if `action` unwinds
    pub fn with_lock<T>(&self, action: impl FnOnce() -> T) -> T {
        let _guard = self.acquire();
        action()
    }

    /// Force release on behalf of a user gesture. Returns whether a lock was held.
    pub fn interrupt(&self) -> bool {
        let previous = self.state.holder.swap(UNLOCKED, Ordering::AcqRel);
        if previous != UNLOCKED {
            tracing::debug!(token = previous, "Lock interrupted");
        }
        previous != UNLOCKED
    }

    fn release(&self, token: u64) -> bool {
        self.state
            .holder
            .compare_exchange(token, UNLOCKED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// Scoped hold on a [`LockCoordinator`]
#[derive(Debug)]
pub struct LockGuard {
    coordinator: LockCoordinator,
    token: u64,
}

impl LockGuard {
    /// Whether this guard still holds the lock (not interrupted or superseded)
    pub fn is_held(&self) -> bool {
        self.coordinator.state.holder.load(Ordering::Acquire) == self.token
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if self.coordinator.release(self.token) {
            tracing::trace!(token = self.token, "Lock released");
        }
    }
}

/// Hide-on-scroll-down / show-on-scroll-up hysteresis for page chrome
#[derive(Debug, Clone)]
pub struct ChromeVisibility {
    visible: bool,
}

impl Default for ChromeVisibility {
    fn default() -> Self {
        Self { visible: true }
    }
}

impl ChromeVisibility {
    #[inline]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Returns true when visibility flipped
    pub fn update(
        &mut self,
        progress: f64,
        direction: Direction,
        hide_threshold: f64,
        show_threshold: f64,
    ) -> bool {
        let next = match (self.visible, direction) {
            (true, Direction::Down) if progress >= hide_threshold => false,
            (false, Direction::Up) if progress <= show_threshold => true,
            _ => self.visible,
        };
        let changed = next != self.visible;
        self.visible = next;
        changed
    }

    pub fn reset(&mut self) {
        self.visible = true;
    }
}
