//! L3 Molecular Layer: Progress smoother
//!
//! Low-pass filters the accumulator target into the rendered progress scalar.
//! Raw wheel deltas arrive in bursts; rendering the target directly jitters.

use crate::coordinator::LockCoordinator;

#[derive(Debug, Clone)]
pub struct ProgressSmoother {
    rendered: f64,
    target: f64,
    lock: LockCoordinator,
}

impl ProgressSmoother {
    pub fn new(lock: LockCoordinator) -> Self {
        Self {
            rendered: 0.0,
            target: 0.0,
            lock,
        }
    }

    /// The rendered progress scalar
    #[inline]
    pub fn progress(&self) -> f64 {
        self.rendered
    }

    #[inline]
    pub fn target(&self) -> f64 {
        self.target
    }

    #[inline]
    pub fn is_settled(&self) -> bool {
        self.rendered == self.target
    }

    pub fn set_target(&mut self, target: f64) {
        if target.is_finite() {
            self.target = target.clamp(0.0, 1.0);
        }
    }

    /// Advance one frame. No-op while locked. Returns whether the value moved.
    ///
    /// Snaps onto the target once within `epsilon`, so a fixed target is
    /// reached exactly in a bounded number of frames.
    pub fn tick(&mut self, smoothing_factor: f64, epsilon: f64) -> bool {
        if self.lock.is_locked() || self.is_settled() {
            return false;
        }

        let remaining = self.target - self.rendered;
        if remaining.abs() < epsilon {
            self.rendered = self.target;
        } else {
            self.rendered += remaining * smoothing_factor.clamp(f64::EPSILON, 1.0);
        }
        true
    }

    /// Set the rendered value from a programmatic animation, leaving the target
    pub fn drive(&mut self, value: f64) {
        if value.is_finite() {
            self.rendered = value.clamp(0.0, 1.0);
        }
    }

    /// Move both rendered value and target at once
    pub fn jump(&mut self, value: f64) {
        self.set_target(value);
        self.rendered = self.target;
    }
}
