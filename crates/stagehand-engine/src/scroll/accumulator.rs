//! L3 Molecular Layer: Input accumulator
//!
//! Folds raw wheel and touch input into a bounded scalar in [0, 100],
//! independent of the page's actual scroll position.

use std::time::Instant;

use serde::Serialize;

use super::config::InputConfig;
use crate::coordinator::LockCoordinator;

/// Direction of the most recent input
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    #[default]
    None,
}

impl Direction {
    /// Positive magnitudes advance (scroll down), negative retreat
    pub fn from_signed(signed: f64) -> Self {
        if signed > 0.0 {
            Direction::Down
        } else if signed < 0.0 {
            Direction::Up
        } else {
            Direction::None
        }
    }

    /// Discrete carousel step for this direction
    pub fn step(self) -> Option<i32> {
        match self {
            Direction::Down => Some(1),
            Direction::Up => Some(-1),
            Direction::None => None,
        }
    }
}

/// Result of folding a touch sequence
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TouchOutcome {
    /// Whether the accumulated value was updated
    pub accumulated: bool,
    /// Direction of a fast flick that should step the carousel immediately
    pub flick: Option<Direction>,
}

/// Direction of a gesture fast and long enough to count as a flick.
///
/// Expects a positive, finite `elapsed_ms`.
pub fn flick_direction(
    start_y: f64,
    end_y: f64,
    elapsed_ms: f64,
    config: &InputConfig,
) -> Option<Direction> {
    let distance = start_y - end_y;
    let speed = distance.abs() / elapsed_ms;
    if speed > config.flick_velocity_threshold && distance.abs() > config.flick_distance_threshold {
        Some(Direction::from_signed(distance))
    } else {
        None
    }
}

#[derive(Debug, Clone)]
pub struct InputAccumulator {
    value: f64,
    direction: Direction,
    /// Units per second between the last two wheel events
    velocity: f64,
    last_event_at: Option<Instant>,
    lock: LockCoordinator,
}

impl InputAccumulator {
    pub const MAX: f64 = 100.0;

    pub fn new(lock: LockCoordinator) -> Self {
        Self {
            value: 0.0,
            direction: Direction::None,
            velocity: 0.0,
            last_event_at: None,
            lock,
        }
    }

    #[inline]
    pub fn value(&self) -> f64 {
        self.value
    }

    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    #[inline]
    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    /// Progress target derived from the accumulated value, in [0, 1]
    #[inline]
    pub fn target(&self) -> f64 {
        self.value / Self::MAX
    }

    /// Apply a signed magnitude. Returns false when the input was dropped.
    pub fn accumulate(&mut self, signed: f64, sensitivity: f64) -> bool {
        if self.lock.is_locked() {
            tracing::trace!(signed, "Input dropped while locked");
            return false;
        }
        let scaled = signed * sensitivity;
        if !scaled.is_finite() || scaled == 0.0 {
            tracing::debug!(signed, sensitivity, "Ignoring degenerate input");
            return false;
        }

        self.value = (self.value + scaled).clamp(0.0, Self::MAX);
        self.direction = Direction::from_signed(scaled);
        true
    }

    /// Fold one wheel event
    pub fn on_wheel(&mut self, delta_y: f64, now: Instant, config: &InputConfig) -> bool {
        let applied = self.accumulate(delta_y, config.wheel_sensitivity);
        if applied {
            if let Some(last) = self.last_event_at {
                let dt = now.saturating_duration_since(last).as_secs_f64();
                if dt > 0.0 {
                    self.velocity = delta_y * config.wheel_sensitivity / dt;
                }
            }
            self.last_event_at = Some(now);
        }
        applied
    }

    /// Fold a completed touch gesture.
    ///
    /// Travel from `start_y` to `move_y` accumulates; travel from `start_y`
    /// to `end_y` over `elapsed_ms` decides whether the gesture was a flick.
    /// Finger movement upwards advances, like a positive wheel delta.
    pub fn on_touch_sequence(
        &mut self,
        start_y: f64,
        move_y: f64,
        end_y: f64,
        elapsed_ms: f64,
        config: &InputConfig,
    ) -> TouchOutcome {
        let coords_finite = start_y.is_finite() && move_y.is_finite() && end_y.is_finite();
        if !coords_finite || !(elapsed_ms > 0.0) || !elapsed_ms.is_finite() {
            tracing::debug!(start_y, move_y, end_y, elapsed_ms, "Ignoring malformed touch sequence");
            return TouchOutcome::default();
        }
        if self.lock.is_locked() {
            tracing::trace!("Touch sequence dropped while locked");
            return TouchOutcome::default();
        }

        let accumulated = self.accumulate(start_y - move_y, config.touch_sensitivity);

        let flick = flick_direction(start_y, end_y, elapsed_ms, config);
        if flick.is_some() {
            self.velocity = (start_y - end_y) * config.touch_sensitivity / (elapsed_ms / 1000.0);
        }

        TouchOutcome { accumulated, flick }
    }

    /// Short-circuit the target to a fraction of the range (programmatic)
    pub fn force_target(&mut self, fraction: f64) {
        self.value = (fraction.clamp(0.0, 1.0)) * Self::MAX;
    }

    pub fn clear(&mut self) {
        self.value = 0.0;
        self.direction = Direction::None;
        self.velocity = 0.0;
        self.last_event_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::time::Duration;

    fn accumulator() -> InputAccumulator {
        InputAccumulator::new(LockCoordinator::new())
    }

    #[test]
    fn test_wheel_notches_clamp_at_full() {
        let config = InputConfig::default();
        let mut acc = accumulator();
        let start = Instant::now();
        for i in 0..10 {
            // Each 100px notch is +12 units
            acc.on_wheel(100.0, start + Duration::from_millis(i * 16), &config);
        }
        assert_eq!(acc.value(), 100.0);
        assert_eq!(acc.target(), 1.0);
        assert_eq!(acc.direction(), Direction::Down);
    }

    #[test]
    fn test_direction_follows_sign() {
        let mut acc = accumulator();
        acc.accumulate(30.0, 1.0);
        assert_eq!(acc.direction(), Direction::Down);
        acc.accumulate(-5.0, 1.0);
        assert_eq!(acc.direction(), Direction::Up);
        assert_eq!(acc.value(), 25.0);
    }

    #[test]
    fn test_noise_is_ignored() {
        let mut acc = accumulator();
        acc.accumulate(10.0, 1.0);
        assert!(!acc.accumulate(0.0, 1.0));
        assert!(!acc.accumulate(f64::NAN, 1.0));
        assert!(!acc.accumulate(f64::INFINITY, 1.0));
        assert_eq!(acc.value(), 10.0);
        assert_eq!(acc.direction(), Direction::Down);
    }

    #[test]
    fn test_locked_input_is_dropped() {
        let lock = LockCoordinator::new();
        let mut acc = InputAccumulator::new(lock.clone());
        let config = InputConfig::default();
        let guard = lock.acquire();
        assert!(!acc.on_wheel(100.0, Instant::now(), &config));
        let outcome = acc.on_touch_sequence(500.0, 300.0, 200.0, 100.0, &config);
        assert_eq!(outcome, TouchOutcome::default());
        assert_eq!(acc.value(), 0.0);
        drop(guard);
        assert!(acc.on_wheel(100.0, Instant::now(), &config));
    }

    #[test]
    fn test_wheel_velocity() {
        let config = InputConfig::default();
        let mut acc = accumulator();
        let start = Instant::now();
        acc.on_wheel(100.0, start, &config);
        acc.on_wheel(100.0, start + Duration::from_millis(100), &config);
        // 12 units over 0.1s
        assert!((acc.velocity() - 120.0).abs() < 1e-6);
    }

    #[test]
    fn test_fast_flick_requests_step() {
        let config = InputConfig::default();
        let mut acc = accumulator();
        // 200px in 100ms = 2 px/ms, well past both thresholds
        let outcome = acc.on_touch_sequence(600.0, 450.0, 400.0, 100.0, &config);
        assert!(outcome.accumulated);
        assert_eq!(outcome.flick, Some(Direction::Down));
        assert!((acc.value() - 150.0 * config.touch_sensitivity).abs() < 1e-9);
    }

    #[test]
    fn test_slow_or_short_drag_is_not_a_flick() {
        let config = InputConfig::default();
        let mut acc = accumulator();
        // Long but slow
        let slow = acc.on_touch_sequence(600.0, 400.0, 400.0, 2000.0, &config);
        assert_eq!(slow.flick, None);
        // Fast but short
        let short = acc.on_touch_sequence(300.0, 280.0, 280.0, 10.0, &config);
        assert_eq!(short.flick, None);
        // Upward flick
        let up = acc.on_touch_sequence(200.0, 350.0, 400.0, 100.0, &config);
        assert_eq!(up.flick, Some(Direction::Up));
    }

    #[test]
    fn test_malformed_touch_is_dropped() {
        let config = InputConfig::default();
        let mut acc = accumulator();
        assert_eq!(
            acc.on_touch_sequence(600.0, 400.0, 400.0, 0.0, &config),
            TouchOutcome::default()
        );
        assert_eq!(
            acc.on_touch_sequence(600.0, f64::NAN, 400.0, 50.0, &config),
            TouchOutcome::default()
        );
        assert_eq!(acc.value(), 0.0);
    }

    #[test]
    fn test_force_and_clear() {
        let mut acc = accumulator();
        acc.force_target(1.0);
        assert_eq!(acc.value(), 100.0);
        acc.clear();
        assert_eq!(acc.value(), 0.0);
        assert_eq!(acc.direction(), Direction::None);
    }

    proptest! {
        #[test]
        fn prop_value_stays_in_range(deltas in proptest::collection::vec(-500.0f64..500.0, 0..200)) {
            let mut acc = accumulator();
            for delta in deltas {
                acc.accumulate(delta, 1.0);
                prop_assert!(acc.value() >= 0.0 && acc.value() <= InputAccumulator::MAX);
            }
        }
    }
}
