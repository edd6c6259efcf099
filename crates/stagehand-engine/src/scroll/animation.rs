//! L3 Molecular Layer: Programmatic progress snap
//!
//! Eases the progress scalar to a fixed end value over a fixed duration while
//! holding the shared lock, so user input cannot feed back into the motion.

use std::time::{Duration, Instant};

use super::easing::{EasingType, EasingTypeExt};
use super::timing::{is_complete_at, lerp, progress_at};
use crate::coordinator::{LockCoordinator, LockGuard};

/// One frame of a snap
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapFrame {
    pub value: f64,
    pub finished: bool,
}

/// Active snap animation. Dropping it releases the lock.
#[derive(Debug)]
pub struct SnapAnimation {
    start: Instant,
    from: f64,
    to: f64,
    duration: Duration,
    easing: EasingType,
    guard: LockGuard,
}

impl SnapAnimation {
    /// Start a snap, taking the lock for its lifetime
    pub fn start(
        lock: &LockCoordinator,
        from: f64,
        to: f64,
        duration: Duration,
        easing: EasingType,
        now: Instant,
    ) -> Self {
        Self {
            start: now,
            from,
            to,
            duration,
            easing,
            guard: lock.acquire(),
        }
    }

    #[inline]
    pub fn to(&self) -> f64 {
        self.to
    }

    /// False once a user gesture force-released the lock
    #[inline]
    pub fn is_live(&self) -> bool {
        self.guard.is_held()
    }

    /// Sample the eased value at `now`
    pub fn sample(&self, now: Instant) -> SnapFrame {
        if is_complete_at(self.start, self.duration, now) {
            return SnapFrame {
                value: self.to,
                finished: true,
            };
        }
        let t = progress_at(self.start, self.duration, now);
        SnapFrame {
            value: lerp(self.from, self.to, self.easing.apply(t)),
            finished: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snap_holds_lock_until_dropped() {
        let lock = LockCoordinator::new();
        let now = Instant::now();
        let snap = SnapAnimation::start(
            &lock,
            0.4,
            1.0,
            Duration::from_millis(100),
            EasingType::Linear,
            now,
        );
        assert!(lock.is_locked());
        assert!(snap.is_live());
        drop(snap);
        assert!(!lock.is_locked());
    }

    #[test]
    fn test_snap_samples() {
        let lock = LockCoordinator::new();
        let now = Instant::now();
        let snap = SnapAnimation::start(
            &lock,
            0.0,
            1.0,
            Duration::from_millis(100),
            EasingType::Linear,
            now,
        );
        let first = snap.sample(now);
        assert_eq!(first.value, 0.0);
        assert!(!first.finished);

        let mid = snap.sample(now + Duration::from_millis(50));
        assert!((mid.value - 0.5).abs() < 1e-9);

        let end = snap.sample(now + Duration::from_millis(150));
        assert_eq!(end, SnapFrame { value: 1.0, finished: true });
    }

    #[test]
    fn test_interrupt_kills_snap() {
        let lock = LockCoordinator::new();
        let snap = SnapAnimation::start(
            &lock,
            0.0,
            1.0,
            Duration::from_millis(100),
            EasingType::EaseOut,
            Instant::now(),
        );
        lock.interrupt();
        assert!(!snap.is_live());
    }
}
