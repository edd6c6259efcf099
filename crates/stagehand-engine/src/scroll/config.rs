//! L4 Atomic Layer: Configuration helpers for the scroll pipeline
//!
//! Re-exports configuration sections from stagehand-core with Duration accessors.

use std::time::Duration;

pub use stagehand_core::config::{CarouselConfig, InputConfig, SmoothingConfig, StageConfig};

use super::timing::frame_interval;

pub trait SmoothingConfigExt {
    /// Interval between animation frames
    fn frame_interval(&self) -> Duration;
}

impl SmoothingConfigExt for SmoothingConfig {
    #[inline]
    fn frame_interval(&self) -> Duration {
        frame_interval(self.animation_fps)
    }
}

pub trait StageConfigExt {
    fn snap_duration(&self) -> Duration;
}

impl StageConfigExt for StageConfig {
    #[inline]
    fn snap_duration(&self) -> Duration {
        Duration::from_millis(self.snap_duration_ms)
    }
}

pub trait CarouselConfigExt {
    /// Debounce window after a discrete index step
    fn settle_duration(&self) -> Duration;
}

impl CarouselConfigExt for CarouselConfig {
    #[inline]
    fn settle_duration(&self) -> Duration {
        Duration::from_millis(self.settle_duration_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_durations() {
        let stage = StageConfig {
            snap_duration_ms: 250,
            ..Default::default()
        };
        assert_eq!(stage.snap_duration(), Duration::from_millis(250));

        let carousel = CarouselConfig::default();
        assert_eq!(carousel.settle_duration(), Duration::from_millis(700));

        let smoothing = SmoothingConfig::default();
        assert_eq!(smoothing.frame_interval(), Duration::from_millis(16));
    }
}
