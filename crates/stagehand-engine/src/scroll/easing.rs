//! L4 Atomic Layer: Pure easing functions
//!
//! Maps a normalized progress value in [0, 1] onto an eased value in [0, 1].

pub use stagehand_core::EasingType;

pub trait EasingTypeExt {
    /// Eased value for `t`; input outside [0, 1] is clamped first
    fn apply(&self, t: f64) -> f64;
}

impl EasingTypeExt for EasingType {
    #[inline]
    fn apply(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            EasingType::Linear => t,
            EasingType::Cubic => 1.0 - (1.0 - t).powi(3),
            EasingType::EaseInOut => {
                if t < 0.5 {
                    4.0 * t.powi(3)
                } else {
                    1.0 - (2.0 - 2.0 * t).powi(3) / 2.0
                }
            }
            EasingType::EaseOut => ease_out_expo(t),
        }
    }
}

/// 1 - 2^(-10t), pinned to exactly 1 at the end
#[inline]
pub fn ease_out_expo(t: f64) -> f64 {
    if t >= 1.0 {
        1.0
    } else {
        1.0 - 2.0_f64.powf(-10.0 * t)
    }
}
