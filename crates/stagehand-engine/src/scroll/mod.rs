//! Scroll input and progress pipeline
//!
//! Raw wheel/touch input is folded into a bounded accumulator, whose target is
//! low-pass filtered into the rendered progress scalar once per frame.
//!
//! # Architecture
//!
//! ## L4 Atomic Layer
//! - `easing` - Pure easing functions (cubic, in-out, exponential)
//! - `timing` - Time calculation utilities (progress, interpolation)
//! - `config` - Configuration sections (re-exported from stagehand-core)
//!
//! ## L3 Molecular Layer
//! - `accumulator` - Raw input to bounded scalar with direction and velocity
//! - `smoother` - Per-frame critically damped approach to the target
//! - `animation` - Lock-holding programmatic snap
//!
//! # Usage
//!
//! ```ignore
//! use stagehand_engine::coordinator::LockCoordinator;
//! use stagehand_engine::scroll::{InputAccumulator, ProgressSmoother};
//!
//! let lock = LockCoordinator::new();
//! let mut accumulator = InputAccumulator::new(lock.clone());
//! let mut smoother = ProgressSmoother::new(lock);
//!
//! accumulator.on_wheel(delta_y, now, &config.input);
//! smoother.set_target(accumulator.target());
//! smoother.tick(config.smoothing.smoothing_factor, config.smoothing.epsilon);
//! ```

// L4 Atomic Layer
pub mod config;
pub mod easing;
pub mod timing;

// L3 Molecular Layer
pub mod accumulator;
pub mod animation;
pub mod smoother;

// Re-exports for convenient access
pub use accumulator::{flick_direction, Direction, InputAccumulator, TouchOutcome};
pub use animation::{SnapAnimation, SnapFrame};
pub use config::{CarouselConfigExt, SmoothingConfigExt, StageConfigExt};
pub use easing::{EasingType, EasingTypeExt};
pub use smoother::ProgressSmoother;
