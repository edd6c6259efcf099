use crate::scroll::Direction;
use crate::stage::Stage;

/// Which sub-engine consumes directional input in a stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputRoute {
    /// Feed the accumulator (hero / reveal path)
    Accumulate,
    /// Discrete carousel steps
    Carousel,
    /// The reading view scrolls natively
    Ignore,
}

pub fn route_for(stage: Stage) -> InputRoute {
    match stage {
        Stage::Initial | Stage::Revealed => InputRoute::Accumulate,
        Stage::Browsing => InputRoute::Carousel,
        Stage::Reading => InputRoute::Ignore,
    }
}

/// Carousel step for a wheel delta, ignoring zero and non-finite noise
pub fn wheel_step(delta_y: f64) -> Option<i32> {
    if !delta_y.is_finite() {
        return None;
    }
    Direction::from_signed(delta_y).step()
}
