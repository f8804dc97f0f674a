pub mod posture;
pub mod proximity;
pub mod reactor;

pub use proximity::{Proximity, ProximityMonitor};
pub use reactor::{MotionReactor, MotionState};
