pub mod drivers;
pub mod kernel;
pub mod motion;
pub mod vision;

pub use kernel::config::ReflexConfig;
pub use kernel::controller::{Capabilities, Controller, Drivers};
