//! Collaborator contracts for the robot hardware.
//!
//! The controller never talks to hardware directly. Every actuator, sensor and
//! outbound channel sits behind one of these traits so a session can run on
//! real drivers or on the in-process doubles in [`sim`].

pub mod error;
pub mod sim;

use async_trait::async_trait;
use image::DynamicImage;
use tracing::warn;

pub use error::DriverError;

/// A captured camera image. Consumed within one perception cycle.
pub type Frame = DynamicImage;

/// Largest distance from the hip a foot can reach, in millimeters.
pub const LEG_REACH_MM: f64 = 180.0;

/// Foot target in leg-local coordinates (millimeters).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegPosition {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl LegPosition {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    fn reach(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn is_valid(&self) -> bool {
        self.reach() <= LEG_REACH_MM
    }

    /// Pull an unreachable target back onto the reach envelope, keeping its direction.
    pub fn fit(self) -> Self {
        let reach = self.reach();
        if reach <= LEG_REACH_MM {
            return self;
        }
        let scale = LEG_REACH_MM / reach;
        Self::new(self.x * scale, self.y * scale, self.z * scale)
    }
}

/// Bounding box of one detected face, in frame pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Leg, joint and walking primitives of the body.
///
/// Commands are assumed idempotent and last-write-wins; two reactors may issue
/// them concurrently without coordination.
#[async_trait]
pub trait Locomotion: Send + Sync {
    async fn start(&self) -> Result<(), DriverError>;
    async fn close(&self) -> Result<(), DriverError>;
    async fn stand(&self) -> Result<(), DriverError>;
    async fn move_head(&self, heading: f64, duration_ms: u64) -> Result<(), DriverError>;
    async fn walk_continuously(&self, heading: f64, speed: f64) -> Result<(), DriverError>;
    async fn stop_walking_continuously(&self) -> Result<(), DriverError>;
    async fn relax_legs(&self) -> Result<(), DriverError>;
    async fn relax(&self) -> Result<(), DriverError>;
    async fn move_leg(&self, leg: u8, position: LegPosition, duration_ms: u64) -> Result<(), DriverError>;
    async fn move_joint(&self, leg: u8, joint: u8, angle_deg: f64, duration_ms: u64) -> Result<(), DriverError>;
}

#[async_trait]
pub trait DistanceSensor: Send + Sync {
    async fn start(&self) -> Result<(), DriverError>;
    fn available(&self) -> bool;
    async fn read_millimeters(&self) -> Result<f64, DriverError>;
    async fn close(&self) -> Result<(), DriverError>;
}

#[async_trait]
pub trait Camera: Send + Sync {
    async fn start(&self) -> Result<(), DriverError>;
    fn available(&self) -> bool;
    async fn capture_frame(&self) -> Result<Frame, DriverError>;
}

/// Black-box face detector. Assumed total: it never fails, it may find nothing.
pub trait FaceClassifier: Send + Sync {
    fn detect(&self, frame: &Frame) -> Vec<Region>;
}

/// Outbound string channel to the connected remote client.
#[async_trait]
pub trait RemoteLink: Send + Sync {
    async fn send_string(&self, message: String) -> Result<(), DriverError>;
}

/// Log a failed fire-and-forget command. Loops keep going either way.
pub(crate) fn report(result: Result<(), DriverError>, command: &str) {
    if let Err(e) = result {
        warn!(command, "Actuator command failed: {}", e);
    }
}
