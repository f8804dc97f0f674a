use std::sync::Arc;
use tracing::{debug, warn};

use crate::drivers::DistanceSensor;
use crate::kernel::telemetry::{TelemetryEvent, TelemetrySink};

/// Classification of one distance poll.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Proximity {
    TooClose(f64),
    Clear(f64),
    /// The read failed. Handled like `Clear`: no reaction this tick.
    Unknown,
}

impl Proximity {
    pub fn is_too_close(&self) -> bool {
        matches!(self, Proximity::TooClose(_))
    }
}

/// Strictly below the threshold is too close.
pub fn classify(distance_mm: f64, threshold_mm: f64) -> Proximity {
    if distance_mm < threshold_mm {
        Proximity::TooClose(distance_mm)
    } else {
        Proximity::Clear(distance_mm)
    }
}

pub struct ProximityMonitor {
    sensor: Arc<dyn DistanceSensor>,
    threshold_mm: f64,
    telemetry: TelemetrySink,
}

impl ProximityMonitor {
    pub fn new(sensor: Arc<dyn DistanceSensor>, threshold_mm: f64, telemetry: TelemetrySink) -> Self {
        Self {
            sensor,
            threshold_mm,
            telemetry,
        }
    }

    pub fn threshold_mm(&self) -> f64 {
        self.threshold_mm
    }

    /// Take one reading. Failures are logged here and never escape.
    pub async fn poll(&self) -> Proximity {
        match self.sensor.read_millimeters().await {
            Ok(mm) => {
                debug!(distance_mm = mm, "distance read");
                classify(mm, self.threshold_mm)
            }
            Err(e) => {
                warn!("Distance read failed: {}", e);
                self.telemetry.record(TelemetryEvent::SensorFault);
                Proximity::Unknown
            }
        }
    }
}
