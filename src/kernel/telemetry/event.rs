use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::kernel::direction::Heading;
use crate::kernel::event::ReactorKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TelemetryEvent {
    DriverStarted {
        driver: String,
    },
    DriverUnavailable {
        driver: String,
    },

    Command {
        kind: CommandKind,
    },

    ReactorStarted {
        reactor: ReactorKind,
        session: Uuid,
    },
    ReactorStopped {
        reactor: ReactorKind,
        session: Uuid,
    },

    /// One obstacle-avoidance turn.
    Maneuver {
        from: Heading,
        to: Heading,
        distance_mm: f64,
    },
    SensorFault,

    CaptureFault,
    EncodeFault,
    FrameStreamed {
        bytes: usize,
    },
    FacesDetected {
        count: usize,
    },

    WalkStopped {
        source: StopSource,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandKind {
    Start,
    Stop,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopSource {
    Vision,
    RemoteStop,
}
