use std::collections::VecDeque;

use super::event::{CommandKind, StopSource, TelemetryEvent};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetrySnapshot {
    pub commands: CommandStats,
    pub motion: MotionStats,
    pub vision: VisionStats,
    pub sessions_started: u64,
    pub remote_stops: u64,
    pub drivers_started: u64,
    pub drivers_unavailable: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandStats {
    pub start: u64,
    pub stop: u64,
    pub unknown: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MotionStats {
    pub maneuvers: u64,
    pub sensor_faults: u64,
    pub last_heading: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisionStats {
    pub frames_streamed: u64,
    pub bytes_streamed: u64,
    pub avg_frame_bytes: f64,
    pub capture_faults: u64,
    pub encode_faults: u64,
    pub faces_seen: u64,
    pub face_stops: u64,
}

pub fn compute_snapshot(events: &VecDeque<TelemetryEvent>) -> TelemetrySnapshot {
    let mut snap = TelemetrySnapshot::default();

    for event in events {
        match event {
            TelemetryEvent::DriverStarted { .. } => snap.drivers_started += 1,
            TelemetryEvent::DriverUnavailable { .. } => snap.drivers_unavailable += 1,
            TelemetryEvent::Command { kind } => match kind {
                CommandKind::Start => snap.commands.start += 1,
                CommandKind::Stop => snap.commands.stop += 1,
                CommandKind::Unknown => snap.commands.unknown += 1,
            },
            // Sessions are counted by id below; both reactors of one session share it.
            TelemetryEvent::ReactorStarted { .. } | TelemetryEvent::ReactorStopped { .. } => {}
            TelemetryEvent::Maneuver { to, .. } => {
                snap.motion.maneuvers += 1;
                snap.motion.last_heading = Some(*to);
            }
            TelemetryEvent::SensorFault => snap.motion.sensor_faults += 1,
            TelemetryEvent::CaptureFault => snap.vision.capture_faults += 1,
            TelemetryEvent::EncodeFault => snap.vision.encode_faults += 1,
            TelemetryEvent::FrameStreamed { bytes } => {
                snap.vision.frames_streamed += 1;
                snap.vision.bytes_streamed += *bytes as u64;
            }
            TelemetryEvent::FacesDetected { count } => snap.vision.faces_seen += *count as u64,
            TelemetryEvent::WalkStopped { source } => match source {
                StopSource::Vision => snap.vision.face_stops += 1,
                StopSource::RemoteStop => snap.remote_stops += 1,
            },
        }
    }

    snap.sessions_started = count_sessions(events);

    if snap.vision.frames_streamed > 0 {
        snap.vision.avg_frame_bytes = snap.vision.bytes_streamed as f64 / snap.vision.frames_streamed as f64;
    }

    snap
}

fn count_sessions(events: &VecDeque<TelemetryEvent>) -> u64 {
    let mut seen = std::collections::HashSet::new();
    for event in events {
        if let TelemetryEvent::ReactorStarted { session, .. } = event {
            seen.insert(*session);
        }
    }
    seen.len() as u64
}
