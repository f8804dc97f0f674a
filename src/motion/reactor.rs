use std::sync::Arc;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

use super::proximity::{Proximity, ProximityMonitor};
use crate::drivers::{report, DistanceSensor, Locomotion};
use crate::kernel::config::ReflexConfig;
use crate::kernel::direction::DirectionState;
use crate::kernel::event::ReactorKind;
use crate::kernel::telemetry::{TelemetryEvent, TelemetrySink};
use crate::kernel::time::pause;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionState {
    Walking,
    Reacting,
}

/// Obstacle avoidance loop.
///
/// Walks forward, polls the distance sensor every poll interval and turns away
/// when something is too close. A turn is followed by a cool-down during which
/// nothing is polled, so one obstacle triggers one turn.
pub struct MotionReactor {
    locomotion: Arc<dyn Locomotion>,
    monitor: ProximityMonitor,
    direction: DirectionState,
    state: MotionState,
    poll_interval: Duration,
    cool_down: Duration,
    move_head_duration_ms: u64,
    walk_speed: f64,
    telemetry: TelemetrySink,
}

impl MotionReactor {
    pub fn new(
        locomotion: Arc<dyn Locomotion>,
        sensor: Arc<dyn DistanceSensor>,
        direction: DirectionState,
        config: &ReflexConfig,
        telemetry: TelemetrySink,
    ) -> Self {
        Self {
            locomotion,
            monitor: ProximityMonitor::new(sensor, config.reaction_threshold_mm, telemetry.clone()),
            direction,
            state: MotionState::Walking,
            poll_interval: config.poll_interval(),
            cool_down: config.cool_down(),
            move_head_duration_ms: config.move_head_duration_ms,
            walk_speed: config.walk_speed,
            telemetry,
        }
    }

    pub fn state(&self) -> MotionState {
        self.state
    }

    pub fn direction(&self) -> DirectionState {
        self.direction
    }

    /// Run until `cancel` fires, then hand the heading back.
    ///
    /// The loop never stops the body itself; whoever cancels is responsible
    /// for bringing the actuators to rest.
    pub async fn run(mut self, cancel: CancellationToken, session: Uuid) -> DirectionState {
        if cancel.is_cancelled() {
            return self.direction;
        }
        info!(%session, heading = self.direction.heading(), "Motion reactor started");
        self.telemetry.record(TelemetryEvent::ReactorStarted {
            reactor: ReactorKind::Motion,
            session,
        });

        report(self.locomotion.walk_continuously(0.0, self.walk_speed).await, "walk_continuously");
        self.state = MotionState::Walking;

        loop {
            if cancel.is_cancelled() {
                break;
            }
            if let Proximity::TooClose(distance_mm) = self.monitor.poll().await {
                self.react(distance_mm, &cancel).await;
                self.state = MotionState::Walking;
            }
            if !pause(&cancel, self.poll_interval).await {
                break;
            }
        }

        info!(%session, heading = self.direction.heading(), "Motion reactor stopped");
        self.telemetry.record(TelemetryEvent::ReactorStopped {
            reactor: ReactorKind::Motion,
            session,
        });
        self.direction
    }

    async fn react(&mut self, distance_mm: f64, cancel: &CancellationToken) {
        if cancel.is_cancelled() {
            return;
        }
        self.state = MotionState::Reacting;

        let from = self.direction.heading();
        let to = self.direction.turn();
        info!(distance_mm, from, to, "Obstacle ahead, turning");
        self.telemetry.record(TelemetryEvent::Maneuver { from, to, distance_mm });

        report(self.locomotion.move_head(to, self.move_head_duration_ms).await, "move_head");
        if cancel.is_cancelled() {
            return;
        }
        // The body now faces the new heading, so walking resumes straight ahead.
        report(self.locomotion.walk_continuously(0.0, self.walk_speed).await, "walk_continuously");

        debug!(cool_down_ms = self.cool_down.as_millis() as u64, "Cooling down");
        pause(cancel, self.cool_down).await;
    }
}
