use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::cancel::CancellationCoordinator;
use super::config::ReflexConfig;
use super::direction::{DirectionState, Heading};
use super::event::{Disposition, RemoteCommand};
use super::telemetry::{CommandKind, StopSource, TelemetryEvent, TelemetrySink};
use crate::drivers::{report, Camera, DistanceSensor, FaceClassifier, Locomotion, RemoteLink};
use crate::motion::{posture, MotionReactor};
use crate::vision::VisionReactor;

/// Everything a controller drives or listens to.
#[derive(Clone)]
pub struct Drivers {
    pub locomotion: Arc<dyn Locomotion>,
    pub distance: Arc<dyn DistanceSensor>,
    pub camera: Arc<dyn Camera>,
    pub classifier: Arc<dyn FaceClassifier>,
    pub link: Arc<dyn RemoteLink>,
}

/// Which drivers came up during connect. A missing one disables its loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub locomotion: bool,
    pub camera: bool,
    pub distance: bool,
}

impl Capabilities {
    pub fn motion(&self) -> bool {
        self.locomotion && self.distance
    }

    pub fn vision(&self) -> bool {
        self.camera
    }
}

struct Session {
    id: Uuid,
    motion: Option<JoinHandle<DirectionState>>,
    vision: Option<JoinHandle<()>>,
}

/// One connected session's controller.
///
/// Owns the heading and the stop signal. Routes remote commands to the two
/// reactive loops and sequences driver startup and shutdown around them.
pub struct Controller {
    drivers: Drivers,
    config: ReflexConfig,
    capabilities: Capabilities,
    cancel: CancellationCoordinator,
    // Parked here between sessions; moved into the motion loop while it runs.
    direction: DirectionState,
    session: Option<Session>,
    telemetry: TelemetrySink,
}

impl Controller {
    pub fn new(drivers: Drivers, config: ReflexConfig) -> Self {
        Self {
            drivers,
            config,
            capabilities: Capabilities::default(),
            cancel: CancellationCoordinator::new(),
            direction: DirectionState::new(),
            session: None,
            telemetry: TelemetrySink::new(),
        }
    }

    pub fn config(&self) -> &ReflexConfig {
        &self.config
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn telemetry(&self) -> &TelemetrySink {
        &self.telemetry
    }

    /// Heading as of the end of the last session.
    pub fn heading(&self) -> Heading {
        self.direction.heading()
    }

    pub fn is_running(&self) -> bool {
        self.session.is_some()
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.session.as_ref().map(|s| s.id)
    }

    /// Bring drivers up in order. The first hard failure ends the sequence;
    /// the controller stays usable with whatever came up.
    pub async fn on_connect(&mut self) {
        self.capabilities = Capabilities::default();

        if let Err(e) = self.drivers.locomotion.start().await {
            error!("Locomotion start failed: {}", e);
            self.driver_unavailable("locomotion");
            return;
        }
        self.capabilities.locomotion = true;
        self.driver_started("locomotion");

        if let Err(e) = posture::ready(self.drivers.locomotion.as_ref(), &self.config).await {
            warn!("Ready posture incomplete: {}", e);
        }

        if !self.drivers.camera.available() {
            error!("Camera driver not available");
            self.driver_unavailable("camera");
            return;
        }
        match self.drivers.camera.start().await {
            Ok(()) => {
                self.capabilities.camera = true;
                self.driver_started("camera");
            }
            Err(e) => {
                error!("Camera could not start: {}", e);
                self.driver_unavailable("camera");
            }
        }

        let started = match self.drivers.distance.start().await {
            Ok(()) => true,
            Err(e) => {
                error!("Distance start failed: {}", e);
                false
            }
        };
        if !self.drivers.distance.available() {
            error!("Distance sensor is not available");
        }
        if started && self.drivers.distance.available() {
            self.capabilities.distance = true;
            self.driver_started("distance");
        } else {
            self.driver_unavailable("distance");
        }

        info!(capabilities = ?self.capabilities, "Connected");
    }

    pub async fn on_recv_string(&mut self, data: &str) {
        info!(command = data, "Remote command");
        match RemoteCommand::parse(data) {
            Some(RemoteCommand::Start) => {
                self.telemetry.record(TelemetryEvent::Command { kind: CommandKind::Start });
                self.start();
            }
            Some(RemoteCommand::Stop) => {
                self.telemetry.record(TelemetryEvent::Command { kind: CommandKind::Stop });
                self.stop().await;
            }
            None => {
                self.telemetry.record(TelemetryEvent::Command { kind: CommandKind::Unknown });
                warn!(command = data, "Ignoring unknown command");
            }
        }
    }

    /// Launch the reactive loops. Returns `false` if nothing was launched.
    pub fn start(&mut self) -> bool {
        if let Some(session) = &self.session {
            warn!(session = %session.id, "Session already running, ignoring start");
            return false;
        }

        let caps = self.capabilities;
        if !caps.motion() && !caps.vision() {
            warn!(capabilities = ?caps, "No capability available, nothing to start");
            return false;
        }

        let token = self.cancel.arm();
        let id = Uuid::new_v4();

        let motion = caps.motion().then(|| {
            let reactor = MotionReactor::new(
                Arc::clone(&self.drivers.locomotion),
                Arc::clone(&self.drivers.distance),
                self.direction,
                &self.config,
                self.telemetry.clone(),
            );
            tokio::spawn(reactor.run(token.clone(), id))
        });

        let vision = caps.vision().then(|| {
            let reactor = VisionReactor::new(
                Arc::clone(&self.drivers.camera),
                Arc::clone(&self.drivers.classifier),
                Arc::clone(&self.drivers.link),
                caps.locomotion.then(|| Arc::clone(&self.drivers.locomotion)),
                &self.config,
                self.telemetry.clone(),
            );
            tokio::spawn(reactor.run(token.clone(), id))
        });

        info!(session = %id, motion = motion.is_some(), vision = vision.is_some(), "Session started");
        self.session = Some(Session { id, motion, vision });
        true
    }

    /// Cancel the loops, wait for them to finish, then put the body at rest.
    ///
    /// Waiting first guarantees no loop command lands after the rest posture.
    /// Safe to call any number of times.
    pub async fn stop(&mut self) {
        self.cancel.cancel();

        if let Some(session) = self.session.take() {
            if let Some(handle) = session.motion {
                match handle.await {
                    Ok(direction) => self.direction = direction,
                    Err(e) => error!(session = %session.id, "Motion reactor task failed: {}", e),
                }
            }
            if let Some(handle) = session.vision {
                if let Err(e) = handle.await {
                    error!(session = %session.id, "Vision reactor task failed: {}", e);
                }
            }
            info!(session = %session.id, heading = self.direction.heading(), "Session stopped");
        }

        if !self.capabilities.locomotion {
            return;
        }
        let locomotion = &self.drivers.locomotion;
        report(locomotion.stop_walking_continuously().await, "stop_walking_continuously");
        self.telemetry.record(TelemetryEvent::WalkStopped {
            source: StopSource::RemoteStop,
        });
        report(locomotion.relax_legs().await, "relax_legs");
        report(locomotion.relax().await, "relax");
    }

    /// The remote went away. Loops are stopped; the host is expected to exit.
    pub async fn on_disconnect(&mut self) -> Disposition {
        info!("Remote disconnected");
        if self.session.is_some() {
            self.stop().await;
        }
        Disposition::Exit
    }

    /// Release driver resources.
    pub async fn on_close(&mut self) {
        if self.session.is_some() {
            self.stop().await;
        }
        report(self.drivers.locomotion.close().await, "close");
        if let Err(e) = self.drivers.distance.close().await {
            warn!("Distance close failed: {}", e);
        }
        info!("Drivers closed");
    }

    fn driver_started(&self, driver: &str) {
        self.telemetry.record(TelemetryEvent::DriverStarted {
            driver: driver.to_string(),
        });
    }

    fn driver_unavailable(&self, driver: &str) {
        self.telemetry.record(TelemetryEvent::DriverUnavailable {
            driver: driver.to_string(),
        });
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Some(session) = self.session.take() {
            if let Some(handle) = session.motion {
                handle.abort();
            }
            if let Some(handle) = session.vision {
                handle.abort();
            }
        }
    }
}
