use std::sync::Arc;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::encode::encode_frame;
use crate::drivers::{report, Camera, FaceClassifier, Frame, Locomotion, RemoteLink};
use crate::kernel::config::ReflexConfig;
use crate::kernel::event::ReactorKind;
use crate::kernel::telemetry::{StopSource, TelemetryEvent, TelemetrySink};
use crate::kernel::time::pause;

/// Face watch loop.
///
/// Every tick captures a frame, streams a base64 JPEG copy to the remote and
/// runs the classifier. Seeing any face stops continuous walking. There is no
/// way back to walking from here: once a face stopped the body, only a new
/// "start" command resumes it.
pub struct VisionReactor {
    camera: Arc<dyn Camera>,
    classifier: Arc<dyn FaceClassifier>,
    link: Arc<dyn RemoteLink>,
    /// Absent when the body never came up; the loop then only streams and detects.
    locomotion: Option<Arc<dyn Locomotion>>,
    jpeg_quality: u8,
    interval: Duration,
    telemetry: TelemetrySink,
}

impl VisionReactor {
    pub fn new(
        camera: Arc<dyn Camera>,
        classifier: Arc<dyn FaceClassifier>,
        link: Arc<dyn RemoteLink>,
        locomotion: Option<Arc<dyn Locomotion>>,
        config: &ReflexConfig,
        telemetry: TelemetrySink,
    ) -> Self {
        Self {
            camera,
            classifier,
            link,
            locomotion,
            jpeg_quality: config.jpeg_quality,
            interval: config.vision_interval(),
            telemetry,
        }
    }

    pub async fn run(self, cancel: CancellationToken, session: Uuid) {
        if cancel.is_cancelled() {
            return;
        }
        info!(%session, "Vision reactor started");
        self.telemetry.record(TelemetryEvent::ReactorStarted {
            reactor: ReactorKind::Vision,
            session,
        });

        loop {
            if cancel.is_cancelled() {
                break;
            }
            self.tick(&cancel).await;

            if self.interval.is_zero() {
                // Capture may complete without ever suspending; let the stop get through.
                tokio::task::yield_now().await;
            } else if !pause(&cancel, self.interval).await {
                break;
            }
        }

        info!(%session, "Vision reactor stopped");
        self.telemetry.record(TelemetryEvent::ReactorStopped {
            reactor: ReactorKind::Vision,
            session,
        });
    }

    /// One perception cycle. Returns the face count, or `None` if capture failed.
    pub async fn tick(&self, cancel: &CancellationToken) -> Option<usize> {
        let frame = match self.camera.capture_frame().await {
            Ok(frame) => Arc::new(frame),
            Err(e) => {
                warn!("Frame capture failed, skipping tick: {}", e);
                self.telemetry.record(TelemetryEvent::CaptureFault);
                return None;
            }
        };

        self.stream(&frame).await;

        let faces = self.detect(frame).await;
        debug!(faces, "Number of faces");
        if faces == 0 {
            return Some(0);
        }
        self.telemetry.record(TelemetryEvent::FacesDetected { count: faces });

        if cancel.is_cancelled() {
            return Some(faces);
        }
        if let Some(locomotion) = &self.locomotion {
            info!(faces, "Face in view, stopping");
            report(locomotion.stop_walking_continuously().await, "stop_walking_continuously");
            self.telemetry.record(TelemetryEvent::WalkStopped {
                source: StopSource::Vision,
            });
        }
        Some(faces)
    }

    async fn stream(&self, frame: &Arc<Frame>) {
        let shared = Arc::clone(frame);
        let quality = self.jpeg_quality;
        let encoded = tokio::task::spawn_blocking(move || encode_frame(&shared, quality)).await;

        let message = match encoded {
            Ok(Ok(message)) => message,
            Ok(Err(e)) => {
                warn!("Frame encoding failed: {}", e);
                self.telemetry.record(TelemetryEvent::EncodeFault);
                return;
            }
            Err(e) => {
                warn!("Encoder task failed: {}", e);
                self.telemetry.record(TelemetryEvent::EncodeFault);
                return;
            }
        };

        let bytes = message.len();
        match self.link.send_string(message).await {
            Ok(()) => self.telemetry.record(TelemetryEvent::FrameStreamed { bytes }),
            // No acknowledgement and no backpressure; a lost frame is just lost.
            Err(e) => debug!("Frame dropped: {}", e),
        }
    }

    async fn detect(&self, frame: Arc<Frame>) -> usize {
        let classifier = Arc::clone(&self.classifier);
        match tokio::task::spawn_blocking(move || classifier.detect(&frame).len()).await {
            Ok(count) => count,
            Err(e) => {
                warn!("Classifier task failed: {}", e);
                0
            }
        }
    }
}
