use std::sync::Arc;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, Rgba, RgbaImage};
use reflex::drivers::sim::{ChannelLink, MotionCommand, RecordingLocomotion, ScriptedCamera, ScriptedClassifier};
use reflex::drivers::Locomotion;
use reflex::kernel::config::ReflexConfig;
use reflex::kernel::telemetry::{TelemetryEvent, TelemetrySink};
use reflex::vision::{encode_frame, VisionReactor};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

struct Rig {
    locomotion: Arc<RecordingLocomotion>,
    camera: Arc<ScriptedCamera>,
    classifier: Arc<ScriptedClassifier>,
    frames: UnboundedReceiver<String>,
    telemetry: TelemetrySink,
    reactor: VisionReactor,
}

fn rig(camera: ScriptedCamera, classifier: ScriptedClassifier) -> Rig {
    let locomotion = Arc::new(RecordingLocomotion::new());
    let camera = Arc::new(camera);
    let classifier = Arc::new(classifier);
    let (link, frames) = ChannelLink::new();
    let telemetry = TelemetrySink::new();
    let reactor = VisionReactor::new(
        camera.clone(),
        classifier.clone(),
        Arc::new(link),
        Some(locomotion.clone() as Arc<dyn Locomotion>),
        &ReflexConfig::default(),
        telemetry.clone(),
    );
    Rig { locomotion, camera, classifier, frames, telemetry, reactor }
}

#[tokio::test]
async fn test_face_stops_walking_once_and_never_resumes() {
    let rig = rig(ScriptedCamera::new(64, 48), ScriptedClassifier::new(vec![0, 0, 2, 0]));
    let cancel = CancellationToken::new();

    let mut counts = Vec::new();
    for _ in 0..4 {
        counts.push(rig.reactor.tick(&cancel).await);
    }

    assert_eq!(counts, vec![Some(0), Some(0), Some(2), Some(0)]);
    // Exactly one stop, issued on the third tick; the fourth tick's zero doesn't walk again.
    assert_eq!(rig.locomotion.commands(), vec![MotionCommand::StopWalking]);
    assert_eq!(rig.telemetry.snapshot().vision.face_stops, 1);
    assert_eq!(rig.telemetry.snapshot().vision.faces_seen, 2);
}

#[tokio::test]
async fn test_capture_failure_skips_only_that_tick() {
    let mut rig = rig(
        ScriptedCamera::new(32, 32).failing_at(&[1]),
        ScriptedClassifier::blind(),
    );
    let cancel = CancellationToken::new();

    assert_eq!(rig.reactor.tick(&cancel).await, Some(0));
    assert_eq!(rig.reactor.tick(&cancel).await, None);
    assert_eq!(rig.reactor.tick(&cancel).await, Some(0));

    // Failed tick neither streams nor classifies.
    assert_eq!(rig.classifier.calls(), 2);
    let mut streamed = 0;
    while rig.frames.try_recv().is_ok() {
        streamed += 1;
    }
    assert_eq!(streamed, 2);
    assert_eq!(rig.telemetry.snapshot().vision.capture_faults, 1);
}

#[tokio::test]
async fn test_frames_are_base64_jpeg() {
    let mut img = RgbaImage::new(40, 30);
    for (x, _, px) in img.enumerate_pixels_mut() {
        *px = Rgba([(x * 6) as u8, 80, 160, 255]);
    }
    let frame = DynamicImage::ImageRgba8(img);

    let mut rig = rig(
        ScriptedCamera::new(40, 30).with_script(vec![Some(frame)]),
        ScriptedClassifier::blind(),
    );
    rig.reactor.tick(&CancellationToken::new()).await;

    let message = rig.frames.try_recv().expect("one frame streamed");
    let bytes = STANDARD.decode(&message).expect("valid base64");
    assert_eq!(&bytes[..2], &[0xFF, 0xD8], "JPEG SOI marker");
    assert_eq!(&bytes[bytes.len() - 2..], &[0xFF, 0xD9], "JPEG EOI marker");

    let decoded = image::load_from_memory(&bytes).expect("decodable jpeg");
    assert_eq!((decoded.width(), decoded.height()), (40, 30));

    let snap = rig.telemetry.snapshot();
    assert_eq!(snap.vision.frames_streamed, 1);
    assert_eq!(snap.vision.bytes_streamed, message.len() as u64);
}

#[test]
fn test_lower_quality_is_smaller() {
    let mut img = RgbaImage::new(64, 64);
    for (x, y, px) in img.enumerate_pixels_mut() {
        *px = Rgba([(x * 4) as u8, (y * 4) as u8, ((x ^ y) * 4) as u8, 255]);
    }
    let frame = DynamicImage::ImageRgba8(img);
    let low = encode_frame(&frame, 10).unwrap();
    let high = encode_frame(&frame, 95).unwrap();
    assert!(low.len() < high.len());
}

#[tokio::test]
async fn test_closed_link_does_not_stop_detection() {
    let rig = rig(ScriptedCamera::new(16, 16), ScriptedClassifier::new(vec![1]));
    drop(rig.frames);

    assert_eq!(rig.reactor.tick(&CancellationToken::new()).await, Some(1));
    assert_eq!(rig.locomotion.commands(), vec![MotionCommand::StopWalking]);
    assert_eq!(rig.telemetry.snapshot().vision.frames_streamed, 0);
}

#[tokio::test]
async fn test_no_stop_once_cancelled() {
    let rig = rig(ScriptedCamera::new(16, 16), ScriptedClassifier::new(vec![3]));
    let cancel = CancellationToken::new();
    cancel.cancel();

    assert_eq!(rig.reactor.tick(&cancel).await, Some(3));
    assert!(rig.locomotion.is_empty());
}

#[tokio::test]
async fn test_loop_runs_until_cancelled() {
    let mut rig = rig(
        ScriptedCamera::new(32, 24).failing_at(&[2]),
        ScriptedClassifier::blind(),
    );
    let cancel = CancellationToken::new();
    let session = Uuid::new_v4();
    let camera = rig.camera.clone();
    let handle = tokio::spawn(rig.reactor.run(cancel.clone(), session));

    // 1. Let it go past the failing capture
    tokio::time::timeout(Duration::from_secs(10), async {
        while camera.captures() < 6 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("vision loop kept capturing");

    // 2. Stop and join
    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("vision loop stopped")
        .unwrap();

    let captured = camera.captures();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(camera.captures(), captured, "no captures after stop");

    let mut streamed = 0;
    while rig.frames.try_recv().is_ok() {
        streamed += 1;
    }
    assert_eq!(streamed, captured - 1);
    assert!(rig.locomotion.is_empty());

    let events = rig.telemetry.events();
    assert!(events.contains(&TelemetryEvent::ReactorStopped {
        reactor: reflex::kernel::event::ReactorKind::Vision,
        session,
    }));
}
