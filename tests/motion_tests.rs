use std::sync::Arc;
use std::time::Duration;

use reflex::drivers::sim::{MotionCommand, RecordingLocomotion, TimelineDistance};
use reflex::drivers::LegPosition;
use reflex::kernel::config::ReflexConfig;
use reflex::kernel::direction::DirectionState;
use reflex::kernel::telemetry::TelemetrySink;
use reflex::motion::posture;
use reflex::motion::proximity::{classify, Proximity};
use reflex::motion::{MotionReactor, MotionState};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

struct Rig {
    locomotion: Arc<RecordingLocomotion>,
    sensor: Arc<TimelineDistance>,
    telemetry: TelemetrySink,
    reactor: MotionReactor,
}

fn rig(sensor: TimelineDistance) -> Rig {
    let locomotion = Arc::new(RecordingLocomotion::new());
    let sensor = Arc::new(sensor);
    let telemetry = TelemetrySink::new();
    let reactor = MotionReactor::new(
        locomotion.clone(),
        sensor.clone(),
        DirectionState::new(),
        &ReflexConfig::default(),
        telemetry.clone(),
    );
    Rig { locomotion, sensor, telemetry, reactor }
}

fn walk() -> MotionCommand {
    MotionCommand::Walk { heading: 0.0, speed: 1.0 }
}

#[test]
fn test_threshold_is_strict() {
    assert_eq!(classify(249.9, 250.0), Proximity::TooClose(249.9));
    assert_eq!(classify(250.0, 250.0), Proximity::Clear(250.0));
    assert!(!Proximity::Unknown.is_too_close());
}

#[tokio::test(start_paused = true)]
async fn test_one_maneuver_per_obstacle_run() {
    // Readings sampled every 250ms: the 200 triggers a turn, the 100 falls inside the cool-down.
    let rig = rig(TimelineDistance::from_millimeters(
        &[300.0, 200.0, 100.0, 300.0],
        Duration::from_millis(250),
    ));
    assert_eq!(rig.reactor.state(), MotionState::Walking);

    let cancel = CancellationToken::new();
    let handle = tokio::spawn(rig.reactor.run(cancel.clone(), Uuid::new_v4()));

    tokio::time::sleep(Duration::from_secs(5)).await;
    cancel.cancel();
    let direction = handle.await.unwrap();

    assert_eq!(rig.telemetry.snapshot().motion.maneuvers, 1);
    assert_eq!(direction.heading(), -60.0);
    assert_eq!(
        rig.locomotion.commands(),
        vec![
            walk(),
            MotionCommand::MoveHead { heading: -60.0, duration_ms: 500 },
            walk(),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_no_polling_during_cool_down() {
    let rig = rig(TimelineDistance::constant(100.0));
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(rig.reactor.run(cancel.clone(), Uuid::new_v4()));

    // t=0 read + turn, cool-down until 2000ms: only one read so far.
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(rig.sensor.reads(), 1);

    cancel.cancel();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_read_failures_are_tolerated() {
    let rig = rig(TimelineDistance::new(
        vec![None, None, Some(900.0)],
        Duration::from_millis(250),
    ));
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(rig.reactor.run(cancel.clone(), Uuid::new_v4()));

    tokio::time::sleep(Duration::from_millis(1100)).await;
    cancel.cancel();
    handle.await.unwrap();

    let snap = rig.telemetry.snapshot();
    assert_eq!(snap.motion.sensor_faults, 2);
    assert_eq!(snap.motion.maneuvers, 0);
    assert!(rig.sensor.reads() >= 4, "loop must keep polling after failures");
    assert_eq!(rig.locomotion.commands(), vec![walk()]);
}

#[tokio::test(start_paused = true)]
async fn test_turns_alternate_across_obstacles() {
    let rig = rig(TimelineDistance::constant(50.0));
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(rig.reactor.run(cancel.clone(), Uuid::new_v4()));

    tokio::time::sleep(Duration::from_secs(10)).await;
    cancel.cancel();
    let direction = handle.await.unwrap();

    let headings: Vec<f64> = rig
        .locomotion
        .commands()
        .into_iter()
        .filter_map(|c| match c {
            MotionCommand::MoveHead { heading, .. } => Some(heading),
            _ => None,
        })
        .collect();
    assert!(headings.len() >= 3, "expected a turn per cool-down, got {:?}", headings);
    for (i, h) in headings.iter().enumerate() {
        let expected = if i % 2 == 0 { -60.0 } else { 0.0 };
        assert_eq!(*h, expected);
    }
    assert_eq!(direction.heading(), *headings.last().unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_cancel_cuts_cool_down_short() {
    let rig = rig(TimelineDistance::constant(100.0));
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(rig.reactor.run(cancel.clone(), Uuid::new_v4()));

    // 1. Mid cool-down
    tokio::time::sleep(Duration::from_millis(1000)).await;
    let before = rig.locomotion.len();
    let cancelled_at = tokio::time::Instant::now();
    cancel.cancel();
    handle.await.unwrap();

    // 2. Returned promptly, and never touches the body again
    assert!(cancelled_at.elapsed() < Duration::from_millis(250));
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(rig.locomotion.len(), before);
    assert!(!rig.locomotion.commands().contains(&MotionCommand::StopWalking));
}

#[tokio::test]
async fn test_already_cancelled_issues_nothing() {
    let rig = rig(TimelineDistance::constant(100.0));
    let cancel = CancellationToken::new();
    cancel.cancel();

    let direction = rig.reactor.run(cancel, Uuid::new_v4()).await;
    assert_eq!(direction.heading(), 0.0);
    assert!(rig.locomotion.is_empty());
    assert_eq!(rig.sensor.reads(), 0);
}

#[test]
fn test_reachable_fits_out_of_reach_targets() {
    let near = LegPosition::new(-100.0, 50.0, 70.0);
    assert!(near.is_valid());
    assert_eq!(posture::reachable(near), near);

    let far = LegPosition::new(400.0, 0.0, 300.0);
    assert!(!far.is_valid());
    let fitted = posture::reachable(far);
    assert!(fitted.is_valid());
    // Same direction, shorter reach.
    assert!((fitted.x / fitted.z - far.x / far.z).abs() < 1e-9);
}

#[tokio::test]
async fn test_ready_posture_joins_each_pair() {
    let locomotion = RecordingLocomotion::new();
    posture::ready(&locomotion, &ReflexConfig::default()).await.unwrap();

    assert_eq!(
        locomotion.commands(),
        vec![
            MotionCommand::Stand,
            MotionCommand::MoveHead { heading: 0.0, duration_ms: 80 },
            MotionCommand::MoveLeg { leg: 2, position: LegPosition::new(-100.0, 50.0, 70.0), duration_ms: 500 },
            MotionCommand::MoveLeg { leg: 5, position: LegPosition::new(100.0, 50.0, 70.0), duration_ms: 500 },
            MotionCommand::MoveJoint { leg: 0, joint: 1, angle_deg: 90.0, duration_ms: 500 },
            MotionCommand::MoveJoint { leg: 0, joint: 2, angle_deg: 45.0, duration_ms: 500 },
            MotionCommand::MoveJoint { leg: 1, joint: 1, angle_deg: 90.0, duration_ms: 80 },
            MotionCommand::MoveJoint { leg: 1, joint: 2, angle_deg: 45.0, duration_ms: 80 },
        ]
    );
}
