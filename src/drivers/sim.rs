//! In-process driver doubles.
//!
//! These stand in for the robot when running the simulator binary and in
//! tests. They record what they were asked to do and replay scripted sensor
//! data; none of them touch real hardware.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use image::DynamicImage;
use tokio::sync::mpsc;
use tokio::time::{Duration, Instant};

use super::{
    Camera, DistanceSensor, DriverError, FaceClassifier, Frame, LegPosition, Locomotion, Region,
    RemoteLink,
};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One command as received by [`RecordingLocomotion`].
#[derive(Debug, Clone, PartialEq)]
pub enum MotionCommand {
    Start,
    Close,
    Stand,
    MoveHead { heading: f64, duration_ms: u64 },
    Walk { heading: f64, speed: f64 },
    StopWalking,
    RelaxLegs,
    Relax,
    MoveLeg { leg: u8, position: LegPosition, duration_ms: u64 },
    MoveJoint { leg: u8, joint: u8, angle_deg: f64, duration_ms: u64 },
}

/// Locomotion double that appends every command to an in-memory log.
#[derive(Debug, Default)]
pub struct RecordingLocomotion {
    log: Mutex<Vec<MotionCommand>>,
    fail_start: bool,
}

impl RecordingLocomotion {
    pub fn new() -> Self {
        Self::default()
    }

    /// A body whose `start` always fails.
    pub fn failing_start() -> Self {
        Self {
            fail_start: true,
            ..Self::default()
        }
    }

    pub fn commands(&self) -> Vec<MotionCommand> {
        lock(&self.log).clone()
    }

    pub fn count(&self, pred: impl Fn(&MotionCommand) -> bool) -> usize {
        lock(&self.log).iter().filter(|c| pred(c)).count()
    }

    pub fn len(&self) -> usize {
        lock(&self.log).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.log).is_empty()
    }

    fn push(&self, cmd: MotionCommand) {
        lock(&self.log).push(cmd);
    }
}

#[async_trait]
impl Locomotion for RecordingLocomotion {
    async fn start(&self) -> Result<(), DriverError> {
        if self.fail_start {
            return Err(DriverError::StartFailed {
                driver: "locomotion",
                reason: "servo bus not responding".to_string(),
            });
        }
        self.push(MotionCommand::Start);
        Ok(())
    }

    async fn close(&self) -> Result<(), DriverError> {
        self.push(MotionCommand::Close);
        Ok(())
    }

    async fn stand(&self) -> Result<(), DriverError> {
        self.push(MotionCommand::Stand);
        Ok(())
    }

    async fn move_head(&self, heading: f64, duration_ms: u64) -> Result<(), DriverError> {
        self.push(MotionCommand::MoveHead { heading, duration_ms });
        Ok(())
    }

    async fn walk_continuously(&self, heading: f64, speed: f64) -> Result<(), DriverError> {
        self.push(MotionCommand::Walk { heading, speed });
        Ok(())
    }

    async fn stop_walking_continuously(&self) -> Result<(), DriverError> {
        self.push(MotionCommand::StopWalking);
        Ok(())
    }

    async fn relax_legs(&self) -> Result<(), DriverError> {
        self.push(MotionCommand::RelaxLegs);
        Ok(())
    }

    async fn relax(&self) -> Result<(), DriverError> {
        self.push(MotionCommand::Relax);
        Ok(())
    }

    async fn move_leg(&self, leg: u8, position: LegPosition, duration_ms: u64) -> Result<(), DriverError> {
        self.push(MotionCommand::MoveLeg { leg, position, duration_ms });
        Ok(())
    }

    async fn move_joint(&self, leg: u8, joint: u8, angle_deg: f64, duration_ms: u64) -> Result<(), DriverError> {
        self.push(MotionCommand::MoveJoint { leg, joint, angle_deg, duration_ms });
        Ok(())
    }
}

/// Distance sensor replaying a time series.
///
/// Sample `i` is what the sensor sees during `[i * period, (i + 1) * period)`
/// measured from the first read. `None` samples fail the read. Past the end
/// the last sample holds, or the series wraps when built with [`cycling`].
///
/// [`cycling`]: TimelineDistance::cycling
#[derive(Debug)]
pub struct TimelineDistance {
    samples: Vec<Option<f64>>,
    period: Duration,
    cycle: bool,
    available: bool,
    origin: Mutex<Option<Instant>>,
    reads: AtomicUsize,
}

impl TimelineDistance {
    pub fn new(samples: Vec<Option<f64>>, period: Duration) -> Self {
        Self {
            samples,
            period,
            cycle: false,
            available: true,
            origin: Mutex::new(None),
            reads: AtomicUsize::new(0),
        }
    }

    pub fn from_millimeters(samples: &[f64], period: Duration) -> Self {
        Self::new(samples.iter().copied().map(Some).collect(), period)
    }

    pub fn constant(mm: f64) -> Self {
        Self::new(vec![Some(mm)], Duration::from_millis(1))
    }

    pub fn cycling(samples: Vec<Option<f64>>, period: Duration) -> Self {
        Self {
            cycle: true,
            ..Self::new(samples, period)
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::constant(f64::MAX)
        }
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn sample_index(&self, elapsed: Duration) -> usize {
        let period = self.period.as_nanos().max(1);
        let raw = (elapsed.as_nanos() / period) as usize;
        if self.cycle {
            raw % self.samples.len()
        } else {
            raw.min(self.samples.len() - 1)
        }
    }
}

#[async_trait]
impl DistanceSensor for TimelineDistance {
    async fn start(&self) -> Result<(), DriverError> {
        if !self.available {
            return Err(DriverError::StartFailed {
                driver: "distance",
                reason: "no sensor on i2c bus".to_string(),
            });
        }
        Ok(())
    }

    fn available(&self) -> bool {
        self.available
    }

    async fn read_millimeters(&self) -> Result<f64, DriverError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.samples.is_empty() {
            return Err(DriverError::ReadFailed("no samples".to_string()));
        }
        let now = Instant::now();
        let origin = *lock(&self.origin).get_or_insert(now);
        match self.samples[self.sample_index(now - origin)] {
            Some(mm) => Ok(mm),
            None => Err(DriverError::ReadFailed("echo timeout".to_string())),
        }
    }

    async fn close(&self) -> Result<(), DriverError> {
        Ok(())
    }
}

/// Camera that plays a script of frames, then produces blank frames forever.
///
/// `None` entries in the script fail that capture.
#[derive(Debug)]
pub struct ScriptedCamera {
    script: Mutex<VecDeque<Option<Frame>>>,
    width: u32,
    height: u32,
    available: bool,
    captures: AtomicUsize,
}

impl ScriptedCamera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            width,
            height,
            available: true,
            captures: AtomicUsize::new(0),
        }
    }

    pub fn with_script(self, script: Vec<Option<Frame>>) -> Self {
        *lock(&self.script) = script.into();
        self
    }

    /// Fail the capture at each of the given zero-based tick indices.
    pub fn failing_at(self, ticks: &[usize]) -> Self {
        let last = ticks.iter().copied().max().map_or(0, |t| t + 1);
        let script = (0..last)
            .map(|i| {
                if ticks.contains(&i) {
                    None
                } else {
                    Some(DynamicImage::new_rgb8(self.width, self.height))
                }
            })
            .collect();
        self.with_script(script)
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new(1, 1)
        }
    }

    pub fn captures(&self) -> usize {
        self.captures.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Camera for ScriptedCamera {
    async fn start(&self) -> Result<(), DriverError> {
        Ok(())
    }

    fn available(&self) -> bool {
        self.available
    }

    async fn capture_frame(&self) -> Result<Frame, DriverError> {
        self.captures.fetch_add(1, Ordering::SeqCst);
        match lock(&self.script).pop_front() {
            Some(Some(frame)) => Ok(frame),
            Some(None) => Err(DriverError::CaptureFailed("sensor returned no data".to_string())),
            None => Ok(DynamicImage::new_rgb8(self.width, self.height)),
        }
    }
}

#[derive(Debug)]
enum Pattern {
    Script(Mutex<VecDeque<usize>>),
    Every(usize),
}

/// Classifier that reports a scripted number of faces per call.
#[derive(Debug)]
pub struct ScriptedClassifier {
    pattern: Pattern,
    calls: AtomicUsize,
}

impl ScriptedClassifier {
    /// Report `counts[i]` faces on call `i`, then none.
    pub fn new(counts: Vec<usize>) -> Self {
        Self {
            pattern: Pattern::Script(Mutex::new(counts.into())),
            calls: AtomicUsize::new(0),
        }
    }

    /// Never sees a face.
    pub fn blind() -> Self {
        Self::new(Vec::new())
    }

    /// One face on every `n`th call.
    pub fn every(n: usize) -> Self {
        Self {
            pattern: Pattern::Every(n.max(1)),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl FaceClassifier for ScriptedClassifier {
    fn detect(&self, frame: &Frame) -> Vec<Region> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let count = match &self.pattern {
            Pattern::Script(script) => lock(script).pop_front().unwrap_or(0),
            Pattern::Every(n) => usize::from(call % n == 0),
        };
        let (w, h) = (frame.width() / 4, frame.height() / 4);
        (0..count as u32)
            .map(|i| Region { x: i * w, y: 0, width: w, height: h })
            .collect()
    }
}

/// Remote link backed by an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelLink {
    tx: mpsc::UnboundedSender<String>,
}

impl ChannelLink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl RemoteLink for ChannelLink {
    async fn send_string(&self, message: String) -> Result<(), DriverError> {
        self.tx.send(message).map_err(|_| DriverError::LinkClosed)
    }
}
