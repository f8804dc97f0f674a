use thiserror::Error;

/// Failures reported by hardware collaborators.
///
/// None of these are fatal to a reactive loop. Startup failures disable a
/// capability for the session, per-tick failures skip the tick.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DriverError {
    #[error("{0} driver is not available")]
    Unavailable(&'static str),
    #[error("{driver} failed to start: {reason}")]
    StartFailed { driver: &'static str, reason: String },
    #[error("distance read failed: {0}")]
    ReadFailed(String),
    #[error("frame capture failed: {0}")]
    CaptureFailed(String),
    #[error("locomotion command failed: {0}")]
    CommandFailed(String),
    #[error("remote link closed")]
    LinkClosed,
}
