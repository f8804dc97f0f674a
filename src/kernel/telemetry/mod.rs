//! Observability for the reactive loops.
//!
//! Telemetry is write-only from the loops' point of view: nothing in the
//! control path reads it back. Events never carry frame content, only counts,
//! headings and identifiers.

pub mod event;
pub mod metrics;
pub mod recorder;

pub use event::{CommandKind, StopSource, TelemetryEvent};
pub use metrics::TelemetrySnapshot;
pub use recorder::{TelemetryRecorder, TelemetrySink};
