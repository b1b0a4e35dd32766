//! Ambient telemetry system (§10.1): a typed, in-process event recorder for
//! the executor's own lifecycle, separate from `tracing` spans/events which
//! are emitted directly at the call sites that need them.

pub mod error;
pub mod in_memory;
pub mod noop;
pub mod traits;
pub mod types;

pub use error::TelemetryError;
pub use in_memory::InMemoryTelemetry;
pub use noop::NoopTelemetry;
pub use traits::{EventSeverity, Telemetry, TelemetryEvent};
pub use types::{ExecutorEvent, ExecutorEventKind, TelemetryConfig, TelemetrySnapshot};
