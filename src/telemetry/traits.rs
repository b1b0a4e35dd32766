//! Core telemetry traits for observing the executor's own lifecycle.

use std::fmt::Debug;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::error::TelemetryError;
use super::types::TelemetrySnapshot;

/// Event severity levels for filtering and categorization.
///
/// Ordered from lowest to highest severity for filtering purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum EventSeverity {
    /// Trace-level events for detailed debugging.
    Trace,
    /// Debug-level events for development.
    Debug,
    /// Informational events for normal operation.
    Info,
    /// Warning events for potential issues (e.g. visible-queue displacement).
    Warning,
    /// Error events for failures.
    Error,
    /// Critical events for unrecoverable conditions.
    Critical,
}

/// Trait for events that can be observed through the telemetry system.
///
/// # Example
/// ```
/// use bundle_exec::telemetry::{TelemetryEvent, EventSeverity};
/// use chrono::{DateTime, Utc};
/// use serde::Serialize;
///
/// #[derive(Debug, Clone, Serialize)]
/// struct MyEvent {
///     timestamp: DateTime<Utc>,
/// }
///
/// impl TelemetryEvent for MyEvent {
///     const EVENT_TYPE: &'static str = "my_event";
///
///     fn timestamp(&self) -> DateTime<Utc> {
///         self.timestamp
///     }
///
///     fn severity(&self) -> EventSeverity {
///         EventSeverity::Info
///     }
/// }
/// ```
pub trait TelemetryEvent: Send + Sync + Clone + Debug + Serialize + 'static {
    /// Static event type identifier for categorization.
    const EVENT_TYPE: &'static str;

    /// When this event occurred.
    fn timestamp(&self) -> DateTime<Utc>;

    /// The severity level of this event.
    fn severity(&self) -> EventSeverity;
}

/// Generic telemetry trait for observing and recording events of type `E`.
///
/// Telemetry is purely observational (§10.1): implementations must never put
/// the caller on a blocking or fallible critical path for correctness. The
/// two shipped implementations are [`super::InMemoryTelemetry`] (bounded
/// history, for tests/debugging) and [`super::NoopTelemetry`] (zero
/// overhead, for production when telemetry isn't consumed).
///
/// Deliberately not `: Clone` — the executor core only ever holds this
/// behind `Arc<dyn Telemetry<E>>`, and `Clone`'s `fn clone(&self) -> Self`
/// would make the trait impossible to turn into a trait object. Both
/// shipped implementations still derive/implement `Clone` themselves for
/// callers that hold a concrete type.
#[async_trait]
pub trait Telemetry<E: TelemetryEvent>: Send + Sync {
    /// Records a telemetry event.
    async fn record(&self, event: E) -> Result<(), TelemetryError>;

    /// Produces a snapshot of the current telemetry state.
    async fn snapshot(&self) -> Result<TelemetrySnapshot<E>, TelemetryError>;

    /// Resets all counters and history.
    async fn reset(&self) -> Result<(), TelemetryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Serialize)]
    struct TestEvent {
        timestamp: DateTime<Utc>,
        severity: EventSeverity,
    }

    impl TelemetryEvent for TestEvent {
        const EVENT_TYPE: &'static str = "test_event";

        fn timestamp(&self) -> DateTime<Utc> {
            self.timestamp
        }

        fn severity(&self) -> EventSeverity {
            self.severity
        }
    }

    #[test]
    fn test_event_severity_ordering() {
        assert!(EventSeverity::Trace < EventSeverity::Debug);
        assert!(EventSeverity::Warning < EventSeverity::Error);
        assert!(EventSeverity::Error < EventSeverity::Critical);
    }

    #[test]
    fn test_telemetry_event_implementation() {
        let now = Utc::now();
        let event = TestEvent {
            timestamp: now,
            severity: EventSeverity::Info,
        };
        assert_eq!(event.timestamp(), now);
        assert_eq!(TestEvent::EVENT_TYPE, "test_event");
    }
}
