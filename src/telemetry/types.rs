//! Telemetry event types and configuration structures.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::traits::{EventSeverity, TelemetryEvent};
use crate::bundle::Key;
use crate::util::{BundleId, ExecutorTaskId, TransformId};

/// Configuration for telemetry behavior (§10.2).
#[derive(Debug, Clone, Serialize)]
pub struct TelemetryConfig {
    /// Whether telemetry recording is enabled.
    pub enabled: bool,

    /// Maximum number of events to keep in history.
    pub max_history_size: usize,

    /// Minimum severity to record; events below this are filtered.
    pub severity_filter: EventSeverity,

    /// Interval for periodic snapshot generation, if the embedder polls on
    /// a timer rather than on demand.
    #[serde(with = "crate::util::duration_serde")]
    pub snapshot_interval: Duration,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_history_size: 1000,
            severity_filter: EventSeverity::Info,
            snapshot_interval: Duration::from_secs(60),
        }
    }
}

/// Snapshot of telemetry state at a point in time.
#[derive(Debug, Clone, Serialize)]
pub struct TelemetrySnapshot<E: TelemetryEvent> {
    /// When the snapshot was taken.
    pub timestamp: DateTime<Utc>,
    /// Total events recorded since the last reset.
    pub total_events: u64,
    /// Count of trace-level events.
    pub trace_count: u64,
    /// Count of debug-level events.
    pub debug_count: u64,
    /// Count of info-level events.
    pub info_count: u64,
    /// Count of warning-level events.
    pub warning_count: u64,
    /// Count of error-level events.
    pub error_count: u64,
    /// Count of critical-level events.
    pub critical_count: u64,
    /// Recent events, bounded by `max_history_size`.
    pub recent_events: Vec<E>,
}

// ============================================================================
// Executor events
// ============================================================================

/// Telemetry events emitted by the executor's own control loop.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutorEvent {
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// The specific event.
    pub kind: ExecutorEventKind,
}

impl TelemetryEvent for ExecutorEvent {
    const EVENT_TYPE: &'static str = "executor";

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    fn severity(&self) -> EventSeverity {
        match &self.kind {
            ExecutorEventKind::Dispatched { .. } => EventSeverity::Debug,
            ExecutorEventKind::TimerFired { .. } => EventSeverity::Debug,
            ExecutorEventKind::TaskCompleted { .. } => EventSeverity::Trace,
            ExecutorEventKind::QueueDisplaced { .. } => EventSeverity::Warning,
            ExecutorEventKind::Quiescent => EventSeverity::Info,
            ExecutorEventKind::RootInjected { .. } => EventSeverity::Debug,
            ExecutorEventKind::Failed { .. } => EventSeverity::Error,
        }
    }
}

impl ExecutorEvent {
    /// Build an event with the current timestamp.
    pub fn now(kind: ExecutorEventKind) -> Self {
        Self {
            timestamp: Utc::now(),
            kind,
        }
    }
}

/// Specific kinds of executor lifecycle events.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ExecutorEventKind {
    /// A bundle was dispatched to a consumer transform.
    Dispatched {
        /// The consuming transform.
        transform: TransformId,
        /// The key, if the target collection is keyed.
        key: Option<Key>,
    },

    /// A timer fired and was synthesized into a keyed bundle (§4.5b).
    TimerFired {
        /// The owning transform.
        transform: TransformId,
        /// The key the timer was set for.
        key: Key,
    },

    /// A `TransformExecutor` task finished (success or failure).
    TaskCompleted {
        /// The task's id in the scheduled-set.
        task: ExecutorTaskId,
        /// The transform that was evaluated.
        transform: TransformId,
        /// Whether the evaluation succeeded.
        succeeded: bool,
    },

    /// The bounded visible-update queue displaced an entry to make room.
    QueueDisplaced {
        /// The bundle (if any) associated with the displaced entry.
        displaced_bundle: Option<BundleId>,
    },

    /// The evaluation context reported `isDone`; the pool is shutting down.
    Quiescent,

    /// A root transform was scheduled with a null bundle to inject work
    /// (§4.5c root-injection rule).
    RootInjected {
        /// The root transform.
        transform: TransformId,
    },

    /// A visible failure was published.
    Failed {
        /// The transform whose evaluation failed, if known.
        transform: Option<TransformId>,
        /// The error message.
        message: String,
    },
}
