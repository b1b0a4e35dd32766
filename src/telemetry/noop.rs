//! No-operation telemetry implementation with zero overhead.

use std::marker::PhantomData;

use async_trait::async_trait;
use chrono::Utc;

use super::error::TelemetryError;
use super::traits::{Telemetry, TelemetryEvent};
use super::types::TelemetrySnapshot;

/// Telemetry sink that discards every event with zero overhead.
///
/// The default for production use when an embedder does not consume
/// telemetry: all methods are `#[inline(always)]` no-ops.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTelemetry<E: TelemetryEvent> {
    _phantom: PhantomData<E>,
}

impl<E: TelemetryEvent> NoopTelemetry<E> {
    /// Creates a new no-op telemetry sink.
    #[inline(always)]
    pub fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

#[async_trait]
impl<E: TelemetryEvent> Telemetry<E> for NoopTelemetry<E> {
    #[inline(always)]
    async fn record(&self, _event: E) -> Result<(), TelemetryError> {
        Ok(())
    }

    #[inline(always)]
    async fn snapshot(&self) -> Result<TelemetrySnapshot<E>, TelemetryError> {
        Ok(TelemetrySnapshot {
            timestamp: Utc::now(),
            total_events: 0,
            trace_count: 0,
            debug_count: 0,
            info_count: 0,
            warning_count: 0,
            error_count: 0,
            critical_count: 0,
            recent_events: Vec::new(),
        })
    }

    #[inline(always)]
    async fn reset(&self) -> Result<(), TelemetryError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::types::{ExecutorEvent, ExecutorEventKind};

    #[tokio::test]
    #[allow(clippy::expect_used)]
    async fn test_noop_ignores_events() {
        let telemetry = NoopTelemetry::<ExecutorEvent>::new();
        for _ in 0..10 {
            telemetry
                .record(ExecutorEvent::now(ExecutorEventKind::Quiescent))
                .await
                .expect("record should succeed");
        }

        let snapshot = telemetry.snapshot().await.expect("snapshot should succeed");
        assert_eq!(snapshot.total_events, 0);
    }

    #[tokio::test]
    #[allow(clippy::expect_used)]
    async fn test_noop_reset_always_succeeds() {
        let telemetry = NoopTelemetry::<ExecutorEvent>::new();
        telemetry.reset().await.expect("reset should succeed");
    }
}
