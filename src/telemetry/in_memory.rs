//! In-memory telemetry implementation with lock-free atomic counters.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::Utc;

use super::error::TelemetryError;
use super::traits::{EventSeverity, Telemetry, TelemetryEvent};
use super::types::{TelemetryConfig, TelemetrySnapshot};

/// In-memory telemetry recorder: atomic counters plus a bounded ring buffer
/// of recent events.
///
/// Uses the `Arc<Inner>` cheap-clone pattern: all clones share the same
/// underlying counters and history.
#[derive(Debug)]
pub struct InMemoryTelemetry<E: TelemetryEvent> {
    inner: Arc<Inner<E>>,
}

#[derive(Debug)]
struct Inner<E: TelemetryEvent> {
    config: TelemetryConfig,
    total_events: AtomicU64,
    trace_count: AtomicU64,
    debug_count: AtomicU64,
    info_count: AtomicU64,
    warning_count: AtomicU64,
    error_count: AtomicU64,
    critical_count: AtomicU64,
    history: RwLock<VecDeque<E>>,
}

impl<E: TelemetryEvent> InMemoryTelemetry<E> {
    /// Create a new in-memory telemetry recorder with the given config.
    pub fn new(config: TelemetryConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                total_events: AtomicU64::new(0),
                trace_count: AtomicU64::new(0),
                debug_count: AtomicU64::new(0),
                info_count: AtomicU64::new(0),
                warning_count: AtomicU64::new(0),
                error_count: AtomicU64::new(0),
                critical_count: AtomicU64::new(0),
                history: RwLock::new(VecDeque::new()),
            }),
        }
    }

    fn increment_severity_counter(&self, severity: EventSeverity) {
        match severity {
            EventSeverity::Trace => self.inner.trace_count.fetch_add(1, Ordering::Relaxed),
            EventSeverity::Debug => self.inner.debug_count.fetch_add(1, Ordering::Relaxed),
            EventSeverity::Info => self.inner.info_count.fetch_add(1, Ordering::Relaxed),
            EventSeverity::Warning => self.inner.warning_count.fetch_add(1, Ordering::Relaxed),
            EventSeverity::Error => self.inner.error_count.fetch_add(1, Ordering::Relaxed),
            EventSeverity::Critical => self.inner.critical_count.fetch_add(1, Ordering::Relaxed),
        };
    }
}

impl<E: TelemetryEvent> Clone for InMemoryTelemetry<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl<E: TelemetryEvent> Telemetry<E> for InMemoryTelemetry<E> {
    async fn record(&self, event: E) -> Result<(), TelemetryError> {
        if !self.inner.config.enabled {
            return Ok(());
        }

        let severity = event.severity();
        if severity < self.inner.config.severity_filter {
            return Ok(());
        }

        self.inner.total_events.fetch_add(1, Ordering::Relaxed);
        self.increment_severity_counter(severity);

        let mut history = self
            .inner
            .history
            .write()
            .map_err(|e| TelemetryError::record(format!("failed to acquire write lock: {e}")))?;

        if history.len() >= self.inner.config.max_history_size {
            history.pop_front();
        }
        history.push_back(event);

        Ok(())
    }

    async fn snapshot(&self) -> Result<TelemetrySnapshot<E>, TelemetryError> {
        let history = self
            .inner
            .history
            .read()
            .map_err(|e| TelemetryError::snapshot(format!("failed to acquire read lock: {e}")))?;

        Ok(TelemetrySnapshot {
            timestamp: Utc::now(),
            total_events: self.inner.total_events.load(Ordering::Relaxed),
            trace_count: self.inner.trace_count.load(Ordering::Relaxed),
            debug_count: self.inner.debug_count.load(Ordering::Relaxed),
            info_count: self.inner.info_count.load(Ordering::Relaxed),
            warning_count: self.inner.warning_count.load(Ordering::Relaxed),
            error_count: self.inner.error_count.load(Ordering::Relaxed),
            critical_count: self.inner.critical_count.load(Ordering::Relaxed),
            recent_events: history.iter().cloned().collect(),
        })
    }

    async fn reset(&self) -> Result<(), TelemetryError> {
        self.inner.total_events.store(0, Ordering::Relaxed);
        self.inner.trace_count.store(0, Ordering::Relaxed);
        self.inner.debug_count.store(0, Ordering::Relaxed);
        self.inner.info_count.store(0, Ordering::Relaxed);
        self.inner.warning_count.store(0, Ordering::Relaxed);
        self.inner.critical_count.store(0, Ordering::Relaxed);
        self.inner.error_count.store(0, Ordering::Relaxed);

        let mut history = self
            .inner
            .history
            .write()
            .map_err(|e| TelemetryError::reset(format!("failed to acquire write lock: {e}")))?;
        history.clear();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::types::{ExecutorEvent, ExecutorEventKind};

    #[tokio::test]
    #[allow(clippy::expect_used)]
    async fn test_record_and_snapshot() {
        let telemetry = InMemoryTelemetry::new(TelemetryConfig::default());
        telemetry
            .record(ExecutorEvent::now(ExecutorEventKind::Quiescent))
            .await
            .expect("record should succeed");

        let snapshot = telemetry.snapshot().await.expect("snapshot should succeed");
        assert_eq!(snapshot.total_events, 1);
        assert_eq!(snapshot.info_count, 1);
    }

    #[tokio::test]
    #[allow(clippy::expect_used)]
    async fn test_severity_filter() {
        let config = TelemetryConfig {
            severity_filter: EventSeverity::Warning,
            ..TelemetryConfig::default()
        };
        let telemetry = InMemoryTelemetry::new(config);

        telemetry
            .record(ExecutorEvent::now(ExecutorEventKind::Quiescent))
            .await
            .expect("record should succeed");
        telemetry
            .record(ExecutorEvent::now(ExecutorEventKind::Failed {
                transform: None,
                message: "boom".into(),
            }))
            .await
            .expect("record should succeed");

        let snapshot = telemetry.snapshot().await.expect("snapshot should succeed");
        assert_eq!(snapshot.total_events, 1);
        assert_eq!(snapshot.error_count, 1);
    }

    #[tokio::test]
    #[allow(clippy::expect_used)]
    async fn test_ring_buffer_bounded() {
        let config = TelemetryConfig {
            max_history_size: 3,
            ..TelemetryConfig::default()
        };
        let telemetry = InMemoryTelemetry::new(config);

        for _ in 0..10 {
            telemetry
                .record(ExecutorEvent::now(ExecutorEventKind::Quiescent))
                .await
                .expect("record should succeed");
        }

        let snapshot = telemetry.snapshot().await.expect("snapshot should succeed");
        assert_eq!(snapshot.total_events, 10);
        assert_eq!(snapshot.recent_events.len(), 3);
    }

    #[tokio::test]
    #[allow(clippy::expect_used)]
    async fn test_reset() {
        let telemetry = InMemoryTelemetry::new(TelemetryConfig::default());
        telemetry
            .record(ExecutorEvent::now(ExecutorEventKind::Quiescent))
            .await
            .expect("record should succeed");
        telemetry.reset().await.expect("reset should succeed");

        let snapshot = telemetry.snapshot().await.expect("snapshot should succeed");
        assert_eq!(snapshot.total_events, 0);
    }

    #[tokio::test]
    #[allow(clippy::expect_used)]
    async fn test_clone_shares_state() {
        let telemetry1 = InMemoryTelemetry::new(TelemetryConfig::default());
        telemetry1
            .record(ExecutorEvent::now(ExecutorEventKind::Quiescent))
            .await
            .expect("record should succeed");

        let telemetry2 = telemetry1.clone();
        let snapshot = telemetry2.snapshot().await.expect("snapshot should succeed");
        assert_eq!(snapshot.total_events, 1);
    }

    #[tokio::test]
    #[allow(clippy::expect_used)]
    async fn test_disabled_telemetry_records_nothing() {
        let config = TelemetryConfig {
            enabled: false,
            ..TelemetryConfig::default()
        };
        let telemetry = InMemoryTelemetry::new(config);
        telemetry
            .record(ExecutorEvent::now(ExecutorEventKind::Quiescent))
            .await
            .expect("record should succeed");

        let snapshot = telemetry.snapshot().await.expect("snapshot should succeed");
        assert_eq!(snapshot.total_events, 0);
    }
}
