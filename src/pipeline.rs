//! The public surface of the core (§6): `start`, `awaitCompletion`, and
//! `scheduleConsumption`, wired on top of the dispatcher/monitor/queues.

// Layer 1: Standard library imports
use std::sync::Arc;

// Layer 2: Third-party crate imports
use dashmap::DashSet;

// Layer 3: Internal module imports
use crate::bundle::Bundle;
use crate::callback::Callback;
use crate::config::ExecutorConfig;
use crate::context::{EvaluationContext, EvaluatorRegistry};
use crate::dispatcher::Dispatcher;
use crate::error::ExecutorError;
use crate::graph::GraphMetadata;
use crate::monitor::Monitor;
use crate::pool::{ExecutorService, TokioExecutorService};
use crate::telemetry::{ExecutorEvent, Telemetry};
use crate::update::{BoundedVisibleQueue, InternalUpdateQueue, VisibleUpdate};
use crate::util::TransformId;

/// The in-process bundle executor (§2): owns the dispatcher, the monitor,
/// and the two update queues over a dedicated worker pool.
pub struct Executor {
    dispatcher: Arc<Dispatcher>,
    monitor: Arc<Monitor>,
    visible_queue: Arc<BoundedVisibleQueue>,
}

impl Executor {
    /// Wire an executor over a fixed graph and a pair of collaborators.
    /// Does not start running anything until `start` is called.
    pub fn new(
        graph: Arc<GraphMetadata>,
        registry: Arc<dyn EvaluatorRegistry>,
        context: Arc<dyn EvaluationContext>,
        config: &ExecutorConfig,
        telemetry: Arc<dyn Telemetry<ExecutorEvent>>,
    ) -> Result<Self, ExecutorError> {
        let pool = Arc::new(
            TokioExecutorService::new(config.worker_threads)
                .map_err(|err| ExecutorError::Shutdown(err.to_string()))?,
        ) as Arc<dyn ExecutorService>;

        let scheduled = Arc::new(DashSet::new());
        let internal_queue = Arc::new(InternalUpdateQueue::new());
        let visible_queue = Arc::new(BoundedVisibleQueue::new(config.visible_queue_capacity));

        let dispatcher = Arc::new(Dispatcher::new(
            Arc::clone(&graph),
            Arc::clone(&pool),
            registry,
            Arc::clone(&context),
            Arc::clone(&internal_queue),
            Arc::clone(&scheduled),
        ));

        let monitor = Monitor::new(
            Arc::clone(&dispatcher),
            context,
            Arc::clone(&pool),
            graph,
            internal_queue,
            Arc::clone(&visible_queue),
            scheduled,
            telemetry,
        );

        Ok(Self {
            dispatcher,
            monitor,
            visible_queue,
        })
    }

    /// Record `roots` and submit the monitor. Non-blocking (§6).
    pub fn start(&self, roots: &[TransformId]) -> Result<(), ExecutorError> {
        for &root in roots {
            self.dispatcher
                .schedule_consumption(root, None, Callback::Default)?;
        }
        self.monitor.start();
        Ok(())
    }

    /// Block until a terminal visible update arrives; rethrow on failure,
    /// return normally (pool already shut down) on success (§6).
    pub async fn await_completion(&self) -> Result<(), ExecutorError> {
        match self.visible_queue.pop().await {
            VisibleUpdate::Done => Ok(()),
            VisibleUpdate::Failed { error, .. } => {
                Err(Arc::try_unwrap(error).unwrap_or_else(|shared| {
                    ExecutorError::Shutdown(shared.to_string())
                }))
            }
        }
    }

    /// Dispatch `bundle` into `consumer` exactly as the monitor would
    /// (§6): primarily for roots and tests to seed work.
    pub fn schedule_consumption(
        &self,
        consumer: TransformId,
        bundle: Option<Bundle>,
        callback: Callback,
    ) -> Result<(), ExecutorError> {
        Ok(self
            .dispatcher
            .schedule_consumption(consumer, bundle, callback)?)
    }
}
