//! The `Monitor` control loop (§4.5): the single logical task that drains
//! updates, fires timers, checks quiescence, and re-submits itself.

// Layer 1: Standard library imports
use std::sync::Arc;

// Layer 2: Third-party crate imports
use dashmap::DashSet;
use tracing::{debug, error, instrument, warn};

// Layer 3: Internal module imports
use crate::bundle::{Bundle, WindowedValue};
use crate::callback::Callback;
use crate::context::{EvaluationContext, TimerWorkItem};
use crate::dispatcher::Dispatcher;
use crate::error::ExecutorError;
use crate::graph::GraphMetadata;
use crate::pool::ExecutorService;
use crate::telemetry::{ExecutorEvent, ExecutorEventKind, Telemetry};
use crate::update::{BoundedVisibleQueue, ExecutorUpdate, InternalUpdateQueue, VisibleUpdate};
use crate::util::ExecutorTaskId;

/// Outcome of a single tick, deciding whether the monitor re-submits itself.
enum TickOutcome {
    /// Neither done nor failed: re-submit for another tick.
    Continue,
    /// Quiescence reached: publish `Done`, shut down the pool, stop.
    Done,
    /// The monitor's own tick failed unexpectedly (§7 kind 3): publish a
    /// failure and stop without rescheduling.
    Fatal(ExecutorError),
}

/// Single-threaded-in-effect control loop (§4.5): at most one tick runs at
/// a time, re-submitted to the shared pool after each one completes.
pub struct Monitor {
    dispatcher: Arc<Dispatcher>,
    context: Arc<dyn EvaluationContext>,
    pool: Arc<dyn ExecutorService>,
    graph: Arc<GraphMetadata>,
    internal_queue: Arc<InternalUpdateQueue>,
    visible_queue: Arc<BoundedVisibleQueue>,
    scheduled: Arc<DashSet<ExecutorTaskId>>,
    telemetry: Arc<dyn Telemetry<ExecutorEvent>>,
}

impl Monitor {
    /// Construct a monitor over its collaborators. Does not start ticking
    /// until `start` is called.
    pub fn new(
        dispatcher: Arc<Dispatcher>,
        context: Arc<dyn EvaluationContext>,
        pool: Arc<dyn ExecutorService>,
        graph: Arc<GraphMetadata>,
        internal_queue: Arc<InternalUpdateQueue>,
        visible_queue: Arc<BoundedVisibleQueue>,
        scheduled: Arc<DashSet<ExecutorTaskId>>,
        telemetry: Arc<dyn Telemetry<ExecutorEvent>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            dispatcher,
            context,
            pool,
            graph,
            internal_queue,
            visible_queue,
            scheduled,
            telemetry,
        })
    }

    /// Submit the first tick to the pool. Non-blocking (§6 `start`).
    pub fn start(self: &Arc<Self>) {
        let monitor = Arc::clone(self);
        // Submission failure here means the pool is already shut down,
        // which can only happen before `start` is ever called; nothing
        // useful to do but drop the monitor.
        let _ = self.pool.submit(Box::pin(async move {
            monitor.run_loop().await;
        }));
    }

    /// Run one tick and, unless quiescent or fatally failed, re-submit
    /// itself to the pool (§4.5 "Rescheduling" — no recursion, no pinned
    /// thread, just a self-resubmitting task per §9).
    async fn run_loop(self: Arc<Self>) {
        match self.tick().await {
            TickOutcome::Continue => {
                let monitor = Arc::clone(&self);
                let _ = self.pool.submit(Box::pin(async move {
                    monitor.run_loop().await;
                }));
            }
            TickOutcome::Done => {}
            TickOutcome::Fatal(error) => {
                self.publish_failure(Arc::new(error), None).await;
            }
        }
    }

    #[instrument(skip(self))]
    async fn tick(&self) -> TickOutcome {
        self.drain_one_update().await;

        if let Err(error) = self.fire_timers() {
            error!(error = %error, "timer extraction failed");
            return TickOutcome::Fatal(ExecutorError::Context(error.to_string()));
        }

        if self.context.is_done() {
            debug!("quiescence reached");
            let _ = self
                .telemetry
                .record(ExecutorEvent::now(ExecutorEventKind::Quiescent))
                .await;
            self.visible_queue.push(VisibleUpdate::Done);
            self.pool.shutdown().await;
            return TickOutcome::Done;
        }

        if self.internal_queue.is_empty() && self.scheduled.is_empty() {
            // Active-count quiescence heuristic (§9): nothing in flight and
            // nothing queued, but the context does not yet report done.
            // Re-inject work at every root.
            for &root in self.graph.roots() {
                let _ = self
                    .telemetry
                    .record(ExecutorEvent::now(ExecutorEventKind::RootInjected {
                        transform: root,
                    }))
                    .await;
                if let Err(dispatch_error) =
                    self.dispatcher
                        .schedule_consumption(root, None, Callback::Default)
                {
                    return TickOutcome::Fatal(ExecutorError::from(dispatch_error));
                }
            }
        }

        TickOutcome::Continue
    }

    async fn drain_one_update(&self) {
        match self.internal_queue.pop() {
            Some(ExecutorUpdate::Produced { transform, bundle }) => {
                debug!(transform = %transform, "dispatching produced bundle");
                if let Err(dispatch_error) = self.dispatcher.dispatch_produced(&bundle) {
                    self.publish_failure(
                        Arc::new(ExecutorError::from(dispatch_error)),
                        Some(transform),
                    )
                    .await;
                }
            }
            Some(ExecutorUpdate::Failed { transform, error }) => {
                error!(transform = %transform, error = %error, "transform failed");
                self.publish_failure(error, Some(transform)).await;
            }
            None => {}
        }
    }

    fn fire_timers(&self) -> Result<(), crate::context::ContextError> {
        let fired = self.context.extract_fired_timers()?;

        for (transform, by_key) in fired {
            for (key, by_domain) in by_key {
                let timers: Vec<_> = by_domain.into_values().flatten().collect();
                if timers.is_empty() {
                    continue;
                }

                debug!(transform = %transform, key = %key, count = timers.len(), "firing timers");

                let work_item = TimerWorkItem {
                    key: key.clone(),
                    timers: timers.clone(),
                };
                let bundle = Bundle::builder(
                    self.graph
                        .node(transform)
                        .and_then(crate::graph::TransformNode::input)
                        .unwrap_or_else(crate::util::CollectionId::new),
                )
                .key(key.clone())
                .push(WindowedValue::new(work_item, chrono::Utc::now()))
                .build();

                if self
                    .dispatcher
                    .schedule_timer(transform, key, bundle, Arc::new(timers))
                    .is_err()
                {
                    warn!(transform = %transform, "timer dispatch rejected, pool likely shutting down");
                }
            }
        }

        Ok(())
    }

    async fn publish_failure(
        &self,
        error: Arc<ExecutorError>,
        transform: Option<crate::util::TransformId>,
    ) {
        let _ = self
            .telemetry
            .record(ExecutorEvent::now(ExecutorEventKind::Failed {
                transform,
                message: error.to_string(),
            }))
            .await;
        self.visible_queue.push(VisibleUpdate::Failed { error, transform });
    }
}
