//! The `Dispatcher` (§4.4): stateless per-bundle routing to the right
//! admitter, with race-free fetch-or-create of serial admission slots.

// Layer 1: Standard library imports
use std::sync::Arc;

// Layer 2: Third-party crate imports
use dashmap::{DashMap, DashSet};
use thiserror::Error;

// Layer 3: Internal module imports
use crate::bundle::Bundle;
use crate::callback::Callback;
use crate::context::{EvaluationContext, EvaluatorRegistry};
use crate::executor::{ExecutorContext, ParallelExecutorService, SerialExecutorService};
use crate::graph::{GraphMetadata, StepAndKey};
use crate::pool::{ExecutorService, PoolError};
use crate::update::InternalUpdateQueue;
use crate::util::{ExecutorTaskId, TransformId};

/// Errors raised by the dispatcher's routing/admission step.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The worker pool rejected the submission (already shutting down, or
    /// the task itself failed to enqueue).
    #[error("pool rejected submission: {0}")]
    Pool(#[from] PoolError),
}

/// Routes `(consumer, bundle)` pairs to the parallel admitter or the
/// per-`StepAndKey` serial admitter (§4.4).
pub struct Dispatcher {
    graph: Arc<GraphMetadata>,
    parallel: Arc<ParallelExecutorService>,
    serial: DashMap<StepAndKey, Arc<SerialExecutorService>>,
    pool: Arc<dyn ExecutorService>,
    registry: Arc<dyn EvaluatorRegistry>,
    context: Arc<dyn EvaluationContext>,
    internal_queue: Arc<InternalUpdateQueue>,
    scheduled: Arc<DashSet<ExecutorTaskId>>,
}

impl Dispatcher {
    /// Construct a dispatcher over a fixed graph, sharing the scheduled-set
    /// with whichever `EvaluationContext` computes `is_done` (§9).
    pub fn new(
        graph: Arc<GraphMetadata>,
        pool: Arc<dyn ExecutorService>,
        registry: Arc<dyn EvaluatorRegistry>,
        context: Arc<dyn EvaluationContext>,
        internal_queue: Arc<InternalUpdateQueue>,
        scheduled: Arc<DashSet<ExecutorTaskId>>,
    ) -> Self {
        let parallel = ParallelExecutorService::new(ExecutorContext {
            pool: Arc::clone(&pool),
            registry: Arc::clone(&registry),
            context: Arc::clone(&context),
            internal_queue: Arc::clone(&internal_queue),
            scheduled: Arc::clone(&scheduled),
        });

        Self {
            graph,
            parallel,
            serial: DashMap::new(),
            pool,
            registry,
            context,
            internal_queue,
            scheduled,
        }
    }

    /// Schedule `bundle` into `consumer`, choosing the parallel or keyed
    /// serial admitter per §4.4.
    ///
    /// A `None` bundle (root injection) always routes through the parallel
    /// admitter, regardless of the consumer's keyed-ness (§9 resolved open
    /// question).
    pub fn schedule_consumption(
        &self,
        consumer: TransformId,
        bundle: Option<Bundle>,
        callback: Callback,
    ) -> Result<(), DispatchError> {
        let keyed_key = bundle
            .as_ref()
            .filter(|b| self.graph.is_keyed(b.collection()))
            .and_then(Bundle::key)
            .cloned();

        match keyed_key {
            Some(key) => {
                let slot = StepAndKey::new(consumer, key);
                let admitter = self.serial_admitter_for(slot);
                admitter.schedule(bundle, callback)?;
            }
            None => {
                self.parallel.schedule(consumer, bundle, callback)?;
            }
        }
        Ok(())
    }

    /// Dispatch a freshly committed bundle to every consumer of its
    /// collection, via the default completion callback (§4.5a).
    pub fn dispatch_produced(&self, bundle: &Bundle) -> Result<(), DispatchError> {
        for &consumer in self.graph.consumers_of(bundle.collection()) {
            self.schedule_consumption(consumer, Some(bundle.clone()), Callback::Default)?;
        }
        Ok(())
    }

    fn serial_admitter_for(&self, slot: StepAndKey) -> Arc<SerialExecutorService> {
        let transform = slot.transform();
        // `DashMap::entry` holds the shard lock for the duration of the
        // closure, so concurrent dispatches for the same slot converge on a
        // single admitter (§4.4 "fetch-or-create must be race-free").
        Arc::clone(
            self.serial
                .entry(slot)
                .or_insert_with(|| {
                    SerialExecutorService::new(
                        ExecutorContext {
                            pool: Arc::clone(&self.pool),
                            registry: Arc::clone(&self.registry),
                            context: Arc::clone(&self.context),
                            internal_queue: Arc::clone(&self.internal_queue),
                            scheduled: Arc::clone(&self.scheduled),
                        },
                        transform,
                    )
                })
                .value(),
        )
    }

    /// Number of distinct serial admission slots created so far, for tests.
    pub fn serial_slot_count(&self) -> usize {
        self.serial.len()
    }

    /// Schedule a synthesized timer bundle directly into the per-key serial
    /// admitter for `(transform, key)`, bypassing the keyed-collection check
    /// in `schedule_consumption` — timer work is inherently keyed (§4.5b).
    pub fn schedule_timer(
        &self,
        transform: TransformId,
        key: crate::bundle::Key,
        bundle: Bundle,
        timers: Arc<Vec<crate::context::TimerData>>,
    ) -> Result<(), DispatchError> {
        let slot = StepAndKey::new(transform, key);
        self.serial_admitter_for(slot)
            .schedule(Some(bundle), Callback::Timer(timers))?;
        Ok(())
    }
}
