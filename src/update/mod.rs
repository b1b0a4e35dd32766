//! Internal and visible update queues (§3, §5): the two message channels
//! that connect `TransformExecutor` completions to the monitor, and the
//! monitor to `awaitCompletion`.

// Layer 1: Standard library imports
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

// Layer 2: Third-party crate imports
use crossbeam_queue::SegQueue;
use parking_lot::Mutex;
use tokio::time::sleep;

// Layer 3: Internal module imports
use crate::bundle::Bundle;
use crate::error::ExecutorError;
use crate::util::TransformId;

/// Internal monitor message (§3): posted by a completion callback running on
/// a worker thread, drained by the monitor's own tick.
#[derive(Debug, Clone)]
pub enum ExecutorUpdate {
    /// A fresh output bundle committed while evaluating `transform`.
    Produced { transform: TransformId, bundle: Bundle },
    /// `transform`'s evaluator raised an error.
    Failed {
        transform: TransformId,
        error: Arc<ExecutorError>,
    },
}

/// External monitor message (§3) surfaced through `awaitCompletion`.
#[derive(Debug, Clone)]
pub enum VisibleUpdate {
    /// The pipeline has reached quiescence with nothing left to do.
    Done,
    /// A failure that terminates the pipeline, with the offending transform
    /// when one is attributable.
    Failed {
        error: Arc<ExecutorError>,
        transform: Option<TransformId>,
    },
}

impl VisibleUpdate {
    fn is_done(&self) -> bool {
        matches!(self, VisibleUpdate::Done)
    }
}

/// Multi-producer, single-consumer internal update queue (§5): lock-free,
/// unbounded — every `TransformExecutor` and the monitor itself push, only
/// the monitor pops.
#[derive(Default)]
pub struct InternalUpdateQueue {
    inner: SegQueue<ExecutorUpdate>,
}

impl InternalUpdateQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self {
            inner: SegQueue::new(),
        }
    }

    /// Push an update from a completion callback.
    pub fn push(&self, update: ExecutorUpdate) {
        self.inner.push(update);
    }

    /// Non-blocking pop, used by the monitor's drain step (§4.5a).
    pub fn pop(&self) -> Option<ExecutorUpdate> {
        self.inner.pop()
    }

    /// True iff no updates are queued — consulted for quiescence (§9).
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Bounded (default capacity 20, §5) single-producer (monitor),
/// single-consumer (`awaitCompletion`) visible-update queue.
///
/// On overflow, the oldest non-terminal entry is displaced first; a `Done`
/// update is never evicted (§9 "bounded visible queue with displacement").
pub struct BoundedVisibleQueue {
    capacity: usize,
    inner: Mutex<VecDeque<VisibleUpdate>>,
}

impl BoundedVisibleQueue {
    /// Create a queue bounded at `capacity` (must be > 0).
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Push an update, displacing an existing entry if the queue is full.
    pub fn push(&self, update: VisibleUpdate) {
        let mut queue = self.inner.lock();
        if queue.len() >= self.capacity {
            if let Some(pos) = queue.iter().position(|existing| !existing.is_done()) {
                queue.remove(pos);
            } else {
                // every queued entry is Done (degenerate, but don't grow
                // past capacity): drop the oldest.
                queue.pop_front();
            }
        }
        queue.push_back(update);
    }

    /// Pop the oldest update if one is queued, without blocking.
    pub fn try_pop(&self) -> Option<VisibleUpdate> {
        self.inner.lock().pop_front()
    }

    /// Blocks (async) until an update is available.
    pub async fn pop(&self) -> VisibleUpdate {
        loop {
            if let Some(update) = self.try_pop() {
                return update;
            }
            sleep(Duration::from_millis(1)).await;
        }
    }

    /// Current queue length, for diagnostics/tests.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// True iff no updates are queued.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}
