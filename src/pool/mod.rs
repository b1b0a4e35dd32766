//! The worker pool collaborator (§6 `ExecutorService`): runs submitted
//! `TransformExecutor` tasks on a bounded set of OS threads.

// Layer 1: Standard library imports
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

// Layer 2: Third-party crate imports
use thiserror::Error;
use tokio::runtime::{Builder, Runtime};
use tokio::task::JoinHandle;

// Layer 3: Internal module imports
// (none)

/// A boxed unit of work submitted to the pool.
pub type PoolTask = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Errors raised by an `ExecutorService` (§7 kind 4).
#[derive(Debug, Error)]
pub enum PoolError {
    /// The pool has already been shut down and rejects new submissions.
    #[error("pool is shut down")]
    ShuttingDown,

    /// A submitted task panicked or the runtime dropped its handle.
    #[error("submitted task failed to complete: {0}")]
    TaskFailed(String),
}

/// External collaborator (§6): accepts fire-and-forget async tasks and
/// reports when all of them have drained.
pub trait ExecutorService: Send + Sync {
    /// Submit a task for execution. Never blocks the caller.
    fn submit(&self, task: PoolTask) -> Result<(), PoolError>;

    /// Blocks (async) until every submitted task that has not yet completed
    /// does so, or `shutdown` has already been called.
    fn shutdown(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}

struct Inner {
    runtime: Option<Runtime>,
    handles: parking_lot::Mutex<Vec<JoinHandle<()>>>,
    shutting_down: std::sync::atomic::AtomicBool,
}

/// Tokio-backed [`ExecutorService`] (§5 Concurrency & Resource Model):
/// dedicated multi-threaded runtime sized by `worker_threads`, or the
/// Tokio default (CPU count) when `0`.
#[derive(Clone)]
pub struct TokioExecutorService {
    inner: Arc<Inner>,
}

impl TokioExecutorService {
    /// Build a pool with its own dedicated Tokio runtime.
    pub fn new(worker_threads: usize) -> Result<Self, PoolError> {
        let mut builder = Builder::new_multi_thread();
        builder.enable_all();
        if worker_threads > 0 {
            builder.worker_threads(worker_threads);
        }
        let runtime = builder
            .build()
            .map_err(|err| PoolError::TaskFailed(err.to_string()))?;

        Ok(Self {
            inner: Arc::new(Inner {
                runtime: Some(runtime),
                handles: parking_lot::Mutex::new(Vec::new()),
                shutting_down: std::sync::atomic::AtomicBool::new(false),
            }),
        })
    }

    fn is_shutting_down(&self) -> bool {
        self.inner
            .shutting_down
            .load(std::sync::atomic::Ordering::Acquire)
    }
}

impl ExecutorService for TokioExecutorService {
    fn submit(&self, task: PoolTask) -> Result<(), PoolError> {
        if self.is_shutting_down() {
            return Err(PoolError::ShuttingDown);
        }

        let runtime = self
            .inner
            .runtime
            .as_ref()
            .expect("runtime only taken during drop");
        let handle = runtime.spawn(task);
        self.inner.handles.lock().push(handle);
        Ok(())
    }

    fn shutdown(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            self.inner
                .shutting_down
                .store(true, std::sync::atomic::Ordering::Release);

            let handles: Vec<_> = std::mem::take(&mut *self.inner.handles.lock());
            for handle in handles {
                let _ = handle.await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_submitted_tasks_run() {
        let pool = TokioExecutorService::new(2).expect("pool should build");
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..8 {
            let counter = Arc::clone(&counter);
            pool.submit(Box::pin(async move {
                counter.fetch_add(1, Ordering::AcqRel);
            }))
            .expect("submit should succeed");
        }

        pool.shutdown().await;
        assert_eq!(counter.load(Ordering::Acquire), 8);
    }

    #[tokio::test]
    async fn test_rejects_submissions_after_shutdown() {
        let pool = TokioExecutorService::new(1).expect("pool should build");
        pool.shutdown().await;

        let result = pool.submit(Box::pin(async {}));
        assert!(matches!(result, Err(PoolError::ShuttingDown)));
    }
}
