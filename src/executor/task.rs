//! `TransformExecutor` (§4.1): a one-shot unit of work evaluating one
//! `(transform, input bundle)` pair.

// Layer 1: Standard library imports
use std::sync::Arc;

// Layer 2: Third-party crate imports
use tracing::{debug, error};

// Layer 3: Internal module imports
use super::admitter::Admitter;
use crate::bundle::Bundle;
use crate::callback::Callback;
use crate::context::{EvaluationContext, EvaluatorRegistry};
use crate::error::ExecutorError;
use crate::update::{ExecutorUpdate, InternalUpdateQueue};
use crate::util::{ExecutorTaskId, TransformId};

/// A one-shot task bundling `(registry, context, input bundle?, transform,
/// callback, admitter)` (§4.1).
pub struct TransformExecutor {
    task_id: ExecutorTaskId,
    transform: TransformId,
    input_bundle: Option<Bundle>,
    callback: Callback,
    registry: Arc<dyn EvaluatorRegistry>,
    context: Arc<dyn EvaluationContext>,
    internal_queue: Arc<InternalUpdateQueue>,
    admitter: Arc<dyn Admitter>,
}

impl TransformExecutor {
    /// Construct a new task. Not run until `run` is awaited (typically by
    /// the pool the admitter submits it to).
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        task_id: ExecutorTaskId,
        transform: TransformId,
        input_bundle: Option<Bundle>,
        callback: Callback,
        registry: Arc<dyn EvaluatorRegistry>,
        context: Arc<dyn EvaluationContext>,
        internal_queue: Arc<InternalUpdateQueue>,
        admitter: Arc<dyn Admitter>,
    ) -> Self {
        Self {
            task_id,
            transform,
            input_bundle,
            callback,
            registry,
            context,
            internal_queue,
            admitter,
        }
    }

    /// Run the evaluator to completion, post exactly one `ExecutorUpdate`,
    /// and unconditionally notify the admitter (§4.1).
    ///
    /// All exceptions raised by the user-provided evaluator are caught here
    /// and never escape to the pool (§4.1 Failure semantics).
    pub async fn run(self) {
        let outcome = self.evaluate();

        // Only a `Default`-callback bundle ever incremented `outstanding`
        // (via `handle_result`'s commit-time fan-out accounting, §10.5). A
        // `Timer` bundle is synthesized directly by the monitor and never
        // went through that accounting, so releasing it here would
        // underflow `outstanding` and wedge `is_done` forever.
        if self.input_bundle.is_some() && matches!(self.callback, Callback::Default) {
            self.context.note_consumed();
        }

        let update = match outcome {
            Ok(result) => {
                let fired_timers = self.callback.fired_timers();
                match self.context.handle_result(
                    self.transform,
                    self.input_bundle.as_ref(),
                    &fired_timers,
                    result,
                ) {
                    Ok(bundles) => {
                        debug!(
                            transform = %self.transform,
                            produced = bundles.len(),
                            "transform evaluation committed",
                        );
                        for bundle in bundles {
                            self.internal_queue.push(ExecutorUpdate::Produced {
                                transform: self.transform,
                                bundle,
                            });
                        }
                        None
                    }
                    Err(context_error) => Some(ExecutorError::Context(context_error.to_string())),
                }
            }
            Err(evaluator_error) => {
                error!(
                    transform = %self.transform,
                    error = %evaluator_error,
                    "transform evaluation failed",
                );
                Some(ExecutorError::evaluator(self.transform, evaluator_error))
            }
        };

        if let Some(error) = update {
            self.internal_queue.push(ExecutorUpdate::Failed {
                transform: self.transform,
                error: Arc::new(error),
            });
        }

        self.admitter.notify_complete(self.task_id);
    }

    fn evaluate(&self) -> Result<crate::context::TransformResult, crate::error::EvaluatorError> {
        let mut evaluator = self
            .registry
            .evaluator_for(self.transform, self.input_bundle.as_ref())
            .map_err(|err| Box::new(err) as crate::error::EvaluatorError)?;

        evaluator.start(self.input_bundle.as_ref())?;

        if let Some(bundle) = &self.input_bundle {
            let key = bundle.key();
            for value in bundle.values() {
                evaluator.process_element(value, key)?;
            }
        }

        evaluator.finish()
    }
}
