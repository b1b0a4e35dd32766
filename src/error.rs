//! Crate-root error type aggregating every failure kind the executor core
//! can surface (§7 Error Handling Design).

// Layer 1: Standard library imports
use std::error::Error as StdError;

// Layer 2: Third-party crate imports
use thiserror::Error;

// Layer 3: Internal module imports
use crate::dispatcher::DispatchError;
use crate::telemetry::TelemetryError;
use crate::util::TransformId;

/// A boxed, thread-safe error from user-provided evaluator code.
pub type EvaluatorError = Box<dyn StdError + Send + Sync + 'static>;

/// Top-level error surfaced through `awaitCompletion` (§6, §7).
///
/// Every variant maps to one of the four error kinds in §7: user-evaluator
/// failure, context failure, monitor internal failure, and pool
/// rejection/interrupt.
#[derive(Error, Debug)]
pub enum ExecutorError {
    /// Kind 1: the registry-provided evaluator threw while processing a
    /// bundle for `transform`. Non-retriable.
    #[error("transform {transform} failed: {source}")]
    Evaluator {
        /// The offending transform's stable identity (its name is logged at
        /// error level by the monitor, per §7, via `GraphMetadata`).
        transform: TransformId,
        /// The underlying error raised by user code.
        #[source]
        source: EvaluatorError,
    },

    /// Kind 2: the evaluation context failed, e.g. `extractFiredTimers`
    /// threw.
    #[error("evaluation context failed: {0}")]
    Context(String),

    /// Kind 3: the monitor's own tick raised an unexpected internal error.
    /// The monitor does not re-submit itself after this.
    #[error("monitor internal failure: {0}")]
    Monitor(String),

    /// Kind 4: the worker pool rejected a submission, or `awaitCompletion`
    /// observed an interrupted wait.
    #[error("executor shut down or interrupted: {0}")]
    Shutdown(String),

    /// Routing/admission failure from the dispatcher.
    #[error("dispatch failed: {0}")]
    Dispatch(#[from] DispatchError),

    /// A telemetry sink failed. Telemetry is purely observational (§10.1);
    /// this variant exists so a caller who explicitly chooses to surface
    /// telemetry errors can, but the monitor itself never lets one block or
    /// fail dispatch.
    #[error("telemetry failure: {0}")]
    Telemetry(#[from] TelemetryError),
}

impl ExecutorError {
    /// Construct an evaluator-failure error.
    pub fn evaluator(transform: TransformId, source: EvaluatorError) -> Self {
        Self::Evaluator { transform, source }
    }

    /// True iff this originated from user evaluator code (kind 1), as
    /// opposed to the executor's own machinery.
    pub fn is_user_error(&self) -> bool {
        matches!(self, Self::Evaluator { .. })
    }

    /// True iff the pipeline cannot continue in any form once this is
    /// observed (kinds 3 and 4 are always terminal; the core never retries
    /// any kind, but these two also indicate the executor's own loop has
    /// already stopped itself).
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Monitor(_) | Self::Shutdown(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("boom")]
    struct Boom;

    #[test]
    fn test_evaluator_error_is_user_error() {
        let err = ExecutorError::evaluator(TransformId::new(), Box::new(Boom));
        assert!(err.is_user_error());
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_monitor_and_shutdown_are_fatal() {
        assert!(ExecutorError::Monitor("tick panicked".into()).is_fatal());
        assert!(ExecutorError::Shutdown("interrupted".into()).is_fatal());
        assert!(!ExecutorError::Context("bad timer state".into()).is_fatal());
    }

    #[test]
    fn test_display_includes_transform_id() {
        let transform = TransformId::new();
        let err = ExecutorError::evaluator(transform, Box::new(Boom));
        assert!(err.to_string().contains(&transform.to_string()));
    }
}
