//! The `EvaluationContext` and `EvaluatorRegistry` collaborators (§6).
//!
//! Both are synchronous: the spec describes their operations as effectively
//! instantaneous bookkeeping (watermark advancement, timer extraction,
//! result commit), so there is no benefit in making every call site `.await`
//! something that never actually suspends. Async/Tokio machinery is reserved
//! for the worker pool (`pool::ExecutorService`) and `awaitCompletion`.

// Layer 1: Standard library imports
use std::collections::HashMap;

// Layer 2: Third-party crate imports
use chrono::{DateTime, Utc};
use thiserror::Error;

// Layer 3: Internal module imports
use crate::bundle::{Bundle, Key, WindowedValue};
use crate::config::PipelineOptions;
use crate::util::{CollectionId, TransformId};

/// Errors raised by an `EvaluationContext` (§7 kind 2).
#[derive(Debug, Error)]
pub enum ContextError {
    /// Timer extraction failed.
    #[error("failed to extract fired timers: {0}")]
    TimerExtraction(String),

    /// Committing a result failed.
    #[error("failed to commit result: {0}")]
    Commit(String),
}

/// Errors raised by an `EvaluatorRegistry` when resolving an evaluator.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No evaluator is registered for the given transform.
    #[error("no evaluator registered for transform {0}")]
    NotFound(TransformId),
}

/// The time domain a timer is set in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimeDomain {
    /// Fires once event-time watermark passes the set instant.
    EventTime,
    /// Fires once wall-clock processing time passes the set instant.
    ProcessingTime,
}

/// A single fired (or pending) timer.
#[derive(Debug, Clone)]
pub struct TimerData {
    /// The key this timer is scoped to.
    pub key: Key,
    /// Which domain the timer fires in.
    pub domain: TimeDomain,
    /// The instant at which the timer is set to fire.
    pub fire_time: DateTime<Utc>,
    /// An opaque tag the owning transform can use to distinguish timers.
    pub tag: String,
}

/// Nested map of fired timers returned by `extractFiredTimers` (§6):
/// `transform → key → timeDomain → [TimerData]`.
pub type FiredTimers = HashMap<TransformId, HashMap<Key, HashMap<TimeDomain, Vec<TimerData>>>>;

/// The single element a timer-firing synthetic bundle carries (§4.5b):
/// timers are not a separate execution path, they become a keyed bundle
/// whose sole element is this work item.
#[derive(Debug, Clone)]
pub struct TimerWorkItem {
    /// The key this timer group fired for.
    pub key: Key,
    /// The fired timers themselves, also handed separately to
    /// `handle_result` via the timer completion callback.
    pub timers: Vec<TimerData>,
}

/// One element produced by a `TransformEvaluator`, destined for a specific
/// output collection (and key, if that collection is keyed).
#[derive(Debug, Clone)]
pub struct ProducedElement {
    /// The output collection this element belongs to.
    pub collection: CollectionId,
    /// The key, if `collection` is keyed.
    pub key: Option<Key>,
    /// The windowed value itself.
    pub value: WindowedValue,
}

/// The result of running a `TransformEvaluator` to completion (`finish()`).
#[derive(Debug, Clone, Default)]
pub struct TransformResult {
    /// Elements produced during this evaluation, grouped into output
    /// bundles by `(collection, key)` on commit.
    pub outputs: Vec<ProducedElement>,
    /// Set by root evaluators to signal their upstream source has no more
    /// data; consulted by `isDone` (§10.5 supplemented reference context).
    pub source_exhausted: bool,
}

impl TransformResult {
    /// An empty result that does not signal exhaustion.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// External collaborator (§6): commits evaluation side effects, tracks
/// watermarks/timers, and reports quiescence.
pub trait EvaluationContext: Send + Sync {
    /// Atomically commits the side effects of an evaluation and returns the
    /// freshly committed output bundles. `transform` is the transform whose
    /// evaluator produced `result`, so implementations can attribute
    /// `TransformResult::source_exhausted` to the right root.
    fn handle_result(
        &self,
        transform: TransformId,
        input_bundle: Option<&Bundle>,
        fired_timers: &[TimerData],
        result: TransformResult,
    ) -> Result<Vec<Bundle>, ContextError>;

    /// Returns and clears the set of timers whose hold time has passed.
    fn extract_fired_timers(&self) -> Result<FiredTimers, ContextError>;

    /// Registers a timer to fire at `fire_time` for `(transform, key)`.
    fn set_timer(
        &self,
        transform: TransformId,
        key: Key,
        domain: TimeDomain,
        fire_time: DateTime<Utc>,
        tag: String,
    );

    /// True once all watermarks have reached +∞ and no work remains.
    fn is_done(&self) -> bool;

    /// Called once a `TransformExecutor` has finished consuming its input
    /// bundle, whether evaluation succeeded or failed. Releases whatever
    /// outstanding-bundle obligation `handle_result` created when that
    /// bundle was committed, so `is_done` can account for in-flight
    /// deliveries and not just root exhaustion. Default no-op; contexts
    /// that track outstanding commits (`InMemoryEvaluationContext`)
    /// override it.
    fn note_consumed(&self) {}

    /// Diagnostics-only pipeline options.
    fn pipeline_options(&self) -> &PipelineOptions;
}

/// Single-threaded-per-bundle evaluator for one `(transform, input bundle)`
/// pair (§6). May be pooled and reused across bundles by the registry.
pub trait TransformEvaluator: Send {
    /// Called once before any elements are processed.
    fn start(&mut self, input_bundle: Option<&Bundle>) -> Result<(), crate::error::EvaluatorError>;

    /// Called once per element of the input bundle, in order.
    fn process_element(
        &mut self,
        value: &WindowedValue,
        key: Option<&Key>,
    ) -> Result<(), crate::error::EvaluatorError>;

    /// Called once after all elements have been processed; returns the
    /// produced result.
    fn finish(&mut self) -> Result<TransformResult, crate::error::EvaluatorError>;
}

/// Factory producing one fresh `TransformEvaluator` per `(transform, input
/// bundle)` pair.
pub trait EvaluatorFactory: Send + Sync {
    /// Build a new evaluator instance for this transform.
    fn create(&self) -> Box<dyn TransformEvaluator>;
}

impl<F> EvaluatorFactory for F
where
    F: Fn() -> Box<dyn TransformEvaluator> + Send + Sync,
{
    fn create(&self) -> Box<dyn TransformEvaluator> {
        (self)()
    }
}

/// External collaborator (§6): resolves an evaluator for a transform.
pub trait EvaluatorRegistry: Send + Sync {
    /// Returns a fresh evaluator for `transform`.
    fn evaluator_for(
        &self,
        transform: TransformId,
        input_bundle: Option<&Bundle>,
    ) -> Result<Box<dyn TransformEvaluator>, RegistryError>;
}
