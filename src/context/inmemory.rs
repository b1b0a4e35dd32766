//! The in-process reference `EvaluationContext` (§10.5).

// Layer 1: Standard library imports
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

// Layer 2: Third-party crate imports
use chrono::{DateTime, Utc};
use dashmap::DashSet;
use parking_lot::Mutex;

// Layer 3: Internal module imports
use super::traits::{
    ContextError, EvaluationContext, FiredTimers, TimeDomain, TimerData, TransformResult,
};
use crate::bundle::{Bundle, Key};
use crate::config::PipelineOptions;
use crate::graph::GraphMetadata;
use crate::util::{CollectionId, ExecutorTaskId, TransformId};

#[derive(Debug, Clone, PartialEq, Eq)]
struct TimerEntry {
    fire_time: DateTime<Utc>,
    transform: TransformId,
    key: Key,
    domain: TimeDomain,
    tag: String,
}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimerEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.fire_time.cmp(&other.fire_time)
    }
}

/// Tracks per-collection watermarks, a per-key timer min-heap, and commits
/// output bundles from `TransformResult` (§10.5).
///
/// Shares its `scheduled_set` with the executor's admitters so `is_done`
/// reflects live in-flight work (§9 active-count variant, DESIGN.md's
/// "conservative membership" resolution).
pub struct InMemoryEvaluationContext {
    graph: Arc<GraphMetadata>,
    scheduled_set: Arc<DashSet<ExecutorTaskId>>,
    options: PipelineOptions,
    /// Bundles committed but not yet fully consumed: incremented by one per
    /// `(committed bundle, consumer)` delivery a committed bundle fans out
    /// to, decremented once each of those deliveries is consumed by a
    /// `TransformExecutor` (`EvaluationContext::note_consumed`). A bundle
    /// committed into a collection with no consumers never increments this
    /// at all, since nothing will ever consume it.
    outstanding: AtomicI64,
    exhausted_roots: DashSet<TransformId>,
    timers: Mutex<BinaryHeap<Reverse<TimerEntry>>>,
}

impl InMemoryEvaluationContext {
    /// Construct a new context over a fixed graph, sharing `scheduled_set`
    /// with the executor services that submit `TransformExecutor` tasks.
    pub fn new(
        graph: Arc<GraphMetadata>,
        scheduled_set: Arc<DashSet<ExecutorTaskId>>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            graph,
            scheduled_set,
            options,
            outstanding: AtomicI64::new(0),
            exhausted_roots: DashSet::new(),
            timers: Mutex::new(BinaryHeap::new()),
        }
    }

    fn all_roots_exhausted(&self) -> bool {
        self.graph
            .roots()
            .iter()
            .all(|root| self.exhausted_roots.contains(root))
    }
}

impl EvaluationContext for InMemoryEvaluationContext {
    fn handle_result(
        &self,
        transform: TransformId,
        _input_bundle: Option<&Bundle>,
        fired_timers: &[TimerData],
        result: TransformResult,
    ) -> Result<Vec<Bundle>, ContextError> {
        // Group produced elements by (collection, key) so multiple elements
        // for the same key land in one bundle.
        let mut groups: HashMap<(CollectionId, Option<Key>), Vec<_>> = HashMap::new();
        for element in result.outputs {
            groups
                .entry((element.collection, element.key.clone()))
                .or_default()
                .push(element.value);
        }

        let mut committed = Vec::with_capacity(groups.len());
        for ((collection, key), values) in groups {
            let mut builder = Bundle::builder(collection).extend(values);
            if let Some(key) = key {
                builder = builder.key(key);
            }
            committed.push(builder.build());
        }

        // Each committed bundle fans out to every consumer of its collection
        // (`Dispatcher::dispatch_produced`); one `TransformExecutor` run —
        // and one `note_consumed` call — follows per consumer. A bundle with
        // no consumers is never awaited at all.
        let deliveries: i64 = committed
            .iter()
            .map(|bundle| self.graph.consumers_of(bundle.collection()).len() as i64)
            .sum();
        self.outstanding.fetch_add(deliveries, Ordering::AcqRel);

        if result.source_exhausted {
            self.exhausted_roots.insert(transform);
        }

        // fired_timers that caused this execution are considered delivered;
        // the in-memory reference does not re-track them once handed back.
        let _ = fired_timers;

        Ok(committed)
    }

    fn extract_fired_timers(&self) -> Result<FiredTimers, ContextError> {
        let now = Utc::now();
        let mut timers = self.timers.lock();
        let mut fired: FiredTimers = HashMap::new();

        while let Some(Reverse(entry)) = timers.peek() {
            if entry.fire_time > now {
                break;
            }
            let Reverse(entry) = timers.pop().expect("peeked entry must be present");
            fired
                .entry(entry.transform)
                .or_default()
                .entry(entry.key.clone())
                .or_default()
                .entry(entry.domain)
                .or_default()
                .push(TimerData {
                    key: entry.key,
                    domain: entry.domain,
                    fire_time: entry.fire_time,
                    tag: entry.tag,
                });
        }

        Ok(fired)
    }

    fn set_timer(
        &self,
        transform: TransformId,
        key: Key,
        domain: TimeDomain,
        fire_time: DateTime<Utc>,
        tag: String,
    ) {
        self.timers.lock().push(Reverse(TimerEntry {
            fire_time,
            transform,
            key,
            domain,
            tag,
        }));
    }

    fn is_done(&self) -> bool {
        self.all_roots_exhausted()
            && self.outstanding.load(Ordering::Acquire) == 0
            && self.scheduled_set.is_empty()
            && self.timers.lock().is_empty()
    }

    fn note_consumed(&self) {
        self.outstanding.fetch_sub(1, Ordering::AcqRel);
    }

    fn pipeline_options(&self) -> &PipelineOptions {
        &self.options
    }
}

impl InMemoryEvaluationContext {
    /// Marks a root transform's upstream source as exhausted directly,
    /// without routing through `handle_result` (§10.5). `handle_result`
    /// already does this automatically whenever a root's evaluator returns
    /// `TransformResult::source_exhausted`; this is for callers that need to
    /// force the state out of band (tests, or an embedder-owned exhaustion
    /// signal that doesn't flow through a `TransformResult`).
    pub fn mark_root_exhausted(&self, root: TransformId) {
        self.exhausted_roots.insert(root);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::WindowedValue;
    use crate::context::traits::ProducedElement;
    use crate::graph::TransformNode;
    use std::collections::HashSet;
    use std::time::Duration as StdDuration;

    fn test_context() -> (InMemoryEvaluationContext, TransformId, CollectionId) {
        let root_id = TransformId::new();
        let out = CollectionId::new();
        let root = TransformNode::root(root_id, "source", vec![out]);
        let graph = Arc::new(GraphMetadata::new(vec![root], HashSet::new()));
        let scheduled = Arc::new(DashSet::new());
        let ctx = InMemoryEvaluationContext::new(graph, scheduled, PipelineOptions::default());
        (ctx, root_id, out)
    }

    #[test]
    fn test_not_done_before_root_exhausted() {
        let (ctx, _root, _out) = test_context();
        assert!(!ctx.is_done());
    }

    #[test]
    fn test_done_once_root_exhausted_and_no_outstanding() {
        let (ctx, root, _out) = test_context();
        ctx.mark_root_exhausted(root);
        assert!(ctx.is_done());
    }

    #[test]
    fn test_handle_result_marks_root_exhausted_from_source_exhausted_flag() {
        let (ctx, root, _out) = test_context();
        assert!(!ctx.is_done());

        let result = TransformResult {
            outputs: Vec::new(),
            source_exhausted: true,
        };
        ctx.handle_result(root, None, &[], result).unwrap();

        assert!(ctx.is_done());
    }

    #[test]
    fn test_outstanding_blocks_done_until_consumed() {
        // `out` needs a consumer, or a committed bundle has nothing to wait
        // on and `outstanding` never moves off zero.
        let root_id = TransformId::new();
        let out = CollectionId::new();
        let root = TransformNode::root(root_id, "source", vec![out]);
        let consumer = TransformNode::new(TransformId::new(), "sink", out, vec![]);
        let graph = Arc::new(GraphMetadata::new(vec![root, consumer], HashSet::new()));
        let scheduled = Arc::new(DashSet::new());
        let ctx = InMemoryEvaluationContext::new(graph, scheduled, PipelineOptions::default());
        ctx.mark_root_exhausted(root_id);

        let result = TransformResult {
            outputs: vec![ProducedElement {
                collection: out,
                key: None,
                value: WindowedValue::new(1i32, Utc::now()),
            }],
            source_exhausted: false,
        };
        let committed = ctx.handle_result(root_id, None, &[], result).unwrap();
        assert_eq!(committed.len(), 1);
        assert!(!ctx.is_done());

        ctx.note_consumed();
        assert!(ctx.is_done());
    }

    #[test]
    fn test_bundle_with_no_consumers_does_not_block_done() {
        let (ctx, root, out) = test_context();
        ctx.mark_root_exhausted(root);

        let result = TransformResult {
            outputs: vec![ProducedElement {
                collection: out,
                key: None,
                value: WindowedValue::new(1i32, Utc::now()),
            }],
            source_exhausted: false,
        };
        ctx.handle_result(root, None, &[], result).unwrap();
        assert!(ctx.is_done());
    }

    #[test]
    fn test_elements_grouped_by_collection_and_key() {
        let (ctx, root, out) = test_context();
        let key = Key::from_slice(b"k1");
        let result = TransformResult {
            outputs: vec![
                ProducedElement {
                    collection: out,
                    key: Some(key.clone()),
                    value: WindowedValue::new(1i32, Utc::now()),
                },
                ProducedElement {
                    collection: out,
                    key: Some(key),
                    value: WindowedValue::new(2i32, Utc::now()),
                },
            ],
            source_exhausted: false,
        };

        let committed = ctx.handle_result(root, None, &[], result).unwrap();
        assert_eq!(committed.len(), 1);
        assert_eq!(committed[0].values().len(), 2);
    }

    #[test]
    fn test_timer_not_fired_before_instant() {
        let (ctx, _root, _out) = test_context();
        ctx.set_timer(
            TransformId::new(),
            Key::from_slice(b"k1"),
            TimeDomain::EventTime,
            Utc::now() + chrono::Duration::from_std(StdDuration::from_secs(3600)).unwrap(),
            "t1".to_string(),
        );
        let fired = ctx.extract_fired_timers().unwrap();
        assert!(fired.is_empty());
        // pending timer keeps is_done false even if roots are exhausted
        assert!(!ctx.timers.lock().is_empty());
    }

    #[test]
    fn test_timer_fires_once_past_instant() {
        let (ctx, _root, _out) = test_context();
        let transform = TransformId::new();
        ctx.set_timer(
            transform,
            Key::from_slice(b"k1"),
            TimeDomain::EventTime,
            Utc::now() - chrono::Duration::from_std(StdDuration::from_secs(1)).unwrap(),
            "t1".to_string(),
        );

        let fired = ctx.extract_fired_timers().unwrap();
        assert!(fired.contains_key(&transform));

        // extraction clears the heap
        let fired_again = ctx.extract_fired_timers().unwrap();
        assert!(fired_again.is_empty());
    }
}
