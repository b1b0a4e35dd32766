//! Admission Benchmarks
//!
//! Measures baseline performance of the dispatcher/admitter hot path:
//! - Parallel admission submission latency
//! - Serial (per-key) admission throughput under FIFO contention
//! - Dispatcher routing overhead for keyed vs. unkeyed bundles

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

// Layer 1: Standard library imports
use std::collections::HashSet;
use std::hint::black_box;
use std::sync::Arc;

// Layer 2: Third-party crate imports
use chrono::Utc;
use criterion::{criterion_group, criterion_main, Criterion};
use dashmap::DashSet;

// Layer 3: Internal module imports
use bundle_exec::bundle::{Bundle, Key, WindowedValue};
use bundle_exec::callback::Callback;
use bundle_exec::context::{
    ContextError, EvaluationContext, EvaluatorRegistry, FiredTimers, RegistryError, TimeDomain,
    TransformEvaluator, TransformResult,
};
use bundle_exec::dispatcher::Dispatcher;
use bundle_exec::error::EvaluatorError;
use bundle_exec::graph::{GraphMetadata, TransformNode};
use bundle_exec::pool::{ExecutorService, TokioExecutorService};
use bundle_exec::update::InternalUpdateQueue;
use bundle_exec::util::{CollectionId, TransformId};

struct NoopEvaluator;

impl TransformEvaluator for NoopEvaluator {
    fn start(&mut self, _input_bundle: Option<&Bundle>) -> Result<(), EvaluatorError> {
        Ok(())
    }

    fn process_element(
        &mut self,
        _value: &WindowedValue,
        _key: Option<&Key>,
    ) -> Result<(), EvaluatorError> {
        Ok(())
    }

    fn finish(&mut self) -> Result<TransformResult, EvaluatorError> {
        Ok(TransformResult::empty())
    }
}

struct NoopRegistry;

impl EvaluatorRegistry for NoopRegistry {
    fn evaluator_for(
        &self,
        _transform: TransformId,
        _input_bundle: Option<&Bundle>,
    ) -> Result<Box<dyn TransformEvaluator>, RegistryError> {
        Ok(Box::new(NoopEvaluator))
    }
}

struct NoopContext;

impl EvaluationContext for NoopContext {
    fn handle_result(
        &self,
        _transform: TransformId,
        _input_bundle: Option<&Bundle>,
        _fired_timers: &[bundle_exec::context::TimerData],
        _result: TransformResult,
    ) -> Result<Vec<Bundle>, ContextError> {
        Ok(Vec::new())
    }

    fn extract_fired_timers(&self) -> Result<FiredTimers, ContextError> {
        Ok(FiredTimers::new())
    }

    fn set_timer(
        &self,
        _transform: TransformId,
        _key: Key,
        _domain: TimeDomain,
        _fire_time: chrono::DateTime<Utc>,
        _tag: String,
    ) {
    }

    fn is_done(&self) -> bool {
        false
    }

    fn pipeline_options(&self) -> &bundle_exec::config::PipelineOptions {
        unimplemented!("not exercised by these benchmarks")
    }
}

fn bench_dispatcher(keyed: bool) -> (tokio::runtime::Runtime, Arc<Dispatcher>, TransformId, CollectionId) {
    let rt = tokio::runtime::Runtime::new().expect("runtime builds");
    let consumer = TransformId::new();
    let collection = CollectionId::new();
    let mut keyed_set = HashSet::new();
    if keyed {
        keyed_set.insert(collection);
    }
    let node = TransformNode::new(consumer, "bench-consumer", collection, vec![]);
    let graph = Arc::new(GraphMetadata::new(vec![node], keyed_set));

    let pool = Arc::new(TokioExecutorService::new(4).expect("pool builds"));
    let dispatcher = Arc::new(Dispatcher::new(
        graph,
        pool as Arc<dyn ExecutorService>,
        Arc::new(NoopRegistry),
        Arc::new(NoopContext),
        Arc::new(InternalUpdateQueue::new()),
        Arc::new(DashSet::new()),
    ));
    (rt, dispatcher, consumer, collection)
}

fn parallel_admission_submission(c: &mut Criterion) {
    let (rt, dispatcher, consumer, collection) = bench_dispatcher(false);

    c.bench_function("parallel_admission_submission", |b| {
        b.to_async(&rt).iter(|| {
            let dispatcher = Arc::clone(&dispatcher);
            let bundle = Bundle::builder(collection)
                .push(WindowedValue::new(1i32, Utc::now()))
                .build();
            async move {
                dispatcher
                    .schedule_consumption(consumer, Some(black_box(bundle)), Callback::Default)
                    .expect("schedule should succeed");
            }
        });
    });
}

fn serial_admission_same_key_fifo(c: &mut Criterion) {
    let (rt, dispatcher, consumer, collection) = bench_dispatcher(true);
    let key = Key::from_slice(b"bench-key");

    c.bench_function("serial_admission_same_key_fifo", |b| {
        b.to_async(&rt).iter(|| {
            let dispatcher = Arc::clone(&dispatcher);
            let key = key.clone();
            let bundle = Bundle::builder(collection)
                .key(key)
                .push(WindowedValue::new(1i32, Utc::now()))
                .build();
            async move {
                dispatcher
                    .schedule_consumption(consumer, Some(black_box(bundle)), Callback::Default)
                    .expect("schedule should succeed");
            }
        });
    });
}

fn serial_admission_distinct_keys(c: &mut Criterion) {
    let (rt, dispatcher, consumer, collection) = bench_dispatcher(true);
    let mut counter: u64 = 0;

    c.bench_function("serial_admission_distinct_keys", |b| {
        b.to_async(&rt).iter(|| {
            let dispatcher = Arc::clone(&dispatcher);
            counter += 1;
            let key = Key::from_slice(&counter.to_le_bytes());
            let bundle = Bundle::builder(collection)
                .key(key)
                .push(WindowedValue::new(1i32, Utc::now()))
                .build();
            async move {
                dispatcher
                    .schedule_consumption(consumer, Some(black_box(bundle)), Callback::Default)
                    .expect("schedule should succeed");
            }
        });
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default();
    targets = parallel_admission_submission, serial_admission_same_key_fifo, serial_admission_distinct_keys
}
criterion_main!(benches);
