//! Getting Started Example - Sum-Per-Key Pipeline
//!
//! Builds a two-transform graph: a root source emits a handful of
//! `(key, value)` pairs then reports exhaustion, and a keyed `sum` transform
//! accumulates a running total per key and prints it as it goes. Demonstrates
//! wiring `GraphMetadata`, a `StaticEvaluatorRegistry`, and driving the
//! pipeline to quiescence through `Executor::start`/`await_completion`.
//!
//! Run with: cargo run --example getting_started

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::Utc;
use dashmap::DashSet;

use bundle_exec::config::ExecutorConfig;
use bundle_exec::context::inmemory::InMemoryEvaluationContext;
use bundle_exec::context::{
    ProducedElement, StaticEvaluatorRegistry, TransformEvaluator, TransformResult,
};
use bundle_exec::error::EvaluatorError;
use bundle_exec::graph::{GraphMetadata, TransformNode};
use bundle_exec::telemetry::NoopTelemetry;
use bundle_exec::{Bundle, CollectionId, Key, TransformId, WindowedValue};

/// Emits a fixed batch of `(key, value)` pairs once, then reports its source
/// as exhausted.
struct SourceEvaluator {
    output: CollectionId,
    calls: Arc<AtomicUsize>,
}

impl TransformEvaluator for SourceEvaluator {
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
        let call = self.calls.fetch_add(1, Ordering::AcqRel);
        if call > 0 {
            // Already emitted our one batch on the first invocation.
            return Ok(TransformResult {
                outputs: Vec::new(),
                source_exhausted: true,
            });
        }

        let now = Utc::now();
        let pairs = [("alice", 3), ("bob", 5), ("alice", 4), ("bob", 1), ("alice", 2)];
        let outputs = pairs
            .into_iter()
            .map(|(key, value)| ProducedElement {
                collection: self.output,
                key: Some(Key::from_slice(key.as_bytes())),
                value: WindowedValue::new(value, now),
            })
            .collect();

        Ok(TransformResult {
            outputs,
            source_exhausted: true,
        })
    }
}

/// Accumulates a running per-key sum and prints it each time it advances.
struct SumEvaluator {
    key: Option<Key>,
    total: i32,
    totals: Arc<std::sync::Mutex<HashMap<Key, i32>>>,
}

impl TransformEvaluator for SumEvaluator {
    fn start(&mut self, input_bundle: Option<&Bundle>) -> Result<(), EvaluatorError> {
        self.key = input_bundle.and_then(Bundle::key).cloned();
        Ok(())
    }

    fn process_element(
        &mut self,
        value: &WindowedValue,
        _key: Option<&Key>,
    ) -> Result<(), EvaluatorError> {
        let Some(v) = value.downcast_ref::<i32>() else {
            return Err("expected an i32 element".into());
        };
        self.total += v;
        Ok(())
    }

    fn finish(&mut self) -> Result<TransformResult, EvaluatorError> {
        if let Some(key) = &self.key {
            let mut totals = self.totals.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            let entry = totals.entry(key.clone()).or_insert(0);
            *entry += self.total;
            println!("  running total for {key:?}: {entry}");
        }
        Ok(TransformResult::empty())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Sum-Per-Key Pipeline ===\n");

    let source_id = TransformId::new();
    let sum_id = TransformId::new();
    let totals_collection = CollectionId::new();

    let source_node = TransformNode::root(source_id, "source", vec![totals_collection]);
    let sum_node = TransformNode::new(sum_id, "sum", totals_collection, vec![]);

    let mut keyed = HashSet::new();
    keyed.insert(totals_collection);
    let graph = Arc::new(GraphMetadata::new(vec![source_node, sum_node], keyed));

    let calls = Arc::new(AtomicUsize::new(0));
    let totals = Arc::new(std::sync::Mutex::new(HashMap::new()));

    let registry = Arc::new(
        StaticEvaluatorRegistry::builder()
            .with_factory(source_id, {
                let calls = Arc::clone(&calls);
                move || -> Box<dyn TransformEvaluator> {
                    Box::new(SourceEvaluator {
                        output: totals_collection,
                        calls: Arc::clone(&calls),
                    })
                }
            })
            .with_factory(sum_id, {
                let totals = Arc::clone(&totals);
                move || -> Box<dyn TransformEvaluator> {
                    Box::new(SumEvaluator {
                        key: None,
                        total: 0,
                        totals: Arc::clone(&totals),
                    })
                }
            })
            .build(),
    );

    let scheduled = Arc::new(DashSet::new());
    let context = Arc::new(InMemoryEvaluationContext::new(
        Arc::clone(&graph),
        scheduled,
        Default::default(),
    ));

    let config = ExecutorConfig::default();
    let executor = bundle_exec::Executor::new(
        graph,
        registry,
        context,
        &config,
        Arc::new(NoopTelemetry::new()),
    )?;

    println!("Starting pipeline...\n");
    executor.start(&[source_id])?;
    executor.await_completion().await?;

    println!("\nFinal totals:");
    for (key, total) in totals.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).iter() {
        println!("  {key:?} -> {total}");
    }

    println!("\n=== Pipeline Complete ===");
    Ok(())
}
