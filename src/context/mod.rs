//! The `EvaluationContext`/`EvaluatorRegistry` collaborators (§6) and the
//! in-process reference implementations supplementing them (§10.5).

pub mod inmemory;
pub mod registry;
pub mod traits;

pub use inmemory::InMemoryEvaluationContext;
pub use registry::{StaticEvaluatorRegistry, StaticEvaluatorRegistryBuilder};
pub use traits::{
    ContextError, EvaluationContext, EvaluatorFactory, EvaluatorRegistry, FiredTimers,
    ProducedElement, RegistryError, TimeDomain, TimerData, TimerWorkItem, TransformEvaluator,
    TransformResult,
};
