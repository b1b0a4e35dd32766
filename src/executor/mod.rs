//! `TransformExecutor` and the `TransformExecutorService` admission layer
//! (§4.1–§4.3).

pub(crate) mod admitter;
pub(crate) mod service;
pub mod task;

pub use admitter::Admitter;
pub(crate) use service::ExecutorContext;
pub use service::{ParallelExecutorService, SerialExecutorService};
pub use task::TransformExecutor;
