//! Utility types and helpers shared across the executor.

pub mod ids;
pub mod serde_helpers;

pub use ids::{BundleId, CollectionId, ExecutorTaskId, TransformId};
pub use serde_helpers::duration_serde;
