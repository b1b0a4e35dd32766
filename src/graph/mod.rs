//! Pipeline graph data: nodes, per-key identity, and the immutable metadata
//! collaborator the executor consults for routing (§3, §6).

pub mod metadata;
pub mod node;
pub mod step_and_key;

pub use metadata::GraphMetadata;
pub use node::TransformNode;
pub use step_and_key::StepAndKey;
