// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
// (none)

// Layer 3: Internal module imports
use crate::util::{CollectionId, TransformId};

/// A node in the pipeline graph (§3 `TransformNode`).
///
/// Graph construction itself (parsing a user-visible DSL, wiring collections)
/// is out of scope (§1 Non-goals); this is the plain data the executor needs
/// once a graph already exists.
#[derive(Debug, Clone)]
pub struct TransformNode {
    id: TransformId,
    /// Stable, human-readable name. Logged at error level when this
    /// transform's evaluation fails (§7).
    name: String,
    input: Option<CollectionId>,
    outputs: Vec<CollectionId>,
    is_root: bool,
}

impl TransformNode {
    /// Construct a non-root node consuming `input` and producing `outputs`.
    pub fn new(
        id: TransformId,
        name: impl Into<String>,
        input: CollectionId,
        outputs: Vec<CollectionId>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            input: Some(input),
            outputs,
            is_root: false,
        }
    }

    /// Construct a root node: no upstream input, produces bundles from an
    /// external source.
    pub fn root(id: TransformId, name: impl Into<String>, outputs: Vec<CollectionId>) -> Self {
        Self {
            id,
            name: name.into(),
            input: None,
            outputs,
            is_root: true,
        }
    }

    /// Stable identity.
    pub fn id(&self) -> TransformId {
        self.id
    }

    /// Full name, for diagnostics and error attribution.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The collection this transform consumes, if any.
    pub fn input(&self) -> Option<CollectionId> {
        self.input
    }

    /// The collections this transform produces into.
    pub fn outputs(&self) -> &[CollectionId] {
        &self.outputs
    }

    /// True iff this transform has no upstream input.
    pub fn is_root(&self) -> bool {
        self.is_root
    }
}
