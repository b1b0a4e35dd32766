// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
// (none)

// Layer 3: Internal module imports
use crate::bundle::Key;
use crate::util::TransformId;

/// Composite identity `(transform, key)` used as the slot key for serial
/// admission (§3). Two bundles with equal `StepAndKey` must execute
/// serially; bundles with differing `StepAndKey` may execute in parallel.
///
/// `None` keys never collide with each other under this type: a transform
/// consuming an unkeyed collection has no `StepAndKey` at all and is always
/// routed through the parallel admitter (§4.4) — this type is only ever
/// constructed for genuinely keyed dispatches.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StepAndKey {
    transform: TransformId,
    key: Key,
}

impl StepAndKey {
    /// Build a new composite identity.
    pub fn new(transform: TransformId, key: Key) -> Self {
        Self { transform, key }
    }

    /// The transform half of the identity.
    pub fn transform(&self) -> TransformId {
        self.transform
    }

    /// The key half of the identity.
    pub fn key(&self) -> &Key {
        &self.key
    }
}
