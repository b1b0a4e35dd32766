// Layer 1: Standard library imports
use std::collections::{HashMap, HashSet};

// Layer 2: Third-party crate imports
// (none)

// Layer 3: Internal module imports
use super::node::TransformNode;
use crate::util::{CollectionId, TransformId};

/// Immutable-after-`start` graph metadata (§6 "Graph metadata" collaborator).
///
/// Built once by the embedder and handed to the executor by `Arc`; the
/// executor core never mutates it.
#[derive(Debug, Clone)]
pub struct GraphMetadata {
    nodes: HashMap<TransformId, TransformNode>,
    value_to_consumers: HashMap<CollectionId, Vec<TransformId>>,
    keyed_collections: HashSet<CollectionId>,
    roots: Vec<TransformId>,
}

impl GraphMetadata {
    /// Build graph metadata from a fixed set of nodes and the set of
    /// collections declared keyed.
    pub fn new(nodes: Vec<TransformNode>, keyed_collections: HashSet<CollectionId>) -> Self {
        let mut value_to_consumers: HashMap<CollectionId, Vec<TransformId>> = HashMap::new();
        let mut roots = Vec::new();
        let mut by_id = HashMap::new();

        for node in nodes {
            if node.is_root() {
                roots.push(node.id());
            }
            by_id.insert(node.id(), node);
        }

        // valueToConsumers: every node that declares `input` as its upstream
        // collection is a consumer of that collection.
        for node in by_id.values() {
            if let Some(input) = node.input() {
                value_to_consumers.entry(input).or_default().push(node.id());
            }
        }

        Self {
            nodes: by_id,
            value_to_consumers,
            keyed_collections,
            roots,
        }
    }

    /// Look up a node by id.
    pub fn node(&self, id: TransformId) -> Option<&TransformNode> {
        self.nodes.get(&id)
    }

    /// The consumers of a given collection, in no particular order.
    pub fn consumers_of(&self, collection: CollectionId) -> &[TransformId] {
        self.value_to_consumers
            .get(&collection)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// True iff `collection` is declared keyed.
    pub fn is_keyed(&self, collection: CollectionId) -> bool {
        self.keyed_collections.contains(&collection)
    }

    /// The fixed set of root transforms.
    pub fn roots(&self) -> &[TransformId] {
        &self.roots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consumers_of_collection() {
        let out = CollectionId::new();
        let root = TransformNode::root(TransformId::new(), "source", vec![out]);
        let consumer = TransformNode::new(TransformId::new(), "map", out, vec![]);
        let consumer_id = consumer.id();

        let graph = GraphMetadata::new(vec![root, consumer], HashSet::new());
        assert_eq!(graph.consumers_of(out), &[consumer_id]);
    }

    #[test]
    fn test_roots_are_collected() {
        let root1 = TransformNode::root(TransformId::new(), "a", vec![]);
        let root2 = TransformNode::root(TransformId::new(), "b", vec![]);
        let root1_id = root1.id();
        let root2_id = root2.id();

        let graph = GraphMetadata::new(vec![root1, root2], HashSet::new());
        assert_eq!(graph.roots().len(), 2);
        assert!(graph.roots().contains(&root1_id));
        assert!(graph.roots().contains(&root2_id));
    }

    #[test]
    fn test_keyed_collection_membership() {
        let keyed = CollectionId::new();
        let unkeyed = CollectionId::new();
        let mut keyed_set = HashSet::new();
        keyed_set.insert(keyed);

        let graph = GraphMetadata::new(vec![], keyed_set);
        assert!(graph.is_keyed(keyed));
        assert!(!graph.is_keyed(unkeyed));
    }

    #[test]
    fn test_node_lookup() {
        let node = TransformNode::root(TransformId::new(), "source", vec![]);
        let id = node.id();
        let graph = GraphMetadata::new(vec![node], HashSet::new());
        assert_eq!(graph.node(id).map(TransformNode::name), Some("source"));
        assert!(graph.node(TransformId::new()).is_none());
    }
}
