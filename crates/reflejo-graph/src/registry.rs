//! The node kind catalogue.

use crate::error::GraphError;
use crate::kind::NodeKind;
use crate::kinds::builtin_kinds;
use crate::node::NodeScratch;

/// Catalogue of node kinds, keyed by unique label.
///
/// All built-in kinds are registered at construction; hosts may register
/// additional kinds before any graphs are created.
///
/// # Example
///
/// ```rust
/// use reflejo_graph::NodeRegistry;
///
/// let registry = NodeRegistry::new();
/// let kind = registry.get("Envelope Follower").unwrap();
/// assert!(kind.stateful);
/// ```
pub struct NodeRegistry {
    kinds: Vec<NodeKind>,
}

impl NodeRegistry {
    /// Creates a registry with all built-in kinds registered.
    pub fn new() -> Self {
        let mut registry = Self { kinds: Vec::new() };
        for kind in builtin_kinds() {
            // Built-in labels are unique by construction.
            let _ = registry.register(kind);
        }
        registry
    }

    /// Registers a kind. Labels must be unique within the registry.
    pub fn register(&mut self, kind: NodeKind) -> Result<(), GraphError> {
        if self.get(kind.label).is_some() {
            return Err(GraphError::DuplicateKind(kind.label.to_string()));
        }
        self.kinds.push(kind);
        Ok(())
    }

    /// Looks up a kind by label.
    pub fn get(&self, label: &str) -> Option<&NodeKind> {
        self.kinds.iter().find(|k| k.label == label)
    }

    /// Whether a label is registered.
    pub fn contains(&self, label: &str) -> bool {
        self.get(label).is_some()
    }

    /// Creates fresh scratch for a kind, `NodeScratch::None` for unknown
    /// labels.
    pub fn init_scratch(&self, label: &str) -> NodeScratch {
        self.get(label).map_or(NodeScratch::None, |k| (k.init_scratch)())
    }

    /// Iterates over all registered kinds in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &NodeKind> {
        self.kinds.iter()
    }

    /// Number of registered kinds.
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
