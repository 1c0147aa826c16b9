//! Minimal serializable projections for the history service.
//!
//! Layer snapshots capture ordered layer metadata, per-parameter static
//! values, and per-network enabled bits. Network snapshots capture nodes
//! and edges only; node scratch is never part of a snapshot, so undo never
//! rewinds envelope or window state.

use std::collections::BTreeMap;

use reflejo_core::Value;
use reflejo_graph::{Edge, NetworkGraph, NodeId, NodeRegistry, ParameterId};

use crate::layer::{Layer, LayerSettings};

/// Snapshot of one layer's metadata and static values.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerRecord {
    /// Layer id.
    pub layer_id: String,
    /// Component kind name.
    pub kind_name: String,
    /// Compositor settings.
    pub settings: LayerSettings,
    /// Editor expansion state.
    pub expanded: bool,
    /// Debug overlay state.
    pub debug: bool,
    /// Static value per parameter, keyed by id.
    pub static_values: BTreeMap<ParameterId, Value>,
}

/// Snapshot of the whole layer stack plus network enabled bits.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LayerSnapshot {
    /// Layers in composition order.
    pub layers: Vec<LayerRecord>,
    /// Enabled bit per known network.
    pub network_enabled: BTreeMap<ParameterId, bool>,
}

impl LayerSnapshot {
    /// Captures the current layer stack and enabled bits.
    pub fn capture(layers: &[Layer], networks: &reflejo_graph::NetworkStore) -> Self {
        let records = layers
            .iter()
            .map(|layer| LayerRecord {
                layer_id: layer.id.clone(),
                kind_name: layer.kind_name.clone(),
                settings: layer.settings.clone(),
                expanded: layer.expanded,
                debug: layer.debug,
                static_values: layer
                    .config
                    .params()
                    .map(|p| (p.id.clone(), p.static_value.clone()))
                    .collect(),
            })
            .collect();
        let network_enabled = networks
            .iter()
            .map(|(id, graph)| (id.clone(), graph.enabled))
            .collect();
        Self {
            layers: records,
            network_enabled,
        }
    }
}

/// Snapshot of one node: everything except scratch.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotNode {
    /// Node id.
    pub id: NodeId,
    /// Kind label.
    pub kind_label: String,
    /// Literal input overrides.
    pub input_values: BTreeMap<String, Value>,
    /// Editor position.
    pub position: (f32, f32),
}

/// Snapshot of one network graph: nodes and edges only.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NetworkSnapshot {
    /// Nodes, sorted by id for stable equality.
    pub nodes: Vec<SnapshotNode>,
    /// Edges in insertion order.
    pub edges: Vec<Edge>,
}

impl NetworkSnapshot {
    /// Captures a graph's structure.
    pub fn capture(graph: &NetworkGraph) -> Self {
        let mut nodes: Vec<SnapshotNode> = graph
            .nodes
            .values()
            .map(|node| SnapshotNode {
                id: node.id.clone(),
                kind_label: node.kind_label.clone(),
                input_values: node
                    .input_values
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
                position: node.position,
            })
            .collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        Self {
            nodes,
            edges: graph.edges.clone(),
        }
    }

    /// Applies the snapshot onto a graph in place.
    ///
    /// Surviving nodes (same id and kind) keep their scratch so undo does
    /// not reset envelopes mid-flight; everything else gets fresh scratch
    /// from the registry.
    pub fn apply(&self, graph: &mut NetworkGraph, registry: &NodeRegistry) {
        let mut old_nodes = std::mem::take(&mut graph.nodes);
        graph.edges.clear();
        for snap in &self.nodes {
            let scratch = match old_nodes.remove(&snap.id) {
                Some(old) if old.kind_label == snap.kind_label => old.scratch,
                _ => registry.init_scratch(&snap.kind_label),
            };
            let mut node =
                reflejo_graph::GraphNode::new(snap.id.clone(), snap.kind_label.clone(), scratch);
            node.input_values = snap.input_values.clone().into_iter().collect();
            node.position = snap.position;
            graph.insert_node(node);
        }
        for edge in &self.edges {
            graph.add_edge(edge.clone());
        }
    }
}
