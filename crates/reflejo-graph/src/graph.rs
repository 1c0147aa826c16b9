//! The network graph arena.
//!
//! Nodes live in a flat map keyed by [`NodeId`]; edges are plain endpoint
//! tuples. Nothing holds a cross-reference by pointer, so removal is a map
//! delete plus an edge sweep.

use std::collections::HashMap;

use reflejo_core::PortType;

use crate::id::NodeId;
use crate::kind::{INPUT_KIND, OUTPUT_KIND};
use crate::node::{GraphNode, NodeScratch};

/// A directed connection between two node ports.
///
/// At most one edge may terminate at a given `(target, target_port)`;
/// inserting another replaces the previous one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Edge {
    /// Source node.
    pub source: NodeId,
    /// Output port on the source node.
    pub source_port: String,
    /// Target node.
    pub target: NodeId,
    /// Input port on the target node.
    pub target_port: String,
}

impl Edge {
    /// Creates an edge.
    pub fn new(
        source: impl Into<NodeId>,
        source_port: impl Into<String>,
        target: impl Into<NodeId>,
        target_port: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            source_port: source_port.into(),
            target: target.into(),
            target_port: target_port.into(),
        }
    }
}

/// One dataflow graph bound to a single animated parameter.
#[derive(Debug, Clone)]
pub struct NetworkGraph {
    /// Display name.
    pub name: String,
    /// Disabled graphs are retained but evaluate to nothing; the parameter
    /// falls back to its static value.
    pub enabled: bool,
    /// The type the `Output` node produces.
    pub output_type: PortType,
    /// Node arena keyed by id.
    pub nodes: HashMap<NodeId, GraphNode>,
    /// Edge tuples, in insertion order.
    pub edges: Vec<Edge>,
    next_serial: u64,
}

impl NetworkGraph {
    /// Creates an empty graph.
    pub fn new(name: impl Into<String>, output_type: PortType) -> Self {
        Self {
            name: name.into(),
            enabled: false,
            output_type,
            nodes: HashMap::new(),
            edges: Vec::new(),
            next_serial: 0,
        }
    }

    /// Creates the minimal enabled graph for a parameter: an `Input` and an
    /// `Output` node, unconnected.
    pub fn minimal(
        parameter_id: &str,
        output_type: PortType,
        input_scratch: NodeScratch,
        output_scratch: NodeScratch,
    ) -> Self {
        let mut graph = Self::new(parameter_id, output_type);
        let mut input = GraphNode::new(
            NodeId::new(format!("{parameter_id}-input-node")),
            INPUT_KIND,
            input_scratch,
        );
        input.position = (60.0, 120.0);
        let mut output = GraphNode::new(
            NodeId::new(format!("{parameter_id}-output-node")),
            OUTPUT_KIND,
            output_scratch,
        );
        output.position = (460.0, 120.0);
        graph.insert_node(input);
        graph.insert_node(output);
        graph
    }

    /// Inserts a node, replacing any node with the same id.
    pub fn insert_node(&mut self, node: GraphNode) {
        self.nodes.insert(node.id.clone(), node);
    }

    /// Mints a fresh node id unique within this graph.
    pub fn mint_node_id(&mut self, hint: &str) -> NodeId {
        loop {
            let id = NodeId::new(format!("{}-{}", slug(hint), self.next_serial));
            self.next_serial += 1;
            if !self.nodes.contains_key(&id) {
                return id;
            }
        }
    }

    /// Removes a node and every edge touching it. Removal drops the node's
    /// scratch with it.
    pub fn remove_node(&mut self, id: &NodeId) -> Option<GraphNode> {
        let node = self.nodes.remove(id)?;
        self.edges.retain(|e| &e.source != id && &e.target != id);
        Some(node)
    }

    /// Inserts an edge, replacing any existing edge into the same
    /// `(target, target_port)`.
    pub fn add_edge(&mut self, edge: Edge) {
        self.edges
            .retain(|e| !(e.target == edge.target && e.target_port == edge.target_port));
        self.edges.push(edge);
    }

    /// Removes the edge terminating at `(target, target_port)`, if any.
    pub fn remove_edge(&mut self, target: &NodeId, target_port: &str) -> Option<Edge> {
        let idx = self
            .edges
            .iter()
            .position(|e| &e.target == target && e.target_port == target_port)?;
        Some(self.edges.remove(idx))
    }

    /// The last-added edge terminating at `(target, target_port)`, plus how
    /// many edges terminate there (more than one indicates store corruption
    /// the evaluator warns about).
    pub fn incoming_edge(&self, target: &NodeId, target_port: &str) -> (Option<&Edge>, usize) {
        let mut count = 0;
        let mut found = None;
        for edge in &self.edges {
            if &edge.target == target && edge.target_port == target_port {
                count += 1;
                found = Some(edge);
            }
        }
        (found, count)
    }

    /// The unique `Input` node, if present.
    pub fn input_node(&self) -> Option<&GraphNode> {
        self.nodes.values().find(|n| n.kind_label == INPUT_KIND)
    }

    /// The unique `Output` node, if present.
    pub fn output_node(&self) -> Option<&GraphNode> {
        self.nodes.values().find(|n| n.kind_label == OUTPUT_KIND)
    }

    /// Counts nodes with the given kind label.
    pub fn count_kind(&self, label: &str) -> usize {
        self.nodes.values().filter(|n| n.kind_label == label).count()
    }

    /// Whether `from` can reach `to` following existing edges.
    pub fn can_reach(&self, from: &NodeId, to: &NodeId) -> bool {
        if from == to {
            return true;
        }
        let mut stack = vec![from.clone()];
        let mut seen = std::collections::HashSet::new();
        while let Some(current) = stack.pop() {
            if !seen.insert(current.clone()) {
                continue;
            }
            for edge in &self.edges {
                if edge.source == current {
                    if edge.target == *to {
                        return true;
                    }
                    stack.push(edge.target.clone());
                }
            }
        }
        false
    }

    /// Clears every node's scratch state.
    pub fn reset_scratch(&mut self) {
        for node in self.nodes.values_mut() {
            node.scratch.reset();
        }
    }
}

fn slug(hint: &str) -> String {
    let mut out = String::with_capacity(hint.len());
    for ch in hint.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    out.trim_matches('-').to_string()
}
