//! The network store: one graph per animated parameter.
//!
//! All mutation funnels through here so the graph invariants hold at rest:
//! candidate edges are validated (existence, exact type match, self-loops,
//! cycles) before entering a graph, enable/disable transitions are
//! idempotent, and deleting a layer removes exactly the networks whose
//! parameter id belongs to it.

use std::collections::HashMap;

use reflejo_core::PortType;

use crate::error::GraphError;
use crate::graph::{Edge, NetworkGraph};
use crate::id::{NodeId, ParameterId};
use crate::kind::{INPUT_KIND, OUTPUT_KIND, OUTPUT_VALUE_PORT};
use crate::node::GraphNode;
use crate::registry::NodeRegistry;

/// Owns every [`NetworkGraph`], keyed by [`ParameterId`].
#[derive(Default)]
pub struct NetworkStore {
    networks: HashMap<ParameterId, NetworkGraph>,
}

impl NetworkStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables the network for a parameter, creating the minimal
    /// `Input`/`Output` graph if none exists yet. Idempotent.
    pub fn enable(&mut self, id: &ParameterId, output_type: PortType, registry: &NodeRegistry) {
        let graph = self.networks.entry(id.clone()).or_insert_with(|| {
            NetworkGraph::minimal(
                id.as_str(),
                output_type,
                registry.init_scratch(INPUT_KIND),
                registry.init_scratch(OUTPUT_KIND),
            )
        });
        graph.enabled = true;
    }

    /// Disables a parameter's network. The graph is retained; evaluation
    /// yields nothing and the parameter falls back to its static value.
    /// Idempotent; disabling a parameter without a network is a no-op.
    pub fn disable(&mut self, id: &ParameterId) {
        if let Some(graph) = self.networks.get_mut(id) {
            graph.enabled = false;
        }
    }

    /// Whether a parameter currently has an enabled network.
    pub fn is_enabled(&self, id: &ParameterId) -> bool {
        self.networks.get(id).is_some_and(|g| g.enabled)
    }

    /// Replaces (or installs) a parameter's graph wholesale after
    /// validating it.
    pub fn replace(
        &mut self,
        id: &ParameterId,
        graph: NetworkGraph,
        registry: &NodeRegistry,
    ) -> Result<(), GraphError> {
        validate_graph(&graph, registry)?;
        self.networks.insert(id.clone(), graph);
        Ok(())
    }

    /// Installs a graph without structural validation.
    ///
    /// For rehydration paths that keep a partially-understood graph around
    /// disabled rather than dropping user data.
    pub fn install_unchecked(&mut self, id: &ParameterId, graph: NetworkGraph) {
        self.networks.insert(id.clone(), graph);
    }

    /// Removes a parameter's network entirely.
    pub fn remove(&mut self, id: &ParameterId) -> Option<NetworkGraph> {
        self.networks.remove(id)
    }

    /// Removes every network belonging to a layer; returns the removed
    /// keys. Exactly the networks whose id's layer segment matches are
    /// removed.
    pub fn remove_layer_networks(&mut self, layer_id: &str) -> Vec<ParameterId> {
        let doomed: Vec<ParameterId> = self
            .networks
            .keys()
            .filter(|id| id.belongs_to(layer_id))
            .cloned()
            .collect();
        for id in &doomed {
            self.networks.remove(id);
        }
        doomed
    }

    /// Shared access to a parameter's graph.
    pub fn graph(&self, id: &ParameterId) -> Option<&NetworkGraph> {
        self.networks.get(id)
    }

    /// Mutable access to a parameter's graph.
    pub fn graph_mut(&mut self, id: &ParameterId) -> Option<&mut NetworkGraph> {
        self.networks.get_mut(id)
    }

    /// Iterates over all `(parameter, graph)` entries.
    pub fn iter(&self) -> impl Iterator<Item = (&ParameterId, &NetworkGraph)> {
        self.networks.iter()
    }

    /// Number of stored networks.
    pub fn len(&self) -> usize {
        self.networks.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }

    /// Adds a node of the given kind to a parameter's graph, minting a
    /// fresh id.
    pub fn add_node(
        &mut self,
        id: &ParameterId,
        kind_label: &str,
        position: (f32, f32),
        registry: &NodeRegistry,
    ) -> Result<NodeId, GraphError> {
        if !registry.contains(kind_label) {
            return Err(GraphError::UnknownKind(kind_label.to_string()));
        }
        let graph = self
            .networks
            .get_mut(id)
            .ok_or_else(|| GraphError::NetworkNotFound(id.as_str().to_string()))?;
        let node_id = graph.mint_node_id(kind_label);
        let mut node = GraphNode::new(node_id.clone(), kind_label, registry.init_scratch(kind_label));
        node.position = position;
        graph.insert_node(node);
        Ok(node_id)
    }

    /// Removes a node (and its edges) from a parameter's graph.
    pub fn remove_node(&mut self, id: &ParameterId, node: &NodeId) -> Result<(), GraphError> {
        let graph = self
            .networks
            .get_mut(id)
            .ok_or_else(|| GraphError::NetworkNotFound(id.as_str().to_string()))?;
        graph
            .remove_node(node)
            .map(|_| ())
            .ok_or_else(|| GraphError::MissingNode(node.clone()))
    }

    /// Validates a candidate connection against a parameter's graph without
    /// applying it.
    ///
    /// Rejects missing nodes or ports, self-loops, exact-type mismatches,
    /// and edges that would introduce a cycle.
    pub fn is_valid_connection(
        &self,
        id: &ParameterId,
        candidate: &Edge,
        registry: &NodeRegistry,
    ) -> Result<(), GraphError> {
        let graph = self
            .networks
            .get(id)
            .ok_or_else(|| GraphError::NetworkNotFound(id.as_str().to_string()))?;
        validate_connection(graph, candidate, registry)
    }

    /// Validates and applies a candidate connection. A previous edge into
    /// the same target port is replaced.
    pub fn connect(
        &mut self,
        id: &ParameterId,
        candidate: Edge,
        registry: &NodeRegistry,
    ) -> Result<(), GraphError> {
        self.is_valid_connection(id, &candidate, registry)?;
        let graph = self
            .networks
            .get_mut(id)
            .ok_or_else(|| GraphError::NetworkNotFound(id.as_str().to_string()))?;
        graph.add_edge(candidate);
        Ok(())
    }

    /// Removes the edge terminating at `(target, port)` in a parameter's
    /// graph.
    pub fn disconnect(
        &mut self,
        id: &ParameterId,
        target: &NodeId,
        port: &str,
    ) -> Result<(), GraphError> {
        let graph = self
            .networks
            .get_mut(id)
            .ok_or_else(|| GraphError::NetworkNotFound(id.as_str().to_string()))?;
        graph.remove_edge(target, port);
        Ok(())
    }

    /// Clears all node scratch in a parameter's graph.
    pub fn reset_graph(&mut self, id: &ParameterId) {
        if let Some(graph) = self.networks.get_mut(id) {
            graph.reset_scratch();
        }
    }
}

/// Validates a candidate edge against a graph.
pub fn validate_connection(
    graph: &NetworkGraph,
    candidate: &Edge,
    registry: &NodeRegistry,
) -> Result<(), GraphError> {
    if candidate.source == candidate.target {
        return Err(GraphError::SelfLoop(candidate.source.clone()));
    }
    let source = graph
        .nodes
        .get(&candidate.source)
        .ok_or_else(|| GraphError::MissingNode(candidate.source.clone()))?;
    let target = graph
        .nodes
        .get(&candidate.target)
        .ok_or_else(|| GraphError::MissingNode(candidate.target.clone()))?;

    let source_kind = registry
        .get(&source.kind_label)
        .ok_or_else(|| GraphError::UnknownKind(source.kind_label.clone()))?;
    let target_kind = registry
        .get(&target.kind_label)
        .ok_or_else(|| GraphError::UnknownKind(target.kind_label.clone()))?;

    let source_ty = source_kind
        .output(&candidate.source_port)
        .ok_or_else(|| GraphError::MissingPort {
            node: candidate.source.clone(),
            port: candidate.source_port.clone(),
        })?
        .ty;
    let target_spec =
        target_kind
            .input(&candidate.target_port)
            .ok_or_else(|| GraphError::MissingPort {
                node: candidate.target.clone(),
                port: candidate.target_port.clone(),
            })?;
    // The Output node's value port adopts the graph's output type.
    let target_ty = if target.kind_label == OUTPUT_KIND && candidate.target_port == OUTPUT_VALUE_PORT
    {
        graph.output_type
    } else {
        target_spec.ty
    };

    if source_ty != target_ty {
        return Err(GraphError::TypeMismatch {
            source_type: source_ty,
            target: target_ty,
        });
    }

    // The candidate introduces source -> target; a cycle appears iff the
    // target can already reach the source.
    if graph.can_reach(&candidate.target, &candidate.source) {
        return Err(GraphError::CycleDetected);
    }
    Ok(())
}

/// Validates a whole graph: canonical endpoints, referential integrity,
/// type compatibility, acyclicity.
pub fn validate_graph(graph: &NetworkGraph, registry: &NodeRegistry) -> Result<(), GraphError> {
    let inputs = graph.count_kind(INPUT_KIND);
    if inputs != 1 {
        return Err(GraphError::InvalidInputCount(inputs));
    }
    let outputs = graph.count_kind(OUTPUT_KIND);
    if outputs != 1 {
        return Err(GraphError::InvalidOutputCount(outputs));
    }
    for node in graph.nodes.values() {
        if !registry.contains(&node.kind_label) {
            return Err(GraphError::UnknownKind(node.kind_label.clone()));
        }
    }
    for edge in &graph.edges {
        // Connection validation also covers cycles: every edge was the
        // "candidate" once, and re-checking each against the full edge set
        // rejects any cycle present at rest.
        let mut without = graph.clone();
        without
            .edges
            .retain(|e| !(e.target == edge.target && e.target_port == edge.target_port));
        validate_connection(&without, edge, registry)?;
    }
    Ok(())
}
