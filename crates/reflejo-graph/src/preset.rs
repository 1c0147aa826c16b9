//! Declarative graph templates and their instantiation.
//!
//! A preset lists intermediate nodes by kind label and edges by template
//! key; the canonical endpoints appear only as the placeholder keys
//! [`INPUT_KEY`] and [`OUTPUT_KEY`]. Instantiation mints fresh node ids
//! scoped to the receiving parameter, rewrites the edges through the key
//! map, optionally auto-places everything in topological layers, and
//! validates the expanded graph before it is handed over. Application to a
//! store is atomic: a failed expansion leaves the store untouched.

use std::collections::HashMap;

use reflejo_core::{MathOp, PortType, Value};

use crate::error::PresetError;
use crate::graph::{Edge, NetworkGraph};
use crate::id::{NodeId, ParameterId};
use crate::kind::{INPUT_KIND, OUTPUT_KIND, OUTPUT_VALUE_PORT};
use crate::node::GraphNode;
use crate::registry::NodeRegistry;
use crate::store::{validate_graph, NetworkStore};

/// Placeholder key for the canonical `Input` endpoint in preset edges.
pub const INPUT_KEY: &str = "INPUT";

/// Placeholder key for the canonical `Output` endpoint in preset edges.
pub const OUTPUT_KEY: &str = "OUTPUT";

/// One intermediate node in a template.
#[derive(Debug, Clone)]
pub struct PresetNode {
    /// Template-local key, referenced by [`PresetEdge`]s.
    pub key: String,
    /// Kind label to instantiate.
    pub kind_label: String,
    /// Literal input overrides for the instance.
    pub input_values: HashMap<String, Value>,
    /// Explicit editor position; ignored when the preset auto-places.
    pub position: Option<(f32, f32)>,
}

impl PresetNode {
    /// Creates a template node.
    pub fn new(key: impl Into<String>, kind_label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            kind_label: kind_label.into(),
            input_values: HashMap::new(),
            position: None,
        }
    }

    /// Adds a literal input override.
    pub fn with_value(mut self, port: impl Into<String>, value: Value) -> Self {
        self.input_values.insert(port.into(), value);
        self
    }
}

/// One edge in a template, endpoints by key.
#[derive(Debug, Clone)]
pub struct PresetEdge {
    /// Source node key (`INPUT` for the canonical input).
    pub source: String,
    /// Output port on the source.
    pub source_port: String,
    /// Target node key (`OUTPUT` for the canonical output).
    pub target: String,
    /// Input port on the target.
    pub target_port: String,
}

impl PresetEdge {
    /// Creates a template edge.
    pub fn new(
        source: impl Into<String>,
        source_port: impl Into<String>,
        target: impl Into<String>,
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

/// A named, typed graph template.
#[derive(Debug, Clone)]
pub struct GraphPreset {
    /// Display name.
    pub name: String,
    /// One-line description.
    pub description: String,
    /// The type the expanded graph produces; must match the requesting
    /// parameter.
    pub output_type: PortType,
    /// Whether instantiation runs the layered auto-layout.
    pub auto_place: bool,
    /// Intermediate nodes (the canonical endpoints are implicit).
    pub nodes: Vec<PresetNode>,
    /// Edges by template key.
    pub edges: Vec<PresetEdge>,
}

impl GraphPreset {
    /// Expands the template into a fresh graph for `parameter_id`.
    pub fn instantiate(
        &self,
        parameter_id: &ParameterId,
        desired_output_type: PortType,
        registry: &NodeRegistry,
    ) -> Result<NetworkGraph, PresetError> {
        if self.output_type != desired_output_type {
            return Err(PresetError::OutputTypeMismatch {
                preset: self.output_type,
                requested: desired_output_type,
            });
        }

        let pid = parameter_id.as_str();
        let mut graph = NetworkGraph::minimal(
            pid,
            desired_output_type,
            registry.init_scratch(INPUT_KIND),
            registry.init_scratch(OUTPUT_KIND),
        );

        let mut key_map: HashMap<&str, NodeId> = HashMap::new();
        key_map.insert(INPUT_KEY, NodeId::new(format!("{pid}-input-node")));
        key_map.insert(OUTPUT_KEY, NodeId::new(format!("{pid}-output-node")));

        for (index, template) in self.nodes.iter().enumerate() {
            if !registry.contains(&template.kind_label) {
                return Err(PresetError::UnknownKind(template.kind_label.clone()));
            }
            let node_id = NodeId::new(format!("{pid}-{}-{index}", template.key));
            let mut node = GraphNode::new(
                node_id.clone(),
                template.kind_label.clone(),
                registry.init_scratch(&template.kind_label),
            );
            node.input_values = template.input_values.clone();
            if let Some(position) = template.position {
                node.position = position;
            }
            graph.insert_node(node);
            key_map.insert(template.key.as_str(), node_id);
        }

        for edge in &self.edges {
            let source = key_map
                .get(edge.source.as_str())
                .ok_or_else(|| PresetError::UnknownNodeKey(edge.source.clone()))?;
            let target = key_map
                .get(edge.target.as_str())
                .ok_or_else(|| PresetError::UnknownNodeKey(edge.target.clone()))?;
            graph.add_edge(Edge::new(
                source.clone(),
                edge.source_port.clone(),
                target.clone(),
                edge.target_port.clone(),
            ));
        }

        validate_graph(&graph, registry)?;

        if self.auto_place {
            auto_place(&mut graph);
        }

        graph.name = self.name.clone();
        Ok(graph)
    }

    /// Instantiates and installs into the store, enabled. Atomic: on error
    /// the store is untouched.
    pub fn apply(
        &self,
        store: &mut NetworkStore,
        parameter_id: &ParameterId,
        desired_output_type: PortType,
        registry: &NodeRegistry,
    ) -> Result<(), PresetError> {
        let mut graph = self.instantiate(parameter_id, desired_output_type, registry)?;
        graph.enabled = true;
        store.install_unchecked(parameter_id, graph);
        Ok(())
    }
}

/// Simple layered layout: topological rank on the x-axis, rank siblings
/// spread down the y-axis. Deterministic given the graph.
fn auto_place(graph: &mut NetworkGraph) {
    let mut ranks: HashMap<NodeId, usize> = HashMap::new();
    let ids: Vec<NodeId> = graph.nodes.keys().cloned().collect();
    for id in &ids {
        rank_of(graph, id, &mut ranks);
    }

    let mut by_rank: HashMap<usize, Vec<NodeId>> = HashMap::new();
    for (id, rank) in &ranks {
        by_rank.entry(*rank).or_default().push(id.clone());
    }
    for (rank, mut siblings) in by_rank {
        siblings.sort();
        for (row, id) in siblings.into_iter().enumerate() {
            if let Some(node) = graph.nodes.get_mut(&id) {
                node.position = (80.0 + rank as f32 * 220.0, 80.0 + row as f32 * 140.0);
            }
        }
    }
}

fn rank_of(graph: &NetworkGraph, id: &NodeId, ranks: &mut HashMap<NodeId, usize>) -> usize {
    if let Some(&rank) = ranks.get(id) {
        return rank;
    }
    // Acyclicity was validated before layout, so recursion terminates.
    ranks.insert(id.clone(), 0);
    let rank = graph
        .edges
        .iter()
        .filter(|e| &e.target == id)
        .map(|e| rank_of(graph, &e.source, ranks) + 1)
        .max()
        .unwrap_or(0);
    ranks.insert(id.clone(), rank);
    rank
}

/// The built-in template catalogue, always available without external
/// files.
pub fn factory_presets() -> Vec<GraphPreset> {
    vec![
        GraphPreset {
            name: "Bass Pulse".into(),
            description: "Low-band energy, adaptively normalized and smoothed".into(),
            output_type: PortType::Number,
            auto_place: true,
            nodes: vec![
                PresetNode::new("band", "Frequency Band")
                    .with_value("startHz", Value::Number(20.0))
                    .with_value("endHz", Value::Number(150.0)),
                PresetNode::new("level", "Average Volume"),
                PresetNode::new("norm", "Adaptive Normalize"),
                PresetNode::new("env", "Envelope Follower")
                    .with_value("attackMs", Value::Number(20.0))
                    .with_value("releaseMs", Value::Number(200.0)),
            ],
            edges: vec![
                PresetEdge::new(INPUT_KEY, "frequencyAnalysis", "band", "analysis"),
                PresetEdge::new("band", "output", "level", "signal"),
                PresetEdge::new("level", "output", "norm", "input"),
                PresetEdge::new("norm", "output", "env", "input"),
                PresetEdge::new("env", "output", OUTPUT_KEY, OUTPUT_VALUE_PORT),
            ],
        },
        GraphPreset {
            name: "Beat Gate".into(),
            description: "Kick-band trigger with refractory lockout".into(),
            output_type: PortType::Number,
            auto_place: true,
            nodes: vec![
                PresetNode::new("band", "Frequency Band")
                    .with_value("startHz", Value::Number(30.0))
                    .with_value("endHz", Value::Number(120.0)),
                PresetNode::new("level", "Average Volume"),
                PresetNode::new("norm", "Adaptive Normalize"),
                PresetNode::new("gate", "Refractory Gate")
                    .with_value("low", Value::Number(0.4))
                    .with_value("high", Value::Number(0.6))
                    .with_value("minIntervalMs", Value::Number(250.0)),
            ],
            edges: vec![
                PresetEdge::new(INPUT_KEY, "frequencyAnalysis", "band", "analysis"),
                PresetEdge::new("band", "output", "level", "signal"),
                PresetEdge::new("level", "output", "norm", "input"),
                PresetEdge::new("norm", "output", "gate", "input"),
                PresetEdge::new("gate", "output", OUTPUT_KEY, OUTPUT_VALUE_PORT),
            ],
        },
        GraphPreset {
            name: "Sine Wave".into(),
            description: "Unit sine on the project clock, mapped to [0, 1]".into(),
            output_type: PortType::Number,
            auto_place: true,
            nodes: vec![
                PresetNode::new("rate", "Math")
                    .with_value("op", Value::MathOp(MathOp::Mul))
                    .with_value("b", Value::Number(core::f64::consts::TAU)),
                PresetNode::new("sin", "Unary Math")
                    .with_value("op", Value::Text("sin".into())),
                PresetNode::new("map", "Normalize")
                    .with_value("inMin", Value::Number(-1.0))
                    .with_value("inMax", Value::Number(1.0))
                    .with_value("outMin", Value::Number(0.0))
                    .with_value("outMax", Value::Number(1.0)),
            ],
            edges: vec![
                PresetEdge::new(INPUT_KEY, "time", "rate", "a"),
                PresetEdge::new("rate", "output", "sin", "a"),
                PresetEdge::new("sin", "output", "map", "input"),
                PresetEdge::new("map", "output", OUTPUT_KEY, OUTPUT_VALUE_PORT),
            ],
        },
        GraphPreset {
            name: "Spectrum".into(),
            description: "Raw frequency bins, passed through".into(),
            output_type: PortType::Bytes,
            auto_place: true,
            nodes: Vec::new(),
            edges: vec![PresetEdge::new(
                INPUT_KEY,
                "frequencyData",
                OUTPUT_KEY,
                OUTPUT_VALUE_PORT,
            )],
        },
        GraphPreset {
            name: "Waveform".into(),
            description: "Raw time-domain samples, passed through".into(),
            output_type: PortType::Bytes,
            auto_place: true,
            nodes: Vec::new(),
            edges: vec![PresetEdge::new(
                INPUT_KEY,
                "audioSignal",
                OUTPUT_KEY,
                OUTPUT_VALUE_PORT,
            )],
        },
        GraphPreset {
            name: "Loudness".into(),
            description: "Overall signal level mapped to [0, 1]".into(),
            output_type: PortType::Number,
            auto_place: true,
            nodes: vec![
                PresetNode::new("level", "Average Volume"),
                PresetNode::new("map", "Normalize")
                    .with_value("inMin", Value::Number(0.0))
                    .with_value("inMax", Value::Number(255.0)),
            ],
            edges: vec![
                PresetEdge::new(INPUT_KEY, "frequencyData", "level", "signal"),
                PresetEdge::new("level", "output", "map", "input"),
                PresetEdge::new("map", "output", OUTPUT_KEY, OUTPUT_VALUE_PORT),
            ],
        },
    ]
}
