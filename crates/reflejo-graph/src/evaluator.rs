//! Demand-driven memoized network evaluation.
//!
//! One call produces the value at the unique `Output` node for one frame.
//! The traversal starts fresh per call, visits only nodes the output
//! actually depends on, and computes each at most once; that single
//! invocation is also what guarantees a stateful node's scratch observes
//! each tick exactly once.
//!
//! Malformed graphs never error out of the tick: a missing `Output`, an
//! unknown kind, or a cycle yields `None` with a warning, and the owning
//! parameter falls back to its static value.

use std::collections::HashMap;

use reflejo_core::{AudioFrame, PortType, Value};

use crate::graph::NetworkGraph;
use crate::id::NodeId;
use crate::kind::{OUTPUT_KIND, OUTPUT_VALUE_PORT};
use crate::port::{Inputs, Outputs};
use crate::registry::NodeRegistry;

/// Evaluates the graph against one frame.
///
/// Returns `None` when the graph is disabled or malformed. Node scratch is
/// mutated during computation and never cleared here; graph reset is an
/// explicit store operation.
pub fn evaluate(
    graph: &mut NetworkGraph,
    registry: &NodeRegistry,
    frame: &AudioFrame,
) -> Option<Value> {
    if !graph.enabled {
        return None;
    }

    let Some(output) = graph.output_node() else {
        tracing::warn!(network = %graph.name, "network has no Output node");
        return None;
    };
    let output_id = output.id.clone();

    let mut marks: HashMap<NodeId, Mark> = HashMap::new();
    let mut order: Vec<NodeId> = Vec::new();
    if visit(graph, &output_id, &mut marks, &mut order).is_err() {
        tracing::warn!(network = %graph.name, "cycle detected during evaluation");
        return None;
    }

    let mut memo: HashMap<NodeId, Outputs> = HashMap::new();
    for id in order {
        let Some(node) = graph.nodes.get(&id) else {
            continue;
        };
        let kind_label = node.kind_label.clone();
        let Some(kind) = registry.get(&kind_label) else {
            tracing::warn!(network = %graph.name, kind = %kind_label, "unknown node kind");
            return None;
        };

        let mut inputs = Inputs::new();
        for spec in &kind.inputs {
            // The Output node's value port adopts the graph's output type.
            let port_ty = if kind_label == OUTPUT_KIND && spec.id == OUTPUT_VALUE_PORT {
                graph.output_type
            } else {
                spec.ty
            };

            let (edge, inbound) = graph.incoming_edge(&id, spec.id);
            if inbound > 1 {
                tracing::warn!(
                    network = %graph.name,
                    node = %id,
                    port = spec.id,
                    inbound,
                    "multiple edges terminate at one port; using the last added"
                );
            }

            let mut resolved = edge
                .and_then(|e| memo.get(&e.source).and_then(|out| out.get(&e.source_port)))
                .cloned();
            if resolved.is_none() {
                resolved = node.input_values.get(spec.id).cloned();
            }
            if resolved.is_none() {
                resolved = spec.default.clone();
            }

            match resolved {
                Some(value) => {
                    let value = match port_ty {
                        PortType::Number | PortType::Text => value.coerce(port_ty),
                        _ => value,
                    };
                    inputs.insert(spec.id, value);
                }
                None if spec.optional => {}
                None => inputs.insert(spec.id, Value::zero(port_ty)),
            }
        }

        // Re-borrow mutably for the scratch handle; the resolution above
        // only needed shared access.
        let node = graph.nodes.get_mut(&id)?;
        let outputs = (kind.compute)(&inputs, frame, &mut node.scratch);
        memo.insert(id, outputs);
    }

    memo.get(&output_id).and_then(Outputs::result).cloned()
}

#[derive(Clone, Copy, PartialEq)]
enum Mark {
    InProgress,
    Done,
}

fn visit(
    graph: &NetworkGraph,
    id: &NodeId,
    marks: &mut HashMap<NodeId, Mark>,
    order: &mut Vec<NodeId>,
) -> Result<(), ()> {
    match marks.get(id) {
        Some(Mark::InProgress) => return Err(()),
        Some(Mark::Done) => return Ok(()),
        None => {}
    }
    marks.insert(id.clone(), Mark::InProgress);
    for edge in &graph.edges {
        if &edge.target == id && graph.nodes.contains_key(&edge.source) {
            visit(graph, &edge.source, marks, order)?;
        }
    }
    marks.insert(id.clone(), Mark::Done);
    order.push(id.clone());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Edge;
    use crate::kind::INPUT_KIND;
    use crate::node::{GraphNode, NodeScratch};

    fn add_node(graph: &mut NetworkGraph, registry: &NodeRegistry, id: &str, kind: &str) {
        graph.insert_node(GraphNode::new(
            NodeId::new(id),
            kind,
            registry.init_scratch(kind),
        ));
    }

    fn minimal_enabled(registry: &NodeRegistry) -> NetworkGraph {
        let mut graph = NetworkGraph::minimal(
            "p",
            PortType::Number,
            registry.init_scratch(INPUT_KIND),
            registry.init_scratch(OUTPUT_KIND),
        );
        graph.enabled = true;
        graph
    }

    #[test]
    fn disabled_graph_evaluates_to_none() {
        let registry = NodeRegistry::new();
        let mut graph = minimal_enabled(&registry);
        graph.enabled = false;
        assert_eq!(evaluate(&mut graph, &registry, &AudioFrame::default()), None);
    }

    #[test]
    fn missing_output_evaluates_to_none() {
        let registry = NodeRegistry::new();
        let mut graph = NetworkGraph::new("p", PortType::Number);
        graph.enabled = true;
        add_node(&mut graph, &registry, "in", INPUT_KIND);
        assert_eq!(evaluate(&mut graph, &registry, &AudioFrame::default()), None);
    }

    #[test]
    fn unconnected_output_yields_type_zero() {
        let registry = NodeRegistry::new();
        let mut graph = minimal_enabled(&registry);
        let value = evaluate(&mut graph, &registry, &AudioFrame::default());
        assert_eq!(value, Some(Value::Number(0.0)));
    }

    #[test]
    fn time_flows_from_input_to_output() {
        let registry = NodeRegistry::new();
        let mut graph = minimal_enabled(&registry);
        graph.add_edge(Edge::new(
            NodeId::new("p-input-node"),
            "time",
            NodeId::new("p-output-node"),
            OUTPUT_VALUE_PORT,
        ));
        let mut frame = AudioFrame::default();
        frame.time = 4.25;
        let value = evaluate(&mut graph, &registry, &frame);
        assert_eq!(value, Some(Value::Number(4.25)));
    }

    #[test]
    fn cycle_yields_none() {
        let registry = NodeRegistry::new();
        let mut graph = minimal_enabled(&registry);
        add_node(&mut graph, &registry, "m1", "Math");
        add_node(&mut graph, &registry, "m2", "Math");
        // m1 -> m2 -> m1 plus m2 -> output, bypassing store validation.
        graph.add_edge(Edge::new(NodeId::new("m1"), "output", NodeId::new("m2"), "a"));
        graph.add_edge(Edge::new(NodeId::new("m2"), "output", NodeId::new("m1"), "a"));
        graph.add_edge(Edge::new(
            NodeId::new("m2"),
            "output",
            NodeId::new("p-output-node"),
            OUTPUT_VALUE_PORT,
        ));
        assert_eq!(evaluate(&mut graph, &registry, &AudioFrame::default()), None);
    }

    #[test]
    fn unknown_kind_yields_none() {
        let registry = NodeRegistry::new();
        let mut graph = minimal_enabled(&registry);
        graph.insert_node(GraphNode::new(NodeId::new("x"), "Nope", NodeScratch::None));
        graph.add_edge(Edge::new(
            NodeId::new("x"),
            "output",
            NodeId::new("p-output-node"),
            OUTPUT_VALUE_PORT,
        ));
        assert_eq!(evaluate(&mut graph, &registry, &AudioFrame::default()), None);
    }

    #[test]
    fn instance_overrides_beat_port_defaults() {
        let registry = NodeRegistry::new();
        let mut graph = minimal_enabled(&registry);
        add_node(&mut graph, &registry, "m", "Math");
        {
            let node = graph.nodes.get_mut(&NodeId::new("m")).unwrap();
            node.set_input_value("a", Value::Number(3.0));
            node.set_input_value("b", Value::Number(4.0));
            node.set_input_value("op", Value::Text("mul".into()));
        }
        graph.add_edge(Edge::new(
            NodeId::new("m"),
            "output",
            NodeId::new("p-output-node"),
            OUTPUT_VALUE_PORT,
        ));
        let value = evaluate(&mut graph, &registry, &AudioFrame::default());
        assert_eq!(value, Some(Value::Number(12.0)));
    }

    #[test]
    fn number_port_coerces_text_input() {
        let registry = NodeRegistry::new();
        let mut graph = minimal_enabled(&registry);
        add_node(&mut graph, &registry, "m", "Math");
        {
            let node = graph.nodes.get_mut(&NodeId::new("m")).unwrap();
            node.set_input_value("a", Value::Text("2.5".into()));
            node.set_input_value("b", Value::Text("not a number".into()));
        }
        graph.add_edge(Edge::new(
            NodeId::new("m"),
            "output",
            NodeId::new("p-output-node"),
            OUTPUT_VALUE_PORT,
        ));
        let value = evaluate(&mut graph, &registry, &AudioFrame::default());
        assert_eq!(value, Some(Value::Number(2.5)));
    }

    #[test]
    fn each_node_computes_once_per_call() {
        // A stateful Moving Mean feeding two Math inputs would double-push
        // per tick if memoization failed; the mean then shifts.
        let registry = NodeRegistry::new();
        let mut graph = minimal_enabled(&registry);
        add_node(&mut graph, &registry, "mean", "Moving Mean");
        add_node(&mut graph, &registry, "sum", "Math");
        {
            let node = graph.nodes.get_mut(&NodeId::new("mean")).unwrap();
            node.set_input_value("input", Value::Number(10.0));
        }
        graph.add_edge(Edge::new(NodeId::new("mean"), "output", NodeId::new("sum"), "a"));
        graph.add_edge(Edge::new(NodeId::new("mean"), "output", NodeId::new("sum"), "b"));
        graph.add_edge(Edge::new(
            NodeId::new("sum"),
            "output",
            NodeId::new("p-output-node"),
            OUTPUT_VALUE_PORT,
        ));

        let mut frame = AudioFrame::default();
        frame.time = 0.0;
        assert_eq!(
            evaluate(&mut graph, &registry, &frame),
            Some(Value::Number(20.0))
        );
        // One tick pushed exactly one window sample.
        match &graph.nodes.get(&NodeId::new("mean")).unwrap().scratch {
            NodeScratch::Window(win) => assert_eq!(win.len(), 1),
            other => panic!("unexpected scratch: {other:?}"),
        }
    }
}
